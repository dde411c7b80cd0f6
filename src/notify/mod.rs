//! Fire-and-forget notification side-channel.
//!
//! Link issuance enqueues a [`BookingNotice`] on a bounded channel; a
//! background worker delivers it through a [`Notifier`]. Delivery is
//! decoupled from the transactional core: a full queue or a failed
//! delivery is logged and never fails the issuing call.

pub mod dispatcher;
pub mod notice;

pub use dispatcher::{LogNotifier, NotificationDispatcher, Notifier};
pub use notice::BookingNotice;
