//! Bounded-queue notification dispatcher.
//!
//! [`NotificationDispatcher`] wraps a [`tokio::sync::mpsc`] channel. The
//! issuing side enqueues without blocking; a spawned worker drains the
//! queue and hands each notice to the configured [`Notifier`]. Worker
//! faults are logged — they never propagate back to the issuer.

use std::future::Future;

use tokio::sync::mpsc;

use super::notice::BookingNotice;

/// Delivery backend for booking notices.
///
/// Implementations own the transport (SMTP relay, webhook, plain log).
/// A returned error is logged by the worker and otherwise dropped.
pub trait Notifier: Send + Sync + 'static {
    /// Delivers one notice to its recipient.
    fn deliver(
        &self,
        notice: &BookingNotice,
    ) -> impl Future<Output = Result<(), String>> + Send;
}

/// Sender half of the notification queue.
///
/// Cloneable and cheap; every clone feeds the same worker.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<BookingNotice>,
}

impl NotificationDispatcher {
    /// Spawns the delivery worker and returns the dispatcher feeding it.
    ///
    /// The worker runs until every dispatcher clone is dropped.
    #[must_use]
    pub fn spawn<N: Notifier>(notifier: N, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<BookingNotice>(capacity);

        tokio::spawn(async move {
            while let Some(notice) = receiver.recv().await {
                if let Err(reason) = notifier.deliver(&notice).await {
                    tracing::warn!(
                        recipient = %notice.recipient_contact,
                        %reason,
                        "booking notice delivery failed"
                    );
                }
            }
        });

        Self { sender }
    }

    /// Enqueues a notice without waiting.
    ///
    /// A full queue drops the notice with a warning: notification is
    /// best-effort and must not stall or fail the issuing call.
    pub fn dispatch(&self, notice: BookingNotice) {
        if let Err(err) = self.sender.try_send(notice) {
            let notice = match err {
                mpsc::error::TrySendError::Full(n) | mpsc::error::TrySendError::Closed(n) => n,
            };
            tracing::warn!(
                recipient = %notice.recipient_contact,
                "notification queue unavailable; booking notice dropped"
            );
        }
    }
}

/// Log-backed notifier used when no delivery transport is configured.
///
/// Writes the booking link and offered windows to the log so an operator
/// can relay them manually.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a new `LogNotifier`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for LogNotifier {
    async fn deliver(&self, notice: &BookingNotice) -> Result<(), String> {
        let windows: Vec<String> = notice
            .slot_windows
            .iter()
            .map(|(start, end)| format!("{} ~ {}", start.to_rfc3339(), end.to_rfc3339()))
            .collect();
        tracing::info!(
            recipient = %notice.recipient_contact,
            booking_url = %notice.booking_url,
            windows = ?windows,
            "booking link issued"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    struct CountingNotifier {
        delivered: Arc<AtomicUsize>,
    }

    impl Notifier for CountingNotifier {
        async fn deliver(&self, _notice: &BookingNotice) -> Result<(), String> {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        async fn deliver(&self, _notice: &BookingNotice) -> Result<(), String> {
            Err("relay unreachable".to_string())
        }
    }

    fn make_notice() -> BookingNotice {
        BookingNotice {
            recipient_contact: "pat@example.com".to_string(),
            booking_url: "http://localhost:5173/booking?token=abc".to_string(),
            slot_windows: vec![(Utc::now(), Utc::now())],
        }
    }

    #[tokio::test]
    async fn worker_delivers_enqueued_notices() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let dispatcher = NotificationDispatcher::spawn(
            CountingNotifier {
                delivered: Arc::clone(&delivered),
            },
            16,
        );

        dispatcher.dispatch(make_notice());
        dispatcher.dispatch(make_notice());

        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(delivered.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_panic_or_block() {
        let dispatcher = NotificationDispatcher::spawn(FailingNotifier, 16);
        dispatcher.dispatch(make_notice());
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        // Still usable after a failed delivery.
        dispatcher.dispatch(make_notice());
    }
}
