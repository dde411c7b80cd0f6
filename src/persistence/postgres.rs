//! PostgreSQL implementation of the persistence layer.
//!
//! The admission transaction uses `SELECT ... FOR UPDATE` on the slot row
//! as its conflict-serializing mechanism, with a `SET LOCAL lock_timeout`
//! bounding the wait. The lock is per slot row, so admissions against
//! different slots proceed independently.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::BookingStore;
use super::models::{ReservationRow, SlotCountRow, SlotRow, TokenRow};
use crate::domain::{
    AccessToken, Applicant, OwnerId, Reservation, ReservationId, Slot, SlotId, SlotWithCount,
    TokenValue,
};
use crate::error::BookingError;

/// Postgres error code raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

const SLOT_COLUMNS: &str = "id, owner_id, start_time, end_time, capacity, created_at, updated_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    lock_wait_ms: u64,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool and admission
    /// lock wait bound.
    #[must_use]
    pub fn new(pool: PgPool, lock_wait_ms: u64) -> Self {
        Self { pool, lock_wait_ms }
    }
}

/// Maps a database failure outside the admission transaction.
fn persistence(e: sqlx::Error) -> BookingError {
    BookingError::PersistenceError(e.to_string())
}

/// Maps a database failure inside the admission transaction. Everything
/// here is retryable from the caller's perspective: the transaction is
/// rolled back and no partial state survives. A lock wait timeout is
/// reported as such rather than as a generic fault.
fn admission_fault(e: sqlx::Error) -> BookingError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some(LOCK_NOT_AVAILABLE) {
            return BookingError::TransientFailure("slot lock wait timed out".to_string());
        }
    }
    BookingError::TransientFailure(e.to_string())
}

impl BookingStore for PostgresStore {
    async fn insert_slot(&self, slot: &Slot) -> Result<(), BookingError> {
        sqlx::query(
            "INSERT INTO slots (id, owner_id, start_time, end_time, capacity, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(*slot.id.as_uuid())
        .bind(*slot.owner_id.as_uuid())
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(slot.capacity)
        .bind(slot.created_at)
        .bind(slot.updated_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(())
    }

    async fn list_slots(
        &self,
        owner_id: OwnerId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<SlotWithCount>, BookingError> {
        let rows = sqlx::query_as::<_, SlotCountRow>(
            "SELECT s.id, s.owner_id, s.start_time, s.end_time, s.capacity, \
                    s.created_at, s.updated_at, \
                    (SELECT COUNT(*) FROM reservations r WHERE r.slot_id = s.id) AS confirmed_count \
             FROM slots s \
             WHERE s.owner_id = $1 \
               AND ($2::timestamptz IS NULL OR s.start_time >= $2) \
               AND ($3::timestamptz IS NULL OR s.start_time <= $3) \
             ORDER BY s.start_time ASC",
        )
        .bind(*owner_id.as_uuid())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_slot(&self, slot_id: SlotId) -> Result<Option<SlotWithCount>, BookingError> {
        // Capacity and count come from one statement, so the pair is a
        // consistent snapshot of this slot.
        let row = sqlx::query_as::<_, SlotCountRow>(
            "SELECT s.id, s.owner_id, s.start_time, s.end_time, s.capacity, \
                    s.created_at, s.updated_at, \
                    (SELECT COUNT(*) FROM reservations r WHERE r.slot_id = s.id) AS confirmed_count \
             FROM slots s WHERE s.id = $1",
        )
        .bind(*slot_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row.map(Into::into))
    }

    async fn fetch_slots(&self, slot_ids: &[SlotId]) -> Result<Vec<Slot>, BookingError> {
        let ids: Vec<uuid::Uuid> = slot_ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, SlotRow>(
            "SELECT id, owner_id, start_time, end_time, capacity, created_at, updated_at \
             FROM slots WHERE id = ANY($1) ORDER BY start_time ASC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_slot(
        &self,
        slot_id: SlotId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        capacity: i32,
    ) -> Result<Slot, BookingError> {
        let row = sqlx::query_as::<_, SlotRow>(&format!(
            "UPDATE slots SET start_time = $2, end_time = $3, capacity = $4, updated_at = now() \
             WHERE id = $1 RETURNING {SLOT_COLUMNS}",
        ))
        .bind(*slot_id.as_uuid())
        .bind(start_time)
        .bind(end_time)
        .bind(capacity)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        row.map(Into::into)
            .ok_or_else(|| BookingError::SlotNotFound(*slot_id.as_uuid()))
    }

    async fn delete_slot(&self, slot_id: SlotId) -> Result<(), BookingError> {
        let result = sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(*slot_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(persistence)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::SlotNotFound(*slot_id.as_uuid()));
        }
        Ok(())
    }

    async fn insert_token(
        &self,
        token: &AccessToken,
        slot_ids: &[SlotId],
    ) -> Result<(), BookingError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        sqlx::query(
            "INSERT INTO access_tokens (token, recipient_contact, expires_at, used, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*token.token.as_uuid())
        .bind(&token.recipient_contact)
        .bind(token.expires_at)
        .bind(token.used)
        .bind(token.created_at)
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;

        for slot_id in slot_ids {
            sqlx::query("INSERT INTO access_token_slots (token, slot_id) VALUES ($1, $2)")
                .bind(*token.token.as_uuid())
                .bind(*slot_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(persistence)?;
        }

        tx.commit().await.map_err(persistence)?;
        Ok(())
    }

    async fn fetch_token(
        &self,
        value: TokenValue,
    ) -> Result<Option<(AccessToken, Vec<SlotWithCount>)>, BookingError> {
        let token_row = sqlx::query_as::<_, TokenRow>(
            "SELECT token, recipient_contact, expires_at, used, created_at \
             FROM access_tokens WHERE token = $1",
        )
        .bind(*value.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        let Some(token_row) = token_row else {
            return Ok(None);
        };

        let slot_rows = sqlx::query_as::<_, SlotCountRow>(
            "SELECT s.id, s.owner_id, s.start_time, s.end_time, s.capacity, \
                    s.created_at, s.updated_at, \
                    (SELECT COUNT(*) FROM reservations r WHERE r.slot_id = s.id) AS confirmed_count \
             FROM slots s \
             JOIN access_token_slots ats ON ats.slot_id = s.id \
             WHERE ats.token = $1 \
             ORDER BY s.start_time ASC",
        )
        .bind(*value.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(Some((
            token_row.into(),
            slot_rows.into_iter().map(Into::into).collect(),
        )))
    }

    async fn admit(
        &self,
        value: TokenValue,
        slot_id: SlotId,
        applicant: &Applicant,
    ) -> Result<(Reservation, Slot), BookingError> {
        let mut tx = self.pool.begin().await.map_err(admission_fault)?;

        // lock_timeout is a setting, not bindable; the value is a config
        // integer so interpolation is safe.
        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", self.lock_wait_ms))
            .execute(&mut *tx)
            .await
            .map_err(admission_fault)?;

        // Exclusive intent lock on the slot row. Without it the capacity
        // check and the insert race: two transactions can both observe
        // count < capacity before either commits its insert.
        let slot_row = sqlx::query_as::<_, SlotRow>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots WHERE id = $1 FOR UPDATE",
        ))
        .bind(*slot_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(admission_fault)?;

        let Some(slot_row) = slot_row else {
            tx.rollback().await.map_err(admission_fault)?;
            return Err(BookingError::SlotNotFound(*slot_id.as_uuid()));
        };

        let confirmed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE slot_id = $1")
                .bind(*slot_id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(admission_fault)?;

        if confirmed >= i64::from(slot_row.capacity) {
            tx.rollback().await.map_err(admission_fault)?;
            return Err(BookingError::CapacityExceeded);
        }

        // Conditional redemption: exactly one admission flips used. A
        // concurrent admission that got here first leaves zero rows to
        // affect, and this transaction aborts without a reservation.
        let redeemed = sqlx::query(
            "UPDATE access_tokens SET used = TRUE WHERE token = $1 AND used = FALSE",
        )
        .bind(*value.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(admission_fault)?
        .rows_affected();

        if redeemed == 0 {
            tx.rollback().await.map_err(admission_fault)?;
            return Err(BookingError::InvalidToken);
        }

        let reservation = Reservation::confirmed(slot_id, applicant);
        sqlx::query(
            "INSERT INTO reservations (id, slot_id, applicant_name, applicant_contact, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*reservation.id.as_uuid())
        .bind(*reservation.slot_id.as_uuid())
        .bind(&reservation.applicant_name)
        .bind(&reservation.applicant_contact)
        .bind(&reservation.status)
        .bind(reservation.created_at)
        .execute(&mut *tx)
        .await
        .map_err(admission_fault)?;

        tx.commit().await.map_err(admission_fault)?;

        Ok((reservation, slot_row.into()))
    }

    async fn list_reservations(&self, slot_id: SlotId) -> Result<Vec<Reservation>, BookingError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            "SELECT id, slot_id, applicant_name, applicant_contact, status, created_at \
             FROM reservations WHERE slot_id = $1 ORDER BY created_at ASC",
        )
        .bind(*slot_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_reservation(
        &self,
        id: ReservationId,
    ) -> Result<Option<(Reservation, Slot)>, BookingError> {
        let row = sqlx::query_as::<_, ReservationRow>(
            "SELECT id, slot_id, applicant_name, applicant_contact, status, created_at \
             FROM reservations WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let slot_row = sqlx::query_as::<_, SlotRow>(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots WHERE id = $1",
        ))
        .bind(row.slot_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        let Some(slot_row) = slot_row else {
            // Reservation rows carry a foreign key to slots; an orphan
            // indicates storage corruption.
            return Err(BookingError::PersistenceError(format!(
                "reservation {} references missing slot {}",
                row.id, row.slot_id
            )));
        };

        Ok(Some((row.into(), slot_row.into())))
    }
}
