//! Booking coordinator.
//!
//! The only write path into the catalog and the ledger. Every operation
//! runs as a single PostgreSQL transaction: slot and account rows are read
//! under `FOR UPDATE` locks, validated, and written together, so concurrent
//! bookings of the same slot (or spends from the same account) serialize at
//! the store rather than in this process. Serialization failures and
//! deadlocks are retried a bounded number of times; each attempt carries a
//! timeout so no caller blocks indefinitely.

use std::future::Future;
use std::time::Duration;

use classbook_core::errors::{BookingError, BookingResult};
use classbook_core::models::ledger::TxCategory;
use classbook_core::models::slot::{
    self, CreateClassSlotRequest, SlotStatus, UpdateClassSlotRequest,
};
use sqlx::{Pool, Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

use crate::models::{DbClassSlot, DbCreditTransaction};
use crate::repositories::{class_slot, ledger};

/// Retry envelope for transactional operations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts before a transient failure surfaces as `Unavailable`
    pub max_attempts: u32,
    /// Base delay between attempts, scaled linearly by attempt number
    pub backoff: Duration,
    /// Per-attempt timeout
    pub op_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff: Duration::from_millis(25),
            op_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookOutcome {
    pub slot: DbClassSlot,
    /// Student balance after the booking debit
    pub balance: i64,
}

#[derive(Debug, Clone)]
pub struct FinishOutcome {
    pub slot: DbClassSlot,
    /// Amount actually paid out, frozen at booking time
    pub payout: i64,
    /// Coach balance after settlement
    pub balance: i64,
}

#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub slot: DbClassSlot,
    pub refund: i64,
}

#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub id: Uuid,
    pub refunded: i64,
}

#[derive(Debug, Clone)]
pub struct TopUpOutcome {
    pub transaction: DbCreditTransaction,
    pub balance: i64,
}

/// Maps low-level store errors onto the domain taxonomy. Serialization
/// failures (40001) and deadlocks (40P01) are transient conflicts; pool and
/// IO trouble is `Unavailable`; anything else is a genuine database error.
pub(crate) fn classify(err: sqlx::Error) -> BookingError {
    match &err {
        sqlx::Error::Database(db) => {
            if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) {
                return BookingError::Conflict(err.to_string());
            }
        }
        sqlx::Error::PoolTimedOut => {
            return BookingError::Unavailable(
                "timed out acquiring a database connection".to_string(),
            );
        }
        sqlx::Error::Io(_) => {
            return BookingError::Unavailable(err.to_string());
        }
        _ => {}
    }
    BookingError::Database(eyre::Report::new(err))
}

/// Runs one attempt of a transactional operation under the policy's
/// timeout, retrying transient failures from the read step. Business
/// outcomes pass through untouched on the first attempt.
async fn with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    op: &'static str,
    mut run: F,
) -> BookingResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BookingResult<T>>,
{
    let mut attempt = 1u32;
    loop {
        let result = match tokio::time::timeout(policy.op_timeout, run()).await {
            Ok(result) => result,
            Err(_) => Err(BookingError::Unavailable(format!(
                "{op} timed out after {:?}",
                policy.op_timeout
            ))),
        };

        match result {
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                warn!("{} attempt {} failed, retrying: {}", op, attempt, err);
                tokio::time::sleep(policy.backoff * attempt).await;
                attempt += 1;
            }
            Err(err) if err.is_transient() => {
                warn!("{} gave up after {} attempts: {}", op, attempt, err);
                return Err(BookingError::Unavailable(format!(
                    "{op} failed after {attempt} attempts: {err}"
                )));
            }
            other => return other,
        }
    }
}

pub async fn create_class_slot(
    pool: &Pool<Postgres>,
    policy: &RetryPolicy,
    req: &CreateClassSlotRequest,
) -> BookingResult<DbClassSlot> {
    // Validate before touching the store
    slot::validate_interval(req.start_time, req.end_time)?;
    slot::validate_cost(req.credit_cost)?;

    with_retries(policy, "create_class_slot", || create_class_slot_once(pool, req)).await
}

async fn create_class_slot_once(
    pool: &Pool<Postgres>,
    req: &CreateClassSlotRequest,
) -> BookingResult<DbClassSlot> {
    let mut tx = pool.begin().await.map_err(classify)?;

    let label = slot::time_label(req.start_time, req.end_time);
    let date = slot::slot_date(req.start_time);
    let created = class_slot::insert_slot(
        &mut tx,
        req.creator_id,
        &req.instructor_name,
        req.start_time,
        req.end_time,
        &label,
        req.credit_cost,
        date,
    )
    .await
    .map_err(classify)?;

    tx.commit().await.map_err(classify)?;
    Ok(created)
}

pub async fn edit_class_slot(
    pool: &Pool<Postgres>,
    policy: &RetryPolicy,
    slot_id: Uuid,
    req: &UpdateClassSlotRequest,
) -> BookingResult<DbClassSlot> {
    with_retries(policy, "edit_class_slot", || {
        edit_class_slot_once(pool, slot_id, req)
    })
    .await
}

async fn edit_class_slot_once(
    pool: &Pool<Postgres>,
    slot_id: Uuid,
    req: &UpdateClassSlotRequest,
) -> BookingResult<DbClassSlot> {
    let mut tx = pool.begin().await.map_err(classify)?;

    let current = class_slot::lock_slot(&mut tx, slot_id)
        .await
        .map_err(classify)?
        .ok_or_else(|| BookingError::NotFound(format!("class slot {} not found", slot_id)))?;

    if current.status == SlotStatus::Finished.as_str() {
        return Err(BookingError::InvalidState(format!(
            "class slot {} is finished and can no longer be edited",
            slot_id
        )));
    }

    let instructor_name = req
        .instructor_name
        .as_deref()
        .unwrap_or(&current.instructor_name);
    let start_time = req.start_time.unwrap_or(current.start_time);
    let end_time = req.end_time.unwrap_or(current.end_time);
    let credit_cost = req.credit_cost.unwrap_or(current.credit_cost);

    // Re-validate the merged fields before writing. Changing the cost of a
    // booked slot is allowed; the already-posted debit stays untouched and
    // settlement uses the amount charged at booking time.
    slot::validate_interval(start_time, end_time)?;
    slot::validate_cost(credit_cost)?;

    let label = slot::time_label(start_time, end_time);
    let date = slot::slot_date(start_time);
    let updated = class_slot::update_slot_fields(
        &mut tx,
        slot_id,
        instructor_name,
        start_time,
        end_time,
        &label,
        credit_cost,
        date,
    )
    .await
    .map_err(classify)?;

    tx.commit().await.map_err(classify)?;
    Ok(updated)
}

pub async fn delete_class_slot(
    pool: &Pool<Postgres>,
    policy: &RetryPolicy,
    slot_id: Uuid,
    requester: Uuid,
) -> BookingResult<DeleteOutcome> {
    with_retries(policy, "delete_class_slot", || {
        delete_class_slot_once(pool, slot_id, requester)
    })
    .await
}

async fn delete_class_slot_once(
    pool: &Pool<Postgres>,
    slot_id: Uuid,
    requester: Uuid,
) -> BookingResult<DeleteOutcome> {
    let mut tx = pool.begin().await.map_err(classify)?;

    let current = class_slot::lock_slot(&mut tx, slot_id)
        .await
        .map_err(classify)?
        .ok_or_else(|| BookingError::NotFound(format!("class slot {} not found", slot_id)))?;

    if current.creator_id != requester {
        return Err(BookingError::Forbidden(format!(
            "only the creator may delete class slot {}",
            slot_id
        )));
    }
    if current.status == SlotStatus::Finished.as_str() {
        return Err(BookingError::InvalidState(format!(
            "class slot {} is finished; settlement history is preserved",
            slot_id
        )));
    }

    // Deleting a booked slot is the cancellation path: the student gets
    // their charged credits back before the slot row disappears.
    let refunded = refund_booked_student(&mut tx, &current).await?;
    class_slot::delete_slot_row(&mut tx, slot_id)
        .await
        .map_err(classify)?;

    tx.commit().await.map_err(classify)?;
    Ok(DeleteOutcome {
        id: slot_id,
        refunded,
    })
}

pub async fn book_slot(
    pool: &Pool<Postgres>,
    policy: &RetryPolicy,
    slot_id: Uuid,
    student_id: Uuid,
) -> BookingResult<BookOutcome> {
    with_retries(policy, "book_slot", || {
        book_slot_once(pool, slot_id, student_id)
    })
    .await
}

async fn book_slot_once(
    pool: &Pool<Postgres>,
    slot_id: Uuid,
    student_id: Uuid,
) -> BookingResult<BookOutcome> {
    let mut tx = pool.begin().await.map_err(classify)?;

    let current = class_slot::lock_slot(&mut tx, slot_id)
        .await
        .map_err(classify)?
        .ok_or_else(|| BookingError::NotFound(format!("class slot {} not found", slot_id)))?;

    // The row lock guarantees that of two concurrent bookings exactly one
    // observes 'available'; the loser sees the committed 'booked' state.
    if current.status != SlotStatus::Available.as_str() {
        return Err(BookingError::AlreadyBooked(format!(
            "class slot {} is not available",
            slot_id
        )));
    }

    ledger::ensure_account(&mut tx, student_id)
        .await
        .map_err(classify)?;
    let balance = ledger::lock_balance(&mut tx, student_id)
        .await
        .map_err(classify)?;
    if balance < current.credit_cost {
        return Err(BookingError::InsufficientCredits {
            required: current.credit_cost,
            available: balance,
        });
    }

    ledger::insert_entry(
        &mut tx,
        student_id,
        -current.credit_cost,
        TxCategory::Booking.as_str(),
        Some(slot_id),
    )
    .await
    .map_err(classify)?;
    let balance = ledger::apply_to_balance(&mut tx, student_id, -current.credit_cost)
        .await
        .map_err(classify)?;
    let updated = class_slot::mark_booked(&mut tx, slot_id, student_id)
        .await
        .map_err(classify)?;

    tx.commit().await.map_err(classify)?;
    Ok(BookOutcome {
        slot: updated,
        balance,
    })
}

pub async fn finish_slot(
    pool: &Pool<Postgres>,
    policy: &RetryPolicy,
    slot_id: Uuid,
    requester: Uuid,
) -> BookingResult<FinishOutcome> {
    with_retries(policy, "finish_slot", || {
        finish_slot_once(pool, slot_id, requester)
    })
    .await
}

async fn finish_slot_once(
    pool: &Pool<Postgres>,
    slot_id: Uuid,
    requester: Uuid,
) -> BookingResult<FinishOutcome> {
    let mut tx = pool.begin().await.map_err(classify)?;

    let current = class_slot::lock_slot(&mut tx, slot_id)
        .await
        .map_err(classify)?
        .ok_or_else(|| BookingError::NotFound(format!("class slot {} not found", slot_id)))?;

    if current.creator_id != requester {
        return Err(BookingError::Forbidden(format!(
            "only the creator may finish class slot {}",
            slot_id
        )));
    }
    // Finishing twice fails here: the state check and the payout commit
    // in the same transaction, so a finished slot is never paid again.
    if current.status != SlotStatus::Booked.as_str() {
        return Err(BookingError::InvalidState(format!(
            "class slot {} is not booked",
            slot_id
        )));
    }

    let payout = charged_amount(&mut tx, &current).await?;
    ledger::ensure_account(&mut tx, current.creator_id)
        .await
        .map_err(classify)?;
    ledger::insert_entry(
        &mut tx,
        current.creator_id,
        payout,
        TxCategory::Completion.as_str(),
        Some(slot_id),
    )
    .await
    .map_err(classify)?;
    let balance = ledger::apply_to_balance(&mut tx, current.creator_id, payout)
        .await
        .map_err(classify)?;
    let updated = class_slot::mark_finished(&mut tx, slot_id)
        .await
        .map_err(classify)?;

    tx.commit().await.map_err(classify)?;
    Ok(FinishOutcome {
        slot: updated,
        payout,
        balance,
    })
}

pub async fn cancel_booking(
    pool: &Pool<Postgres>,
    policy: &RetryPolicy,
    slot_id: Uuid,
    requester: Uuid,
) -> BookingResult<CancelOutcome> {
    with_retries(policy, "cancel_booking", || {
        cancel_booking_once(pool, slot_id, requester)
    })
    .await
}

async fn cancel_booking_once(
    pool: &Pool<Postgres>,
    slot_id: Uuid,
    requester: Uuid,
) -> BookingResult<CancelOutcome> {
    let mut tx = pool.begin().await.map_err(classify)?;

    let current = class_slot::lock_slot(&mut tx, slot_id)
        .await
        .map_err(classify)?
        .ok_or_else(|| BookingError::NotFound(format!("class slot {} not found", slot_id)))?;

    if current.status != SlotStatus::Booked.as_str() {
        return Err(BookingError::InvalidState(format!(
            "class slot {} has no booking to cancel",
            slot_id
        )));
    }
    let is_creator = current.creator_id == requester;
    let is_student = current.student_id == Some(requester);
    if !is_creator && !is_student {
        return Err(BookingError::Forbidden(format!(
            "only the creator or the booked student may cancel class slot {}",
            slot_id
        )));
    }

    let refund = refund_booked_student(&mut tx, &current).await?;
    let updated = class_slot::clear_booking(&mut tx, slot_id)
        .await
        .map_err(classify)?;

    tx.commit().await.map_err(classify)?;
    Ok(CancelOutcome {
        slot: updated,
        refund,
    })
}

pub async fn top_up(
    pool: &Pool<Postgres>,
    policy: &RetryPolicy,
    user_id: Uuid,
    amount: i64,
) -> BookingResult<TopUpOutcome> {
    // Validate before touching the store
    if amount <= 0 {
        return Err(BookingError::InvalidAmount(format!(
            "top-up amount must be positive, got {}",
            amount
        )));
    }

    with_retries(policy, "top_up", || top_up_once(pool, user_id, amount)).await
}

async fn top_up_once(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    amount: i64,
) -> BookingResult<TopUpOutcome> {
    let mut tx = pool.begin().await.map_err(classify)?;

    ledger::ensure_account(&mut tx, user_id)
        .await
        .map_err(classify)?;
    let transaction = ledger::insert_entry(
        &mut tx,
        user_id,
        amount,
        TxCategory::Topup.as_str(),
        None,
    )
    .await
    .map_err(classify)?;
    let balance = ledger::apply_to_balance(&mut tx, user_id, amount)
        .await
        .map_err(classify)?;

    tx.commit().await.map_err(classify)?;
    Ok(TopUpOutcome {
        transaction,
        balance,
    })
}

/// The amount a booking actually charged: read back from the booking debit
/// so later cost edits never change what is settled. Legacy rows without a
/// recorded debit fall back to the slot's current cost.
async fn charged_amount(
    tx: &mut Transaction<'_, Postgres>,
    slot: &DbClassSlot,
) -> BookingResult<i64> {
    let debit = ledger::booking_debit_for_slot(tx, slot.id)
        .await
        .map_err(classify)?;
    Ok(debit.map(|d| -d.amount).unwrap_or(slot.credit_cost))
}

/// Posts the compensating refund for a booked slot's student. Returns the
/// refunded amount (0 when the slot somehow has no student on record).
async fn refund_booked_student(
    tx: &mut Transaction<'_, Postgres>,
    slot: &DbClassSlot,
) -> BookingResult<i64> {
    let Some(student_id) = slot.student_id else {
        return Ok(0);
    };

    let refund = charged_amount(tx, slot).await?;
    ledger::ensure_account(tx, student_id)
        .await
        .map_err(classify)?;
    ledger::insert_entry(
        tx,
        student_id,
        refund,
        TxCategory::Refund.as_str(),
        Some(slot.id),
    )
    .await
    .map_err(classify)?;
    ledger::apply_to_balance(tx, student_id, refund)
        .await
        .map_err(classify)?;

    Ok(refund)
}
