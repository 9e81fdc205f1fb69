use crate::models::DbCreditTransaction;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

/// Returns the cached balance for a user, or 0 when the account has never
/// been touched.
pub async fn get_balance(pool: &Pool<Postgres>, user_id: Uuid) -> Result<i64> {
    tracing::debug!("Getting balance for user: {}", user_id);

    let balance = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT balance
        FROM credit_accounts
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(balance.unwrap_or(0))
}

/// Newest-first transaction history, optionally restricted to a closed
/// time range.
pub async fn history(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<Vec<DbCreditTransaction>> {
    tracing::debug!(
        "Fetching history for user: {} (from={:?}, to={:?})",
        user_id,
        from,
        to
    );

    let transactions = sqlx::query_as::<_, DbCreditTransaction>(
        r#"
        SELECT id, user_id, amount, category, related_slot_id, created_at
        FROM credit_transactions
        WHERE user_id = $1
          AND ($2::timestamptz IS NULL OR created_at >= $2)
          AND ($3::timestamptz IS NULL OR created_at <= $3)
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(transactions)
}

// Transaction-scoped helpers below are only called by the coordinator. The
// ledger itself does not enforce non-negative balances; the coordinator
// checks under lock before writing.

/// Creates the account row if it does not exist yet. Accounts come into
/// being on first reference and are never deleted.
pub(crate) async fn ensure_account(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO credit_accounts (user_id, balance)
        VALUES ($1, 0)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Reads the balance under a row lock, serializing concurrent spends
/// against the same account. The account row must already exist.
pub(crate) async fn lock_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT balance
        FROM credit_accounts
        WHERE user_id = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn insert_entry(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i64,
    category: &str,
    related_slot_id: Option<Uuid>,
) -> Result<DbCreditTransaction, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query_as::<_, DbCreditTransaction>(
        r#"
        INSERT INTO credit_transactions (id, user_id, amount, category, related_slot_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, amount, category, related_slot_id, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(amount)
    .bind(category)
    .bind(related_slot_id)
    .bind(now)
    .fetch_one(&mut **tx)
    .await
}

/// Applies a signed amount to the cached balance and returns the new value.
pub(crate) async fn apply_to_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE credit_accounts
        SET balance = balance + $2, updated_at = NOW()
        WHERE user_id = $1
        RETURNING balance
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_one(&mut **tx)
    .await
}

/// Looks up the debit posted when the given slot was booked. The payout and
/// refund paths settle with this amount, not the slot's mutable cost field.
pub(crate) async fn booking_debit_for_slot(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: Uuid,
) -> Result<Option<DbCreditTransaction>, sqlx::Error> {
    sqlx::query_as::<_, DbCreditTransaction>(
        r#"
        SELECT id, user_id, amount, category, related_slot_id, created_at
        FROM credit_transactions
        WHERE related_slot_id = $1 AND category = 'booking'
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(slot_id)
    .fetch_optional(&mut **tx)
    .await
}
