use crate::models::DbClassSlot;
use chrono::{DateTime, NaiveDate, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

pub async fn get_class_slot(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbClassSlot>> {
    let slot = sqlx::query_as::<_, DbClassSlot>(
        r#"
        SELECT id, creator_id, instructor_name, start_time, end_time, time_label,
               credit_cost, date, status, student_id, created_at
        FROM class_slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

pub async fn list_by_date(pool: &Pool<Postgres>, date: NaiveDate) -> Result<Vec<DbClassSlot>> {
    let slots = sqlx::query_as::<_, DbClassSlot>(
        r#"
        SELECT id, creator_id, instructor_name, start_time, end_time, time_label,
               credit_cost, date, status, student_id, created_at
        FROM class_slots
        WHERE date = $1
        ORDER BY start_time ASC
        "#,
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

pub async fn list_by_coach(pool: &Pool<Postgres>, coach_id: Uuid) -> Result<Vec<DbClassSlot>> {
    let slots = sqlx::query_as::<_, DbClassSlot>(
        r#"
        SELECT id, creator_id, instructor_name, start_time, end_time, time_label,
               credit_cost, date, status, student_id, created_at
        FROM class_slots
        WHERE creator_id = $1
        ORDER BY start_time ASC
        "#,
    )
    .bind(coach_id)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

// Transaction-scoped helpers below are only called by the coordinator, which
// owns locking order and commit/rollback.

pub(crate) async fn lock_slot(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<DbClassSlot>, sqlx::Error> {
    sqlx::query_as::<_, DbClassSlot>(
        r#"
        SELECT id, creator_id, instructor_name, start_time, end_time, time_label,
               credit_cost, date, status, student_id, created_at
        FROM class_slots
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

pub(crate) async fn insert_slot(
    tx: &mut Transaction<'_, Postgres>,
    creator_id: Uuid,
    instructor_name: &str,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    time_label: &str,
    credit_cost: i64,
    date: NaiveDate,
) -> Result<DbClassSlot, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query_as::<_, DbClassSlot>(
        r#"
        INSERT INTO class_slots
            (id, creator_id, instructor_name, start_time, end_time, time_label,
             credit_cost, date, status, student_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'available', NULL, $9)
        RETURNING id, creator_id, instructor_name, start_time, end_time, time_label,
                  credit_cost, date, status, student_id, created_at
        "#,
    )
    .bind(id)
    .bind(creator_id)
    .bind(instructor_name)
    .bind(start_time)
    .bind(end_time)
    .bind(time_label)
    .bind(credit_cost)
    .bind(date)
    .bind(now)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn update_slot_fields(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    instructor_name: &str,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    time_label: &str,
    credit_cost: i64,
    date: NaiveDate,
) -> Result<DbClassSlot, sqlx::Error> {
    sqlx::query_as::<_, DbClassSlot>(
        r#"
        UPDATE class_slots
        SET instructor_name = $2, start_time = $3, end_time = $4, time_label = $5,
            credit_cost = $6, date = $7
        WHERE id = $1
        RETURNING id, creator_id, instructor_name, start_time, end_time, time_label,
                  credit_cost, date, status, student_id, created_at
        "#,
    )
    .bind(id)
    .bind(instructor_name)
    .bind(start_time)
    .bind(end_time)
    .bind(time_label)
    .bind(credit_cost)
    .bind(date)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn mark_booked(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    student_id: Uuid,
) -> Result<DbClassSlot, sqlx::Error> {
    sqlx::query_as::<_, DbClassSlot>(
        r#"
        UPDATE class_slots
        SET status = 'booked', student_id = $2
        WHERE id = $1
        RETURNING id, creator_id, instructor_name, start_time, end_time, time_label,
                  credit_cost, date, status, student_id, created_at
        "#,
    )
    .bind(id)
    .bind(student_id)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn mark_finished(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<DbClassSlot, sqlx::Error> {
    sqlx::query_as::<_, DbClassSlot>(
        r#"
        UPDATE class_slots
        SET status = 'finished'
        WHERE id = $1
        RETURNING id, creator_id, instructor_name, start_time, end_time, time_label,
                  credit_cost, date, status, student_id, created_at
        "#,
    )
    .bind(id)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn clear_booking(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<DbClassSlot, sqlx::Error> {
    sqlx::query_as::<_, DbClassSlot>(
        r#"
        UPDATE class_slots
        SET status = 'available', student_id = NULL
        WHERE id = $1
        RETURNING id, creator_id, instructor_name, start_time, end_time, time_label,
                  credit_cost, date, status, student_id, created_at
        "#,
    )
    .bind(id)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn delete_slot_row(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM class_slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
