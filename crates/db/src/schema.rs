use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create class_slots table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS class_slots (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            creator_id UUID NOT NULL,
            instructor_name VARCHAR(255) NOT NULL,
            start_time TIMESTAMP WITH TIME ZONE NOT NULL,
            end_time TIMESTAMP WITH TIME ZONE NOT NULL,
            time_label VARCHAR(32) NOT NULL,
            credit_cost BIGINT NOT NULL,
            date DATE NOT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'available',
            student_id UUID NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_time_range CHECK (end_time > start_time),
            CONSTRAINT non_negative_cost CHECK (credit_cost >= 0),
            CONSTRAINT known_status CHECK (status IN ('available', 'booked', 'finished')),
            CONSTRAINT student_matches_status CHECK ((student_id IS NULL) = (status = 'available'))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create credit_accounts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS credit_accounts (
            user_id UUID PRIMARY KEY,
            balance BIGINT NOT NULL DEFAULT 0,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create credit_transactions table. No foreign key on related_slot_id:
    // refund entries must outlive the slot rows they reference.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS credit_transactions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            amount BIGINT NOT NULL,
            category VARCHAR(32) NOT NULL,
            related_slot_id UUID NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_class_slots_date ON class_slots(date);
        CREATE INDEX IF NOT EXISTS idx_class_slots_creator_id ON class_slots(creator_id);
        CREATE INDEX IF NOT EXISTS idx_class_slots_start_time ON class_slots(start_time);
        CREATE INDEX IF NOT EXISTS idx_credit_transactions_user_id ON credit_transactions(user_id);
        CREATE INDEX IF NOT EXISTS idx_credit_transactions_created_at ON credit_transactions(created_at);
        CREATE INDEX IF NOT EXISTS idx_credit_transactions_related_slot_id ON credit_transactions(related_slot_id);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
