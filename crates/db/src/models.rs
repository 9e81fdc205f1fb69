use chrono::{DateTime, NaiveDate, Utc};
use classbook_core::models::ledger::CreditTransaction;
use classbook_core::models::slot::{ClassSlot, SlotStatus};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbClassSlot {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub instructor_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub time_label: String,
    pub credit_cost: i64,
    pub date: NaiveDate,
    pub status: String,
    pub student_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCreditTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub category: String,
    pub related_slot_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCreditAccount {
    pub user_id: Uuid,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbClassSlot> for ClassSlot {
    fn from(row: DbClassSlot) -> Self {
        ClassSlot {
            id: row.id,
            creator_id: row.creator_id,
            instructor_name: row.instructor_name,
            start_time: row.start_time,
            end_time: row.end_time,
            time_label: row.time_label,
            credit_cost: row.credit_cost,
            date: row.date,
            // Lenient on the read side only; write paths compare the
            // stored string exactly.
            status: SlotStatus::from_str(&row.status),
            student_id: row.student_id,
            created_at: row.created_at,
        }
    }
}

impl From<DbCreditTransaction> for CreditTransaction {
    fn from(row: DbCreditTransaction) -> Self {
        CreditTransaction {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            category: row.category,
            related_slot_id: row.related_slot_id,
            created_at: row.created_at,
        }
    }
}
