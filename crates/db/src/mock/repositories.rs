use chrono::{DateTime, NaiveDate, Utc};
use mockall::mock;
use uuid::Uuid;

use crate::models::{DbClassSlot, DbCreditTransaction};

// Mock repositories for testing
mock! {
    pub CatalogRepo {
        pub async fn create_class_slot(
            &self,
            creator_id: Uuid,
            instructor_name: &'static str,
            start_time: DateTime<Utc>,
            end_time: DateTime<Utc>,
            credit_cost: i64,
        ) -> eyre::Result<DbClassSlot>;

        pub async fn get_class_slot(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbClassSlot>>;

        pub async fn update_class_slot(
            &self,
            id: Uuid,
            instructor_name: Option<&'static str>,
            start_time: Option<DateTime<Utc>>,
            end_time: Option<DateTime<Utc>>,
            credit_cost: Option<i64>,
        ) -> eyre::Result<DbClassSlot>;

        pub async fn delete_class_slot(
            &self,
            id: Uuid,
        ) -> eyre::Result<()>;

        pub async fn mark_booked(
            &self,
            id: Uuid,
            student_id: Uuid,
        ) -> eyre::Result<DbClassSlot>;

        pub async fn mark_finished(
            &self,
            id: Uuid,
        ) -> eyre::Result<DbClassSlot>;

        pub async fn clear_booking(
            &self,
            id: Uuid,
        ) -> eyre::Result<DbClassSlot>;

        pub async fn list_by_date(
            &self,
            date: NaiveDate,
        ) -> eyre::Result<Vec<DbClassSlot>>;

        pub async fn list_by_coach(
            &self,
            coach_id: Uuid,
        ) -> eyre::Result<Vec<DbClassSlot>>;
    }
}

mock! {
    pub LedgerRepo {
        pub async fn get_balance(
            &self,
            user_id: Uuid,
        ) -> eyre::Result<i64>;

        pub async fn history(
            &self,
            user_id: Uuid,
            from: Option<DateTime<Utc>>,
            to: Option<DateTime<Utc>>,
        ) -> eyre::Result<Vec<DbCreditTransaction>>;

        pub async fn append_transaction(
            &self,
            user_id: Uuid,
            amount: i64,
            category: &'static str,
            related_slot_id: Option<Uuid>,
        ) -> eyre::Result<DbCreditTransaction>;

        pub async fn booking_debit_for_slot(
            &self,
            slot_id: Uuid,
        ) -> eyre::Result<Option<DbCreditTransaction>>;
    }
}
