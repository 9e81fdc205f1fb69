use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a credit ledger entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TxCategory {
    /// Student purchased credits
    Topup,
    /// Debit charged when a class is booked
    Booking,
    /// Payout to the coach when a class finishes
    Completion,
    /// Compensating credit when a booking is cancelled
    Refund,
}

impl TxCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxCategory::Topup => "topup",
            TxCategory::Booking => "booking",
            TxCategory::Completion => "completion",
            TxCategory::Refund => "refund",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "topup" => Some(TxCategory::Topup),
            "booking" => Some(TxCategory::Booking),
            "completion" => Some(TxCategory::Completion),
            "refund" => Some(TxCategory::Refund),
            _ => None,
        }
    }
}

/// A single append-only ledger entry.
///
/// The ledger is the source of truth for balances: for every user the sum
/// of entry amounts equals the cached account balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Signed amount: positive credits the account, negative debits it
    pub amount: i64,
    pub category: String,
    pub related_slot_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpRequest {
    pub user_id: Uuid,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpResponse {
    pub user_id: Uuid,
    pub amount: i64,
    /// Balance after the top-up
    pub balance: i64,
    pub transaction_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub user_id: Uuid,
    /// Newest-first
    pub transactions: Vec<CreditTransaction>,
}
