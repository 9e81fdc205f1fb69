//! Read-side credit summaries.
//!
//! Pure functions that bucket ledger entries by calendar month or year and
//! sum the signed amounts. The API layer fetches a user's history once and
//! derives both groupings from the same read; nothing here touches storage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ledger::CreditTransaction;

/// Aggregated credit movement for one time bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreditBucket {
    /// Bucket label: `"2026-08"` for months, `"2026"` for years
    pub bucket: String,
    /// Sum of positive amounts
    pub credited: i64,
    /// Sum of negative amounts (non-positive)
    pub debited: i64,
    /// credited + debited
    pub net: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditSummaryResponse {
    pub user_id: Uuid,
    pub balance: i64,
    pub monthly: Vec<CreditBucket>,
    pub yearly: Vec<CreditBucket>,
}

/// Groups entries by calendar month, oldest bucket first.
pub fn summarize_monthly(transactions: &[CreditTransaction]) -> Vec<CreditBucket> {
    summarize(transactions, "%Y-%m")
}

/// Groups entries by calendar year, oldest bucket first.
pub fn summarize_yearly(transactions: &[CreditTransaction]) -> Vec<CreditBucket> {
    summarize(transactions, "%Y")
}

fn summarize(transactions: &[CreditTransaction], bucket_format: &str) -> Vec<CreditBucket> {
    let mut buckets: BTreeMap<String, (i64, i64)> = BTreeMap::new();

    for tx in transactions {
        let label = tx.created_at.format(bucket_format).to_string();
        let entry = buckets.entry(label).or_default();
        if tx.amount >= 0 {
            entry.0 += tx.amount;
        } else {
            entry.1 += tx.amount;
        }
    }

    buckets
        .into_iter()
        .map(|(bucket, (credited, debited))| CreditBucket {
            bucket,
            credited,
            debited,
            net: credited + debited,
        })
        .collect()
}
