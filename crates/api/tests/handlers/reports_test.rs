use axum::Json;
use chrono::{DateTime, Duration, TimeZone, Utc};
use mockall::predicate;
use pretty_assertions::assert_eq;
use classbook_core::models::{
    ledger::{BalanceResponse, CreditTransaction, HistoryResponse},
    report::{summarize_monthly, summarize_yearly, CreditSummaryResponse},
};
use uuid::Uuid;

use crate::test_utils::{sample_transaction, TestContext};
use classbook_api::middleware::error_handling::AppError;

async fn test_balance_wrapper(
    ctx: &mut TestContext,
    user_id: Uuid,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = ctx.ledger_repo.get_balance(user_id).await?;
    Ok(Json(BalanceResponse { user_id, balance }))
}

async fn test_history_wrapper(
    ctx: &mut TestContext,
    user_id: Uuid,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<Json<HistoryResponse>, AppError> {
    let transactions = ctx
        .ledger_repo
        .history(user_id, from, to)
        .await?
        .into_iter()
        .map(CreditTransaction::from)
        .collect();

    Ok(Json(HistoryResponse {
        user_id,
        transactions,
    }))
}

async fn test_summary_wrapper(
    ctx: &mut TestContext,
    user_id: Uuid,
) -> Result<Json<CreditSummaryResponse>, AppError> {
    let balance = ctx.ledger_repo.get_balance(user_id).await?;
    let transactions: Vec<CreditTransaction> = ctx
        .ledger_repo
        .history(user_id, None, None)
        .await?
        .into_iter()
        .map(CreditTransaction::from)
        .collect();

    Ok(Json(CreditSummaryResponse {
        user_id,
        balance,
        monthly: summarize_monthly(&transactions),
        yearly: summarize_yearly(&transactions),
    }))
}

#[tokio::test]
async fn test_balance_defaults_to_zero_for_untouched_account() {
    let mut ctx = TestContext::new();
    let user = Uuid::new_v4();

    ctx.ledger_repo
        .expect_get_balance()
        .with(predicate::eq(user))
        .returning(|_| Ok(0));

    let response = test_balance_wrapper(&mut ctx, user)
        .await
        .expect("balance read should succeed")
        .0;

    assert_eq!(response.balance, 0);
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let mut ctx = TestContext::new();
    let user = Uuid::new_v4();

    let mut newer = sample_transaction(user, 50, "topup", None);
    let mut older = sample_transaction(user, -30, "booking", Some(Uuid::new_v4()));
    newer.created_at = Utc::now();
    older.created_at = Utc::now() - Duration::hours(3);

    let newest_first = vec![newer.clone(), older.clone()];
    ctx.ledger_repo
        .expect_history()
        .returning(move |_, _, _| Ok(newest_first.clone()));

    let response = test_history_wrapper(&mut ctx, user, None, None)
        .await
        .expect("history read should succeed")
        .0;

    assert_eq!(response.transactions.len(), 2);
    assert!(response.transactions[0].created_at > response.transactions[1].created_at);
    assert_eq!(response.transactions[0].id, newer.id);
}

#[tokio::test]
async fn test_history_forwards_date_range() {
    let mut ctx = TestContext::new();
    let user = Uuid::new_v4();
    let from = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 8, 31, 23, 59, 59).unwrap();

    ctx.ledger_repo
        .expect_history()
        .with(
            predicate::eq(user),
            predicate::eq(Some(from)),
            predicate::eq(Some(to)),
        )
        .times(1)
        .returning(|_, _, _| Ok(vec![]));

    let response = test_history_wrapper(&mut ctx, user, Some(from), Some(to))
        .await
        .expect("history read should succeed")
        .0;

    assert!(response.transactions.is_empty());
}

#[tokio::test]
async fn test_summary_buckets_history_and_reports_balance() {
    let mut ctx = TestContext::new();
    let user = Uuid::new_v4();

    let mk = |y: i32, m: u32, amount: i64, category: &str| {
        let mut tx = sample_transaction(user, amount, category, None);
        tx.created_at = Utc.with_ymd_and_hms(y, m, 10, 12, 0, 0).unwrap();
        tx
    };
    let transactions = vec![
        mk(2026, 7, 50, "topup"),
        mk(2026, 7, -30, "booking"),
        mk(2026, 8, 30, "completion"),
    ];
    let balance: i64 = transactions.iter().map(|t| t.amount).sum();

    ctx.ledger_repo
        .expect_get_balance()
        .with(predicate::eq(user))
        .returning(move |_| Ok(balance));
    let history = transactions.clone();
    ctx.ledger_repo
        .expect_history()
        .returning(move |_, _, _| Ok(history.clone()));

    let response = test_summary_wrapper(&mut ctx, user)
        .await
        .expect("summary should succeed")
        .0;

    assert_eq!(response.balance, 50);
    assert_eq!(response.monthly.len(), 2);
    assert_eq!(response.monthly[0].bucket, "2026-07");
    assert_eq!(response.monthly[0].credited, 50);
    assert_eq!(response.monthly[0].debited, -30);
    assert_eq!(response.yearly.len(), 1);
    assert_eq!(response.yearly[0].bucket, "2026");
    assert_eq!(response.yearly[0].net, 50);

    // Bucket nets reconcile with the cached balance
    let monthly_net: i64 = response.monthly.iter().map(|b| b.net).sum();
    assert_eq!(monthly_net, response.balance);
}

#[tokio::test]
async fn test_summary_of_empty_history() {
    let mut ctx = TestContext::new();
    let user = Uuid::new_v4();

    ctx.ledger_repo
        .expect_get_balance()
        .with(predicate::eq(user))
        .returning(|_| Ok(0));
    ctx.ledger_repo
        .expect_history()
        .returning(|_, _, _| Ok(vec![]));

    let response = test_summary_wrapper(&mut ctx, user)
        .await
        .expect("summary should succeed")
        .0;

    assert_eq!(response.balance, 0);
    assert!(response.monthly.is_empty());
    assert!(response.yearly.is_empty());
}
