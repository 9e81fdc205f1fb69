use std::sync::{Arc, Mutex};

use axum::Json;
use mockall::predicate;
use pretty_assertions::assert_eq;
use classbook_core::{
    errors::BookingError,
    models::{
        ledger::{TopUpResponse, TxCategory},
        slot::{
            BookClassResponse, CancelBookingResponse, ClassSlot, FinishClassResponse, SlotStatus,
        },
    },
};
use uuid::Uuid;

use crate::test_utils::{sample_slot, sample_transaction, TestContext};
use classbook_api::middleware::error_handling::AppError;

// Test wrappers that exercise the booking decision logic against mock
// repositories: the same checks the coordinator performs inside its
// transaction, in the same order.

async fn test_book_class_wrapper(
    ctx: &mut TestContext,
    slot_id: Uuid,
    student_id: Uuid,
) -> Result<Json<BookClassResponse>, AppError> {
    let slot = match ctx.catalog_repo.get_class_slot(slot_id).await? {
        Some(slot) => slot,
        None => {
            return Err(AppError(BookingError::NotFound(format!(
                "class slot {} not found",
                slot_id
            ))))
        }
    };

    if slot.status != SlotStatus::Available.as_str() {
        return Err(AppError(BookingError::AlreadyBooked(format!(
            "class slot {} is not available",
            slot_id
        ))));
    }

    let balance = ctx.ledger_repo.get_balance(student_id).await?;
    if balance < slot.credit_cost {
        return Err(AppError(BookingError::InsufficientCredits {
            required: slot.credit_cost,
            available: balance,
        }));
    }

    ctx.ledger_repo
        .append_transaction(student_id, -slot.credit_cost, "booking", Some(slot_id))
        .await?;
    let updated = ctx.catalog_repo.mark_booked(slot_id, student_id).await?;

    Ok(Json(BookClassResponse {
        slot: ClassSlot::from(updated).into(),
        balance: balance - slot.credit_cost,
    }))
}

async fn test_finish_class_wrapper(
    ctx: &mut TestContext,
    slot_id: Uuid,
    requester: Uuid,
) -> Result<Json<FinishClassResponse>, AppError> {
    let slot = match ctx.catalog_repo.get_class_slot(slot_id).await? {
        Some(slot) => slot,
        None => {
            return Err(AppError(BookingError::NotFound(format!(
                "class slot {} not found",
                slot_id
            ))))
        }
    };

    if slot.creator_id != requester {
        return Err(AppError(BookingError::Forbidden(format!(
            "only the creator may finish class slot {}",
            slot_id
        ))));
    }
    if slot.status != SlotStatus::Booked.as_str() {
        return Err(AppError(BookingError::InvalidState(format!(
            "class slot {} is not booked",
            slot_id
        ))));
    }

    // Settle with the amount actually charged at booking time
    let debit = ctx.ledger_repo.booking_debit_for_slot(slot_id).await?;
    let payout = debit.map(|d| -d.amount).unwrap_or(slot.credit_cost);

    let balance = ctx.ledger_repo.get_balance(requester).await? + payout;
    ctx.ledger_repo
        .append_transaction(requester, payout, "completion", Some(slot_id))
        .await?;
    let updated = ctx.catalog_repo.mark_finished(slot_id).await?;

    Ok(Json(FinishClassResponse {
        slot: ClassSlot::from(updated).into(),
        payout,
        balance,
    }))
}

async fn test_cancel_booking_wrapper(
    ctx: &mut TestContext,
    slot_id: Uuid,
    requester: Uuid,
) -> Result<Json<CancelBookingResponse>, AppError> {
    let slot = match ctx.catalog_repo.get_class_slot(slot_id).await? {
        Some(slot) => slot,
        None => {
            return Err(AppError(BookingError::NotFound(format!(
                "class slot {} not found",
                slot_id
            ))))
        }
    };

    if slot.status != SlotStatus::Booked.as_str() {
        return Err(AppError(BookingError::InvalidState(format!(
            "class slot {} has no booking to cancel",
            slot_id
        ))));
    }
    let is_creator = slot.creator_id == requester;
    let is_student = slot.student_id == Some(requester);
    if !is_creator && !is_student {
        return Err(AppError(BookingError::Forbidden(format!(
            "only the creator or the booked student may cancel class slot {}",
            slot_id
        ))));
    }

    let student_id = slot.student_id.expect("booked slot has a student");
    let debit = ctx.ledger_repo.booking_debit_for_slot(slot_id).await?;
    let refund = debit.map(|d| -d.amount).unwrap_or(slot.credit_cost);

    ctx.ledger_repo
        .append_transaction(student_id, refund, "refund", Some(slot_id))
        .await?;
    let updated = ctx.catalog_repo.clear_booking(slot_id).await?;

    Ok(Json(CancelBookingResponse {
        slot: ClassSlot::from(updated).into(),
        refund,
    }))
}

async fn test_top_up_wrapper(
    ctx: &mut TestContext,
    user_id: Uuid,
    amount: i64,
) -> Result<Json<TopUpResponse>, AppError> {
    if amount <= 0 {
        return Err(AppError(BookingError::InvalidAmount(format!(
            "top-up amount must be positive, got {}",
            amount
        ))));
    }

    let balance = ctx.ledger_repo.get_balance(user_id).await? + amount;
    let transaction = ctx
        .ledger_repo
        .append_transaction(user_id, amount, "topup", None)
        .await?;

    Ok(Json(TopUpResponse {
        user_id,
        amount: transaction.amount,
        balance,
        transaction_id: transaction.id,
    }))
}

#[tokio::test]
async fn test_book_class_insufficient_credits_leaves_slot_available() {
    let mut ctx = TestContext::new();
    let coach = Uuid::new_v4();
    let student = Uuid::new_v4();
    let slot = sample_slot(coach, 30, SlotStatus::Available, None);
    let slot_id = slot.id;

    ctx.catalog_repo
        .expect_get_class_slot()
        .with(predicate::eq(slot_id))
        .returning(move |_| Ok(Some(slot.clone())));
    ctx.ledger_repo
        .expect_get_balance()
        .with(predicate::eq(student))
        .returning(|_| Ok(0));
    // No append_transaction / mark_booked expectations: the operation must
    // stop before any write.

    let result = test_book_class_wrapper(&mut ctx, slot_id, student).await;

    match result {
        Err(AppError(BookingError::InsufficientCredits {
            required,
            available,
        })) => {
            assert_eq!(required, 30);
            assert_eq!(available, 0);
        }
        other => panic!("expected InsufficientCredits, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_book_class_debits_student_and_books_slot() {
    let mut ctx = TestContext::new();
    let coach = Uuid::new_v4();
    let student = Uuid::new_v4();
    let slot = sample_slot(coach, 30, SlotStatus::Available, None);
    let slot_id = slot.id;
    let booked = {
        let mut s = slot.clone();
        s.status = SlotStatus::Booked.as_str().to_string();
        s.student_id = Some(student);
        s
    };

    ctx.catalog_repo
        .expect_get_class_slot()
        .with(predicate::eq(slot_id))
        .returning(move |_| Ok(Some(slot.clone())));
    ctx.ledger_repo
        .expect_get_balance()
        .with(predicate::eq(student))
        .returning(|_| Ok(30));
    ctx.ledger_repo
        .expect_append_transaction()
        .withf(move |user, amount, category, related| {
            *user == student && *amount == -30 && category == "booking" && *related == Some(slot_id)
        })
        .times(1)
        .returning(|user, amount, category, related| {
            Ok(sample_transaction(user, amount, category, related))
        });
    ctx.catalog_repo
        .expect_mark_booked()
        .with(predicate::eq(slot_id), predicate::eq(student))
        .times(1)
        .returning(move |_, _| Ok(booked.clone()));

    let response = test_book_class_wrapper(&mut ctx, slot_id, student)
        .await
        .expect("booking should succeed")
        .0;

    assert_eq!(response.balance, 0);
    assert_eq!(response.slot.status, SlotStatus::Booked);
    assert_eq!(response.slot.student_id, Some(student));
}

#[tokio::test]
async fn test_book_class_not_found() {
    let mut ctx = TestContext::new();
    let slot_id = Uuid::new_v4();

    ctx.catalog_repo
        .expect_get_class_slot()
        .with(predicate::eq(slot_id))
        .returning(|_| Ok(None));

    let result = test_book_class_wrapper(&mut ctx, slot_id, Uuid::new_v4()).await;

    assert!(matches!(
        result,
        Err(AppError(BookingError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_book_class_already_booked_after_lost_race() {
    let mut ctx = TestContext::new();
    let coach = Uuid::new_v4();
    let winner = Uuid::new_v4();
    let loser = Uuid::new_v4();
    let slot = sample_slot(coach, 10, SlotStatus::Booked, Some(winner));
    let slot_id = slot.id;

    // The loser re-reads the slot after the winner's commit: the balance
    // is never consulted and no debit is posted.
    ctx.catalog_repo
        .expect_get_class_slot()
        .with(predicate::eq(slot_id))
        .returning(move |_| Ok(Some(slot.clone())));

    let result = test_book_class_wrapper(&mut ctx, slot_id, loser).await;

    assert!(matches!(
        result,
        Err(AppError(BookingError::AlreadyBooked(_)))
    ));
}

#[tokio::test]
async fn test_finish_class_pays_amount_charged_at_booking_time() {
    let mut ctx = TestContext::new();
    let coach = Uuid::new_v4();
    let student = Uuid::new_v4();
    // Cost was edited to 50 after the booking; the debit on record is -30.
    let slot = sample_slot(coach, 50, SlotStatus::Booked, Some(student));
    let slot_id = slot.id;
    let finished = {
        let mut s = slot.clone();
        s.status = SlotStatus::Finished.as_str().to_string();
        s
    };

    ctx.catalog_repo
        .expect_get_class_slot()
        .with(predicate::eq(slot_id))
        .returning(move |_| Ok(Some(slot.clone())));
    ctx.ledger_repo
        .expect_booking_debit_for_slot()
        .with(predicate::eq(slot_id))
        .returning(move |id| Ok(Some(sample_transaction(student, -30, "booking", Some(id)))));
    ctx.ledger_repo
        .expect_get_balance()
        .with(predicate::eq(coach))
        .returning(|_| Ok(0));
    ctx.ledger_repo
        .expect_append_transaction()
        .withf(move |user, amount, category, related| {
            *user == coach && *amount == 30 && category == "completion" && *related == Some(slot_id)
        })
        .times(1)
        .returning(|user, amount, category, related| {
            Ok(sample_transaction(user, amount, category, related))
        });
    ctx.catalog_repo
        .expect_mark_finished()
        .with(predicate::eq(slot_id))
        .times(1)
        .returning(move |_| Ok(finished.clone()));

    let response = test_finish_class_wrapper(&mut ctx, slot_id, coach)
        .await
        .expect("finish should succeed")
        .0;

    assert_eq!(response.payout, 30);
    assert_eq!(response.balance, 30);
    assert_eq!(response.slot.status, SlotStatus::Finished);
}

#[tokio::test]
async fn test_finish_class_twice_is_invalid_state() {
    let mut ctx = TestContext::new();
    let coach = Uuid::new_v4();
    let student = Uuid::new_v4();
    let slot = sample_slot(coach, 30, SlotStatus::Finished, Some(student));
    let slot_id = slot.id;

    ctx.catalog_repo
        .expect_get_class_slot()
        .with(predicate::eq(slot_id))
        .returning(move |_| Ok(Some(slot.clone())));
    // No payout expectations: a finished slot is never paid again.

    let result = test_finish_class_wrapper(&mut ctx, slot_id, coach).await;

    assert!(matches!(
        result,
        Err(AppError(BookingError::InvalidState(_)))
    ));
}

#[tokio::test]
async fn test_finish_class_forbidden_for_non_creator() {
    let mut ctx = TestContext::new();
    let coach = Uuid::new_v4();
    let student = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let slot = sample_slot(coach, 30, SlotStatus::Booked, Some(student));
    let slot_id = slot.id;

    ctx.catalog_repo
        .expect_get_class_slot()
        .with(predicate::eq(slot_id))
        .returning(move |_| Ok(Some(slot.clone())));

    let result = test_finish_class_wrapper(&mut ctx, slot_id, stranger).await;

    assert!(matches!(
        result,
        Err(AppError(BookingError::Forbidden(_)))
    ));
}

#[tokio::test]
async fn test_finish_available_slot_is_invalid_state() {
    let mut ctx = TestContext::new();
    let coach = Uuid::new_v4();
    let slot = sample_slot(coach, 30, SlotStatus::Available, None);
    let slot_id = slot.id;

    ctx.catalog_repo
        .expect_get_class_slot()
        .with(predicate::eq(slot_id))
        .returning(move |_| Ok(Some(slot.clone())));

    let result = test_finish_class_wrapper(&mut ctx, slot_id, coach).await;

    assert!(matches!(
        result,
        Err(AppError(BookingError::InvalidState(_)))
    ));
}

#[tokio::test]
async fn test_cancel_booking_refunds_student_in_full() {
    let mut ctx = TestContext::new();
    let coach = Uuid::new_v4();
    let student = Uuid::new_v4();
    let slot = sample_slot(coach, 30, SlotStatus::Booked, Some(student));
    let slot_id = slot.id;
    let reverted = {
        let mut s = slot.clone();
        s.status = SlotStatus::Available.as_str().to_string();
        s.student_id = None;
        s
    };

    ctx.catalog_repo
        .expect_get_class_slot()
        .with(predicate::eq(slot_id))
        .returning(move |_| Ok(Some(slot.clone())));
    ctx.ledger_repo
        .expect_booking_debit_for_slot()
        .with(predicate::eq(slot_id))
        .returning(move |id| Ok(Some(sample_transaction(student, -30, "booking", Some(id)))));
    ctx.ledger_repo
        .expect_append_transaction()
        .withf(move |user, amount, category, related| {
            *user == student && *amount == 30 && category == "refund" && *related == Some(slot_id)
        })
        .times(1)
        .returning(|user, amount, category, related| {
            Ok(sample_transaction(user, amount, category, related))
        });
    ctx.catalog_repo
        .expect_clear_booking()
        .with(predicate::eq(slot_id))
        .times(1)
        .returning(move |_| Ok(reverted.clone()));

    let response = test_cancel_booking_wrapper(&mut ctx, slot_id, student)
        .await
        .expect("cancel should succeed")
        .0;

    assert_eq!(response.refund, 30);
    assert_eq!(response.slot.status, SlotStatus::Available);
    assert_eq!(response.slot.student_id, None);
}

#[tokio::test]
async fn test_cancel_booking_forbidden_for_stranger() {
    let mut ctx = TestContext::new();
    let coach = Uuid::new_v4();
    let student = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let slot = sample_slot(coach, 30, SlotStatus::Booked, Some(student));
    let slot_id = slot.id;

    ctx.catalog_repo
        .expect_get_class_slot()
        .with(predicate::eq(slot_id))
        .returning(move |_| Ok(Some(slot.clone())));

    let result = test_cancel_booking_wrapper(&mut ctx, slot_id, stranger).await;

    assert!(matches!(
        result,
        Err(AppError(BookingError::Forbidden(_)))
    ));
}

#[tokio::test]
async fn test_top_up_rejects_non_positive_amounts() {
    for amount in [0, -5] {
        let mut ctx = TestContext::new();
        // No ledger expectations: validation happens before any write.
        let result = test_top_up_wrapper(&mut ctx, Uuid::new_v4(), amount).await;

        assert!(matches!(
            result,
            Err(AppError(BookingError::InvalidAmount(_)))
        ));
    }
}

#[tokio::test]
async fn test_top_up_appends_and_reports_new_balance() {
    let mut ctx = TestContext::new();
    let student = Uuid::new_v4();

    ctx.ledger_repo
        .expect_get_balance()
        .with(predicate::eq(student))
        .returning(|_| Ok(20));
    ctx.ledger_repo
        .expect_append_transaction()
        .withf(move |user, amount, category, related| {
            *user == student && *amount == 30 && category == "topup" && related.is_none()
        })
        .times(1)
        .returning(|user, amount, category, related| {
            Ok(sample_transaction(user, amount, category, related))
        });

    let response = test_top_up_wrapper(&mut ctx, student, 30)
        .await
        .expect("top-up should succeed")
        .0;

    assert_eq!(response.amount, 30);
    assert_eq!(response.balance, 50);
}

#[tokio::test]
async fn test_top_up_then_book_is_a_round_trip() {
    let mut ctx = TestContext::new();
    let coach = Uuid::new_v4();
    let student = Uuid::new_v4();
    let slot = sample_slot(coach, 50, SlotStatus::Available, None);
    let slot_id = slot.id;
    let booked = {
        let mut s = slot.clone();
        s.status = SlotStatus::Booked.as_str().to_string();
        s.student_id = Some(student);
        s
    };

    // Record every appended ledger entry to check the net effect
    let appended: Arc<Mutex<Vec<(i64, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let appended_in = appended.clone();

    ctx.ledger_repo
        .expect_get_balance()
        .with(predicate::eq(student))
        .returning({
            let appended = appended.clone();
            move |_| {
                let total: i64 = appended.lock().unwrap().iter().map(|(a, _)| a).sum();
                Ok(total)
            }
        });
    ctx.ledger_repo
        .expect_append_transaction()
        .times(2)
        .returning(move |user, amount, category, related| {
            appended_in
                .lock()
                .unwrap()
                .push((amount, category.to_string()));
            Ok(sample_transaction(user, amount, category, related))
        });
    ctx.catalog_repo
        .expect_get_class_slot()
        .with(predicate::eq(slot_id))
        .returning(move |_| Ok(Some(slot.clone())));
    ctx.catalog_repo
        .expect_mark_booked()
        .returning(move |_, _| Ok(booked.clone()));

    let top_up = test_top_up_wrapper(&mut ctx, student, 50)
        .await
        .expect("top-up should succeed")
        .0;
    assert_eq!(top_up.balance, 50);

    let booking = test_book_class_wrapper(&mut ctx, slot_id, student)
        .await
        .expect("booking should succeed")
        .0;
    assert_eq!(booking.balance, 0);

    // Exactly two entries, +50 and -50, netting to the pre-top-up balance
    let entries = appended.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], (50, TxCategory::Topup.as_str().to_string()));
    assert_eq!(entries[1], (-50, TxCategory::Booking.as_str().to_string()));
    assert_eq!(entries.iter().map(|(a, _)| a).sum::<i64>(), 0);
}
