use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};

/// Lifecycle state of a class slot.
///
/// `Finished` is terminal: once credits have been settled no further
/// transition is permitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Booked,
    Finished,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Booked => "booked",
            SlotStatus::Finished => "finished",
        }
    }

    /// Lenient parse for read-side display of legacy rows. Write paths
    /// compare against the exact stored string instead.
    pub fn from_str(s: &str) -> Self {
        match s {
            "booked" => SlotStatus::Booked,
            "finished" => SlotStatus::Finished,
            _ => SlotStatus::Available,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSlot {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub instructor_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub time_label: String,
    pub credit_cost: i64,
    pub date: NaiveDate,
    pub status: SlotStatus,
    pub student_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Validates a scheduling interval at the write boundary.
pub fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> BookingResult<()> {
    if end <= start {
        return Err(BookingError::InvalidInterval(format!(
            "end time {} must be after start time {}",
            end, start
        )));
    }
    Ok(())
}

/// Validates a credit cost at the write boundary.
pub fn validate_cost(credit_cost: i64) -> BookingResult<()> {
    if credit_cost < 0 {
        return Err(BookingError::InvalidCost(format!(
            "credit cost must be non-negative, got {}",
            credit_cost
        )));
    }
    Ok(())
}

/// Derives the human-readable label shown for a slot's interval.
///
/// The label is computed once at the write boundary and stored; it is
/// never parsed back.
pub fn time_label(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
}

/// Derives the calendar date a slot is listed under.
pub fn slot_date(start: DateTime<Utc>) -> NaiveDate {
    start.date_naive()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClassSlotRequest {
    pub creator_id: Uuid,
    pub instructor_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub credit_cost: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateClassSlotRequest {
    pub instructor_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub credit_cost: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSlotResponse {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub instructor_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub time_label: String,
    pub credit_cost: i64,
    pub date: NaiveDate,
    pub status: SlotStatus,
    pub student_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<ClassSlot> for ClassSlotResponse {
    fn from(slot: ClassSlot) -> Self {
        ClassSlotResponse {
            id: slot.id,
            creator_id: slot.creator_id,
            instructor_name: slot.instructor_name,
            start_time: slot.start_time,
            end_time: slot.end_time,
            time_label: slot.time_label,
            credit_cost: slot.credit_cost,
            date: slot.date,
            status: slot.status,
            student_id: slot.student_id,
            created_at: slot.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassListResponse {
    pub classes: Vec<ClassSlotResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookClassRequest {
    pub student_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookClassResponse {
    pub slot: ClassSlotResponse,
    /// Student balance after the booking debit
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishClassRequest {
    pub requester: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishClassResponse {
    pub slot: ClassSlotResponse,
    /// Credits paid out to the coach, frozen at booking time
    pub payout: i64,
    /// Coach balance after settlement
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub requester: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingResponse {
    pub slot: ClassSlotResponse,
    /// Credits returned to the student
    pub refund: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteClassResponse {
    pub id: Uuid,
    /// Credits returned to the student when a booked slot is deleted
    pub refunded: i64,
}
