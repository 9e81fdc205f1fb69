/// Booking, settlement, and top-up handlers
pub mod booking;
/// Class slot CRUD and listing handlers
pub mod catalog;
/// Read-side balance, history, and summary handlers
pub mod reports;

use classbook_core::models::slot::{ClassSlot, ClassSlotResponse};
use classbook_db::models::DbClassSlot;

pub(crate) fn slot_response(row: DbClassSlot) -> ClassSlotResponse {
    ClassSlot::from(row).into()
}
