/// Booking, settlement, and top-up endpoints
pub mod booking;
/// Class catalog endpoints
pub mod catalog;
/// Liveness endpoints
pub mod health;
/// Credit balance, history, and summary endpoints
pub mod reports;
