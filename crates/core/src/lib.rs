//! # Classbook Core
//!
//! Domain types shared by every Classbook crate: class slots and their
//! lifecycle, credit ledger entries, the request/response types exchanged
//! with the API layer, and the error taxonomy returned by the booking
//! engine.
//!
//! This crate is deliberately free of any persistence or transport
//! concerns so that the booking rules can be exercised without a database.

/// Error taxonomy for booking and ledger operations
pub mod errors;
/// Domain models and API request/response types
pub mod models;
