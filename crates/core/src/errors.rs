use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid cost: {0}")]
    InvalidCost(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient credits: required {required}, available {available}")]
    InsufficientCredits { required: i64, available: i64 },

    #[error("Already booked: {0}")]
    AlreadyBooked(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),
}

impl BookingError {
    /// Transient failures are retried by the coordinator; everything else
    /// is a business outcome surfaced to the caller as-is.
    pub fn is_transient(&self) -> bool {
        matches!(self, BookingError::Conflict(_) | BookingError::Unavailable(_))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
