//! Error handling for the stockroom core
//!
//! Validation errors are raised before any record is mutated, so a failed
//! operation never leaves partial writes behind.

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Business logic errors
    #[error("Insufficient stock for material {0}")]
    InsufficientStock(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Order has no positive-quantity lines")]
    EmptyOrder,

    // Import errors
    #[error("Missing column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    // Record errors
    #[error("{0} not found")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    // Internal errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for callers that surface errors over a
    /// transport of their choosing.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            AppError::InvalidQuantity(_) => "INVALID_QUANTITY",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::EmptyOrder => "EMPTY_ORDER",
            AppError::MissingColumns(_) => "MISSING_COLUMNS",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DuplicateEntry(_) => "DUPLICATE_ENTRY",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias for service operations
pub type AppResult<T> = Result<T, AppError>;
