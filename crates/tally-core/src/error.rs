//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! `ValidationError` is bad input, `CoreError` a snapshot lookup or
//! consistency failure. Both surface in tally-report as `anyhow::Error`.
//!
//! ## What Is NOT an Error
//! Empty-but-well-typed input never fails:
//! - a staff member with no commission rule earns 0
//! - a sale with a zero subtotal has a margin of 0
//! - a profit below every tier threshold earns 0
//! - an item with no current sell price falls back to the default markup

use thiserror::Error;

use crate::config::ConfigError;

// =============================================================================
// Core Error
// =============================================================================

/// Engine errors.
///
/// Raised when a snapshot is internally inconsistent (a reference points at
/// nothing) or when an input fails validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Staff member cannot be found in the snapshot.
    #[error("Staff member not found: {0}")]
    StaffNotFound(String),

    /// A staff member references a commission rule that does not exist.
    ///
    /// ## When This Occurs
    /// - The rule was deleted while still assigned
    /// - The snapshot was assembled from inconsistent sources
    ///
    /// A staff member with NO rule is fine (commission 0); a dangling
    /// reference is not.
    #[error("Commission rule {rule_id} assigned to staff {staff_id} not found")]
    CommissionRuleNotFound { staff_id: String, rule_id: String },

    /// A catalog item, recipe or package cannot be found.
    #[error("{kind} not found: {id}")]
    SourceNotFound { kind: String, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The engine was given an invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised synchronously, never silently corrected. The caller decides
/// whether to reject the whole transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, fractional cents).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Arithmetic on the value leaves the representable range.
    #[error("{field} is too large")]
    Overflow { field: String },

    /// The same id appears twice in one collection.
    #[error("duplicate {field} '{value}'")]
    Duplicate { field: String, value: String },

    /// A stored figure disagrees with the figures it is derived from.
    #[error("{field} is inconsistent: {reason}")]
    Inconsistent { field: String, reason: String },

    /// Value is not in allowed set (e.g., unknown commission rule type).
    #[error("{field} must be one of: {allowed:?}, got '{value}'")]
    NotAllowed {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::MustBePositive`].
    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::MustNotBeNegative`].
    pub fn must_not_be_negative(field: impl Into<String>) -> Self {
        ValidationError::MustNotBeNegative {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::Overflow`].
    pub fn overflow(field: impl Into<String>) -> Self {
        ValidationError::Overflow {
            field: field.into(),
        }
    }

    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Overflow { field }
            | ValidationError::Duplicate { field, .. }
            | ValidationError::Inconsistent { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
