use rust_decimal::Decimal;
use thiserror::Error;

use crate::cpq::catalog::RatePath;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid configuration for `{field}`: {message}")]
    Configuration { field: String, message: String },
    #[error("rate not found at `{path}`")]
    PricingNotFound { path: RatePath },
    #[error("invalid measurement `{field}`: {value} is out of range")]
    InvalidMeasurement { field: String, value: Decimal },
    #[error("insufficient space: remaining width {remaining}mm, requested {requested}mm")]
    InsufficientSpace { remaining: Decimal, requested: Decimal },
    #[error("invalid quantity for `{field}`: {value} (must be at least 1)")]
    InvalidQuantity { field: String, value: i64 },
    #[error("{entity} at index {index} was not found")]
    NotFound { entity: String, index: usize },
    #[error("stale revision: expected {expected}, section is at {actual}")]
    StaleRevision { expected: u64, actual: u64 },
}

impl EngineError {
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration { field: field.into(), message: message.into() }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::configuration(field, "required for the selected unit type")
    }

    pub fn not_found(entity: impl Into<String>, index: usize) -> Self {
        Self::NotFound { entity: entity.into(), index }
    }

    /// Stable machine-readable code for the transport layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::PricingNotFound { .. } => "PRICING_NOT_FOUND",
            Self::InvalidMeasurement { .. } => "INVALID_MEASUREMENT",
            Self::InsufficientSpace { .. } => "INSUFFICIENT_SPACE",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::StaleRevision { .. } => "STALE_REVISION",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration { .. } | Self::InvalidMeasurement { .. } => {
                "The configuration could not be priced. Check the selected options and try again."
            }
            Self::PricingNotFound { .. } => {
                "No rate is available for this configuration in the current price catalog."
            }
            Self::InsufficientSpace { .. } => "The section does not have enough free width.",
            Self::InvalidQuantity { .. } => "Quantities must be at least one.",
            Self::NotFound { .. } => "The requested item does not exist.",
            Self::StaleRevision { .. } => {
                "The section was changed by another request. Reload and try again."
            }
        }
    }
}
