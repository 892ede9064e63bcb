use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Square millimetres in one square foot.
pub const SQ_MM_PER_SQFT: Decimal = Decimal::from_parts(92_900, 0, 0, false, 0);

/// Millimetres in one running foot (304.8).
pub const MM_PER_RUNNING_FOOT: Decimal = Decimal::from_parts(3_048, 0, 0, false, 1);

/// Physical size of a unit in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub width: Decimal,
    pub height: Decimal,
    pub depth: Decimal,
}

impl Measurement {
    pub fn new(width: Decimal, height: Decimal, depth: Decimal) -> Result<Self, EngineError> {
        let measurement = Self { width, height, depth };
        measurement.validate()?;
        Ok(measurement)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        ensure_positive("width", self.width)?;
        ensure_positive("height", self.height)?;
        ensure_positive("depth", self.depth)
    }

    /// Face area in square feet at full precision.
    pub fn square_feet(&self) -> Result<Decimal, EngineError> {
        square_feet(self.width, self.height)
    }

    pub fn square_feet_display(&self) -> Result<Decimal, EngineError> {
        calculate_square_feet(self.width, self.height)
    }
}

pub fn ensure_positive(field: &str, value: Decimal) -> Result<(), EngineError> {
    if value <= Decimal::ZERO {
        return Err(EngineError::InvalidMeasurement { field: field.to_owned(), value });
    }
    Ok(())
}

pub fn square_feet(width: Decimal, height: Decimal) -> Result<Decimal, EngineError> {
    width
        .checked_mul(height)
        .and_then(|area| area.checked_div(SQ_MM_PER_SQFT))
        .ok_or_else(|| EngineError::InvalidMeasurement { field: "height".to_owned(), value: height })
}

/// Square feet rounded to two decimals, for display only.
pub fn calculate_square_feet(width: Decimal, height: Decimal) -> Result<Decimal, EngineError> {
    square_feet(width, height).map(|sqft| round_half_up(sqft, 2))
}

/// `rate × units`; an overflowing product is reported against `field`.
pub fn checked_amount(field: &str, rate: Decimal, units: Decimal) -> Result<Decimal, EngineError> {
    rate.checked_mul(units)
        .ok_or_else(|| EngineError::InvalidMeasurement { field: field.to_owned(), value: units })
}

pub fn running_feet(width: Decimal) -> Decimal {
    width / MM_PER_RUNNING_FOOT
}

pub fn round_half_up(value: Decimal, decimal_places: u32) -> Decimal {
    value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
}

/// Whole currency units, half-up.
pub fn round_currency(value: Decimal) -> Decimal {
    round_half_up(value, 0)
}
