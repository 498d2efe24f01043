//! Range validation for assessment inputs
//!
//! Every field is checked; violations are collected rather than returned on
//! the first failure so the caller can show them all at once.

use crate::error::{Field, FieldViolation, ValidationErrors};
use crate::types::AssessmentInput;

/// Inclusive numeric range for one field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// NaN and infinities are never inside a range
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    fn violation(&self, value: f64) -> FieldViolation {
        FieldViolation {
            value,
            min: self.min,
            max: self.max,
        }
    }
}

pub const SCREEN_HOURS_RANGE: FieldRange = FieldRange::new(0.0, 24.0);
pub const HEIGHT_CM_RANGE: FieldRange = FieldRange::new(50.0, 250.0);
pub const WEIGHT_KG_RANGE: FieldRange = FieldRange::new(10.0, 300.0);
pub const HEART_RATE_RANGE: FieldRange = FieldRange::new(30.0, 220.0);
pub const SYSTOLIC_RANGE: FieldRange = FieldRange::new(70.0, 250.0);
pub const DIASTOLIC_RANGE: FieldRange = FieldRange::new(40.0, 150.0);

/// Range table applied to an input; age depends on the entry point
pub fn ranges_for(input: &AssessmentInput) -> [(Field, FieldRange, f64); 7] {
    let (age_min, age_max) = input.entry.age_range();
    [
        (
            Field::Age,
            FieldRange::new(f64::from(age_min), f64::from(age_max)),
            f64::from(input.age),
        ),
        (Field::ScreenHours, SCREEN_HOURS_RANGE, f64::from(input.screen_hours)),
        (Field::HeightCm, HEIGHT_CM_RANGE, input.height_cm),
        (Field::WeightKg, WEIGHT_KG_RANGE, input.weight_kg),
        (Field::HeartRateBpm, HEART_RATE_RANGE, f64::from(input.heart_rate_bpm)),
        (Field::SystolicBp, SYSTOLIC_RANGE, f64::from(input.systolic_bp)),
        (Field::DiastolicBp, DIASTOLIC_RANGE, f64::from(input.diastolic_bp)),
    ]
}

/// Check every ranged field, collecting all violations
pub fn validate(input: &AssessmentInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    for (field, range, value) in ranges_for(input) {
        if !range.contains(value) {
            errors.insert(field, range.violation(value));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A single-field report for `field`, using its current value and range
pub fn violation(input: &AssessmentInput, field: Field) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if let Some((_, range, value)) = ranges_for(input).into_iter().find(|(f, _, _)| *f == field) {
        errors.insert(field, range.violation(value));
    }
    errors
}
