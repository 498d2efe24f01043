//! Error types for Wellcheck

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Banner shown for any failure of the prediction call
pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to connect to the analysis engine. Please ensure the backend is running.";

/// Errors that can occur while assessing
#[derive(Debug, Error)]
pub enum AssessError {
    #[error("Invalid assessment input: {0}")]
    Validation(ValidationErrors),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Prediction service returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("Malformed prediction response: {0}")]
    MalformedResponse(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stress level must be between 1 and 10, got {0}")]
    InvalidStressLevel(u8),

    #[error("Cannot {action} while in the {stage} stage")]
    InvalidStage {
        action: &'static str,
        stage: &'static str,
    },

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("No submission is in flight")]
    NoSubmissionInFlight,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AssessError {
    /// True for failures of the prediction call itself: transport, non-2xx
    /// status, or a response that could not be decoded.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            AssessError::Transport(_) | AssessError::Status { .. } | AssessError::MalformedResponse(_)
        )
    }
}

/// Input fields that carry a numeric range check
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Age,
    ScreenHours,
    HeightCm,
    WeightKg,
    HeartRateBpm,
    SystolicBp,
    DiastolicBp,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Age => "age",
            Field::ScreenHours => "screen_hours",
            Field::HeightCm => "height_cm",
            Field::WeightKg => "weight_kg",
            Field::HeartRateBpm => "heart_rate_bpm",
            Field::SystolicBp => "systolic_bp",
            Field::DiastolicBp => "diastolic_bp",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single out-of-range value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is outside {}..={}", self.value, self.min, self.max)
    }
}

/// Every violation found in one input, keyed by field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    violations: BTreeMap<Field, FieldViolation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, violation: FieldViolation) {
        self.violations.insert(field, violation);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn get(&self, field: Field) -> Option<&FieldViolation> {
        self.violations.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.violations.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.violations.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldViolation)> {
        self.violations.iter().map(|(field, v)| (*field, v))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .violations
            .iter()
            .map(|(field, v)| format!("{field}: {v}"))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.violations.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_display_lists_every_field() {
        let mut errors = ValidationErrors::new();
        errors.insert(
            Field::ScreenHours,
            FieldViolation { value: 30.0, min: 0.0, max: 24.0 },
        );
        errors.insert(
            Field::Age,
            FieldViolation { value: 3.0, min: 8.0, max: 19.0 },
        );

        let text = errors.to_string();
        assert_eq!(text, "age: 3 is outside 8..=19; screen_hours: 30 is outside 0..=24");
    }

    #[test]
    fn test_validation_errors_serialize_keyed_by_field() {
        let mut errors = ValidationErrors::new();
        errors.insert(
            Field::HeartRateBpm,
            FieldViolation { value: 10.0, min: 30.0, max: 220.0 },
        );

        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value["heart_rate_bpm"]["min"], 30.0);
        assert_eq!(value["heart_rate_bpm"]["value"], 10.0);
    }

    #[test]
    fn test_network_classification() {
        assert!(AssessError::Transport("refused".into()).is_network());
        assert!(AssessError::Status { status: 500, body: String::new() }.is_network());
        assert!(AssessError::MalformedResponse("eof".into()).is_network());
        assert!(!AssessError::Validation(ValidationErrors::new()).is_network());
        assert!(!AssessError::SubmissionInFlight.is_network());
        assert!(!AssessError::NoSubmissionInFlight.is_network());
    }
}
