//! Core types for the Wellcheck assessment flow
//!
//! This module defines the data that flows through each stage: the editable
//! assessment input, locally derived metrics, and the prediction returned by
//! the external service.

use serde::{Deserialize, Serialize};

use crate::error::AssessError;

/// Which form the assessment was started from
///
/// The two entry points differ in their accepted age range and in the band
/// tables used for the discretized scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPoint {
    /// Child and adolescent form, ages 8-19
    #[default]
    Youth,
    /// Open-age form, ages 5-99
    General,
}

impl EntryPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Youth => "youth",
            EntryPoint::General => "general",
        }
    }

    /// Inclusive age range accepted by this entry point
    pub fn age_range(&self) -> (i32, i32) {
        match self {
            EntryPoint::Youth => (8, 19),
            EntryPoint::General => (5, 99),
        }
    }
}

/// Biological sex, encoded as 0/1 on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Sex {
    #[default]
    Female,
    Male,
}

impl Sex {
    pub fn code(&self) -> u8 {
        match self {
            Sex::Female => 0,
            Sex::Male => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
        }
    }
}

impl TryFrom<u8> for Sex {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Sex::Female),
            1 => Ok(Sex::Male),
            other => Err(format!("sex must be 0 or 1, got {other}")),
        }
    }
}

impl From<Sex> for u8 {
    fn from(sex: Sex) -> Self {
        sex.code()
    }
}

/// Stress level on the guided-mode slider (1 = calm, 10 = highly stressed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct StressLevel(u8);

impl StressLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(level: u8) -> Result<Self, AssessError> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(AssessError::InvalidStressLevel(level))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for StressLevel {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u8> for StressLevel {
    type Error = AssessError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<StressLevel> for u8 {
    fn from(level: StressLevel) -> Self {
        level.0
    }
}

/// Where the heart rate and blood pressure values came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum VitalsSource {
    /// Entered by the user from a real reading
    #[default]
    Measured,
    /// Filled in by the guided-mode estimator; not a measurement
    Estimated { stress_level: StressLevel },
}

impl VitalsSource {
    pub fn is_estimated(&self) -> bool {
        matches!(self, VitalsSource::Estimated { .. })
    }
}

/// Vitals produced by the guided-mode estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedVitals {
    pub stress_level: StressLevel,
    pub heart_rate_bpm: i32,
    pub systolic_bp: i32,
    pub diastolic_bp: i32,
}

/// One user's assessment, edited in place until it is submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentInput {
    pub entry: EntryPoint,
    /// Age in years
    pub age: i32,
    pub sex: Sex,
    /// Daily computer/internet hours
    pub screen_hours: i32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub heart_rate_bpm: i32,
    pub systolic_bp: i32,
    pub diastolic_bp: i32,
    /// SDS raw score, always a band value
    pub sleep_disturbance: f64,
    /// PAQ raw score, always a band value
    pub physical_activity: f64,
    /// CGAS raw score, always a band value
    pub social_functioning: f64,
    pub vitals_source: VitalsSource,
}

impl Default for AssessmentInput {
    fn default() -> Self {
        Self {
            entry: EntryPoint::Youth,
            age: 15,
            sex: Sex::Female,
            screen_hours: 4,
            height_cm: 165.0,
            weight_kg: 60.0,
            heart_rate_bpm: 78,
            systolic_bp: 120,
            diastolic_bp: 75,
            sleep_disturbance: 30.0,
            physical_activity: 3.0,
            social_functioning: 80.0,
            vitals_source: VitalsSource::Estimated {
                stress_level: StressLevel::default(),
            },
        }
    }
}

/// Metrics computed locally from the input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Body-mass index, rounded to two decimals. This is the value both
    /// displayed and transmitted.
    pub bmi: f64,
}

/// Classification returned by the prediction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Continuous severity score, conventionally 0.0-3.0
    pub prediction_score: f64,
    /// Discrete severity index (SII), 0-3
    pub sii_index: u8,
    /// Tier label, e.g. "Moderate"
    pub risk_level: String,
    pub description: String,
    /// Share of the score attributed to stress and vitals (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_metrics: Option<serde_json::Value>,
}
