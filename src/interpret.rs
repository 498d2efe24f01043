//! Result interpretation
//!
//! Turns a raw prediction into what a results view needs: where the gauge
//! needle sits, which tone to use, whether to flag risk, and the stress share
//! as a percentage.

use serde::Serialize;

use crate::types::PredictionResult;

/// Top of the conventional score range
pub const MAX_SCORE: f64 = 3.0;

/// Severity index at or above which a result is flagged high risk
pub const HIGH_RISK_SII: u8 = 2;

/// Stress share above which the stress indicator is flagged
pub const ELEVATED_STRESS: f64 = 0.6;

/// Visual tone of the gauge, by continuous score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Healthy,
    Mild,
    Moderate,
    Severe,
}

impl Tone {
    pub fn from_score(score: f64) -> Tone {
        if score < 0.5 {
            Tone::Healthy
        } else if score < 1.5 {
            Tone::Mild
        } else if score < 2.5 {
            Tone::Moderate
        } else {
            Tone::Severe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Healthy => "healthy",
            Tone::Mild => "mild",
            Tone::Moderate => "moderate",
            Tone::Severe => "severe",
        }
    }

    /// ANSI SGR color code for terminal rendering
    pub fn ansi_color(&self) -> u8 {
        match self {
            Tone::Healthy => 32,
            Tone::Mild => 34,
            Tone::Moderate => 33,
            Tone::Severe => 31,
        }
    }
}

/// Semicircle gauge position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeReading {
    /// Score scaled into 0..=1
    pub fraction: f64,
    /// Needle sweep, 0..=180 degrees
    pub rotation_deg: f64,
    pub tone: Tone,
}

impl GaugeReading {
    pub fn from_score(score: f64) -> Self {
        let fraction = (score / MAX_SCORE).clamp(0.0, 1.0);
        Self {
            fraction,
            rotation_deg: fraction * 180.0,
            tone: Tone::from_score(score),
        }
    }
}

/// Call-out shown under the breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub title: &'static str,
    pub message: &'static str,
}

/// Stress & vital signs line of the breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StressIndicator {
    /// Whole percent
    pub percent: u8,
    pub elevated: bool,
}

impl StressIndicator {
    pub fn from_fraction(fraction: f64) -> Self {
        Self {
            percent: (fraction.clamp(0.0, 1.0) * 100.0).round() as u8,
            elevated: fraction > ELEVATED_STRESS,
        }
    }
}

/// Everything a results view renders for one prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub gauge: GaugeReading,
    pub risk_level: String,
    pub description: String,
    pub sii_index: u8,
    pub is_high_risk: bool,
    pub is_healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress: Option<StressIndicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

impl Interpretation {
    pub fn from_result(result: &PredictionResult) -> Self {
        let is_high_risk = result.sii_index >= HIGH_RISK_SII;
        let is_healthy = result.sii_index == 0;

        Self {
            gauge: GaugeReading::from_score(result.prediction_score),
            risk_level: result.risk_level.clone(),
            description: result.description.clone(),
            sii_index: result.sii_index,
            is_high_risk,
            is_healthy,
            stress: result.stress_factor.map(StressIndicator::from_fraction),
            recommendation: recommendation(is_high_risk, is_healthy),
        }
    }
}

fn recommendation(is_high_risk: bool, is_healthy: bool) -> Option<Recommendation> {
    if is_high_risk {
        Some(Recommendation {
            title: "Action Recommended",
            message: "Your vitals indicate high stress levels linked to digital habits. \
                      Consider reducing screen time by 2 hours/day.",
        })
    } else if is_healthy {
        Some(Recommendation {
            title: "Doing Great!",
            message: "Your digital habits seem balanced. Keep maintaining your current routine.",
        })
    } else {
        None
    }
}
