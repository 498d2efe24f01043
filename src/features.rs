//! Feature derivation
//!
//! This module derives values the user does not enter directly:
//! - Body-mass index from height and weight
//! - Guided-mode vitals estimated from a stress level

use crate::types::{AssessmentInput, DerivedMetrics, EstimatedVitals, StressLevel, VitalsSource};

/// Decimal places kept for BMI, for display and on the wire alike
pub const BMI_DECIMALS: i32 = 2;

/// Feature deriver for computing local metrics
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Derive metrics from an input. `None` when BMI is undefined.
    pub fn derive(input: &AssessmentInput) -> Option<DerivedMetrics> {
        bmi(input.height_cm, input.weight_kg).map(|bmi| DerivedMetrics { bmi })
    }
}

/// BMI = weight_kg / (height_cm / 100)^2, rounded to [`BMI_DECIMALS`]
pub fn bmi(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if !height_cm.is_finite() || !weight_kg.is_finite() || height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(round_to(weight_kg / (height_m * height_m), BMI_DECIMALS))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Estimate vitals from a stress level.
///
/// A UX fallback for users who cannot supply a reading, not a physiological
/// model. Results are always tagged as estimated.
pub fn estimate_vitals(level: StressLevel) -> EstimatedVitals {
    let s = f64::from(level.value());
    EstimatedVitals {
        stress_level: level,
        heart_rate_bpm: (60.0 + 3.5 * s).round() as i32,
        systolic_bp: (105.0 + 3.0 * s).round() as i32,
        diastolic_bp: (65.0 + 2.0 * s).round() as i32,
    }
}

/// Fill the input's vitals from the estimator and mark them estimated
pub fn apply_estimated_vitals(input: &mut AssessmentInput, level: StressLevel) -> EstimatedVitals {
    let vitals = estimate_vitals(level);
    input.heart_rate_bpm = vitals.heart_rate_bpm;
    input.systolic_bp = vitals.systolic_bp;
    input.diastolic_bp = vitals.diastolic_bp;
    input.vitals_source = VitalsSource::Estimated {
        stress_level: level,
    };
    vitals
}

/// Set vitals from a real reading and mark them measured
pub fn apply_measured_vitals(
    input: &mut AssessmentInput,
    heart_rate_bpm: i32,
    systolic_bp: i32,
    diastolic_bp: i32,
) {
    input.heart_rate_bpm = heart_rate_bpm;
    input.systolic_bp = systolic_bp;
    input.diastolic_bp = diastolic_bp;
    input.vitals_source = VitalsSource::Measured;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bmi_reference_value() {
        // 60 / 1.65^2 = 22.04
        let value = bmi(165.0, 60.0).unwrap();
        assert!((value - 22.0).abs() < 0.05);
        assert_eq!(value, 22.04);
    }

    #[test]
    fn test_bmi_fixed_precision() {
        // 70 / 1.8^2 = 21.6049...
        assert_eq!(bmi(180.0, 70.0), Some(21.6));
        // 55 / 1.52^2 = 23.8054...
        assert_eq!(bmi(152.0, 55.0), Some(23.81));
    }

    #[test]
    fn test_bmi_undefined_inputs() {
        assert_eq!(bmi(0.0, 60.0), None);
        assert_eq!(bmi(-170.0, 60.0), None);
        assert_eq!(bmi(f64::NAN, 60.0), None);
        assert_eq!(bmi(170.0, f64::INFINITY), None);
    }

    #[test]
    fn test_estimate_vitals_mid_stress() {
        let vitals = estimate_vitals(StressLevel::new(5).unwrap());
        assert_eq!(vitals.heart_rate_bpm, 78);
        assert_eq!(vitals.systolic_bp, 120);
        assert_eq!(vitals.diastolic_bp, 75);
    }

    #[test]
    fn test_estimate_vitals_extremes() {
        let calm = estimate_vitals(StressLevel::new(1).unwrap());
        assert_eq!(
            (calm.heart_rate_bpm, calm.systolic_bp, calm.diastolic_bp),
            (64, 108, 67)
        );

        let stressed = estimate_vitals(StressLevel::new(10).unwrap());
        assert_eq!(
            (stressed.heart_rate_bpm, stressed.systolic_bp, stressed.diastolic_bp),
            (95, 135, 85)
        );
    }

    #[test]
    fn test_apply_vitals_tracks_source() {
        let mut input = AssessmentInput::default();
        let level = StressLevel::new(3).unwrap();

        apply_estimated_vitals(&mut input, level);
        assert_eq!(input.heart_rate_bpm, 71);
        assert!(input.vitals_source.is_estimated());

        apply_measured_vitals(&mut input, 66, 112, 70);
        assert_eq!(input.vitals_source, VitalsSource::Measured);
        assert_eq!(input.systolic_bp, 112);
    }

    #[test]
    fn test_derive_uses_input_dimensions() {
        let input = AssessmentInput::default();
        let derived = FeatureDeriver::derive(&input).unwrap();
        assert_eq!(derived.bmi, 22.04);
    }
}
