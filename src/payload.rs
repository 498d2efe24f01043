//! Feature payload building
//!
//! This module turns a validated assessment into the flat record the
//! prediction service expects. The internal-to-wire name table is fixed; the
//! service was trained against these exact identifiers.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::{AssessError, Field};
use crate::features::FeatureDeriver;
use crate::normalizer::Normalizer;
use crate::types::{AssessmentInput, DerivedMetrics};
use crate::validation;

/// The twelve features sent to the predictor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Age,
    Sex,
    ScreenHours,
    Height,
    Weight,
    Bmi,
    HeartRate,
    SystolicBp,
    DiastolicBp,
    SleepDisturbance,
    PhysicalActivity,
    SocialFunctioning,
}

impl Feature {
    /// Wire order
    pub const ALL: [Feature; 12] = [
        Feature::Age,
        Feature::Sex,
        Feature::ScreenHours,
        Feature::Height,
        Feature::Weight,
        Feature::Bmi,
        Feature::HeartRate,
        Feature::SystolicBp,
        Feature::DiastolicBp,
        Feature::SleepDisturbance,
        Feature::PhysicalActivity,
        Feature::SocialFunctioning,
    ];

    /// External field name used by the prediction service
    pub fn wire_name(&self) -> &'static str {
        match self {
            Feature::Age => "Basic_Demos-Age",
            Feature::Sex => "Basic_Demos-Sex",
            Feature::ScreenHours => "PreInt_EduHx-computerinternet_hoursday",
            Feature::Height => "Physical-Height",
            Feature::Weight => "Physical-Weight",
            Feature::Bmi => "Physical-BMI",
            Feature::HeartRate => "Physical-HeartRate",
            Feature::SystolicBp => "Physical-Systolic_BP",
            Feature::DiastolicBp => "Physical-Diastolic_BP",
            Feature::SleepDisturbance => "SDS-SDS_Total_Raw",
            Feature::PhysicalActivity => "PAQ_C-PAQ_C_Total",
            Feature::SocialFunctioning => "CGAS-CGAS_Score",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Immutable feature record, serialized as `{"features": {...}}`
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    values: [f64; 12],
}

impl FeatureRecord {
    fn from_input(input: &AssessmentInput, derived: DerivedMetrics) -> Self {
        let mut values = [0.0; 12];
        for feature in Feature::ALL {
            values[feature.index()] = match feature {
                Feature::Age => f64::from(input.age),
                Feature::Sex => f64::from(input.sex.code()),
                Feature::ScreenHours => f64::from(input.screen_hours),
                Feature::Height => input.height_cm,
                Feature::Weight => input.weight_kg,
                Feature::Bmi => derived.bmi,
                Feature::HeartRate => f64::from(input.heart_rate_bpm),
                Feature::SystolicBp => f64::from(input.systolic_bp),
                Feature::DiastolicBp => f64::from(input.diastolic_bp),
                Feature::SleepDisturbance => input.sleep_disturbance,
                Feature::PhysicalActivity => input.physical_activity,
                Feature::SocialFunctioning => input.social_functioning,
            };
        }
        Self { values }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// Look a value up by its wire name
    pub fn get_by_name(&self, wire_name: &str) -> Option<f64> {
        Feature::ALL
            .iter()
            .find(|f| f.wire_name() == wire_name)
            .map(|f| self.get(*f))
    }

    /// `(wire_name, value)` pairs in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        Feature::ALL.iter().map(|f| (f.wire_name(), self.get(*f)))
    }

    pub fn bmi(&self) -> f64 {
        self.get(Feature::Bmi)
    }

    /// Request body as a JSON value
    pub fn to_json_value(&self) -> Result<serde_json::Value, AssessError> {
        serde_json::to_value(self).map_err(AssessError::Json)
    }
}

struct FeatureMap<'a>(&'a FeatureRecord);

impl Serialize for FeatureMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Feature::ALL.len()))?;
        for (name, value) in self.0.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("FeatureRecord", 1)?;
        body.serialize_field("features", &FeatureMap(self))?;
        body.end()
    }
}

/// Builder for validated feature records
pub struct PayloadBuilder;

impl PayloadBuilder {
    /// Validate the input and build its feature record.
    ///
    /// Discretized scores are snapped onto their band values first. If any
    /// field is out of range, every violation is returned and no record is
    /// built.
    pub fn build(input: &AssessmentInput) -> Result<FeatureRecord, AssessError> {
        let mut normalized = input.clone();
        Normalizer::normalize(&mut normalized);

        validation::validate(&normalized).map_err(AssessError::Validation)?;

        // validated height is finite and at least 50 cm, so BMI always exists
        let derived = FeatureDeriver::derive(&normalized).ok_or_else(|| {
            AssessError::Validation(validation::violation(&normalized, Field::HeightCm))
        })?;

        let record = FeatureRecord::from_input(&normalized, derived);
        debug!(
            bmi = record.bmi(),
            estimated_vitals = normalized.vitals_source.is_estimated(),
            "built feature record"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntryPoint, Sex};
    use pretty_assertions::assert_eq;

    fn distinct_input() -> AssessmentInput {
        AssessmentInput {
            entry: EntryPoint::Youth,
            age: 13,
            sex: Sex::Male,
            screen_hours: 6,
            height_cm: 158.0,
            weight_kg: 47.0,
            heart_rate_bpm: 82,
            systolic_bp: 118,
            diastolic_bp: 76,
            sleep_disturbance: 70.0,
            physical_activity: 1.5,
            social_functioning: 65.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_record_has_exactly_twelve_wire_names() {
        let record = PayloadBuilder::build(&distinct_input()).unwrap();
        let json = record.to_json_value().unwrap();

        let features = json["features"].as_object().unwrap();
        assert_eq!(json.as_object().unwrap().len(), 1);
        assert_eq!(features.len(), 12);

        let mut names: Vec<&str> = features.keys().map(|k| k.as_str()).collect();
        names.sort();
        let mut expected = vec![
            "Basic_Demos-Age",
            "Basic_Demos-Sex",
            "PreInt_EduHx-computerinternet_hoursday",
            "Physical-Height",
            "Physical-Weight",
            "Physical-BMI",
            "Physical-HeartRate",
            "Physical-Systolic_BP",
            "Physical-Diastolic_BP",
            "SDS-SDS_Total_Raw",
            "PAQ_C-PAQ_C_Total",
            "CGAS-CGAS_Score",
        ];
        expected.sort();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_each_wire_name_maps_from_its_source() {
        let record = PayloadBuilder::build(&distinct_input()).unwrap();
        let json = record.to_json_value().unwrap();
        let f = &json["features"];

        assert_eq!(f["Basic_Demos-Age"], 13.0);
        assert_eq!(f["Basic_Demos-Sex"], 1.0);
        assert_eq!(f["PreInt_EduHx-computerinternet_hoursday"], 6.0);
        assert_eq!(f["Physical-Height"], 158.0);
        assert_eq!(f["Physical-Weight"], 47.0);
        // 47 / 1.58^2 = 18.827
        assert_eq!(f["Physical-BMI"], 18.83);
        assert_eq!(f["Physical-HeartRate"], 82.0);
        assert_eq!(f["Physical-Systolic_BP"], 118.0);
        assert_eq!(f["Physical-Diastolic_BP"], 76.0);
        assert_eq!(f["SDS-SDS_Total_Raw"], 70.0);
        assert_eq!(f["PAQ_C-PAQ_C_Total"], 1.5);
        assert_eq!(f["CGAS-CGAS_Score"], 65.0);
    }

    #[test]
    fn test_wire_order_is_fixed() {
        let record = PayloadBuilder::build(&distinct_input()).unwrap();
        let text = serde_json::to_string(&record).unwrap();

        let positions: Vec<usize> = Feature::ALL
            .iter()
            .map(|f| text.find(&format!("\"{}\"", f.wire_name())).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_validation_failure_builds_nothing() {
        let input = AssessmentInput {
            age: 3,
            screen_hours: 30,
            ..Default::default()
        };

        match PayloadBuilder::build(&input) {
            Err(AssessError::Validation(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.contains(Field::Age));
                assert!(errors.contains(Field::ScreenHours));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_off_band_scores_are_snapped() {
        let input = AssessmentInput {
            sleep_disturbance: 40.0,
            physical_activity: 2.5,
            social_functioning: 75.0,
            ..Default::default()
        };

        let record = PayloadBuilder::build(&input).unwrap();
        assert_eq!(record.get(Feature::SleepDisturbance), 30.0);
        assert_eq!(record.get(Feature::PhysicalActivity), 3.0);
        assert_eq!(record.get(Feature::SocialFunctioning), 80.0);
    }

    #[test]
    fn test_get_by_name() {
        let record = PayloadBuilder::build(&AssessmentInput::default()).unwrap();
        assert_eq!(record.get_by_name("Physical-BMI"), Some(22.04));
        assert_eq!(record.get_by_name("Physical-bmi"), None);
    }
}
