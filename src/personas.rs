//! Preset starting profiles for the selection stage

use serde::Serialize;

use crate::types::{AssessmentInput, EntryPoint, Sex, VitalsSource};

/// A named starting profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Persona {
    pub id: &'static str,
    pub name: &'static str,
    pub summary: &'static str,
    pub input: AssessmentInput,
}

/// All built-in personas
pub fn personas() -> Vec<Persona> {
    vec![
        Persona {
            id: "balanced",
            name: "Balanced Student",
            summary: "Moderate screen time, active, sleeps well",
            input: AssessmentInput {
                entry: EntryPoint::Youth,
                age: 14,
                sex: Sex::Female,
                screen_hours: 2,
                height_cm: 160.0,
                weight_kg: 52.0,
                heart_rate_bpm: 72,
                systolic_bp: 112,
                diastolic_bp: 72,
                sleep_disturbance: 30.0,
                physical_activity: 4.5,
                social_functioning: 95.0,
                vitals_source: VitalsSource::Measured,
            },
        },
        Persona {
            id: "heavy-screen",
            name: "Heavy Screen User",
            summary: "Long daily screen sessions, sedentary, withdrawn",
            input: AssessmentInput {
                entry: EntryPoint::Youth,
                age: 16,
                sex: Sex::Male,
                screen_hours: 10,
                height_cm: 175.0,
                weight_kg: 82.0,
                heart_rate_bpm: 88,
                systolic_bp: 128,
                diastolic_bp: 84,
                sleep_disturbance: 50.0,
                physical_activity: 1.5,
                social_functioning: 50.0,
                vitals_source: VitalsSource::Measured,
            },
        },
        Persona {
            id: "sleep-deprived",
            name: "Sleep-Deprived Teen",
            summary: "Late nights online, poor sleep, struggling socially",
            input: AssessmentInput {
                entry: EntryPoint::Youth,
                age: 17,
                sex: Sex::Female,
                screen_hours: 7,
                height_cm: 168.0,
                weight_kg: 58.0,
                heart_rate_bpm: 84,
                systolic_bp: 122,
                diastolic_bp: 79,
                sleep_disturbance: 70.0,
                physical_activity: 3.0,
                social_functioning: 65.0,
                vitals_source: VitalsSource::Measured,
            },
        },
    ]
}

/// Look a persona up by id
pub fn find(id: &str) -> Option<Persona> {
    personas().into_iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::Normalizer;
    use crate::validation;

    #[test]
    fn test_personas_are_valid_and_on_band() {
        for persona in personas() {
            assert!(validation::validate(&persona.input).is_ok(), "{}", persona.id);
            assert!(Normalizer::is_normalized(&persona.input), "{}", persona.id);
        }
    }

    #[test]
    fn test_find_by_id() {
        assert_eq!(find("heavy-screen").unwrap().input.screen_hours, 10);
        assert!(find("nobody").is_none());
    }
}
