//! Pipeline orchestration
//!
//! Stateless entry points over the assessment stages:
//! normalize -> validate -> derive -> build record -> predict -> interpret.

use tracing::info;
use uuid::Uuid;

use crate::client::Predictor;
use crate::error::AssessError;
use crate::payload::{FeatureRecord, PayloadBuilder};
use crate::session::AssessmentOutcome;
use crate::types::AssessmentInput;

/// Build the request body for an assessment given as JSON.
///
/// # Arguments
/// * `input_json` - An `AssessmentInput` document; missing fields take defaults
///
/// # Returns
/// The `{"features": {...}}` request body as a JSON string
///
/// # Example
/// ```
/// let body = wellcheck::assessment_to_payload(r#"{"age": 12, "sex": 1}"#).unwrap();
/// assert!(body.contains("Basic_Demos-Age"));
/// ```
pub fn assessment_to_payload(input_json: &str) -> Result<String, AssessError> {
    let input: AssessmentInput = serde_json::from_str(input_json)?;
    let record = PayloadBuilder::build(&input)?;
    serde_json::to_string(&record).map_err(AssessError::Json)
}

/// Build the feature record for an input
pub fn build_record(input: &AssessmentInput) -> Result<FeatureRecord, AssessError> {
    PayloadBuilder::build(input)
}

/// Run one assessment end to end against a predictor
pub async fn assess(
    input: &AssessmentInput,
    predictor: &dyn Predictor,
) -> Result<AssessmentOutcome, AssessError> {
    let record = PayloadBuilder::build(input)?;
    info!(endpoint = %predictor.endpoint(), "submitting assessment");

    let result = predictor.predict(&record).await?;
    Ok(AssessmentOutcome::new(
        Uuid::new_v4(),
        result,
        input.vitals_source.is_estimated(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpPredictor;
    use crate::config::ClientConfig;
    use crate::features::apply_estimated_vitals;
    use crate::types::StressLevel;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_assessment_to_payload() {
        let body = assessment_to_payload(r#"{"age": 12, "sex": 1, "screen_hours": 9}"#).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(value["features"]["Basic_Demos-Age"], 12.0);
        assert_eq!(value["features"]["Basic_Demos-Sex"], 1.0);
        assert_eq!(value["features"]["PreInt_EduHx-computerinternet_hoursday"], 9.0);
    }

    #[test]
    fn test_assessment_to_payload_invalid_json() {
        let err = assessment_to_payload("not valid json").unwrap_err();
        assert!(matches!(err, AssessError::Json(_)));
    }

    #[test]
    fn test_assessment_to_payload_out_of_range() {
        let err = assessment_to_payload(r#"{"age": 3, "screen_hours": 30}"#).unwrap_err();
        match err {
            AssessError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_assess_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "prediction_score": 0.3,
                "sii_index": 0,
                "risk_level": "None",
                "description": "No signs of problematic use."
            })))
            .mount(&server)
            .await;

        let predictor = HttpPredictor::new(ClientConfig::new(server.uri()).unwrap()).unwrap();
        let mut input = AssessmentInput::default();
        apply_estimated_vitals(&mut input, StressLevel::new(2).unwrap());

        let outcome = assess(&input, &predictor).await.unwrap();
        assert!(outcome.interpretation.is_healthy);
        assert!(outcome.vitals_estimated);
        assert_eq!(outcome.interpretation.recommendation.unwrap().title, "Doing Great!");
    }
}
