//! Prediction service client
//!
//! One POST per submission. No retries, no timeout, no cancellation; a
//! failure is reported once and the caller decides whether to resubmit.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::AssessError;
use crate::payload::FeatureRecord;
use crate::types::PredictionResult;

/// Anything that can turn a feature record into a prediction
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, AssessError>;

    fn endpoint(&self) -> String;
}

/// HTTP client for the external `/predict` endpoint
#[derive(Debug, Clone)]
pub struct HttpPredictor {
    client: Client,
    config: ClientConfig,
}

impl HttpPredictor {
    pub fn new(config: ClientConfig) -> Result<Self, AssessError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AssessError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, AssessError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    async fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, AssessError> {
        let url = self.config.predict_url();
        debug!(url = %url, "posting feature record");

        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "prediction request failed");
                AssessError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AssessError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "prediction service returned an error status");
            debug!(body = %body, "error body");
            return Err(AssessError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result = decode_prediction(&body)?;
        info!(
            sii_index = result.sii_index,
            risk_level = %result.risk_level,
            score = result.prediction_score,
            "received prediction"
        );
        Ok(result)
    }

    fn endpoint(&self) -> String {
        self.config.predict_url()
    }
}

/// Decode a response body, rejecting values outside their documented ranges
pub fn decode_prediction(body: &str) -> Result<PredictionResult, AssessError> {
    let result: PredictionResult = serde_json::from_str(body)
        .map_err(|e| AssessError::MalformedResponse(e.to_string()))?;

    if !result.prediction_score.is_finite() {
        return Err(AssessError::MalformedResponse(
            "prediction_score is not a finite number".to_string(),
        ));
    }

    if let Some(stress) = result.stress_factor {
        if !(0.0..=1.0).contains(&stress) {
            return Err(AssessError::MalformedResponse(format!(
                "stress_factor {stress} is outside 0..=1"
            )));
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PayloadBuilder;
    use crate::types::AssessmentInput;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_response() -> serde_json::Value {
        serde_json::json!({
            "prediction_score": 1.73,
            "sii_index": 2,
            "risk_level": "Moderate",
            "description": "Moderate risk of problematic internet use.",
            "stress_factor": 0.64,
            "detailed_metrics": { "screen_hours_weight": 0.31 }
        })
    }

    fn predictor_for(server: &MockServer) -> HttpPredictor {
        HttpPredictor::new(ClientConfig::new(server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_predict_posts_features_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "features": { "Basic_Demos-Age": 15.0, "Physical-BMI": 22.04 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_response()))
            .expect(1)
            .mount(&server)
            .await;

        let record = PayloadBuilder::build(&AssessmentInput::default()).unwrap();
        let result = predictor_for(&server).predict(&record).await.unwrap();

        assert_eq!(result.sii_index, 2);
        assert_eq!(result.risk_level, "Moderate");
        assert_eq!(result.stress_factor, Some(0.64));
        assert!(result.detailed_metrics.is_some());
    }

    #[tokio::test]
    async fn test_error_status_surfaces_opaquely() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let record = PayloadBuilder::build(&AssessmentInput::default()).unwrap();
        let err = predictor_for(&server).predict(&record).await.unwrap_err();

        match err {
            AssessError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "model not loaded");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let record = PayloadBuilder::build(&AssessmentInput::default()).unwrap();
        let err = predictor_for(&server).predict(&record).await.unwrap_err();

        assert!(matches!(err, AssessError::MalformedResponse(_)));
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // bind then release an ephemeral port so nothing is listening on it
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ClientConfig::new(format!("http://127.0.0.1:{port}")).unwrap();
        let predictor = HttpPredictor::new(config).unwrap();
        let record = PayloadBuilder::build(&AssessmentInput::default()).unwrap();
        let err = predictor.predict(&record).await.unwrap_err();

        assert!(matches!(err, AssessError::Transport(_)));
    }

    #[test]
    fn test_decode_rejects_out_of_range_stress() {
        let mut body = sample_response();
        body["stress_factor"] = serde_json::json!(1.4);
        let err = decode_prediction(&body.to_string()).unwrap_err();
        assert!(matches!(err, AssessError::MalformedResponse(_)));
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        let err = decode_prediction(r#"{"prediction_score": 0.4}"#).unwrap_err();
        assert!(matches!(err, AssessError::MalformedResponse(_)));
    }
}
