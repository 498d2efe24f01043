//! Assessment session
//!
//! Tracks one user's walk through `selection -> assessment -> results`.
//! Submitting is a busy flag on the assessment stage, not a stage of its own.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::Predictor;
use crate::error::{AssessError, NETWORK_ERROR_MESSAGE};
use crate::features::{apply_estimated_vitals, apply_measured_vitals};
use crate::interpret::Interpretation;
use crate::normalizer::{Normalizer, ScaleKind};
use crate::payload::{FeatureRecord, PayloadBuilder};
use crate::personas::Persona;
use crate::types::{AssessmentInput, EstimatedVitals, PredictionResult, StressLevel};

/// Where the user is in the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Selection,
    Assessment,
    Results,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Selection => "selection",
            Stage::Assessment => "assessment",
            Stage::Results => "results",
        }
    }
}

/// A completed prediction with its interpretation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentOutcome {
    pub session_id: Uuid,
    pub received_at: DateTime<Utc>,
    pub result: PredictionResult,
    pub interpretation: Interpretation,
    /// True when heart rate and blood pressure came from the estimator
    pub vitals_estimated: bool,
}

impl AssessmentOutcome {
    pub fn new(session_id: Uuid, result: PredictionResult, vitals_estimated: bool) -> Self {
        let interpretation = Interpretation::from_result(&result);
        Self {
            session_id,
            received_at: Utc::now(),
            result,
            interpretation,
            vitals_estimated,
        }
    }
}

/// State for one assessment session
#[derive(Debug)]
pub struct AssessmentSession {
    id: Uuid,
    stage: Stage,
    input: Option<AssessmentInput>,
    outcome: Option<AssessmentOutcome>,
    submitting: bool,
    error: Option<String>,
}

impl Default for AssessmentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: Stage::Selection,
            input: None,
            outcome: None,
            submitting: false,
            error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn input(&self) -> Option<&AssessmentInput> {
        self.input.as_ref()
    }

    pub fn outcome(&self) -> Option<&AssessmentOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Banner message from the last failed submission
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start from default values
    pub fn start_custom(&mut self) -> Result<&mut AssessmentInput, AssessError> {
        self.start(AssessmentInput::default())
    }

    /// Start from a preset profile
    pub fn start_with_persona(&mut self, persona: &Persona) -> Result<&mut AssessmentInput, AssessError> {
        self.start(persona.input.clone())
    }

    /// Start from an arbitrary input; discretized scores are snapped onto
    /// their bands
    pub fn start_with_input(&mut self, input: AssessmentInput) -> Result<&mut AssessmentInput, AssessError> {
        self.start(input)
    }

    fn start(&mut self, mut input: AssessmentInput) -> Result<&mut AssessmentInput, AssessError> {
        self.require(Stage::Selection, "start an assessment")?;
        Normalizer::normalize(&mut input);
        self.stage = Stage::Assessment;
        self.error = None;
        Ok(self.input.insert(input))
    }

    /// Return to selection, discarding transient input and result state
    pub fn back(&mut self) {
        match self.stage {
            Stage::Selection => {}
            Stage::Assessment | Stage::Results => {
                self.stage = Stage::Selection;
                self.input = None;
                self.outcome = None;
                self.error = None;
                self.submitting = false;
            }
        }
    }

    /// Mutable access to the input while assessing
    pub fn input_mut(&mut self) -> Result<&mut AssessmentInput, AssessError> {
        self.require(Stage::Assessment, "edit the assessment")?;
        self.input
            .as_mut()
            .ok_or(AssessError::InvalidStage {
                action: "edit the assessment",
                stage: "assessment",
            })
    }

    /// Move a discretized slider, returning the raw score it now holds
    pub fn set_step(&mut self, kind: ScaleKind, step: u8) -> Result<f64, AssessError> {
        let input = self.input_mut()?;
        Normalizer::set_step(input, kind, step);
        Ok(Normalizer::raw_value(input, kind))
    }

    /// Guided mode: derive vitals from a stress level
    pub fn set_stress_level(&mut self, level: StressLevel) -> Result<EstimatedVitals, AssessError> {
        let input = self.input_mut()?;
        Ok(apply_estimated_vitals(input, level))
    }

    /// Manual mode: record measured vitals
    pub fn set_measured_vitals(
        &mut self,
        heart_rate_bpm: i32,
        systolic_bp: i32,
        diastolic_bp: i32,
    ) -> Result<(), AssessError> {
        let input = self.input_mut()?;
        apply_measured_vitals(input, heart_rate_bpm, systolic_bp, diastolic_bp);
        Ok(())
    }

    /// Validate and build the record, then mark the session busy.
    ///
    /// Validation failures leave the session in the assessment stage and are
    /// returned verbatim.
    pub fn begin_submit(&mut self) -> Result<FeatureRecord, AssessError> {
        self.require(Stage::Assessment, "submit")?;
        if self.submitting {
            return Err(AssessError::SubmissionInFlight);
        }

        let input = self.input.as_ref().ok_or(AssessError::InvalidStage {
            action: "submit",
            stage: "assessment",
        })?;
        let record = PayloadBuilder::build(input)?;

        self.submitting = true;
        self.error = None;
        Ok(record)
    }

    /// Finish a submission started with [`begin_submit`](Self::begin_submit).
    ///
    /// A result arriving after [`back`](Self::back), or without a matching
    /// `begin_submit`, is dropped and leaves the session untouched.
    pub fn complete_submit(
        &mut self,
        result: Result<PredictionResult, AssessError>,
    ) -> Result<&AssessmentOutcome, AssessError> {
        if self.stage != Stage::Assessment || !self.submitting {
            debug!(session_id = %self.id, stage = self.stage.as_str(), "discarding stale prediction result");
            return Err(AssessError::NoSubmissionInFlight);
        }
        self.submitting = false;

        match result {
            Ok(prediction) => {
                let vitals_estimated = self
                    .input
                    .as_ref()
                    .map(|i| i.vitals_source.is_estimated())
                    .unwrap_or(false);
                let outcome = AssessmentOutcome::new(self.id, prediction, vitals_estimated);
                info!(
                    session_id = %self.id,
                    sii_index = outcome.result.sii_index,
                    "assessment complete"
                );
                self.stage = Stage::Results;
                self.error = None;
                Ok(self.outcome.insert(outcome))
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "submission failed");
                if e.is_network() {
                    self.error = Some(NETWORK_ERROR_MESSAGE.to_string());
                } else {
                    self.error = Some(e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Build, send and record one submission
    pub async fn submit(
        &mut self,
        predictor: &dyn Predictor,
    ) -> Result<&AssessmentOutcome, AssessError> {
        let record = self.begin_submit()?;
        let span = info_span!("submit", session_id = %self.id, endpoint = %predictor.endpoint());
        let result = predictor.predict(&record).instrument(span).await;
        self.complete_submit(result)
    }

    fn require(&self, stage: Stage, action: &'static str) -> Result<(), AssessError> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(AssessError::InvalidStage {
                action,
                stage: self.stage.as_str(),
            })
        }
    }
}
