//! Wellcheck - Wellness assessment core
//!
//! Wellcheck turns a short lifestyle and vitals questionnaire into the
//! feature record an external risk predictor expects, and interprets the
//! classification it returns: input normalization → validation → feature
//! derivation → payload building → prediction → interpretation.
//!
//! ## Modules
//!
//! - **Normalizer**: slider steps ↔ raw band scores, BMI, guided-mode vitals
//! - **Payload Builder**: range validation and the fixed twelve-field wire record
//! - **Client**: the single POST to the prediction service
//! - **Session**: the selection → assessment → results flow

pub mod client;
pub mod config;
pub mod error;
pub mod features;
pub mod interpret;
pub mod normalizer;
pub mod payload;
pub mod personas;
pub mod pipeline;
pub mod session;
pub mod types;
pub mod validation;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use client::{HttpPredictor, Predictor};
pub use config::ClientConfig;
pub use error::{AssessError, Field, ValidationErrors};
pub use payload::{Feature, FeatureRecord, PayloadBuilder};
pub use pipeline::{assess, assessment_to_payload};
pub use session::{AssessmentOutcome, AssessmentSession, Stage};
pub use types::{AssessmentInput, EntryPoint, PredictionResult, Sex, StressLevel};

/// Wellcheck version
pub const WELLCHECK_VERSION: &str = env!("CARGO_PKG_VERSION");
