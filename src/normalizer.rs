//! Input normalization
//!
//! This module maps coarse ordinal selections (slider steps) to the raw scores
//! the predictor was trained on, and back.
//! - Fixed band tables per scale and entry point
//! - Reverse lookup with lower-bound inclusive floors
//! - Snapping of arbitrary raw values onto the nearest owning band

use serde::Serialize;
use tracing::debug;

use crate::types::{AssessmentInput, EntryPoint};

/// Which discretized score a scale describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    /// SDS, higher = worse sleep
    SleepDisturbance,
    /// PAQ, higher = more active
    PhysicalActivity,
    /// CGAS, higher = better functioning
    SocialFunctioning,
}

impl ScaleKind {
    pub const ALL: [ScaleKind; 3] = [
        ScaleKind::SleepDisturbance,
        ScaleKind::PhysicalActivity,
        ScaleKind::SocialFunctioning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleKind::SleepDisturbance => "sleep_disturbance",
            ScaleKind::PhysicalActivity => "physical_activity",
            ScaleKind::SocialFunctioning => "social_functioning",
        }
    }
}

/// One step of a scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    /// 1-based slider position
    pub step: u8,
    /// Canonical raw score sent for this step
    pub raw: f64,
    /// Lowest raw score owned by this step; the first band has no floor
    pub floor: f64,
    pub label: &'static str,
}

/// A fixed band table for one discretized score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandScale {
    pub kind: ScaleKind,
    pub bands: &'static [Band],
}

const fn band(step: u8, raw: f64, floor: f64, label: &'static str) -> Band {
    Band {
        step,
        raw,
        floor,
        label,
    }
}

const YOUTH_SDS: &[Band] = &[
    band(1, 30.0, f64::NEG_INFINITY, "Good Sleep"),
    band(2, 50.0, 45.0, "Average"),
    band(3, 70.0, 65.0, "Troubled/Insomnia"),
];

const YOUTH_PAQ: &[Band] = &[
    band(1, 1.5, f64::NEG_INFINITY, "Sedentary"),
    band(2, 3.0, 2.5, "Moderate"),
    band(3, 4.5, 4.0, "Active"),
];

const YOUTH_CGAS: &[Band] = &[
    band(1, 50.0, f64::NEG_INFINITY, "Withdrawn"),
    band(2, 65.0, 60.0, "Struggling"),
    band(3, 80.0, 75.0, "Okay"),
    band(4, 95.0, 90.0, "Super Social"),
];

const GENERAL_SDS: &[Band] = &[
    band(1, 30.0, f64::NEG_INFINITY, "Good"),
    band(2, 45.0, 37.5, "Fair"),
    band(3, 60.0, 52.5, "Poor"),
    band(4, 75.0, 67.5, "Troubled/Insomnia"),
];

const GENERAL_PAQ: &[Band] = &[
    band(1, 1.5, f64::NEG_INFINITY, "Sedentary"),
    band(2, 2.5, 2.0, "Moderate"),
    band(3, 3.5, 3.0, "Active"),
];

const GENERAL_CGAS: &[Band] = &[
    band(1, 30.0, f64::NEG_INFINITY, "Withdrawn"),
    band(2, 50.0, 40.0, "Struggling"),
    band(3, 70.0, 60.0, "Okay"),
    band(4, 90.0, 80.0, "Super Social"),
];

impl BandScale {
    /// Band table for a score on a given entry point
    pub fn for_entry(entry: EntryPoint, kind: ScaleKind) -> BandScale {
        let bands = match (entry, kind) {
            (EntryPoint::Youth, ScaleKind::SleepDisturbance) => YOUTH_SDS,
            (EntryPoint::Youth, ScaleKind::PhysicalActivity) => YOUTH_PAQ,
            (EntryPoint::Youth, ScaleKind::SocialFunctioning) => YOUTH_CGAS,
            (EntryPoint::General, ScaleKind::SleepDisturbance) => GENERAL_SDS,
            (EntryPoint::General, ScaleKind::PhysicalActivity) => GENERAL_PAQ,
            (EntryPoint::General, ScaleKind::SocialFunctioning) => GENERAL_CGAS,
        };
        BandScale { kind, bands }
    }

    /// Number of steps on the slider
    pub fn steps(&self) -> u8 {
        self.bands.len() as u8
    }

    /// Canonical raw score for a step.
    ///
    /// Steps below 1 clamp to the first band and steps past the end clamp to
    /// the last, so every `u8` maps to a band value.
    pub fn raw_of(&self, step: u8) -> f64 {
        self.band(step).raw
    }

    /// Step whose band contains `raw`. The first band catches everything
    /// below the second band's floor, including NaN.
    pub fn step_of(&self, raw: f64) -> u8 {
        self.bands
            .iter()
            .rev()
            .find(|b| raw >= b.floor)
            .map(|b| b.step)
            .unwrap_or(1)
    }

    /// Move `raw` onto the canonical value of the band that owns it
    pub fn snap(&self, raw: f64) -> f64 {
        self.raw_of(self.step_of(raw))
    }

    /// Whether `raw` is exactly one of this scale's band values
    pub fn is_band_value(&self, raw: f64) -> bool {
        self.bands.iter().any(|b| b.raw == raw)
    }

    pub fn label_of(&self, step: u8) -> &'static str {
        self.band(step).label
    }

    /// Upper bound (exclusive) of a step's band, if it has one
    pub fn ceiling_of(&self, step: u8) -> Option<f64> {
        let idx = self.index(step);
        self.bands.get(idx + 1).map(|b| b.floor)
    }

    fn band(&self, step: u8) -> &Band {
        &self.bands[self.index(step)]
    }

    fn index(&self, step: u8) -> usize {
        (step.max(1) as usize - 1).min(self.bands.len() - 1)
    }
}

/// Normalizer for keeping discretized fields on their band values
pub struct Normalizer;

impl Normalizer {
    /// Current slider step of a discretized field
    pub fn step(input: &AssessmentInput, kind: ScaleKind) -> u8 {
        BandScale::for_entry(input.entry, kind).step_of(raw_value(input, kind))
    }

    /// Set a discretized field from a slider step
    pub fn set_step(input: &mut AssessmentInput, kind: ScaleKind, step: u8) {
        let raw = BandScale::for_entry(input.entry, kind).raw_of(step);
        *raw_value_mut(input, kind) = raw;
    }

    /// Switch entry points, carrying each discretized field across by slider
    /// position. The top step maps to the top step of the new table.
    pub fn set_entry(input: &mut AssessmentInput, entry: EntryPoint) {
        if input.entry == entry {
            return;
        }

        for kind in ScaleKind::ALL {
            let from = BandScale::for_entry(input.entry, kind);
            let to = BandScale::for_entry(entry, kind);
            let step = from.step_of(raw_value(input, kind));
            let step = if step == from.steps() { to.steps() } else { step };
            *raw_value_mut(input, kind) = to.raw_of(step);
        }
        input.entry = entry;
    }

    /// Snap every discretized field onto its band table.
    ///
    /// Returns the scales whose value had to move.
    pub fn normalize(input: &mut AssessmentInput) -> Vec<ScaleKind> {
        let mut adjusted = Vec::new();

        for kind in ScaleKind::ALL {
            let scale = BandScale::for_entry(input.entry, kind);
            let current = raw_value(input, kind);
            let snapped = scale.snap(current);

            if snapped != current {
                debug!(
                    scale = kind.as_str(),
                    from = current,
                    to = snapped,
                    "snapped raw score onto band value"
                );
                *raw_value_mut(input, kind) = snapped;
                adjusted.push(kind);
            }
        }

        adjusted
    }

    /// Whether every discretized field already holds a band value
    pub fn is_normalized(input: &AssessmentInput) -> bool {
        ScaleKind::ALL.iter().all(|kind| {
            BandScale::for_entry(input.entry, *kind).is_band_value(raw_value(input, *kind))
        })
    }

    /// Raw score currently held by a discretized field
    pub fn raw_value(input: &AssessmentInput, kind: ScaleKind) -> f64 {
        raw_value(input, kind)
    }
}

fn raw_value(input: &AssessmentInput, kind: ScaleKind) -> f64 {
    match kind {
        ScaleKind::SleepDisturbance => input.sleep_disturbance,
        ScaleKind::PhysicalActivity => input.physical_activity,
        ScaleKind::SocialFunctioning => input.social_functioning,
    }
}

fn raw_value_mut(input: &mut AssessmentInput, kind: ScaleKind) -> &mut f64 {
    match kind {
        ScaleKind::SleepDisturbance => &mut input.sleep_disturbance,
        ScaleKind::PhysicalActivity => &mut input.physical_activity,
        ScaleKind::SocialFunctioning => &mut input.social_functioning,
    }
}
