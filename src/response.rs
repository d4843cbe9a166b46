//! Caller-facing result shape
//!
//! Whatever transport sits in front of the detector (the CLI here) reports one
//! of three things per image: the names found, a plain "nothing detected", or
//! an error. The three are kept apart so a caller cannot mistake an empty scan
//! for a failure.

use serde::Serialize;
use std::path::Path;
use tracing::warn;

use crate::detector::{
    BestOutcome, DetectionConfig, DetectionOutcome, Match, Matches, Outcome, TwoPassDetector,
};
use crate::error::DetectError;

/// Message used for negative outcomes
pub const NOT_DETECTED_MESSAGE: &str = "No Pokémon detected";

/// Why nothing was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeReason {
    NoReference,
    NoMatch,
}

/// Found names, in one of the requested shapes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Found {
    All(Vec<Match>),
    Best(Match),
    Names(Vec<String>),
}

impl Found {
    pub fn count(&self) -> usize {
        match self {
            Found::All(matches) => matches.len(),
            Found::Best(_) => 1,
            Found::Names(names) => names.len(),
        }
    }
}

/// Serializable result of scanning one image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pokemon: Option<Found>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<NegativeReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionResponse {
    fn found(found: Found) -> Self {
        Self {
            success: true,
            image: None,
            count: Some(found.count()),
            pokemon: Some(found),
            message: None,
            reason: None,
            error: None,
        }
    }

    fn not_found(reason: NegativeReason) -> Self {
        Self {
            success: false,
            image: None,
            pokemon: None,
            count: None,
            message: Some(NOT_DETECTED_MESSAGE.to_string()),
            reason: Some(reason),
            error: None,
        }
    }

    /// All matches in OCR order
    pub fn from_outcome(outcome: DetectionOutcome) -> Self {
        match outcome {
            Outcome::Found(matches) => Self::found(Found::All(matches.into_vec())),
            Outcome::NoReference => Self::not_found(NegativeReason::NoReference),
            Outcome::NoMatch { .. } => Self::not_found(NegativeReason::NoMatch),
        }
    }

    /// The single best match
    pub fn from_best(outcome: BestOutcome) -> Self {
        match outcome {
            Outcome::Found(best) => Self::found(Found::Best(best)),
            Outcome::NoReference => Self::not_found(NegativeReason::NoReference),
            Outcome::NoMatch { .. } => Self::not_found(NegativeReason::NoMatch),
        }
    }

    /// Matched names only
    pub fn from_names(outcome: DetectionOutcome) -> Self {
        if outcome.is_found() {
            return Self::found(Found::Names(outcome.names()));
        }
        Self::from_outcome(outcome)
    }

    pub fn from_error(error: &DetectError) -> Self {
        Self {
            success: false,
            image: None,
            pokemon: None,
            count: None,
            message: None,
            reason: None,
            error: Some(error.to_string()),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// How the found names are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseShape {
    /// Every match with scores
    #[default]
    All,
    /// The best match with scores
    Best,
    /// Names without scores
    Names,
}

impl ResponseShape {
    pub fn from_config(config: &DetectionConfig, names_only: bool) -> Self {
        if names_only {
            ResponseShape::Names
        } else if config.best_only {
            ResponseShape::Best
        } else {
            ResponseShape::All
        }
    }
}

/// Scan one image file and build its response
///
/// Faults (undecodable image, OCR failure) become an error response; they
/// are never folded into "nothing detected".
pub fn scan_file(
    detector: &TwoPassDetector,
    path: &Path,
    config: &DetectionConfig,
    shape: ResponseShape,
) -> DetectionResponse {
    let response = match detector.detect_file(path, config) {
        Ok(outcome) => match shape {
            ResponseShape::All => DetectionResponse::from_outcome(outcome),
            ResponseShape::Best => DetectionResponse::from_best(outcome.into_best()),
            ResponseShape::Names => DetectionResponse::from_names(outcome),
        },
        Err(e) => {
            warn!("Scan of {:?} failed: {}", path, e);
            DetectionResponse::from_error(&e)
        }
    };

    response.with_image(path.display().to_string())
}
