//! Two-pass name detector
//!
//! The largest text on a card is usually its name. The detector therefore:
//!
//! 1. sorts detections by size, largest first, and takes the first one whose
//!    text matches the vocabulary as the *reference*;
//! 2. keeps every detection whose size lies within `size_tolerance` of the
//!    reference and matches each of them again, in OCR order.
//!
//! Small fragments such as attack names, HP or level labels never reach the
//! second pass, whatever their score.

pub mod select;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::DetectError;
use crate::events::{DetectionEvent, EventSink, NullSink, Pass};
use crate::matching::{Matcher, Vocabulary};
use crate::vision::{prepare_detections, Detection, ScanImage, TextRecognizer};

pub use select::{select_best, weighted_score};

/// Minimum OCR confidence for a second-pass match
pub const MIN_MATCH_CONFIDENCE: f64 = 0.15;

/// Parameters of a single scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Language tag forwarded to the OCR engine
    pub language: String,
    /// Scores must be strictly above this (0 - 100)
    pub similarity_threshold: f64,
    /// Fractional size band around the reference (0.3 = ±30%)
    pub size_tolerance: f64,
    /// Reduce the result to a single match
    pub best_only: bool,
    /// Emit trace events
    pub verbose: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            similarity_threshold: 72.0,
            size_tolerance: 0.3,
            best_only: false,
            verbose: false,
        }
    }
}

impl DetectionConfig {
    /// Check that the thresholds are in range
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.similarity_threshold) {
            return Err(format!(
                "similarity_threshold must be within 0-100, got {}",
                self.similarity_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.size_tolerance) {
            return Err(format!(
                "size_tolerance must be within 0.0-1.0, got {}",
                self.size_tolerance
            ));
        }
        if self.language.trim().is_empty() {
            return Err("language must not be empty".to_string());
        }
        Ok(())
    }
}

/// A name found in the image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Vocabulary entry
    pub name: String,
    /// Similarity score (0 - 100)
    pub similarity: f64,
    /// OCR confidence of the detection (0.0 - 1.0)
    pub confidence: f64,
}

/// Accepted matches in OCR order, never empty
#[derive(Debug, Clone, PartialEq)]
pub struct Matches {
    first: Match,
    rest: Vec<Match>,
}

#[allow(clippy::len_without_is_empty)]
impl Matches {
    pub fn new(first: Match) -> Self {
        Self {
            first,
            rest: Vec::new(),
        }
    }

    /// `None` for an empty list
    pub fn from_vec(matches: Vec<Match>) -> Option<Self> {
        let mut iter = matches.into_iter();
        let first = iter.next()?;
        Some(Self {
            first,
            rest: iter.collect(),
        })
    }

    pub fn push(&mut self, m: Match) {
        self.rest.push(m);
    }

    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    /// Earliest match in OCR order
    pub fn first(&self) -> &Match {
        &self.first
    }

    pub fn iter(&self) -> impl Iterator<Item = &Match> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    /// The single best match (see [`select_best`])
    pub fn best(self) -> Match {
        select::pick_best(self.first, self.rest)
    }

    pub fn into_vec(self) -> Vec<Match> {
        let mut matches = Vec::with_capacity(self.len());
        matches.push(self.first);
        matches.extend(self.rest);
        matches
    }
}

/// The detection that calibrates the size band
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// Vocabulary entry it matched in the first pass
    pub name: String,
    /// First-pass score
    pub score: f64,
    /// Bounding box area
    pub area: f64,
}

/// Inclusive area range accepted in the second pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBand {
    pub min_area: f64,
    pub max_area: f64,
}

impl SizeBand {
    pub fn around(reference_area: f64, tolerance: f64) -> Self {
        Self {
            min_area: reference_area * (1.0 - tolerance),
            max_area: reference_area * (1.0 + tolerance),
        }
    }

    pub fn contains(&self, area: f64) -> bool {
        self.min_area <= area && area <= self.max_area
    }
}

/// Result of a scan that completed without a fault
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// One or more names were found
    Found(T),
    /// No detection matched the vocabulary in the reference pass
    NoReference,
    /// A reference existed but nothing survived the size and confidence gates
    NoMatch { reference: Reference },
}

/// Every accepted match, in OCR order
pub type DetectionOutcome = Outcome<Matches>;

/// At most one match
pub type BestOutcome = Outcome<Match>;

impl<T> Outcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Outcome::Found(value) => Some(value),
            _ => None,
        }
    }
}

impl DetectionOutcome {
    /// Reduce to the single best match
    pub fn into_best(self) -> BestOutcome {
        match self {
            Outcome::Found(matches) => Outcome::Found(matches.best()),
            Outcome::NoReference => Outcome::NoReference,
            Outcome::NoMatch { reference } => Outcome::NoMatch { reference },
        }
    }

    /// Matched names only
    pub fn names(&self) -> Vec<String> {
        match self {
            Outcome::Found(matches) => matches.iter().map(|m| m.name.clone()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Run both passes over prepared detections
///
/// `detections` must be in OCR order with empty-text entries already removed
/// (see [`prepare_detections`]), and `config` must pass
/// [`DetectionConfig::validate`].
pub fn find_matches(
    detections: &[Detection],
    vocabulary: &Vocabulary,
    matcher: &Matcher,
    config: &DetectionConfig,
    sink: &dyn EventSink,
) -> DetectionOutcome {
    let emit = |event: DetectionEvent| {
        if config.verbose {
            sink.emit(event);
        }
    };

    // First pass: largest text first, first match wins
    let mut by_size: Vec<&Detection> = detections.iter().collect();
    by_size.sort_by(|a, b| b.area.total_cmp(&a.area));

    let mut reference = None;
    for detection in by_size {
        let Some(candidate) = matcher.best_match(&detection.cleaned_text, vocabulary) else {
            continue;
        };
        emit(compared(Pass::Reference, detection, &candidate.name, candidate.score));

        if candidate.score > config.similarity_threshold {
            reference = Some(Reference {
                name: candidate.name,
                score: candidate.score,
                area: detection.area,
            });
            break;
        }
    }

    let Some(reference) = reference else {
        emit(DetectionEvent::NoReference);
        emit(DetectionEvent::Finished { matches: 0 });
        return Outcome::NoReference;
    };
    emit(DetectionEvent::ReferenceFound {
        name: reference.name.clone(),
        score: reference.score,
        area: reference.area,
    });

    // Second pass: OCR order, size band first, then a fresh score
    let band = SizeBand::around(reference.area, config.size_tolerance);
    emit(DetectionEvent::SizeBand {
        min_area: band.min_area,
        max_area: band.max_area,
    });

    let mut matches = Vec::new();
    for detection in detections.iter().filter(|d| band.contains(d.area)) {
        let Some(candidate) = matcher.best_match(&detection.cleaned_text, vocabulary) else {
            continue;
        };
        emit(compared(Pass::SizeBand, detection, &candidate.name, candidate.score));

        if candidate.score > config.similarity_threshold
            && detection.confidence > MIN_MATCH_CONFIDENCE
        {
            emit(DetectionEvent::MatchAccepted {
                name: candidate.name.clone(),
                score: candidate.score,
                confidence: detection.confidence,
            });
            matches.push(Match {
                name: candidate.name,
                similarity: candidate.score,
                confidence: detection.confidence,
            });
        }
    }

    emit(DetectionEvent::Finished {
        matches: matches.len(),
    });

    match Matches::from_vec(matches) {
        Some(matches) => Outcome::Found(matches),
        None => Outcome::NoMatch { reference },
    }
}

fn compared(pass: Pass, detection: &Detection, candidate: &str, score: f64) -> DetectionEvent {
    DetectionEvent::Compared {
        pass,
        text: detection.raw_text.clone(),
        cleaned: detection.cleaned_text.clone(),
        confidence: detection.confidence,
        area: detection.area,
        width: detection.width,
        height: detection.height,
        candidate: candidate.to_string(),
        score,
    }
}

/// Detector bound to a recognizer and a shared vocabulary
///
/// Holds no per-scan state; one instance can serve many threads.
#[derive(Clone)]
pub struct TwoPassDetector {
    recognizer: Arc<dyn TextRecognizer>,
    vocabulary: Arc<Vocabulary>,
    matcher: Matcher,
    sink: Arc<dyn EventSink>,
}

impl TwoPassDetector {
    /// Create a detector with the default matcher and no event sink
    pub fn new(recognizer: Arc<dyn TextRecognizer>, vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            recognizer,
            vocabulary,
            matcher: Matcher::default(),
            sink: Arc::new(NullSink),
        }
    }

    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Where trace events go when `verbose` is set
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Every name found, in OCR order
    ///
    /// An out-of-range `config` is rejected before the OCR engine runs.
    pub fn detect(
        &self,
        image: &ScanImage,
        config: &DetectionConfig,
    ) -> Result<DetectionOutcome, DetectError> {
        config.validate().map_err(DetectError::InvalidConfig)?;

        let raw = self.recognizer.recognize(image, &config.language)?;
        let total = raw.len();
        let detections = prepare_detections(raw);

        debug!(
            "Scanning {:?}: {} detections, {} with alphabetic text",
            image.path,
            total,
            detections.len()
        );
        if config.verbose {
            self.sink.emit(DetectionEvent::Recognized {
                total,
                kept: detections.len(),
            });
        }

        Ok(find_matches(
            &detections,
            &self.vocabulary,
            &self.matcher,
            config,
            self.sink.as_ref(),
        ))
    }

    /// The single best name found
    pub fn detect_best(
        &self,
        image: &ScanImage,
        config: &DetectionConfig,
    ) -> Result<BestOutcome, DetectError> {
        Ok(self.detect(image, config)?.into_best())
    }

    /// Matched names only
    pub fn detect_names(
        &self,
        image: &ScanImage,
        config: &DetectionConfig,
    ) -> Result<Vec<String>, DetectError> {
        Ok(self.detect(image, config)?.names())
    }

    /// Decode an image file, then [`detect`](Self::detect)
    pub fn detect_file(
        &self,
        path: &std::path::Path,
        config: &DetectionConfig,
    ) -> Result<DetectionOutcome, DetectError> {
        let image = ScanImage::open(path)?;
        self.detect(&image, config)
    }
}
