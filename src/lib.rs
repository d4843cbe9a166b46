//! Pokémon card scanner
//!
//! Finds which known names are printed on a photographed card. OCR
//! detections are cleaned, sized and fuzzy-matched against a vocabulary;
//! text whose size differs from the most prominent matching name is ignored.

pub mod config;
pub mod detector;
pub mod error;
pub mod events;
pub mod matching;
pub mod response;
pub mod vision;

pub use detector::{
    select_best, BestOutcome, DetectionConfig, DetectionOutcome, Match, Matches, Outcome,
    TwoPassDetector,
};
pub use error::DetectError;
pub use events::{DetectionEvent, EventSink, NullSink, RecordingSink, TracingSink};
pub use matching::{Matcher, Scorer, Vocabulary};
pub use response::{scan_file, DetectionResponse, ResponseShape};
pub use vision::{RawDetection, ScanImage, TextRecognizer};
