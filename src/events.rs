//! Trace events emitted while a scan runs
//!
//! The detector never prints. Verbose runs hand it a sink that forwards the
//! events to `tracing`; tests hand it a [`RecordingSink`] and assert on the
//! events directly.

use parking_lot::Mutex;
use tracing::{debug, info};

/// Which pass of the detector produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Reference search over detections sorted by size
    Reference,
    /// Size-banded collection in OCR order
    SizeBand,
}

/// Something that happened during a scan
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionEvent {
    /// OCR finished; `kept` detections had alphabetic text
    Recognized { total: usize, kept: usize },
    /// A detection was scored against the vocabulary
    Compared {
        pass: Pass,
        text: String,
        cleaned: String,
        confidence: f64,
        area: f64,
        width: f64,
        height: f64,
        candidate: String,
        score: f64,
    },
    /// The reference detection was chosen
    ReferenceFound { name: String, score: f64, area: f64 },
    /// Nothing cleared the threshold in the reference pass
    NoReference,
    /// Accepted size range for the second pass
    SizeBand { min_area: f64, max_area: f64 },
    /// A detection in the size band was accepted as a match
    MatchAccepted {
        name: String,
        score: f64,
        confidence: f64,
    },
    /// The scan finished with this many matches
    Finished { matches: usize },
}

/// Receiver for detection events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DetectionEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: DetectionEvent) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: DetectionEvent) {
        match event {
            DetectionEvent::Recognized { total, kept } => {
                debug!("OCR returned {} detections, {} with alphabetic text", total, kept);
            }
            DetectionEvent::Compared {
                pass,
                text,
                cleaned,
                confidence,
                area,
                width,
                height,
                candidate,
                score,
            } => {
                debug!(
                    "[{:?}] {:?} -> {:?} conf {:.2}% size {:.0} (W:{:.0}, H:{:.0}) ~ {} ({:.1}%)",
                    pass,
                    text,
                    cleaned,
                    confidence * 100.0,
                    area,
                    width,
                    height,
                    candidate,
                    score
                );
            }
            DetectionEvent::ReferenceFound { name, score, area } => {
                info!("Reference found: {} ({:.1}%), size {:.0}", name, score, area);
            }
            DetectionEvent::NoReference => {
                info!("No reference name found");
            }
            DetectionEvent::SizeBand { min_area, max_area } => {
                debug!("Size band: {:.0} - {:.0}", min_area, max_area);
            }
            DetectionEvent::MatchAccepted {
                name,
                score,
                confidence,
            } => {
                info!(
                    "Match: {} (similarity {:.1}%, OCR confidence {:.2}%)",
                    name,
                    score,
                    confidence * 100.0
                );
            }
            DetectionEvent::Finished { matches } => {
                info!("Scan finished with {} match(es)", matches);
            }
        }
    }
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DetectionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<DetectionEvent> {
        self.events.lock().clone()
    }

    /// Remove and return all recorded events
    pub fn take(&self) -> Vec<DetectionEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: DetectionEvent) {
        self.events.lock().push(event);
    }
}
