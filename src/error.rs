//! Error types for tracking and line-crossing counting.

use std::path::PathBuf;

use thiserror::Error;

use crate::tracker::TrackId;

/// Result type alias for fallible pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Invalid configuration, rejected before any frame is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("line_position must be within [0, 1], got {0}")]
    LinePosition(f64),

    #[error("hysteresis_margin must be a finite value >= 0, got {0}")]
    HysteresisMargin(f64),

    #[error("max_age must be at least 1")]
    MaxAge,

    #[error("match_gate_distance must be a finite value > 0, got {0}")]
    MatchGateDistance(f64),

    #[error("min_confidence must be within [0, 1], got {0}")]
    MinConfidence(f64),

    #[error("iou_weight must be within [0, 1], got {0}")]
    IouWeight(f64),

    #[error("history_window must be within [2, 1024], got {0}")]
    HistoryWindow(usize),
}

/// Reason a single detection was dropped. The rest of the frame is unaffected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidDetection {
    #[error("bounding box has non-finite coordinates")]
    NonFiniteBox,

    #[error("bounding box is inverted: ({x1}, {y1}) -> ({x2}, {y2})")]
    InvertedBox { x1: f64, y1: f64, x2: f64, y2: f64 },

    #[error("confidence must be within [0, 1], got {0}")]
    Confidence(f32),

    #[error("detection belongs to frame {got}, expected frame {expected}")]
    FrameMismatch { expected: u64, got: u64 },

    #[error("unknown object class: {0}")]
    UnknownClass(String),
}

/// Caller-side ordering violations reported by the tracker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("frame {got} received after frame {previous}; frames must strictly increase")]
    FrameOutOfOrder { previous: u64, got: u64 },
}

/// Internal invariant violations detected while folding crossing events.
///
/// These indicate a bug in the crossing state machine, not bad input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CountingError {
    #[error("track {0} was already counted")]
    DuplicateCrossing(TrackId),
}

/// Crate-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("counting invariant violated: {0}")]
    Counting(#[from] CountingError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed detection frame at {path}:{line}: {source}")]
    SourceParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed configuration in {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<std::convert::Infallible> for Error {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
