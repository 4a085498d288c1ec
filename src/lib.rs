//! Unique, category-aware counting of objects crossing a virtual line.
//!
//! Per-frame detections flow through three components, strictly in order:
//!
//! 1. [`CentroidTracker`] associates detections with live tracks and gives each
//!    physical object a stable [`TrackId`].
//! 2. [`LineCounter`] runs a hysteresis state machine per track and emits at most
//!    one [`CrossingEvent`] per track, ever.
//! 3. [`Aggregator`] folds events into a [`CountsSummary`].
//!
//! [`CountingPipeline`] bundles the three for one video stream.
//!
//! ```
//! use linecount_rs::{Category, CounterConfig, CountingPipeline, DetectionBuilder, Frame};
//!
//! let mut config = CounterConfig::default();
//! config.tracker.match_gate_distance = 0.25;
//! let mut pipeline = CountingPipeline::new(config).unwrap();
//!
//! for (i, y) in [0.30, 0.40, 0.52, 0.60].into_iter().enumerate() {
//!     let frame_index = i as u64 + 1;
//!     let det = DetectionBuilder::new()
//!         .xywh(0.5, y, 0.1, 0.1)
//!         .category(Category::Car)
//!         .confidence(0.9)
//!         .frame(frame_index)
//!         .build()
//!         .unwrap();
//!     pipeline.process_frame(&Frame::new(frame_index, vec![det])).unwrap();
//! }
//!
//! let summary = pipeline.summary();
//! assert_eq!(summary.total, 1);
//! assert_eq!(summary.total_in(), 1);
//! ```

pub mod counting;
pub mod error;
pub mod integration;
pub mod tracker;

pub use counting::{
    Aggregator, CountsSummary, CrossingEvent, CrossingState, Direction, LineAxis, LineConfig,
    LineCounter,
};
pub use error::{ConfigError, CountingError, Error, InvalidDetection, Result, TrackingError};
pub use integration::{
    CounterConfig, CountingPipeline, DetectionBuilder, DetectionSource, Frame, JsonLinesSource,
};
pub use tracker::{
    AssignmentStrategy, Category, CentroidTracker, Detection, FrameTracks, Rect, TrackId,
    TrackSnapshot, TrackerConfig,
};
