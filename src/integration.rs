//! Integration module for connecting detection adapters with the counting core.
//!
//! This module provides the detection builder and source trait used at the
//! boundary with upstream detectors, a JSON Lines recording reader, and the
//! `CountingPipeline` that runs Tracker → LineCounter → Aggregator per frame.

mod builder;
mod config;
mod detector;
mod jsonl;
mod pipeline;

pub use builder::DetectionBuilder;
pub use config::CounterConfig;
pub use detector::{DetectionSource, Frame, FrameIter, frames};
pub use jsonl::{JsonLinesSource, RawDetection, RawFrame};
pub use pipeline::{CountingPipeline, Crossings, PipelineStats};
