//! CountingPipeline: Tracker → LineCounter → Aggregator for one stream.

use std::collections::VecDeque;

use serde::Serialize;

use crate::counting::{Aggregator, CountsSummary, CrossingEvent, LineCounter};
use crate::error::{ConfigError, Error};
use crate::tracker::{CentroidTracker, Detection};

use super::{CounterConfig, DetectionSource, Frame};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub frames: u64,
    /// Dropped by the `min_confidence` filter
    pub below_confidence: u64,
    /// Dropped by the detection adapter before reaching the pipeline
    pub adapter_rejected: u64,
    /// Dropped by the tracker as malformed
    pub tracker_rejected: u64,
    pub crossings: u64,
}

impl PipelineStats {
    /// Malformed or unmappable detections, excluding low-confidence ones.
    pub fn rejected_detections(&self) -> u64 {
        self.adapter_rejected + self.tracker_rejected
    }
}

/// One Tracker + LineCounter + Aggregator triple.
///
/// Frames must be fed in order; run one pipeline per video stream.
pub struct CountingPipeline {
    tracker: CentroidTracker,
    counter: LineCounter,
    aggregator: Aggregator,
    min_confidence: f32,
    stats: PipelineStats,
}

impl CountingPipeline {
    pub fn new(config: CounterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tracker: CentroidTracker::new(config.tracker)?,
            counter: LineCounter::new(config.line)?,
            aggregator: Aggregator::new(),
            min_confidence: config.min_confidence as f32,
            stats: PipelineStats::default(),
        })
    }

    /// Run one frame through the tracker, the line counter and the aggregator.
    ///
    /// Returns the crossings completed in this frame.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<Vec<CrossingEvent>, Error> {
        // Compared in the detections' own precision so a score equal to the
        // threshold is kept.
        let mut below_confidence = 0;
        let mut kept: Vec<Detection> = Vec::with_capacity(frame.detections.len());
        for det in &frame.detections {
            if det.confidence < self.min_confidence {
                below_confidence += 1;
            } else {
                kept.push(det.clone());
            }
        }

        // A frame the tracker refuses leaves every counter untouched.
        let tracks = self.tracker.update(frame.frame_index, &kept)?;
        self.stats.frames += 1;
        self.stats.below_confidence += below_confidence;
        self.stats.adapter_rejected += frame.rejected as u64;
        self.stats.tracker_rejected += tracks.rejected.len() as u64;

        let events = self.counter.update(&tracks);
        for event in &events {
            self.aggregator.apply(event)?;
            self.stats.crossings += 1;
        }
        Ok(events)
    }

    /// Lazily pull frames from `source`, yielding crossings as they complete.
    ///
    /// The iterator ends at the end of the source or after the first error.
    pub fn crossings<D: DetectionSource>(&mut self, source: D) -> Crossings<'_, D> {
        Crossings {
            pipeline: self,
            source,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Drain `source` and return the final summary.
    pub fn run<D>(&mut self, source: D) -> Result<CountsSummary, Error>
    where
        D: DetectionSource,
        Error: From<D::Error>,
    {
        for event in self.crossings(source) {
            event?;
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> CountsSummary {
        self.aggregator.snapshot()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn tracker(&self) -> &CentroidTracker {
        &self.tracker
    }

    pub fn counter(&self) -> &LineCounter {
        &self.counter
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }
}

/// Lazy stream of crossing events. See [`CountingPipeline::crossings`].
pub struct Crossings<'a, D> {
    pipeline: &'a mut CountingPipeline,
    source: D,
    pending: VecDeque<CrossingEvent>,
    finished: bool,
}

impl<D> Iterator for Crossings<'_, D>
where
    D: DetectionSource,
    Error: From<D::Error>,
{
    type Item = Result<CrossingEvent, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }

            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            };
            match self.pipeline.process_frame(&frame) {
                Ok(events) => self.pending.extend(events),
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
