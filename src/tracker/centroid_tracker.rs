//! Centroid tracker: associates each frame's detections with live tracks.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InvalidDetection, TrackingError};
use crate::tracker::matching::{self, AssignmentResult, AssignmentStrategy, Detection, Prediction};
use crate::tracker::track::{Track, TrackId, TrackSnapshot};

/// Largest accepted `history_window`. Only the last two centroids drive
/// prediction, so longer windows are only kept for inspection.
pub const MAX_HISTORY_WINDOW: usize = 1024;

/// Configuration for the CentroidTracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Consecutive unmatched frames a track survives before deletion
    pub max_age: u32,
    /// Maximum association cost, in normalized frame units
    pub match_gate_distance: f64,
    /// Weight of `1 - IoU` in the association cost, 0 for pure centroid distance
    pub iou_weight: f64,
    /// Number of centroids kept per track
    pub history_window: usize,
    /// Extrapolate positions linearly from the last two centroids
    pub extrapolate: bool,
    pub assignment: AssignmentStrategy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_age: 30,
            match_gate_distance: 0.1,
            iou_weight: 0.0,
            history_window: 16,
            extrapolate: true,
            assignment: AssignmentStrategy::Greedy,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_age == 0 {
            return Err(ConfigError::MaxAge);
        }
        if !(self.match_gate_distance.is_finite() && self.match_gate_distance > 0.0) {
            return Err(ConfigError::MatchGateDistance(self.match_gate_distance));
        }
        if !(0.0..=1.0).contains(&self.iou_weight) {
            return Err(ConfigError::IouWeight(self.iou_weight));
        }
        if !(2..=MAX_HISTORY_WINDOW).contains(&self.history_window) {
            return Err(ConfigError::HistoryWindow(self.history_window));
        }
        Ok(())
    }
}

/// Running diagnostics for one tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    pub frames: u64,
    pub rejected_detections: u64,
    pub tracks_spawned: u64,
    pub tracks_removed: u64,
}

/// Tracker output for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameTracks {
    pub frame_index: u64,
    /// One snapshot per live track, ascending by id
    pub tracks: Vec<TrackSnapshot>,
    /// Tracks deleted this frame after exceeding `max_age`
    pub removed: Vec<TrackId>,
    /// Detections dropped this frame, by input position
    pub rejected: Vec<(usize, InvalidDetection)>,
}

pub struct CentroidTracker {
    /// Live tracks, ascending by id
    tracks: Vec<Track>,
    next_id: u64,
    last_frame: Option<u64>,
    config: TrackerConfig,
    stats: TrackerStats,
}

impl CentroidTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tracks: Vec::new(),
            next_id: 1,
            last_frame: None,
            config,
            stats: TrackerStats::default(),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    pub fn live_tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks
            .binary_search_by_key(&id, Track::id)
            .ok()
            .map(|i| &self.tracks[i])
    }

    pub fn update(
        &mut self,
        frame_index: u64,
        detections: &[Detection],
    ) -> Result<FrameTracks, TrackingError> {
        if let Some(previous) = self.last_frame {
            if frame_index <= previous {
                return Err(TrackingError::FrameOutOfOrder {
                    previous,
                    got: frame_index,
                });
            }
        }
        self.last_frame = Some(frame_index);
        self.stats.frames += 1;

        // Step 1: Drop malformed detections
        let mut rejected = Vec::new();
        let mut valid: Vec<Detection> = Vec::with_capacity(detections.len());
        for (idx, det) in detections.iter().enumerate() {
            let check = if det.frame_index != frame_index {
                Err(InvalidDetection::FrameMismatch {
                    expected: frame_index,
                    got: det.frame_index,
                })
            } else {
                det.validate()
            };
            match check {
                Ok(()) => valid.push(det.clone()),
                Err(reason) => {
                    debug!("frame {frame_index}: dropping detection {idx}: {reason}");
                    rejected.push((idx, reason));
                }
            }
        }
        self.stats.rejected_detections += rejected.len() as u64;

        // Step 2: Associate with predicted track positions
        let predictions: Vec<Prediction> = self
            .tracks
            .iter()
            .map(|t| t.predict(frame_index, self.config.extrapolate))
            .collect();
        let costs = matching::cost_matrix(
            &predictions,
            &valid,
            self.config.iou_weight,
            self.config.match_gate_distance,
        );

        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::assign(&costs, self.config.match_gate_distance, self.config.assignment);

        for (itrack, idet) in matches {
            self.tracks[itrack].update(&valid[idet]);
        }

        // Step 3: Age unmatched tracks, delete stale ones
        for itrack in unmatched_tracks {
            self.tracks[itrack].mark_missed();
        }
        let max_age = self.config.max_age;
        let mut removed = Vec::new();
        self.tracks.retain(|t| {
            let keep = t.time_since_update() <= max_age;
            if !keep {
                removed.push(t.id());
            }
            keep
        });
        for id in &removed {
            debug!("frame {frame_index}: track {id} removed after {max_age} missed frames");
        }
        self.stats.tracks_removed += removed.len() as u64;

        // Step 4: Spawn tracks for unmatched detections
        for idet in unmatched_detections {
            let id = TrackId(self.next_id);
            self.next_id += 1;
            trace!("frame {frame_index}: track {id} spawned");
            self.tracks
                .push(Track::new(id, &valid[idet], self.config.history_window));
            self.stats.tracks_spawned += 1;
        }

        Ok(FrameTracks {
            frame_index,
            tracks: self.tracks.iter().map(Track::snapshot).collect(),
            removed,
            rejected,
        })
    }
}
