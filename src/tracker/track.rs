//! Single object track.

use std::collections::VecDeque;
use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::tracker::category::{Category, CategoryVotes};
use crate::tracker::matching::{Detection, Prediction};
use crate::tracker::rect::Rect;

/// Identity of a track, unique within one tracker instance and never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One observed position of a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub frame_index: u64,
    pub centroid: Point2<f64>,
}

/// Per-object state owned by the tracker.
#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    history: VecDeque<Observation>,
    history_window: usize,
    votes: CategoryVotes,
    bbox: Rect,
    /// Number of frames this track has been matched in, including its first
    age: u32,
    /// Consecutive frames without a matching detection
    time_since_update: u32,
}

impl Track {
    pub(crate) fn new(id: TrackId, detection: &Detection, history_window: usize) -> Self {
        let mut history = VecDeque::new();
        history.push_back(Observation {
            frame_index: detection.frame_index,
            centroid: detection.centroid(),
        });
        Self {
            id,
            history,
            history_window,
            votes: CategoryVotes::new(detection.category),
            bbox: detection.bbox,
            age: 1,
            time_since_update: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> TrackId {
        self.id
    }

    #[inline]
    pub fn age(&self) -> u32 {
        self.age
    }

    #[inline]
    pub fn time_since_update(&self) -> u32 {
        self.time_since_update
    }

    /// Last detected bounding box.
    #[inline]
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    pub fn votes(&self) -> &CategoryVotes {
        &self.votes
    }

    /// Oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Observation> {
        self.history.iter()
    }

    fn last(&self) -> &Observation {
        // The history is seeded on creation and only ever trimmed from the front
        // after a push, so it is never empty.
        &self.history[self.history.len() - 1]
    }

    /// Last observed centroid.
    pub fn centroid(&self) -> Point2<f64> {
        self.last().centroid
    }

    pub fn resolved_category(&self) -> Category {
        self.votes.resolved()
    }

    /// Expected position at `frame_index`.
    ///
    /// With `extrapolate`, the velocity between the last two observations is
    /// carried forward over the frames elapsed since the last one.
    pub fn predict(&self, frame_index: u64, extrapolate: bool) -> Prediction {
        let last = *self.last();
        let mut centroid = last.centroid;

        if extrapolate && self.history.len() >= 2 {
            let prev = self.history[self.history.len() - 2];
            let span = last.frame_index.saturating_sub(prev.frame_index);
            if span > 0 {
                let velocity = (last.centroid - prev.centroid) / span as f64;
                let elapsed = frame_index.saturating_sub(last.frame_index) as f64;
                centroid += velocity * elapsed;
            }
        }

        Prediction {
            centroid,
            bbox: self.bbox.recentered(centroid),
        }
    }

    pub(crate) fn update(&mut self, detection: &Detection) {
        self.history.push_back(Observation {
            frame_index: detection.frame_index,
            centroid: detection.centroid(),
        });
        while self.history.len() > self.history_window {
            self.history.pop_front();
        }
        self.votes.vote(detection.category);
        self.bbox = detection.bbox;
        self.time_since_update = 0;
        self.age += 1;
    }

    pub(crate) fn mark_missed(&mut self) {
        self.time_since_update += 1;
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            id: self.id,
            centroid: self.centroid(),
            category: self.resolved_category(),
            age: self.age,
            time_since_update: self.time_since_update,
        }
    }
}

/// Read-only view of a live track, produced once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSnapshot {
    pub id: TrackId,
    /// Last observed centroid
    pub centroid: Point2<f64>,
    /// Majority-vote category
    pub category: Category,
    pub age: u32,
    pub time_since_update: u32,
}

impl TrackSnapshot {
    /// Whether the track was matched in the frame this snapshot came from.
    #[inline]
    pub fn is_observed(&self) -> bool {
        self.time_since_update == 0
    }
}
