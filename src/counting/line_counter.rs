//! Virtual line counter with a hysteresis dead band.

use std::collections::HashMap;

use log::{debug, info};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::counting::crossing::{CrossingEvent, CrossingState, Side};
use crate::error::ConfigError;
use crate::tracker::{Category, FrameTracks, TrackId};

/// Orientation of the counting line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineAxis {
    /// Line at `y = line_position`, counting vertical motion
    #[default]
    Horizontal,
    /// Line at `x = line_position`, counting horizontal motion
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Fractional position of the line along the counting axis, in [0, 1]
    pub line_position: f64,
    /// Half-width of the dead band around the line
    pub hysteresis_margin: f64,
    /// Swap `In` and `Out`, for cameras facing the other way
    pub invert_directions: bool,
    pub axis: LineAxis,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            line_position: 0.5,
            hysteresis_margin: 0.02,
            invert_directions: false,
            axis: LineAxis::Horizontal,
        }
    }
}

impl LineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.line_position) {
            return Err(ConfigError::LinePosition(self.line_position));
        }
        if !(self.hysteresis_margin.is_finite() && self.hysteresis_margin >= 0.0) {
            return Err(ConfigError::HysteresisMargin(self.hysteresis_margin));
        }
        Ok(())
    }
}

/// Decides, at most once per track, whether and which way it crossed the line.
#[derive(Debug, Clone)]
pub struct LineCounter {
    config: LineConfig,
    band_low: f64,
    band_high: f64,
    states: HashMap<TrackId, CrossingState>,
}

impl LineCounter {
    pub fn new(config: LineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            band_low: config.line_position - config.hysteresis_margin,
            band_high: config.line_position + config.hysteresis_margin,
            config,
            states: HashMap::new(),
        })
    }

    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    /// Side of the band for a coordinate on the counting axis, `None` inside it.
    pub fn side_of(&self, coordinate: f64) -> Option<Side> {
        if coordinate < self.band_low {
            Some(Side::Above)
        } else if coordinate > self.band_high {
            Some(Side::Below)
        } else {
            None
        }
    }

    /// Current state of a track; tracks never seen are `Unknown`.
    pub fn state(&self, id: TrackId) -> CrossingState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    /// Number of tracks with crossing state held.
    pub fn tracked(&self) -> usize {
        self.states.len()
    }

    /// Discard the state of a track the tracker deleted.
    pub fn forget(&mut self, id: TrackId) {
        self.states.remove(&id);
    }

    /// Feed one observed position of a track.
    pub fn observe(
        &mut self,
        id: TrackId,
        position: Point2<f64>,
        category: Category,
        frame_index: u64,
    ) -> Option<CrossingEvent> {
        let coordinate = match self.config.axis {
            LineAxis::Horizontal => position.y,
            LineAxis::Vertical => position.x,
        };
        let side = self.side_of(coordinate);

        let state = self.states.entry(id).or_default();
        let (next, crossed) = state.step(side);
        if next != *state {
            debug!("frame {frame_index}: track {id} {:?} -> {next:?}", *state);
        }
        *state = next;

        let direction = crossed.map(|d| {
            if self.config.invert_directions {
                d.flipped()
            } else {
                d
            }
        })?;
        info!("frame {frame_index}: track {id} ({category}) crossed {direction:?}");
        Some(CrossingEvent {
            track_id: id,
            category,
            direction,
            frame_index,
        })
    }

    /// Process one frame of tracker output.
    ///
    /// Only tracks matched this frame are evaluated; state for tracks the tracker
    /// removed is dropped along with them.
    pub fn update(&mut self, frame: &FrameTracks) -> Vec<CrossingEvent> {
        for id in &frame.removed {
            self.forget(*id);
        }
        frame
            .tracks
            .iter()
            .filter(|t| t.is_observed())
            .filter_map(|t| self.observe(t.id, t.centroid, t.category, frame.frame_index))
            .collect()
    }
}
