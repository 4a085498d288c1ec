//! Crossing state machine and the events it emits.

use serde::{Deserialize, Serialize};

use crate::tracker::{Category, TrackId};

/// Direction of a counted crossing.
///
/// Without inversion, `In` is motion from the low-coordinate side of the line to
/// the high-coordinate side (top to bottom for a horizontal line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::In, Direction::Out];

    #[inline]
    pub fn flipped(self) -> Direction {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }
}

/// Which side of the hysteresis band a position falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Below `line_position - margin` on the counting axis (above the line on screen)
    Above,
    /// Beyond `line_position + margin` on the counting axis
    Below,
}

/// Per-track crossing progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossingState {
    /// No side established yet
    #[default]
    Unknown,
    AboveBand,
    BelowBand,
    /// Terminal: the track has been counted
    Counted,
}

impl CrossingState {
    /// Advance with the side resolved for the latest position.
    ///
    /// `side` is `None` while the position is inside the dead band. Returns the
    /// new state and, on a completed crossing, its un-inverted direction.
    pub fn step(self, side: Option<Side>) -> (CrossingState, Option<Direction>) {
        match (self, side) {
            (CrossingState::Counted, _) | (_, None) => (self, None),
            (CrossingState::Unknown, Some(Side::Above)) => (CrossingState::AboveBand, None),
            (CrossingState::Unknown, Some(Side::Below)) => (CrossingState::BelowBand, None),
            (CrossingState::AboveBand, Some(Side::Above)) => (self, None),
            (CrossingState::BelowBand, Some(Side::Below)) => (self, None),
            (CrossingState::AboveBand, Some(Side::Below)) => {
                (CrossingState::Counted, Some(Direction::In))
            }
            (CrossingState::BelowBand, Some(Side::Above)) => {
                (CrossingState::Counted, Some(Direction::Out))
            }
        }
    }

    #[inline]
    pub fn is_counted(self) -> bool {
        self == CrossingState::Counted
    }
}

/// The single, terminal notification that a track crossed the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingEvent {
    pub track_id: TrackId,
    pub category: Category,
    pub direction: Direction,
    pub frame_index: u64,
}
