mod category;
mod centroid_tracker;
mod matching;
mod rect;
mod track;

pub use category::{Category, CategoryVotes};
pub use centroid_tracker::{
    CentroidTracker, FrameTracks, MAX_HISTORY_WINDOW, TrackerConfig, TrackerStats,
};
pub use matching::{
    AssignmentResult, AssignmentStrategy, Detection, Prediction, assign, cost_matrix,
    greedy_assignment, optimal_assignment,
};
pub use rect::Rect;
pub use track::{Observation, Track, TrackId, TrackSnapshot};
