mod aggregator;
mod crossing;
mod line_counter;
mod summary;

pub use aggregator::Aggregator;
pub use crossing::{CrossingEvent, CrossingState, Direction, Side};
pub use line_counter::{LineAxis, LineConfig, LineCounter};
pub use summary::{CategoryCounts, CountsSummary, DirectionalCounts};
