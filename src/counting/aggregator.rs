//! Folds crossing events into a running summary.

use log::warn;

use crate::counting::crossing::CrossingEvent;
use crate::counting::summary::CountsSummary;
use crate::error::CountingError;

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    summary: CountsSummary,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one crossing.
    ///
    /// A second event for an already counted track is an invariant violation:
    /// it is reported and the totals are left untouched.
    pub fn apply(&mut self, event: &CrossingEvent) -> Result<(), CountingError> {
        if !self.summary.counted_track_ids.insert(event.track_id) {
            warn!(
                "track {} already counted, refusing crossing at frame {}",
                event.track_id, event.frame_index
            );
            return Err(CountingError::DuplicateCrossing(event.track_id));
        }

        self.summary.total += 1;
        self.summary.by_category.increment(event.category);
        let directional = self.summary.directional_mut(event.direction);
        directional.total += 1;
        directional.by_category.increment(event.category);
        Ok(())
    }

    /// Apply events in order, stopping at the first invariant violation.
    pub fn apply_all<I>(&mut self, events: I) -> Result<(), CountingError>
    where
        I: IntoIterator<Item = CrossingEvent>,
    {
        events.into_iter().try_for_each(|e| self.apply(&e))
    }

    /// Copy of the current totals.
    pub fn snapshot(&self) -> CountsSummary {
        self.summary.clone()
    }

    pub fn total(&self) -> u64 {
        self.summary.total
    }
}
