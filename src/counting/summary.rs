//! Aggregate counts in the `total` / `by_category` / `in` / `out` shape.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::counting::crossing::Direction;
use crate::tracker::{Category, TrackId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub car: u64,
    pub bike: u64,
    pub bus: u64,
    pub truck: u64,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Car => self.car,
            Category::Bike => self.bike,
            Category::Bus => self.bus,
            Category::Truck => self.truck,
        }
    }

    fn slot(&mut self, category: Category) -> &mut u64 {
        match category {
            Category::Car => &mut self.car,
            Category::Bike => &mut self.bike,
            Category::Bus => &mut self.bus,
            Category::Truck => &mut self.truck,
        }
    }

    pub(crate) fn increment(&mut self, category: Category) {
        *self.slot(category) += 1;
    }

    pub fn sum(&self) -> u64 {
        Category::ALL.iter().map(|&c| self.get(c)).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionalCounts {
    pub total: u64,
    pub by_category: CategoryCounts,
}

/// Snapshot of every tally accumulated so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountsSummary {
    pub total: u64,
    pub by_category: CategoryCounts,
    #[serde(rename = "in")]
    pub inbound: DirectionalCounts,
    pub out: DirectionalCounts,
    pub counted_track_ids: BTreeSet<TrackId>,
}

impl CountsSummary {
    pub fn total_in(&self) -> u64 {
        self.inbound.total
    }

    pub fn total_out(&self) -> u64 {
        self.out.total
    }

    pub fn directional(&self, direction: Direction) -> &DirectionalCounts {
        match direction {
            Direction::In => &self.inbound,
            Direction::Out => &self.out,
        }
    }

    pub(crate) fn directional_mut(&mut self, direction: Direction) -> &mut DirectionalCounts {
        match direction {
            Direction::In => &mut self.inbound,
            Direction::Out => &mut self.out,
        }
    }

    /// Count for one (category, direction) cell.
    pub fn count(&self, category: Category, direction: Direction) -> u64 {
        self.directional(direction).by_category.get(category)
    }

    /// Whether all totals agree with each other and with the counted ids.
    pub fn is_consistent(&self) -> bool {
        let cells_agree = Category::ALL.iter().all(|&c| {
            self.by_category.get(c) == self.count(c, Direction::In) + self.count(c, Direction::Out)
        });
        cells_agree
            && self.by_category.sum() == self.total
            && self.inbound.total + self.out.total == self.total
            && self.inbound.by_category.sum() == self.inbound.total
            && self.out.by_category.sum() == self.out.total
            && self.counted_track_ids.len() as u64 == self.total
    }
}
