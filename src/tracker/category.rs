//! Vehicle categories and per-track majority voting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed set of counted object categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Car,
    /// Bicycles and motorcycles
    Bike,
    Bus,
    Truck,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Car, Category::Bike, Category::Bus, Category::Truck];

    /// Dense index into per-category tables.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Category::Car => 0,
            Category::Bike => 1,
            Category::Bus => 2,
            Category::Truck => 3,
        }
    }

    /// Map a COCO class name onto a counted category.
    ///
    /// Returns `None` for classes that are not counted (`person`, `dog`, ...).
    pub fn from_coco_name(name: &str) -> Option<Category> {
        match name.trim().to_ascii_lowercase().as_str() {
            "car" => Some(Category::Car),
            "bicycle" | "motorcycle" | "motorbike" | "bike" => Some(Category::Bike),
            "bus" => Some(Category::Bus),
            "truck" => Some(Category::Truck),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Car => "car",
            Category::Bike => "bike",
            Category::Bus => "bus",
            Category::Truck => "truck",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated classification evidence for one track.
///
/// Always holds at least the vote it was created with. The resolved category is
/// the one with the most votes; ties go to whichever category was observed first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryVotes {
    counts: [u32; 4],
    initial: Category,
    /// Other categories, in the order they first received a vote
    later: Vec<Category>,
}

impl CategoryVotes {
    pub fn new(initial: Category) -> Self {
        let mut counts = [0; 4];
        counts[initial.index()] = 1;
        Self {
            counts,
            initial,
            later: Vec::new(),
        }
    }

    pub fn vote(&mut self, category: Category) {
        if self.counts[category.index()] == 0 {
            self.later.push(category);
        }
        self.counts[category.index()] += 1;
    }

    pub fn count(&self, category: Category) -> u32 {
        self.counts[category.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Majority category.
    pub fn resolved(&self) -> Category {
        self.later.iter().fold(self.initial, |best, &category| {
            if self.count(category) > self.count(best) {
                category
            } else {
                best
            }
        })
    }
}
