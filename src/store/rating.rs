//! Running rating aggregates, one per laptop

use serde::{Deserialize, Serialize};

use super::memory::MemoryStore;

/// Running count and sum of scores for one laptop
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    pub count: u32,
    pub sum: f64,
}

impl Rating {
    /// Mean score, or `None` before the first rating
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}

#[derive(Default)]
pub struct RatingStore {
    ratings: MemoryStore<String, Rating>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one score to the laptop's aggregate and return the updated copy
    pub async fn add(&self, laptop_id: &str, score: f64) -> Rating {
        self.ratings
            .upsert(laptop_id.to_string(), Rating::default, |rating| {
                rating.count += 1;
                rating.sum += score;
            })
            .await
    }
}
