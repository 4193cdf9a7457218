//! Laptop repository
//!
//! Sole owner of catalog records. Every laptop handed in or out is an
//! independent copy.

use std::future::Future;

use tracing::debug;

use super::memory::MemoryStore;
use crate::models::{Filter, Laptop};
use crate::services::CallContext;
use crate::types::{CatalogError, Result};

#[derive(Default)]
pub struct LaptopStore {
    laptops: MemoryStore<String, Laptop>,
}

impl LaptopStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a copy of `laptop`. Fails with `AlreadyExists` if the id is taken.
    pub async fn save(&self, laptop: &Laptop) -> Result<()> {
        self.laptops
            .insert(laptop.id.clone(), laptop)
            .await
            .map_err(|_| CatalogError::AlreadyExists(laptop.id.clone()))
    }

    /// Copy of the laptop with `id`, or `None` on a miss
    pub async fn find(&self, id: &str) -> Option<Laptop> {
        self.laptops.get(&id.to_string()).await
    }

    /// Whether a laptop with this id is stored
    pub async fn exists(&self, id: &str) -> bool {
        self.laptops.contains(&id.to_string()).await
    }

    pub async fn len(&self) -> usize {
        self.laptops.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.laptops.is_empty().await
    }

    /// Visit every stored laptop and hand a copy of each one matching
    /// `filter` to `found`.
    ///
    /// `ctx` is checked before each visit. A failure from `found` aborts the
    /// scan and is returned as is. The lock is only held while copying a
    /// single record, never while `found` runs.
    pub async fn search<F, Fut>(&self, ctx: &CallContext, filter: &Filter, mut found: F) -> Result<()>
    where
        F: FnMut(Laptop) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        for id in self.laptops.keys().await {
            ctx.check()?;

            // Absent only if removed since the key snapshot
            let Some(laptop) = self.laptops.get(&id).await else {
                continue;
            };

            if filter.is_qualified(&laptop) {
                debug!(laptop_id = %laptop.id, "laptop matches filter");
                found(laptop).await?;
            }
        }

        Ok(())
    }
}
