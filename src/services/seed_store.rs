use std::sync::Arc;

use crate::{
    db::{read_json, write_json, write_json_if_absent, KeyValueStore, StorageKey},
    error::AppResult,
    models::{Identity, Seed},
    services::signals::{Signal, SignalBus},
};

/// Holds the single most recent seed per identity
#[derive(Clone)]
pub struct SeedStore {
    store: Arc<dyn KeyValueStore>,
    bus: SignalBus,
}

impl SeedStore {
    pub fn new(store: Arc<dyn KeyValueStore>, bus: SignalBus) -> Self {
        Self { store, bus }
    }

    /// Replaces the identity's seed and announces the change
    ///
    /// Recomputation happens asynchronously in whoever listens for
    /// [`Signal::SeedChanged`]; this call never triggers it directly.
    pub async fn write_seed(&self, identity: &Identity, seed: &Seed) -> AppResult<()> {
        self.persist_seed(identity, seed).await?;
        self.bus.publish(Signal::SeedChanged {
            identity: identity.clone(),
        });
        Ok(())
    }

    /// Replaces the identity's seed without announcing it
    pub async fn persist_seed(&self, identity: &Identity, seed: &Seed) -> AppResult<()> {
        write_json(self.store.as_ref(), &StorageKey::Seed(identity.clone()), seed).await?;
        tracing::debug!(identity = %identity, ?seed, "Seed stored");
        Ok(())
    }

    /// Stores `seed` without announcing it, unless the identity already has one
    ///
    /// Returns whether `seed` was stored.
    pub async fn persist_seed_if_absent(
        &self,
        identity: &Identity,
        seed: &Seed,
    ) -> AppResult<bool> {
        let key = StorageKey::Seed(identity.clone());
        let stored = write_json_if_absent(self.store.as_ref(), &key, seed).await?;
        if stored {
            tracing::debug!(identity = %identity, ?seed, "Seed stored");
        }
        Ok(stored)
    }

    /// Returns the stored seed; unreadable entries count as absent
    pub async fn read_seed(&self, identity: &Identity) -> Option<Seed> {
        match read_json(self.store.as_ref(), &StorageKey::Seed(identity.clone())).await {
            Ok(seed) => seed,
            Err(e) => {
                tracing::warn!(error = %e, identity = %identity, "Ignoring unreadable seed");
                None
            }
        }
    }
}
