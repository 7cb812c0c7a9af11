//! Contracts for the backing stores the resolver reads from, plus thread-safe in-memory
//! implementations.
//!
//! Stores are read-only from the resolver's point of view: nothing in this crate mutates a
//! definition, experiment, or flag it has been handed.
use std::sync::RwLock;

use crate::{
    error::StoreError, experiment::Experiment, flags::FeatureFlag, model::Brand,
    model::ScreenDefinition,
};

pub trait ScreenStore {
    /// Find a published definition matching `(screen_id, brand, segment)` exactly. `segment: None`
    /// matches only definitions without a segment.
    fn find_published(
        &self,
        screen_id: &str,
        brand: Brand,
        segment: Option<&str>,
    ) -> Result<Option<ScreenDefinition>, StoreError>;
}

pub trait ExperimentStore {
    fn find_active(&self, screen_id: &str, brand: Brand) -> Result<Option<Experiment>, StoreError>;
}

pub trait FlagStore {
    fn list_all(&self) -> Result<Vec<FeatureFlag>, StoreError>;
}

/// In-memory [`ScreenStore`].
#[derive(Default)]
pub struct InMemoryScreenStore {
    screens: RwLock<Vec<ScreenDefinition>>,
}

impl InMemoryScreenStore {
    pub fn new() -> Self {
        InMemoryScreenStore::default()
    }

    pub fn insert(&self, definition: ScreenDefinition) {
        self.screens
            .write()
            .expect("thread holding screen store lock should not panic")
            .push(definition);
    }
}

impl ScreenStore for InMemoryScreenStore {
    fn find_published(
        &self,
        screen_id: &str,
        brand: Brand,
        segment: Option<&str>,
    ) -> Result<Option<ScreenDefinition>, StoreError> {
        let screens = self
            .screens
            .read()
            .map_err(|_| StoreError::Unavailable("screen store lock poisoned".into()))?;

        Ok(screens
            .iter()
            .filter(|s| {
                s.published
                    && s.screen_id == screen_id
                    && s.brand == brand
                    && s.segment.as_deref() == segment
            })
            .max_by_key(|s| s.version)
            .cloned())
    }
}

/// In-memory [`ExperimentStore`].
#[derive(Default)]
pub struct InMemoryExperimentStore {
    experiments: RwLock<Vec<Experiment>>,
}

impl InMemoryExperimentStore {
    pub fn new() -> Self {
        InMemoryExperimentStore::default()
    }

    pub fn insert(&self, experiment: Experiment) {
        self.experiments
            .write()
            .expect("thread holding experiment store lock should not panic")
            .push(experiment);
    }
}

impl ExperimentStore for InMemoryExperimentStore {
    fn find_active(&self, screen_id: &str, brand: Brand) -> Result<Option<Experiment>, StoreError> {
        let experiments = self
            .experiments
            .read()
            .map_err(|_| StoreError::Unavailable("experiment store lock poisoned".into()))?;

        Ok(experiments
            .iter()
            .find(|e| e.active && e.screen_id == screen_id && e.brand == brand)
            .cloned())
    }
}

/// In-memory [`FlagStore`].
#[derive(Default)]
pub struct InMemoryFlagStore {
    flags: RwLock<Vec<FeatureFlag>>,
}

impl InMemoryFlagStore {
    pub fn new() -> Self {
        InMemoryFlagStore::default()
    }

    /// Insert `flag`, replacing any flag with the same key.
    pub fn upsert(&self, flag: FeatureFlag) {
        let mut flags = self
            .flags
            .write()
            .expect("thread holding flag store lock should not panic");
        flags.retain(|f| f.key != flag.key);
        flags.push(flag);
    }
}

impl FlagStore for InMemoryFlagStore {
    fn list_all(&self) -> Result<Vec<FeatureFlag>, StoreError> {
        let flags = self
            .flags
            .read()
            .map_err(|_| StoreError::Unavailable("flag store lock poisoned".into()))?;
        Ok(flags.clone())
    }
}
