use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

pub const DEFAULT_MAX_ABSENT_TRIES: u32 = 2;
pub const DEFAULT_MIN_ABSENT_CHECK_INTERVAL: f64 = 10000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsentResourceListConfig {
    pub max_tries: u32,
    /// Milliseconds a possibly-absent resource is held back after a failure.
    pub min_check_interval: f64,
}
impl Default for AbsentResourceListConfig {
    fn default() -> Self {
        Self {
            max_tries: DEFAULT_MAX_ABSENT_TRIES,
            min_check_interval: DEFAULT_MIN_ABSENT_CHECK_INTERVAL,
        }
    }
}
impl AbsentResourceListConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AbsentResourceListConfig = serde_json::from_str(json)?;
        if config.max_tries == 0 || !(config.min_check_interval >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "absent resource list needs max_tries > 0 and a non-negative interval, got {} and {}",
                config.max_tries, config.min_check_interval
            )));
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy)]
struct AbsentEntry {
    tries: u32,
    last_try: f64,
}

/// Remembers resources that failed to load so they are not requested on
/// every frame.
///
/// A resource that has failed `max_tries` times stays absent until it is
/// unmarked. Before that it is absent only for `min_check_interval`
/// milliseconds after each failure.
#[derive(Resource, Debug, Default)]
pub struct AbsentResourceList {
    config: AbsentResourceListConfig,
    entries: Mutex<HashMap<String, AbsentEntry>>,
}
impl AbsentResourceList {
    pub fn new(max_tries: u32, min_check_interval: f64) -> Self {
        Self::from_config(AbsentResourceListConfig {
            max_tries,
            min_check_interval,
        })
    }
    pub fn from_config(config: AbsentResourceListConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }
    pub fn max_tries(&self) -> u32 {
        self.config.max_tries
    }
    pub fn min_check_interval(&self) -> f64 {
        self.config.min_check_interval
    }
    fn entries(&self) -> MutexGuard<'_, HashMap<String, AbsentEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
    pub fn mark_resource_absent(&self, resource_id: &str) {
        self.mark_resource_absent_at(resource_id, instant::now());
    }
    pub fn mark_resource_absent_at(&self, resource_id: &str, now: f64) {
        let mut entries = self.entries();
        let entry = entries.entry(resource_id.to_string()).or_insert(AbsentEntry {
            tries: 0,
            last_try: now,
        });
        entry.tries += 1;
        entry.last_try = now;
    }
    pub fn unmark_resource_absent(&self, resource_id: &str) {
        self.entries().remove(resource_id);
    }
    pub fn is_resource_absent(&self, resource_id: &str) -> bool {
        self.is_resource_absent_at(resource_id, instant::now())
    }
    pub fn is_resource_absent_at(&self, resource_id: &str, now: f64) -> bool {
        let entries = self.entries();
        let Some(entry) = entries.get(resource_id) else {
            return false;
        };
        if entry.tries >= self.config.max_tries {
            return true;
        }
        now - entry.last_try < self.config.min_check_interval
    }
    /// Number of recorded failures for a resource.
    pub fn tries(&self, resource_id: &str) -> u32 {
        self.entries().get(resource_id).map_or(0, |e| e.tries)
    }
    pub fn clear(&self) {
        self.entries().clear();
    }
}
