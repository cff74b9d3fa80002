use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::models::{Target, TargetConfig};

/// The whole persisted collection, loaded and saved as one unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub targets: BTreeMap<String, Target>,
    // Reserved section, carried through untouched
    #[serde(default)]
    pub email: serde_json::Map<String, serde_json::Value>,
}

impl Snapshot {
    /// Insert a new target or overwrite only the configuration of an existing one.
    pub fn upsert(&mut self, url: &str, config: TargetConfig) -> &Target {
        self.targets
            .entry(url.to_string())
            .and_modify(|target| target.apply_config(config.clone()))
            .or_insert_with(|| Target::new(url, config))
    }

    pub fn get(&self, url: &str) -> Option<&Target> {
        self.targets.get(url)
    }

    pub fn get_mut(&mut self, url: &str) -> Option<&mut Target> {
        self.targets.get_mut(url)
    }

    /// Targets ordered by URL.
    pub fn all(&self) -> Vec<&Target> {
        self.targets.values().collect()
    }

    pub fn remove(&mut self, url: &str) -> Option<Target> {
        self.targets.remove(url)
    }

    pub fn urls(&self) -> Vec<String> {
        self.targets.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
