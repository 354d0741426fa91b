//! Progression store port
//!
//! Read once when a battle starts, written once at the terminal state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::ItemId;

/// Player progression snapshot the engine seeds combatants from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionRecord {
    #[serde(default = "default_name")]
    pub name: String,
    pub level: u32,
    pub xp: u64,
    pub hp: u32,
    pub max_hp: u32,
    /// Attack gauge baseline
    pub attack: u32,
    /// Defense gauge baseline
    pub defense: u32,
    #[serde(default)]
    pub inventory: BTreeMap<ItemId, u32>,
}

fn default_name() -> String {
    "Hero".to_string()
}

impl Default for ProgressionRecord {
    fn default() -> Self {
        Self {
            name: default_name(),
            level: 1,
            xp: 0,
            hp: 100,
            max_hp: 100,
            attack: 100,
            defense: 100,
            inventory: BTreeMap::new(),
        }
    }
}

impl ProgressionRecord {
    pub fn item_count(&self, item: &ItemId) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    pub fn with_item(mut self, item: impl Into<ItemId>, count: u32) -> Self {
        self.inventory.insert(item.into(), count);
        self
    }
}

/// External store of the player's progression
pub trait ProgressionStore: Send {
    fn load(&self) -> Result<ProgressionRecord>;
    fn save(&mut self, record: &ProgressionRecord) -> Result<()>;
}

/// Store backed by a plain value
#[derive(Debug, Clone, Default)]
pub struct InMemoryProgression {
    record: ProgressionRecord,
    saves: u32,
}

impl InMemoryProgression {
    pub fn new(record: ProgressionRecord) -> Self {
        Self { record, saves: 0 }
    }

    pub fn record(&self) -> &ProgressionRecord {
        &self.record
    }

    /// Number of write-backs so far
    pub fn saves(&self) -> u32 {
        self.saves
    }
}

impl ProgressionStore for InMemoryProgression {
    fn load(&self) -> Result<ProgressionRecord> {
        Ok(self.record.clone())
    }

    fn save(&mut self, record: &ProgressionRecord) -> Result<()> {
        self.record = record.clone();
        self.saves += 1;
        Ok(())
    }
}
