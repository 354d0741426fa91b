//! Behavior memory port
//!
//! Aggregates how the player has fought each enemy across encounters. Only
//! the tactician instinct reads it; a missing memory means a balanced read.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::EnemyId;

/// Aggregate player behavior against one enemy
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BehaviorProfile {
    pub encounters: u32,
    /// Fraction of player actions that were basic or special attacks
    pub attack_frequency: f32,
    /// Fraction of player actions that used an item
    pub item_frequency: f32,
}

/// Player actions counted over one battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BehaviorTally {
    pub attacks: u32,
    pub defends: u32,
    pub items: u32,
    pub specials: u32,
    pub flees: u32,
}

impl BehaviorTally {
    pub fn total(&self) -> u32 {
        self.attacks + self.defends + self.items + self.specials + self.flees
    }
}

/// Cross-encounter memory keyed by enemy identifier
pub trait BehaviorMemory: Send {
    fn profile(&self, enemy: &EnemyId) -> Option<BehaviorProfile>;

    /// Fold one finished battle into the memory
    fn record(&mut self, _enemy: &EnemyId, _tally: &BehaviorTally) {}
}

/// Memory that knows nothing; every enemy sees a balanced player
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMemory;

impl BehaviorMemory for NoMemory {
    fn profile(&self, _enemy: &EnemyId) -> Option<BehaviorProfile> {
        None
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Aggregate {
    encounters: u32,
    actions: u32,
    attacks: u32,
    items: u32,
}

/// Process-local memory, enough for the CLI and tests
#[derive(Debug, Default, Clone)]
pub struct InMemoryBehaviorMemory {
    by_enemy: HashMap<EnemyId, Aggregate>,
}

impl InMemoryBehaviorMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BehaviorMemory for InMemoryBehaviorMemory {
    fn profile(&self, enemy: &EnemyId) -> Option<BehaviorProfile> {
        let agg = self.by_enemy.get(enemy)?;
        if agg.actions == 0 {
            return Some(BehaviorProfile {
                encounters: agg.encounters,
                ..BehaviorProfile::default()
            });
        }
        Some(BehaviorProfile {
            encounters: agg.encounters,
            attack_frequency: agg.attacks as f32 / agg.actions as f32,
            item_frequency: agg.items as f32 / agg.actions as f32,
        })
    }

    fn record(&mut self, enemy: &EnemyId, tally: &BehaviorTally) {
        let agg = self.by_enemy.entry(enemy.clone()).or_default();
        agg.encounters += 1;
        agg.actions += tally.total();
        agg.attacks += tally.attacks + tally.specials;
        agg.items += tally.items;
    }
}
