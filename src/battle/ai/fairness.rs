//! Fairness override for gimmick specials
//!
//! Once the enemy has acted on more than `turn_threshold` turns, any flagged
//! special used fewer than `minimum_uses` times fires with certainty. Turns
//! the enemy loses to freezes or confusion never reach a decision and so
//! never count toward the threshold.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::config::FairnessConfig;

/// Per-battle usage counts of flagged specials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FairnessTracker {
    usage: HashMap<String, u32>,
    turn_threshold: u32,
    minimum_uses: u32,
}

impl FairnessTracker {
    pub fn new(config: &FairnessConfig) -> Self {
        Self {
            usage: HashMap::new(),
            turn_threshold: config.turn_threshold,
            minimum_uses: config.minimum_uses,
        }
    }

    pub fn uses(&self, key: &str) -> u32 {
        self.usage.get(key).copied().unwrap_or(0)
    }

    pub fn record(&mut self, key: &str) {
        *self.usage.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Is this special forced to fire on the enemy's `enemy_action`-th decision?
    pub fn is_forced(&self, key: &str, enemy_action: u32) -> bool {
        enemy_action > self.turn_threshold && self.uses(key) < self.minimum_uses
    }

    /// Trigger probability after the override
    pub fn effective_chance(&self, key: &str, base_chance: f64, enemy_action: u32) -> f64 {
        if self.is_forced(key, enemy_action) {
            1.0
        } else {
            base_chance.clamp(0.0, 1.0)
        }
    }
}
