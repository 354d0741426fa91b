//! Outcome and loot resolution
//!
//! Runs exactly once per session, after a terminal transition. All changes
//! are computed on a copy of the progression record and committed in one
//! assignment.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::actions::ItemKind;
use crate::battle::combatant::Combatant;
use crate::battle::session::BattleState;
use crate::core::config::OutcomeConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::types::ItemId;
use crate::ports::progression::ProgressionRecord;

/// One entry of an enemy loot table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootDrop {
    pub id: ItemId,
    pub chance: f64,
}

/// Rewards an enemy can drop on victory
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LootTable {
    /// Inclusive XP range; the level/tier formula applies when absent
    #[serde(default, rename = "xp_coins")]
    pub xp: Option<(u32, u32)>,
    #[serde(default)]
    pub items: Vec<LootDrop>,
}

/// What the outcome changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loot {
    pub result: BattleState,
    pub xp_delta: i64,
    pub items_gained: Vec<ItemId>,
    pub items_lost: Vec<ItemId>,
}

impl Loot {
    fn empty(result: BattleState) -> Self {
        Self {
            result,
            xp_delta: 0,
            items_gained: Vec::new(),
            items_lost: Vec::new(),
        }
    }
}

/// XP for beating `enemy`: the table range if any, else level x tier scaling
pub fn victory_xp<R: Rng>(config: &OutcomeConfig, enemy: &Combatant, table: Option<&LootTable>, rng: &mut R) -> u32 {
    if let Some((a, b)) = table.and_then(|t| t.xp) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        return rng.gen_range(lo..=hi);
    }
    let tier = enemy.tier().value().saturating_sub(1) as f32;
    let base = config.xp_per_level as f32 * enemy.level as f32;
    (base * (1.0 + config.tier_multiplier * tier)).round() as u32
}

/// XP lost on defeat: a fraction of current XP or a level-scaled floor, never more than held
pub fn defeat_penalty(config: &OutcomeConfig, level: u32, xp: u64) -> u64 {
    let fraction = (xp as f64 * config.defeat_xp_fraction as f64).floor() as u64;
    let flat = config.defeat_xp_per_level as u64 * level as u64;
    fraction.max(flat).min(xp)
}

/// Guard plus the resolution logic
#[derive(Debug, Clone, Default)]
pub struct OutcomeResolver {
    resolved: Option<Loot>,
}

impl OutcomeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn loot(&self) -> Option<&Loot> {
        self.resolved.as_ref()
    }

    /// Compute and commit the outcome into `record`
    ///
    /// `inventory` is the session's item counts after mid-battle consumption.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve<R: Rng>(
        &mut self,
        state: BattleState,
        player: &Combatant,
        enemy: &Combatant,
        table: Option<&LootTable>,
        inventory: &BTreeMap<ItemId, u32>,
        config: &OutcomeConfig,
        record: &mut ProgressionRecord,
        rng: &mut R,
    ) -> Result<Loot> {
        if !state.is_terminal() {
            return Err(ArenaError::NotTerminal { state });
        }
        if self.resolved.is_some() {
            tracing::error!(?state, "outcome resolver invoked twice");
            return Err(ArenaError::OutcomeAlreadyResolved);
        }

        let mut next = record.clone();
        next.inventory = inventory.clone();
        next.inventory.retain(|_, count| *count > 0);
        let mut loot = Loot::empty(state);

        match state {
            BattleState::Victory => {
                let xp = victory_xp(config, enemy, table, rng);
                next.xp = next.xp.saturating_add(xp as u64);
                loot.xp_delta = xp as i64;

                for drop in table.map(|t| t.items.as_slice()).unwrap_or_default() {
                    if rng.gen_bool(drop.chance.clamp(0.0, 1.0)) {
                        *next.inventory.entry(drop.id.clone()).or_insert(0) += 1;
                        loot.items_gained.push(drop.id.clone());
                    }
                }
                next.hp = player.hp.value();
            }
            BattleState::Defeat => {
                let penalty = defeat_penalty(config, player.level, next.xp);
                next.xp -= penalty;
                loot.xp_delta = -(penalty as i64);

                if rng.gen_bool(config.item_loss_chance.clamp(0.0, 1.0)) {
                    let held: Vec<ItemId> = next
                        .inventory
                        .iter()
                        .filter(|(id, count)| **count > 0 && ItemKind::from_item_id(id).is_some())
                        .map(|(id, _)| id.clone())
                        .collect();
                    if !held.is_empty() {
                        let lost = held[rng.gen_range(0..held.len())].clone();
                        if let Some(count) = next.inventory.get_mut(&lost) {
                            *count -= 1;
                        }
                        next.inventory.retain(|_, count| *count > 0);
                        loot.items_lost.push(lost);
                    }
                }

                let revive = (next.max_hp as f32 * config.defeat_revive_fraction).floor() as u32;
                next.hp = revive.clamp(1, next.max_hp.max(1));
            }
            // Fled: nothing beyond what the battle already consumed
            _ => {
                next.hp = player.hp.value();
            }
        }

        *record = next;
        tracing::info!(
            result = ?state,
            xp_delta = loot.xp_delta,
            gained = loot.items_gained.len(),
            lost = loot.items_lost.len(),
            "outcome committed"
        );
        self.resolved = Some(loot.clone());
        Ok(loot)
    }
}
