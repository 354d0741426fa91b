//! Battle configuration with documented constants
//!
//! Every balance number the engine uses is collected here. Values load from
//! TOML (`data/battle.toml`); missing sections fall back to the defaults in
//! `battle::constants`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::battle::ai::AiTuning;
use crate::battle::constants::*;
use crate::core::error::{ArenaError, Result};

/// Gauge regeneration and focus gain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GaugeConfig {
    /// Upper bound of every action gauge
    pub max: u32,
    /// Player attack-gauge regen per completed turn pair
    pub player_attack_regen: u32,
    /// Player defense-gauge regen per completed turn pair
    pub player_defense_regen: u32,
    /// Enemy attack-gauge regen per completed turn pair
    pub enemy_attack_regen: u32,
    /// Enemy defense-gauge regen per completed turn pair
    pub enemy_defense_regen: u32,
    /// Focus gained by a basic attack
    pub focus_per_attack: u32,
    /// Focus gained by defending
    pub focus_per_defend: u32,
    /// Enemy defense gauge max = defense stat x this factor (capped at `max`)
    pub enemy_defense_factor: u32,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            max: GAUGE_MAX,
            player_attack_regen: PLAYER_ATTACK_REGEN,
            player_defense_regen: PLAYER_DEFENSE_REGEN,
            enemy_attack_regen: ENEMY_ATTACK_REGEN,
            enemy_defense_regen: ENEMY_DEFENSE_REGEN,
            focus_per_attack: FOCUS_PER_ATTACK,
            focus_per_defend: FOCUS_PER_DEFEND,
            enemy_defense_factor: ENEMY_DEFENSE_GAUGE_FACTOR,
        }
    }
}

/// Attack-gauge cost of every action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub basic_attack: u32,
    pub enemy_attack: u32,
    pub enemy_ability: u32,
    pub fireball: u32,
    pub star_shield: u32,
    pub frost_orb: u32,
    pub poison_dart: u32,
    pub thunder: u32,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            basic_attack: BASIC_ATTACK_COST,
            enemy_attack: ENEMY_ATTACK_COST,
            enemy_ability: ENEMY_ABILITY_COST,
            fireball: FIREBALL_COST,
            star_shield: STAR_SHIELD_COST,
            frost_orb: FROST_ORB_COST,
            poison_dart: POISON_DART_COST,
            thunder: THUNDER_COST,
        }
    }
}

/// Damage and heal magnitudes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageConfig {
    /// Player basic attack roll at level 1
    pub player_strike_min: u32,
    pub player_strike_max: u32,
    /// Added to both strike bounds per level above 1
    pub player_strike_per_level: u32,
    /// Enemy basic attack rolls `power +/- spread`
    pub enemy_strike_spread: u32,
    /// Focus (special) attack roll at level 1
    pub special_min: u32,
    pub special_max: u32,
    pub special_per_level: u32,
    /// Player level required before the special attack can fire
    pub special_unlock_level: u32,
    pub aggressive_multiplier: f32,
    pub reckless_multiplier: f32,
    pub potion_heal: u32,
    pub fireball_min: u32,
    pub fireball_max: u32,
    pub thunder_min: u32,
    pub thunder_max: u32,
    pub star_shield_charges: u32,
    pub frost_orb_turns: u32,
    pub poison_dart_damage: u32,
    pub poison_dart_turns: u32,
    /// Burn left behind by a fireball
    pub fireball_burn_damage: u32,
    pub fireball_burn_turns: u32,
    /// Duration of the Weakened status from an attack debuff
    pub debuff_turns: u32,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            player_strike_min: PLAYER_STRIKE_MIN,
            player_strike_max: PLAYER_STRIKE_MAX,
            player_strike_per_level: PLAYER_STRIKE_PER_LEVEL,
            enemy_strike_spread: ENEMY_STRIKE_SPREAD,
            special_min: SPECIAL_MIN,
            special_max: SPECIAL_MAX,
            special_per_level: SPECIAL_PER_LEVEL,
            special_unlock_level: SPECIAL_UNLOCK_LEVEL,
            aggressive_multiplier: AGGRESSIVE_MULTIPLIER,
            reckless_multiplier: RECKLESS_MULTIPLIER,
            potion_heal: POTION_HEAL,
            fireball_min: FIREBALL_MIN,
            fireball_max: FIREBALL_MAX,
            thunder_min: THUNDER_MIN,
            thunder_max: THUNDER_MAX,
            star_shield_charges: STAR_SHIELD_CHARGES,
            frost_orb_turns: FROST_ORB_TURNS,
            poison_dart_damage: POISON_DART_DAMAGE,
            poison_dart_turns: POISON_DART_TURNS,
            fireball_burn_damage: FIREBALL_BURN_DAMAGE,
            fireball_burn_turns: FIREBALL_BURN_TURNS,
            debuff_turns: DEBUFF_TURNS,
        }
    }
}

/// Flee success chance = max(floor, base - tier * per_tier)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleeConfig {
    pub base_chance: f64,
    pub per_tier: f64,
    pub floor: f64,
}

impl Default for FleeConfig {
    fn default() -> Self {
        Self {
            base_chance: FLEE_BASE_CHANCE,
            per_tier: FLEE_PER_TIER,
            floor: FLEE_FLOOR,
        }
    }
}

/// Forces under-used special abilities to fire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FairnessConfig {
    /// Enemy turns after which the override may kick in
    pub turn_threshold: u32,
    /// Uses each flagged special must reach per battle
    pub minimum_uses: u32,
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            turn_threshold: FAIRNESS_TURN_THRESHOLD,
            minimum_uses: MINIMUM_SPECIAL_USES,
        }
    }
}

/// Rewards and penalties at the end of a battle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    /// XP per enemy level when the loot table has no explicit range
    pub xp_per_level: u32,
    /// Each tier above 1 adds this fraction to the XP reward
    pub tier_multiplier: f32,
    /// Defeat costs this fraction of current XP ...
    pub defeat_xp_fraction: f32,
    /// ... or this much per player level, whichever is larger
    pub defeat_xp_per_level: u32,
    /// Chance to lose one consumable on defeat
    pub item_loss_chance: f64,
    /// HP fraction the player is revived at after a defeat
    pub defeat_revive_fraction: f32,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            xp_per_level: 12,
            tier_multiplier: 0.5,
            defeat_xp_fraction: 0.10,
            defeat_xp_per_level: 5,
            item_loss_chance: 0.25,
            defeat_revive_fraction: 0.25,
        }
    }
}

/// Presentation pacing (milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Minimum delay between a player action and the next accepted input
    pub min_turn_delay_ms: u64,
    /// Longest the runner waits for a presentation "ready" signal
    pub presentation_timeout_ms: u64,
    /// Delay before a finished session is released
    pub post_battle_cooldown_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_turn_delay_ms: 0,
            presentation_timeout_ms: 5_000,
            post_battle_cooldown_ms: 0,
        }
    }
}

impl PacingConfig {
    pub fn min_turn_delay(&self) -> Duration {
        Duration::from_millis(self.min_turn_delay_ms)
    }

    pub fn presentation_timeout(&self) -> Duration {
        Duration::from_millis(self.presentation_timeout_ms)
    }

    pub fn post_battle_cooldown(&self) -> Duration {
        Duration::from_millis(self.post_battle_cooldown_ms)
    }
}

/// Complete battle configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleConfig {
    #[serde(default)]
    pub gauges: GaugeConfig,
    #[serde(default)]
    pub costs: CostConfig,
    #[serde(default)]
    pub damage: DamageConfig,
    #[serde(default)]
    pub flee: FleeConfig,
    #[serde(default)]
    pub fairness: FairnessConfig,
    #[serde(default)]
    pub ai: AiTuning,
    #[serde(default)]
    pub outcome: OutcomeConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

impl BattleConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: BattleConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.gauges.max == 0 {
            return Err(ArenaError::Config("gauges.max must be positive".into()));
        }

        let d = &self.damage;
        let ranges = [
            ("player_strike", d.player_strike_min, d.player_strike_max),
            ("special", d.special_min, d.special_max),
            ("fireball", d.fireball_min, d.fireball_max),
            ("thunder", d.thunder_min, d.thunder_max),
        ];
        for (name, min, max) in ranges {
            if min > max {
                return Err(ArenaError::Config(format!(
                    "damage.{name}_min ({min}) must be <= damage.{name}_max ({max})"
                )));
            }
        }

        let c = &self.costs;
        for (name, cost) in [
            ("basic_attack", c.basic_attack),
            ("fireball", c.fireball),
            ("star_shield", c.star_shield),
            ("frost_orb", c.frost_orb),
            ("poison_dart", c.poison_dart),
            ("thunder", c.thunder),
        ] {
            if cost > self.gauges.max {
                return Err(ArenaError::Config(format!(
                    "costs.{name} ({cost}) exceeds gauges.max ({})",
                    self.gauges.max
                )));
            }
        }

        let f = &self.flee;
        if !(0.0..=1.0).contains(&f.floor) || !(0.0..=1.0).contains(&f.base_chance) {
            return Err(ArenaError::Config(
                "flee chances must lie in [0, 1]".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.outcome.item_loss_chance) {
            return Err(ArenaError::Config(
                "outcome.item_loss_chance must lie in [0, 1]".into(),
            ));
        }

        self.ai.validate().map_err(ArenaError::Config)?;

        Ok(())
    }
}
