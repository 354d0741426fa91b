//! Enemy catalog loaded from TOML
//!
//! Each `[[enemy]]` entry carries base stats at level 1; `scale_stats`
//! grows them with the player's level.

use std::fs;
use std::path::Path;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::battle::ability::{Ability, Capabilities, DamageValue, SpecialMove};
use crate::battle::ai::Instinct;
use crate::battle::combatant::{Combatant, EnemyTraits};
use crate::battle::outcome::LootTable;
use crate::core::config::BattleConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{EnemyId, Tier};

/// HP growth per level above 1
pub const HP_GROWTH: f32 = 0.10;
/// Attack and defense growth per level above 1
pub const STAT_GROWTH: f32 = 0.05;

fn default_min_level() -> u32 {
    1
}

/// One enemy as authored in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyDefinition {
    pub id: EnemyId,
    pub name: String,
    #[serde(default)]
    pub tier: Tier,
    /// Lowest player level this enemy is offered at
    #[serde(default = "default_min_level")]
    pub min_level: u32,
    #[serde(default)]
    pub instinct: Instinct,
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    #[serde(default)]
    pub abilities: Vec<Ability>,
    #[serde(default)]
    pub specials: Vec<SpecialMove>,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub loot: Option<LootTable>,
}

/// Stats after level scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaledStats {
    pub level: u32,
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
}

impl EnemyDefinition {
    /// Scale base stats to `level`
    pub fn scale_stats(&self, level: u32) -> ScaledStats {
        let level = level.max(1);
        let steps = (level - 1) as f32;
        let grow = |base: u32, rate: f32| (base as f32 * (1.0 + rate * steps)).round() as u32;
        ScaledStats {
            level,
            hp: grow(self.hp, HP_GROWTH).max(1),
            attack: grow(self.attack, STAT_GROWTH),
            defense: grow(self.defense, STAT_GROWTH),
        }
    }

    /// Build a combatant for a fight at `level`
    pub fn spawn(&self, level: u32, config: &BattleConfig) -> Combatant {
        let stats = self.scale_stats(level);
        let traits = EnemyTraits::new(self.id.clone(), self.instinct, self.tier)
            .with_abilities(self.abilities.clone())
            .with_specials(self.specials.clone())
            .with_capabilities(self.capabilities);
        Combatant::enemy(
            self.name.clone(),
            stats.level,
            stats.hp,
            stats.attack,
            stats.defense,
            config.gauges.enemy_defense_factor,
            traits,
        )
    }

    fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(ArenaError::Catalog(format!("{}: {msg}", self.id)));
        if self.hp == 0 {
            return fail("hp must be positive".into());
        }
        for ability in &self.abilities {
            if let DamageValue::Range(min, max) = ability.value {
                if min > max {
                    return fail(format!("ability {} has range {min}..{max}", ability.name));
                }
            }
        }
        for special in &self.specials {
            if !(0.0..=1.0).contains(&special.chance) {
                return fail(format!("special {} chance {} outside [0, 1]", special.ability.key(), special.chance));
            }
        }
        let caps = &self.capabilities;
        for (name, chance) in [("evasion", caps.evasion), ("deflection", caps.deflection)] {
            if let Some(chance) = chance {
                if !(0.0..=1.0).contains(&chance) {
                    return fail(format!("{name} chance {chance} outside [0, 1]"));
                }
            }
        }
        if let Some(loot) = &self.loot {
            if loot.items.iter().any(|drop| !(0.0..=1.0).contains(&drop.chance)) {
                return fail("loot chances must lie in [0, 1]".into());
            }
        }
        Ok(())
    }
}

/// Source of enemy definitions
pub trait EnemyCatalog {
    fn get(&self, id: &EnemyId) -> Option<&EnemyDefinition>;

    /// Pick an enemy for `player_level` at `tier`
    fn select(&self, player_level: u32, tier: Tier, rng: &mut dyn RngCore) -> Option<&EnemyDefinition>;
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "enemy")]
    enemies: Vec<EnemyDefinition>,
}

/// Catalog parsed from a TOML document of `[[enemy]]` tables
#[derive(Debug, Clone, Default)]
pub struct TomlCatalog {
    enemies: Vec<EnemyDefinition>,
}

impl TomlCatalog {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents)?;
        for enemy in &file.enemies {
            enemy.validate()?;
        }
        let mut seen = std::collections::HashSet::new();
        for enemy in &file.enemies {
            if !seen.insert(enemy.id.clone()) {
                return Err(ArenaError::Catalog(format!("duplicate enemy id {}", enemy.id)));
            }
        }
        tracing::debug!(count = file.enemies.len(), "enemy catalog parsed");
        Ok(Self { enemies: file.enemies })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnemyDefinition> {
        self.enemies.iter()
    }
}

impl EnemyCatalog for TomlCatalog {
    fn get(&self, id: &EnemyId) -> Option<&EnemyDefinition> {
        self.enemies.iter().find(|e| &e.id == id)
    }

    fn select(&self, player_level: u32, tier: Tier, rng: &mut dyn RngCore) -> Option<&EnemyDefinition> {
        let eligible: Vec<&EnemyDefinition> = self
            .enemies
            .iter()
            .filter(|e| e.tier == tier && e.min_level <= player_level)
            .collect();
        if eligible.is_empty() {
            tracing::warn!(player_level, tier = tier.value(), "no enemy for tier, widening search");
            let fallback: Vec<&EnemyDefinition> =
                self.enemies.iter().filter(|e| e.min_level <= player_level).collect();
            if fallback.is_empty() {
                return None;
            }
            return Some(fallback[rng.gen_range(0..fallback.len())]);
        }
        Some(eligible[rng.gen_range(0..eligible.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ability::{AbilityEffect, SpecialAbility};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const CATALOG: &str = r#"
[[enemy]]
id = "slime"
name = "Slime"
tier = 1
instinct = "guardian"
hp = 35
attack = 6
defense = 3
abilities = [
    { name = "Ooze", value = [4, 8], effect = { type = "damage" }, cooldown = 2 },
    { name = "Jiggle", value = 10, effect = { type = "heal" }, cooldown = 3 },
]
loot = { xp_coins = [10, 30], items = [{ id = "potion", chance = 0.5 }] }

[[enemy]]
id = "medusa"
name = "Medusa"
tier = 2
min_level = 3
instinct = "trickster"
hp = 60
attack = 10
defense = 5
specials = [{ kind = "petrify", turns = 1, chance = 0.15 }]
capabilities = { evasion = 0.1 }
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = TomlCatalog::from_toml_str(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);

        let slime = catalog.get(&EnemyId::new("slime")).unwrap();
        assert_eq!(slime.instinct, Instinct::Guardian);
        assert_eq!(slime.abilities[0].value, DamageValue::Range(4, 8));
        assert_eq!(slime.abilities[1].effect, AbilityEffect::Heal);
        assert_eq!(slime.loot.as_ref().and_then(|l| l.xp), Some((10, 30)));

        let medusa = catalog.get(&EnemyId::new("medusa")).unwrap();
        assert_eq!(medusa.specials[0].ability, SpecialAbility::Petrify { turns: 1 });
        assert_eq!(medusa.capabilities.evasion, Some(0.1));
    }

    #[test]
    fn test_scale_stats() {
        let catalog = TomlCatalog::from_toml_str(CATALOG).unwrap();
        let slime = catalog.get(&EnemyId::new("slime")).unwrap();

        let base = slime.scale_stats(1);
        assert_eq!((base.hp, base.attack, base.defense), (35, 6, 3));

        // level 11: +100% HP, +50% attack/defense
        let scaled = slime.scale_stats(11);
        assert_eq!((scaled.hp, scaled.attack, scaled.defense), (70, 9, 5));
    }

    #[test]
    fn test_spawn_seeds_defense_gauge() {
        let catalog = TomlCatalog::from_toml_str(CATALOG).unwrap();
        let slime = catalog.get(&EnemyId::new("slime")).unwrap();
        let enemy = slime.spawn(1, &BattleConfig::default());
        assert_eq!(enemy.defense.max(), 15);
        assert_eq!(enemy.tier(), Tier::new(1));
        assert_eq!(enemy.enemy.as_ref().map(|t| t.abilities.len()), Some(2));
    }

    #[test]
    fn test_select_respects_tier_and_level() {
        let catalog = TomlCatalog::from_toml_str(CATALOG).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let pick = catalog.select(1, Tier::new(1), &mut rng).unwrap();
        assert_eq!(pick.id.as_str(), "slime");

        // medusa is tier 2 but needs level 3; falls back to what is eligible
        let pick = catalog.select(1, Tier::new(2), &mut rng).unwrap();
        assert_eq!(pick.id.as_str(), "slime");

        let pick = catalog.select(3, Tier::new(2), &mut rng).unwrap();
        assert_eq!(pick.id.as_str(), "medusa");
    }

    #[test]
    fn test_bad_chance_rejected() {
        let bad = r#"
[[enemy]]
id = "bee"
name = "Bee"
hp = 10
attack = 3
defense = 1
specials = [{ kind = "honey", turns = 2, drain = 5, slow_percent = 20, chance = 1.5 }]
"#;
        assert!(matches!(TomlCatalog::from_toml_str(bad), Err(ArenaError::Catalog(_))));
    }
}
