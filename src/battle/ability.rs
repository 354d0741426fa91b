//! Enemy abilities, gimmick specials and defensive capabilities
//!
//! Everything here deserializes from the enemy catalog TOML.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Damage (or heal / gauge delta) magnitude of an ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DamageValue {
    Fixed(u32),
    Range(u32, u32),
}

impl DamageValue {
    /// The value used to rank abilities ("strongest")
    pub fn nominal(&self) -> u32 {
        match *self {
            Self::Fixed(n) => n,
            Self::Range(min, max) => min.max(max),
        }
    }

    pub fn roll<R: Rng>(&self, rng: &mut R) -> u32 {
        match *self {
            Self::Fixed(n) => n,
            Self::Range(min, max) => {
                let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                rng.gen_range(lo..=hi)
            }
        }
    }
}

impl Default for DamageValue {
    fn default() -> Self {
        Self::Fixed(0)
    }
}

/// What an ability does when it lands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AbilityEffect {
    Damage,
    Heal,
    BuffAttack,
    BuffDefense,
    DebuffAttack,
    DebuffDefense,
    MultiHit { hits: u32 },
    Poison { damage: u32, turns: u32 },
    Stun { turns: u32 },
}

/// Effect tags used by the "by type" selection helper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTag {
    Damage,
    Heal,
    BuffAttack,
    BuffDefense,
    DebuffAttack,
    DebuffDefense,
    MultiHit,
    Poison,
    Stun,
}

impl AbilityEffect {
    pub fn tag(&self) -> EffectTag {
        match self {
            Self::Damage => EffectTag::Damage,
            Self::Heal => EffectTag::Heal,
            Self::BuffAttack => EffectTag::BuffAttack,
            Self::BuffDefense => EffectTag::BuffDefense,
            Self::DebuffAttack => EffectTag::DebuffAttack,
            Self::DebuffDefense => EffectTag::DebuffDefense,
            Self::MultiHit { .. } => EffectTag::MultiHit,
            Self::Poison { .. } => EffectTag::Poison,
            Self::Stun { .. } => EffectTag::Stun,
        }
    }
}

/// A named enemy ability with a cooldown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    #[serde(default)]
    pub value: DamageValue,
    pub effect: AbilityEffect,
    /// Enemy turns before the ability can be used again
    #[serde(default)]
    pub cooldown: u32,
}

impl Ability {
    pub fn new(name: impl Into<String>, value: DamageValue, effect: AbilityEffect, cooldown: u32) -> Self {
        Self {
            name: name.into(),
            value,
            effect,
            cooldown,
        }
    }
}

/// Gimmick mechanics attached to specific enemies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecialAbility {
    /// Turns the player to stone: turns skipped
    Petrify { turns: u32 },
    /// Puts the player to sleep: turns skipped
    Sleep { turns: u32 },
    /// Freezes the player: turns skipped, no gauge regen
    Freeze { turns: u32 },
    /// Soaks the player: fireball items unusable
    Drench { turns: u32 },
    /// Bear hug: defending unusable
    Hug { turns: u32 },
    Poison { damage: u32, turns: u32 },
    /// After `delay` player turns the next player attack hits the player
    Overthink { delay: u32 },
    /// Confusion: chance to lose each turn
    Mushroom { turns: u32, miss_chance: f32 },
    /// Sticky slow: drains both gauges and weakens outgoing damage
    Honey { turns: u32, drain: u32, slow_percent: u32 },
    /// The enemy gains shield charges
    StarShield { charges: u32 },
}

impl SpecialAbility {
    /// Stable key for per-battle usage tracking
    pub fn key(&self) -> &'static str {
        match self {
            Self::Petrify { .. } => "petrify",
            Self::Sleep { .. } => "sleep",
            Self::Freeze { .. } => "freeze",
            Self::Drench { .. } => "drench",
            Self::Hug { .. } => "hug",
            Self::Poison { .. } => "poison",
            Self::Overthink { .. } => "overthink",
            Self::Mushroom { .. } => "mushroom",
            Self::Honey { .. } => "honey",
            Self::StarShield { .. } => "star_shield",
        }
    }
}

/// A flagged special with its base trigger chance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecialMove {
    #[serde(flatten)]
    pub ability: SpecialAbility,
    pub chance: f64,
}

/// Self-heal capability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelfHeal {
    pub chance: f64,
    /// Percent of max HP restored
    pub percent: u32,
    pub max_uses: u32,
}

/// Optional defensive capabilities of an enemy
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Chance to dodge an incoming hit entirely
    #[serde(default)]
    pub evasion: Option<f64>,
    /// Chance to bounce an incoming hit back at the attacker
    #[serde(default)]
    pub deflection: Option<f64>,
    #[serde(default)]
    pub self_heal: Option<SelfHeal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_nominal_uses_upper_bound() {
        assert_eq!(DamageValue::Range(4, 9).nominal(), 9);
        assert_eq!(DamageValue::Fixed(7).nominal(), 7);
    }

    #[test]
    fn test_roll_within_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let value = DamageValue::Range(10, 30);
        for _ in 0..200 {
            let roll = value.roll(&mut rng);
            assert!((10..=30).contains(&roll));
        }
    }

    #[test]
    fn test_inverted_range_still_rolls() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let roll = DamageValue::Range(8, 2).roll(&mut rng);
        assert!((2..=8).contains(&roll));
    }

    #[test]
    fn test_ability_parses_from_toml() {
        let ability: Ability = toml::from_str(
            r#"
            name = "Venom Bite"
            value = [4, 8]
            cooldown = 3
            effect = { type = "poison", damage = 3, turns = 2 }
            "#,
        )
        .expect("ability should parse");

        assert_eq!(ability.value, DamageValue::Range(4, 8));
        assert_eq!(ability.effect.tag(), EffectTag::Poison);
    }

    #[test]
    fn test_special_move_parses_flattened() {
        let special: SpecialMove = toml::from_str(
            r#"
            kind = "petrify"
            turns = 1
            chance = 0.2
            "#,
        )
        .expect("special should parse");

        assert_eq!(special.ability, SpecialAbility::Petrify { turns: 1 });
        assert_eq!(special.ability.key(), "petrify");
    }
}
