//! Action requests for both sides

use serde::{Deserialize, Serialize};

use crate::core::config::{BattleConfig, DamageConfig};
use crate::core::types::ItemId;

/// Consumable battle items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Potion,
    Fireball,
    StarShield,
    FrostOrb,
    PoisonDart,
    Thunder,
}

impl ItemKind {
    pub const ALL: [ItemKind; 6] = [
        Self::Potion,
        Self::Fireball,
        Self::StarShield,
        Self::FrostOrb,
        Self::PoisonDart,
        Self::Thunder,
    ];

    /// Inventory identifier in the progression record
    pub fn item_id(self) -> ItemId {
        ItemId::new(match self {
            Self::Potion => "potion",
            Self::Fireball => "fireball",
            Self::StarShield => "star_shield",
            Self::FrostOrb => "frost_orb",
            Self::PoisonDart => "poison_dart",
            Self::Thunder => "thunder",
        })
    }

    pub fn from_item_id(id: &ItemId) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.item_id() == *id)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Potion => "Potion",
            Self::Fireball => "Fireball",
            Self::StarShield => "Star Shield",
            Self::FrostOrb => "Frost Orb",
            Self::PoisonDart => "Poison Dart",
            Self::Thunder => "Thunder Scroll",
        }
    }

    /// Attack-gauge cost
    pub fn cost(self, config: &BattleConfig) -> u32 {
        let c = &config.costs;
        match self {
            Self::Potion => 0,
            Self::Fireball => c.fireball,
            Self::StarShield => c.star_shield,
            Self::FrostOrb => c.frost_orb,
            Self::PoisonDart => c.poison_dart,
            Self::Thunder => c.thunder,
        }
    }

    /// Damage roll bounds for offensive items
    pub fn damage_range(self, damage: &DamageConfig) -> Option<(u32, u32)> {
        match self {
            Self::Fireball => Some((damage.fireball_min, damage.fireball_max)),
            Self::Thunder => Some((damage.thunder_min, damage.thunder_max)),
            Self::PoisonDart => Some((damage.poison_dart_damage, damage.poison_dart_damage)),
            Self::Potion | Self::StarShield | Self::FrostOrb => None,
        }
    }
}

/// What the player asks to do on their turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    Attack,
    Defend,
    /// Focus attack: needs a full focus gauge and the unlock level
    Special,
    UseItem(ItemKind),
    Flee,
}

impl PlayerAction {
    pub fn label(&self) -> String {
        match self {
            Self::Attack => "Attack".to_string(),
            Self::Defend => "Defend".to_string(),
            Self::Special => "Special".to_string(),
            Self::UseItem(item) => item.label().to_string(),
            Self::Flee => "Flee".to_string(),
        }
    }
}

/// Damage multiplier class of an enemy basic attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackStance {
    Normal,
    Aggressive,
    Reckless,
}

impl AttackStance {
    pub fn multiplier(self, damage: &DamageConfig) -> f32 {
        match self {
            Self::Normal => 1.0,
            Self::Aggressive => damage.aggressive_multiplier,
            Self::Reckless => damage.reckless_multiplier,
        }
    }
}

/// The single action an enemy takes on its turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyAction {
    Attack { stance: AttackStance },
    Defend,
    /// Index into the enemy's ability list
    Ability(usize),
    /// Index into the enemy's flagged specials
    Special(usize),
    SelfHeal,
}
