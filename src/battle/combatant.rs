//! Combatant model
//!
//! One player and one enemy per battle. For the player the attack and
//! defense gauges are action resources; for the enemy they are seeded
//! from its stat line and regenerate more slowly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::battle::ability::{Ability, Capabilities, SpecialMove};
use crate::battle::ai::Instinct;
use crate::battle::constants::GAUGE_MAX;
use crate::battle::gauge::Gauge;
use crate::battle::status::StatusEffects;
use crate::core::types::{EnemyId, Side, Tier};

/// Enemy-only state: instinct, abilities and gimmicks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyTraits {
    pub id: EnemyId,
    pub instinct: Instinct,
    pub tier: Tier,
    pub abilities: Vec<Ability>,
    /// Ability name -> enemy turns until usable again
    pub cooldowns: HashMap<String, u32>,
    /// Flagged gimmick specials, in declaration order
    pub specials: Vec<SpecialMove>,
    pub capabilities: Capabilities,
    pub self_heals_used: u32,
}

impl EnemyTraits {
    pub fn new(id: EnemyId, instinct: Instinct, tier: Tier) -> Self {
        Self {
            id,
            instinct,
            tier,
            abilities: Vec::new(),
            cooldowns: HashMap::new(),
            specials: Vec::new(),
            capabilities: Capabilities::default(),
            self_heals_used: 0,
        }
    }

    pub fn with_abilities(mut self, abilities: Vec<Ability>) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_specials(mut self, specials: Vec<SpecialMove>) -> Self {
        self.specials = specials;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn is_available(&self, index: usize) -> bool {
        self.abilities
            .get(index)
            .map(|a| self.cooldowns.get(&a.name).copied().unwrap_or(0) == 0)
            .unwrap_or(false)
    }

    /// Indices of abilities that are off cooldown, in declaration order
    pub fn available_abilities(&self) -> Vec<usize> {
        (0..self.abilities.len())
            .filter(|&i| self.is_available(i))
            .collect()
    }

    pub fn start_cooldown(&mut self, index: usize) {
        if let Some(ability) = self.abilities.get(index) {
            if ability.cooldown > 0 {
                self.cooldowns.insert(ability.name.clone(), ability.cooldown);
            }
        }
    }

    /// Count every cooldown down by one enemy turn
    pub fn tick_cooldowns(&mut self) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0);
    }

    pub fn self_heals_left(&self) -> u32 {
        self.capabilities
            .self_heal
            .map(|h| h.max_uses.saturating_sub(self.self_heals_used))
            .unwrap_or(0)
    }
}

/// Combat-relevant state of one side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub side: Side,
    pub level: u32,
    pub hp: Gauge,
    pub attack: Gauge,
    pub defense: Gauge,
    /// Special/focus gauge (player only)
    pub focus: Option<Gauge>,
    /// Base of the basic-attack roll
    pub power: u32,
    /// Flat mitigation against basic attacks and abilities
    pub armor: u32,
    /// Declared defending stance; cleared at the start of the owner's next turn
    pub is_defending: bool,
    pub statuses: StatusEffects,
    pub enemy: Option<EnemyTraits>,
}

impl Combatant {
    /// Player with 100-point gauges seeded from the given values
    pub fn player(name: impl Into<String>, level: u32, max_hp: u32, attack: u32, defense: u32) -> Self {
        Self {
            name: name.into(),
            side: Side::Player,
            level: level.max(1),
            hp: Gauge::full(max_hp),
            attack: Gauge::new(attack, GAUGE_MAX),
            defense: Gauge::new(defense, GAUGE_MAX),
            focus: Some(Gauge::new(0, GAUGE_MAX)),
            power: 0,
            armor: 0,
            is_defending: false,
            statuses: StatusEffects::new(),
            enemy: None,
        }
    }

    /// Enemy from scaled stats; the defense gauge is `defense x factor`, capped at 100
    pub fn enemy(
        name: impl Into<String>,
        level: u32,
        hp: u32,
        attack: u32,
        defense: u32,
        defense_factor: u32,
        traits: EnemyTraits,
    ) -> Self {
        let defense_gauge = defense.saturating_mul(defense_factor).min(GAUGE_MAX);
        Self {
            name: name.into(),
            side: Side::Enemy,
            level: level.max(1),
            hp: Gauge::full(hp),
            attack: Gauge::full(GAUGE_MAX),
            defense: Gauge::full(defense_gauge),
            focus: None,
            power: attack,
            armor: defense,
            is_defending: false,
            statuses: StatusEffects::new(),
            enemy: Some(traits),
        }
    }

    pub fn with_current_hp(mut self, hp: u32) -> Self {
        self.hp.set(hp);
        self
    }

    pub fn is_dead(&self) -> bool {
        self.hp.is_empty()
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    pub fn hp_fraction(&self) -> f32 {
        self.hp.fraction()
    }

    pub fn focus_fraction(&self) -> f32 {
        self.focus.map(|f| f.fraction()).unwrap_or(0.0)
    }

    pub fn tier(&self) -> Tier {
        self.enemy.as_ref().map(|e| e.tier).unwrap_or_default()
    }

    /// Compact view for presentation updates
    pub fn snapshot(&self) -> StatSnapshot {
        StatSnapshot {
            hp: self.hp.value(),
            max_hp: self.hp.max(),
            attack: self.attack.value(),
            defense: self.defense.value(),
            focus: self.focus.map(|f| f.value()),
            shield_charges: self.statuses.shield_charges(),
        }
    }
}

/// HP and gauge values at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub focus: Option<u32>,
    pub shield_charges: u32,
}
