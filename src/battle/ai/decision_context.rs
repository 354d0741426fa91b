//! AI's view of the battle for one enemy turn

use serde::{Deserialize, Serialize};

use crate::battle::ai::instinct::AiTuning;
use crate::battle::combatant::{Combatant, EnemyTraits};
use crate::ports::memory::BehaviorProfile;

/// Coarse read of how dangerous the player currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ThreatLevel {
    Low,
    Moderate,
    High,
}

impl ThreatLevel {
    /// Weighted blend of the player's HP, attack gauge and focus
    pub fn assess(player: &Combatant, tuning: &AiTuning) -> Self {
        let score = 0.4 * player.hp_fraction()
            + 0.3 * player.attack.fraction()
            + 0.3 * player.focus_fraction();

        if score >= tuning.threat_high {
            Self::High
        } else if score < tuning.threat_low {
            Self::Low
        } else {
            Self::Moderate
        }
    }
}

/// How the player has historically fought this enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerStrategy {
    Aggressive,
    ItemHeavy,
    Defensive,
    #[default]
    Balanced,
}

impl PlayerStrategy {
    /// Item use is checked first: a heavy item user is countered with pressure
    pub fn classify(profile: &BehaviorProfile, tuning: &AiTuning) -> Self {
        if profile.encounters == 0 {
            return Self::Balanced;
        }
        if profile.item_frequency >= tuning.item_heavy_threshold {
            Self::ItemHeavy
        } else if profile.attack_frequency >= tuning.aggressive_threshold {
            Self::Aggressive
        } else if profile.attack_frequency <= tuning.defensive_threshold {
            Self::Defensive
        } else {
            Self::Balanced
        }
    }
}

/// AI's decision-making context
pub struct DecisionContext<'a> {
    pub enemy: &'a Combatant,
    pub player: &'a Combatant,
    /// Enemy turns taken so far, including this one
    pub enemy_turn: u32,
    pub threat: ThreatLevel,
    pub strategy: PlayerStrategy,
}

impl<'a> DecisionContext<'a> {
    pub fn new(
        enemy: &'a Combatant,
        player: &'a Combatant,
        enemy_turn: u32,
        threat: ThreatLevel,
        strategy: PlayerStrategy,
    ) -> Self {
        Self {
            enemy,
            player,
            enemy_turn,
            threat,
            strategy,
        }
    }

    pub fn own_hp_fraction(&self) -> f32 {
        self.enemy.hp_fraction()
    }

    pub fn player_hp_fraction(&self) -> f32 {
        self.player.hp_fraction()
    }

    pub fn player_attack_fraction(&self) -> f32 {
        self.player.attack.fraction()
    }

    /// Enemy traits; an enemy without traits has no abilities
    pub fn traits(&self) -> Option<&'a EnemyTraits> {
        self.enemy.enemy.as_ref()
    }
}
