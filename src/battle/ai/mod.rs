//! Enemy AI system for battle decision-making
//!
//! Architecture: Trait + Data hybrid
//! - BattleAI trait defines interface for swappable implementations
//! - AiTuning struct holds TOML-loaded thresholds and probabilities
//! - DecisionContext provides the read-only battle view for one enemy turn

pub mod decision_context;
pub mod fairness;
pub mod instinct;
pub mod selection;

pub use decision_context::{DecisionContext, PlayerStrategy, ThreatLevel};
pub use fairness::FairnessTracker;
pub use instinct::{AiTuning, Instinct, InstinctAi};
pub use selection::{best_by_type, random_available, strongest_available};

use rand::RngCore;

use crate::battle::actions::EnemyAction;

/// Trait for enemy AI implementations
pub trait BattleAI: Send {
    /// Choose exactly one action for this enemy turn
    fn decide(&mut self, context: &DecisionContext, rng: &mut dyn RngCore) -> EnemyAction;

    /// The behavioral archetype driving decisions
    fn instinct(&self) -> Instinct;
}
