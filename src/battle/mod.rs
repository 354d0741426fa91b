//! Battle system - one player against one enemy, strictly alternating turns
//!
//! Leaves first: gauges and statuses, then the resolver, the enemy AI, the
//! session state machine and the outcome resolver. The runner is the only
//! async piece.

pub mod ability;
pub mod actions;
pub mod ai;
pub mod catalog;
pub mod combatant;
pub mod constants;
pub mod gauge;
pub mod log;
pub mod outcome;
pub mod resolution;
pub mod runner;
pub mod session;
pub mod status;

// Re-exports for convenient access
pub use ability::{
    Ability, AbilityEffect, Capabilities, DamageValue, EffectTag, SelfHeal, SpecialAbility, SpecialMove,
};
pub use actions::{AttackStance, EnemyAction, ItemKind, PlayerAction};
pub use catalog::{EnemyCatalog, EnemyDefinition, ScaledStats, TomlCatalog};
pub use combatant::{Combatant, EnemyTraits, StatSnapshot};
pub use constants::*;
pub use gauge::Gauge;
pub use log::{AnimationKind, BattleLog, LogEntry, LogKind, PresentationEvent};
pub use outcome::{defeat_penalty, victory_xp, Loot, LootDrop, LootTable, OutcomeResolver};
pub use resolution::{
    mitigate_armor, resolve_gauge, resolve_heal, resolve_hit, resolve_status, Hit, Resolution,
    ResolutionKind,
};
pub use runner::BattleRunner;
pub use session::{flee_chance, BattleSession, BattleState};
pub use status::{
    tick_start_of_turn, Affliction, ApplyResult, SkipReason, StatusEffect, StatusEffects, StatusKind,
    TickReport,
};
