//! Status effect engine
//!
//! Timed effects tick at the start of their owner's turn:
//! damage-over-time -> gauge drain -> skip rolls -> duration decrement.
//! Shield charges are counted separately and never expire with time.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::combatant::Combatant;

/// Key used to enforce one active instance per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Poison,
    Burn,
    Frozen,
    Petrified,
    Asleep,
    Stunned,
    Confused,
    Honey,
    Weakened,
    Overthink,
    DefendBlocked,
    FireballBlocked,
}

impl StatusKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Poison => "poison",
            Self::Burn => "burn",
            Self::Frozen => "freeze",
            Self::Petrified => "petrification",
            Self::Asleep => "sleep",
            Self::Stunned => "stun",
            Self::Confused => "confusion",
            Self::Honey => "honey",
            Self::Weakened => "weakness",
            Self::Overthink => "overthinking",
            Self::DefendBlocked => "bear hug",
            Self::FireballBlocked => "drenching",
        }
    }

    /// Kinds that consume the owner's whole turn
    pub fn incapacitates(self) -> bool {
        matches!(
            self,
            Self::Frozen | Self::Petrified | Self::Asleep | Self::Stunned
        )
    }
}

/// An effect with its per-tick magnitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Affliction {
    Poison { damage: u32 },
    Burn { damage: u32 },
    Frozen,
    Petrified,
    Asleep,
    Stunned,
    Confused { miss_chance: f32 },
    Honey { drain: u32, slow_percent: u32 },
    Weakened { percent: u32 },
    Overthink,
    DefendBlocked,
    FireballBlocked,
}

impl Affliction {
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Poison { .. } => StatusKind::Poison,
            Self::Burn { .. } => StatusKind::Burn,
            Self::Frozen => StatusKind::Frozen,
            Self::Petrified => StatusKind::Petrified,
            Self::Asleep => StatusKind::Asleep,
            Self::Stunned => StatusKind::Stunned,
            Self::Confused { .. } => StatusKind::Confused,
            Self::Honey { .. } => StatusKind::Honey,
            Self::Weakened { .. } => StatusKind::Weakened,
            Self::Overthink => StatusKind::Overthink,
            Self::DefendBlocked => StatusKind::DefendBlocked,
            Self::FireballBlocked => StatusKind::FireballBlocked,
        }
    }

    /// Incapacitation or confusion: can cost the owner a turn
    pub fn skips_turns(&self) -> bool {
        self.kind().incapacitates() || matches!(self, Self::Confused { .. })
    }
}

/// An active timed effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub affliction: Affliction,
    /// Owner turns left before the effect is removed
    pub remaining: u32,
}

/// Whether an application created a new effect or refreshed an old one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    Applied,
    Refreshed,
}

/// Why a turn was consumed without an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    Incapacitated(StatusKind),
    Confused,
}

/// What happened during one start-of-turn tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// HP lost to damage-over-time, per kind
    pub damage: Vec<(StatusKind, u32)>,
    /// (attack, defense) gauge drained
    pub drained: (u32, u32),
    pub skipped: Option<SkipReason>,
    pub expired: Vec<StatusKind>,
    /// Delayed backfire counter hit zero this tick
    pub backfire_armed: bool,
    pub died: bool,
}

impl TickReport {
    pub fn total_damage(&self) -> u32 {
        self.damage.iter().map(|(_, amount)| amount).sum()
    }
}

/// Ordered collection of active effects on one combatant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    effects: Vec<StatusEffect>,
    shield_charges: u32,
    backfire_armed: bool,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an effect, refreshing duration and magnitude if one of the same kind is active
    pub fn apply(&mut self, affliction: Affliction, duration: u32) -> ApplyResult {
        let kind = affliction.kind();

        if kind == StatusKind::Overthink && duration == 0 {
            self.remove(kind);
            self.backfire_armed = true;
            return ApplyResult::Applied;
        }

        if let Some(existing) = self.effects.iter_mut().find(|e| e.affliction.kind() == kind) {
            existing.affliction = affliction;
            existing.remaining = duration;
            return ApplyResult::Refreshed;
        }

        self.effects.push(StatusEffect {
            affliction,
            remaining: duration,
        });
        ApplyResult::Applied
    }

    pub fn remove(&mut self, kind: StatusKind) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.affliction.kind() != kind);
        self.effects.len() != before
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|e| e.affliction.kind() == kind)
    }

    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.affliction.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// First incapacitating effect, in application order
    pub fn incapacitation(&self) -> Option<StatusKind> {
        self.effects
            .iter()
            .map(|e| e.affliction.kind())
            .find(|k| k.incapacitates())
    }

    /// Regen is suppressed entirely while frozen
    pub fn suppresses_regen(&self) -> bool {
        self.has(StatusKind::Frozen)
    }

    /// Percentage cut to the owner's outgoing damage (slow + weaken), capped at 100
    pub fn outgoing_reduction_percent(&self) -> u32 {
        let total: u32 = self
            .effects
            .iter()
            .map(|e| match e.affliction {
                Affliction::Honey { slow_percent, .. } => slow_percent,
                Affliction::Weakened { percent } => percent,
                _ => 0,
            })
            .sum();
        total.min(100)
    }

    pub fn shield_charges(&self) -> u32 {
        self.shield_charges
    }

    /// Charges accumulate independently of any duration
    pub fn add_shield(&mut self, charges: u32) {
        self.shield_charges = self.shield_charges.saturating_add(charges);
    }

    /// Spend one charge if any remain
    pub fn consume_shield(&mut self) -> bool {
        if self.shield_charges == 0 {
            return false;
        }
        self.shield_charges -= 1;
        true
    }

    pub fn backfire_armed(&self) -> bool {
        self.backfire_armed
    }

    /// Disarm and report whether the next attack should backfire
    pub fn take_backfire(&mut self) -> bool {
        std::mem::take(&mut self.backfire_armed)
    }

    /// Decrement every duration once, removing effects that reach zero
    fn decrement(&mut self, report: &mut TickReport) {
        for effect in &mut self.effects {
            effect.remaining = effect.remaining.saturating_sub(1);
        }

        let mut kept = Vec::with_capacity(self.effects.len());
        for effect in self.effects.drain(..) {
            if effect.remaining > 0 {
                kept.push(effect);
                continue;
            }
            let kind = effect.affliction.kind();
            if kind == StatusKind::Overthink {
                self.backfire_armed = true;
                report.backfire_armed = true;
            }
            report.expired.push(kind);
        }
        self.effects = kept;
    }
}

/// Run the start-of-turn tick for `owner`
///
/// Damage-over-time lands first and a death stops the tick immediately.
pub fn tick_start_of_turn<R: Rng>(owner: &mut Combatant, rng: &mut R) -> TickReport {
    let mut report = TickReport::default();

    // (a) damage over time
    let dots: Vec<(StatusKind, u32)> = owner
        .statuses
        .iter()
        .filter_map(|e| match e.affliction {
            Affliction::Poison { damage } => Some((StatusKind::Poison, damage)),
            Affliction::Burn { damage } => Some((StatusKind::Burn, damage)),
            _ => None,
        })
        .collect();

    for (kind, damage) in dots {
        let lost = owner.hp.drain(damage);
        report.damage.push((kind, lost));
        if owner.is_dead() {
            report.died = true;
            return report;
        }
    }

    // (b) gauge drain
    let drain: u32 = owner
        .statuses
        .iter()
        .map(|e| match e.affliction {
            Affliction::Honey { drain, .. } => drain,
            _ => 0,
        })
        .sum();
    if drain > 0 {
        let attack = owner.attack.drain(drain);
        let defense = owner.defense.drain(drain);
        report.drained = (attack, defense);
    }

    // (c) skip rolls
    if let Some(kind) = owner.statuses.incapacitation() {
        report.skipped = Some(SkipReason::Incapacitated(kind));
    } else if let Some(StatusEffect {
        affliction: Affliction::Confused { miss_chance },
        ..
    }) = owner.statuses.get(StatusKind::Confused).copied()
    {
        if rng.gen::<f32>() < miss_chance {
            report.skipped = Some(SkipReason::Confused);
        }
    }

    // (d) durations
    owner.statuses.decrement(&mut report);

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::combatant::Combatant;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn dummy() -> Combatant {
        Combatant::player("Hero", 1, 100, 100, 100)
    }

    #[test]
    fn test_same_kind_refreshes_instead_of_stacking() {
        let mut statuses = StatusEffects::new();
        assert_eq!(statuses.apply(Affliction::Poison { damage: 3 }, 2), ApplyResult::Applied);
        assert_eq!(statuses.apply(Affliction::Poison { damage: 5 }, 4), ApplyResult::Refreshed);

        assert_eq!(statuses.len(), 1);
        let poison = statuses.get(StatusKind::Poison).expect("poison active");
        assert_eq!(poison.remaining, 4);
        assert_eq!(poison.affliction, Affliction::Poison { damage: 5 });
    }

    #[test]
    fn test_poison_three_ticks_removes_fifteen() {
        let mut owner = dummy();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        owner.statuses.apply(Affliction::Poison { damage: 5 }, 3);

        for _ in 0..3 {
            tick_start_of_turn(&mut owner, &mut rng);
        }
        assert_eq!(owner.hp.value(), 85);
        assert!(!owner.statuses.has(StatusKind::Poison));

        let report = tick_start_of_turn(&mut owner, &mut rng);
        assert_eq!(report.total_damage(), 0);
        assert_eq!(owner.hp.value(), 85);
    }

    #[test]
    fn test_dot_death_stops_tick() {
        let mut owner = dummy();
        owner.hp.set(4);
        owner.statuses.apply(Affliction::Poison { damage: 5 }, 3);
        owner.statuses.apply(Affliction::Asleep, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let report = tick_start_of_turn(&mut owner, &mut rng);

        assert!(report.died);
        assert_eq!(owner.hp.value(), 0);
        // Nothing after the death is processed
        assert_eq!(owner.statuses.get(StatusKind::Asleep).map(|e| e.remaining), Some(2));
    }

    #[test]
    fn test_incapacitation_skips_then_expires() {
        let mut owner = dummy();
        owner.statuses.apply(Affliction::Frozen, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let report = tick_start_of_turn(&mut owner, &mut rng);
        assert_eq!(report.skipped, Some(SkipReason::Incapacitated(StatusKind::Frozen)));
        assert_eq!(report.expired, vec![StatusKind::Frozen]);

        let report = tick_start_of_turn(&mut owner, &mut rng);
        assert!(report.skipped.is_none());
    }

    #[test]
    fn test_certain_confusion_skips() {
        let mut owner = dummy();
        owner.statuses.apply(Affliction::Confused { miss_chance: 1.0 }, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let report = tick_start_of_turn(&mut owner, &mut rng);
        assert_eq!(report.skipped, Some(SkipReason::Confused));
    }

    #[test]
    fn test_honey_drains_both_gauges() {
        let mut owner = dummy();
        owner.statuses.apply(Affliction::Honey { drain: 7, slow_percent: 20 }, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let report = tick_start_of_turn(&mut owner, &mut rng);
        assert_eq!(report.drained, (7, 7));
        assert_eq!(owner.attack.value(), 93);
        assert_eq!(owner.defense.value(), 93);
    }

    #[test]
    fn test_shield_charges_ignore_time() {
        let mut owner = dummy();
        owner.statuses.add_shield(2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..5 {
            tick_start_of_turn(&mut owner, &mut rng);
        }
        assert_eq!(owner.statuses.shield_charges(), 2);
        assert!(owner.statuses.consume_shield());
        assert!(owner.statuses.consume_shield());
        assert!(!owner.statuses.consume_shield());
    }

    #[test]
    fn test_overthink_arms_when_counter_hits_zero() {
        let mut owner = dummy();
        owner.statuses.apply(Affliction::Overthink, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let first = tick_start_of_turn(&mut owner, &mut rng);
        assert!(!first.backfire_armed);
        assert!(!owner.statuses.backfire_armed());

        let second = tick_start_of_turn(&mut owner, &mut rng);
        assert!(second.backfire_armed);
        assert!(owner.statuses.take_backfire());
        assert!(!owner.statuses.backfire_armed());
    }

    #[test]
    fn test_outgoing_reduction_caps_at_hundred() {
        let mut statuses = StatusEffects::new();
        statuses.apply(Affliction::Honey { drain: 0, slow_percent: 70 }, 2);
        statuses.apply(Affliction::Weakened { percent: 50 }, 2);
        assert_eq!(statuses.outgoing_reduction_percent(), 100);
    }
}
