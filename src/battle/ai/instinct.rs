//! Instinct-driven decision trees
//!
//! Each enemy carries one of five instincts. The trees read HP fractions,
//! the threat level, cooldowns and (for the tactician) the player's
//! historical strategy. Probabilities and thresholds come from `AiTuning`,
//! loaded with the rest of the battle config.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::battle::ability::EffectTag;
use crate::battle::actions::{AttackStance, EnemyAction};
use crate::battle::ai::decision_context::{DecisionContext, PlayerStrategy, ThreatLevel};
use crate::battle::ai::selection::{best_by_type, random_available, strongest_available};
use crate::battle::ai::BattleAI;

/// Behavioral archetype of an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instinct {
    #[default]
    Predator,
    Trickster,
    Guardian,
    Berserker,
    Tactician,
}

/// Thresholds and probabilities for the instinct trees
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    /// Player HP fraction considered critical
    pub critical_hp: f32,
    /// Own HP fraction considered low
    pub low_hp: f32,
    /// Predator: chance to open with its strongest ability
    pub predator_ability_chance: f64,
    /// Predator: chance to turn cautious when hurt and threatened
    pub predator_caution_chance: f64,
    /// Trickster: flat chance to use a random ability
    pub trickster_random_chance: f64,
    /// Trickster: defends when the player's attack gauge is at least this full
    pub trickster_defend_gauge: f32,
    /// Trickster: chance to reach for a debuff
    pub trickster_debuff_chance: f64,
    /// Guardian: own HP below which it turtles up
    pub guardian_wary_hp: f32,
    /// Guardian: chance to defend when healthy
    pub guardian_defend_chance: f64,
    /// Berserker: chance to use its strongest ability when healthy
    pub berserker_ability_chance: f64,
    /// Tactician: attack frequency at or above which the player is aggressive
    pub aggressive_threshold: f32,
    /// Tactician: item frequency at or above which the player is item-heavy
    pub item_heavy_threshold: f32,
    /// Tactician: attack frequency at or below which the player is defensive
    pub defensive_threshold: f32,
    /// Tactician: chance to defend against an aggressive player
    pub tactician_defend_chance: f64,
    /// Threat score boundaries
    pub threat_high: f32,
    pub threat_low: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            critical_hp: 0.25,
            low_hp: 0.30,
            predator_ability_chance: 0.4,
            predator_caution_chance: 0.5,
            trickster_random_chance: 0.30,
            trickster_defend_gauge: 0.7,
            trickster_debuff_chance: 0.5,
            guardian_wary_hp: 0.5,
            guardian_defend_chance: 0.5,
            berserker_ability_chance: 0.2,
            aggressive_threshold: 0.6,
            item_heavy_threshold: 0.3,
            defensive_threshold: 0.3,
            tactician_defend_chance: 0.5,
            threat_high: 0.7,
            threat_low: 0.35,
        }
    }
}

impl AiTuning {
    pub fn validate(&self) -> Result<(), String> {
        let chances = [
            self.predator_ability_chance,
            self.predator_caution_chance,
            self.trickster_random_chance,
            self.trickster_debuff_chance,
            self.guardian_defend_chance,
            self.berserker_ability_chance,
            self.tactician_defend_chance,
        ];
        if chances.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err("ai probabilities must lie in [0, 1]".into());
        }
        if self.threat_low >= self.threat_high {
            return Err(format!(
                "ai.threat_low ({}) should be < ai.threat_high ({})",
                self.threat_low, self.threat_high
            ));
        }
        if self.defensive_threshold >= self.aggressive_threshold {
            return Err(format!(
                "ai.defensive_threshold ({}) should be < ai.aggressive_threshold ({})",
                self.defensive_threshold, self.aggressive_threshold
            ));
        }
        Ok(())
    }
}

/// Rule-tree AI keyed on an instinct
#[derive(Debug, Clone)]
pub struct InstinctAi {
    instinct: Instinct,
    tuning: AiTuning,
}

impl InstinctAi {
    pub fn new(instinct: Instinct, tuning: AiTuning) -> Self {
        Self { instinct, tuning }
    }

    fn predator(&self, ctx: &DecisionContext, rng: &mut dyn RngCore) -> EnemyAction {
        let t = &self.tuning;
        let Some(traits) = ctx.traits() else {
            return EnemyAction::Attack { stance: AttackStance::Aggressive };
        };

        // Go for the kill
        if ctx.player_hp_fraction() <= t.critical_hp {
            if let Some(index) = strongest_available(traits) {
                return EnemyAction::Ability(index);
            }
        }

        // Wounded and facing a strong player: sometimes back off
        if ctx.own_hp_fraction() <= t.low_hp
            && ctx.threat == ThreatLevel::High
            && rng.gen_bool(t.predator_caution_chance)
        {
            return best_by_type(traits, EffectTag::Heal)
                .or_else(|| best_by_type(traits, EffectTag::BuffDefense))
                .map(EnemyAction::Ability)
                .unwrap_or(EnemyAction::Defend);
        }

        if let Some(index) = strongest_available(traits) {
            if rng.gen_bool(t.predator_ability_chance) {
                return EnemyAction::Ability(index);
            }
        }

        EnemyAction::Attack { stance: AttackStance::Aggressive }
    }

    fn trickster(&self, ctx: &DecisionContext, rng: &mut dyn RngCore) -> EnemyAction {
        let t = &self.tuning;
        let Some(traits) = ctx.traits() else {
            return EnemyAction::Attack { stance: AttackStance::Normal };
        };

        if rng.gen_bool(t.trickster_random_chance) {
            if let Some(index) = random_available(traits, rng) {
                return EnemyAction::Ability(index);
            }
        }

        if ctx.player_attack_fraction() >= t.trickster_defend_gauge {
            return EnemyAction::Defend;
        }

        let debuff = best_by_type(traits, EffectTag::DebuffAttack)
            .or_else(|| best_by_type(traits, EffectTag::DebuffDefense));
        if let Some(index) = debuff {
            if rng.gen_bool(t.trickster_debuff_chance) {
                return EnemyAction::Ability(index);
            }
        }

        EnemyAction::Attack { stance: AttackStance::Normal }
    }

    fn guardian(&self, ctx: &DecisionContext, rng: &mut dyn RngCore) -> EnemyAction {
        let t = &self.tuning;
        let traits = ctx.traits();

        // Forced heal when low
        if ctx.own_hp_fraction() < t.low_hp {
            if let Some(index) = traits.and_then(|tr| best_by_type(tr, EffectTag::Heal)) {
                return EnemyAction::Ability(index);
            }
        }

        if ctx.player_hp_fraction() <= t.critical_hp {
            return traits
                .and_then(strongest_available)
                .map(EnemyAction::Ability)
                .unwrap_or(EnemyAction::Attack { stance: AttackStance::Aggressive });
        }

        if ctx.own_hp_fraction() < t.guardian_wary_hp {
            return traits
                .and_then(|tr| best_by_type(tr, EffectTag::BuffDefense))
                .map(EnemyAction::Ability)
                .unwrap_or(EnemyAction::Defend);
        }

        if rng.gen_bool(t.guardian_defend_chance) {
            EnemyAction::Defend
        } else {
            EnemyAction::Attack { stance: AttackStance::Normal }
        }
    }

    fn berserker(&self, ctx: &DecisionContext, rng: &mut dyn RngCore) -> EnemyAction {
        let t = &self.tuning;
        let strongest = ctx.traits().and_then(strongest_available);

        if ctx.own_hp_fraction() < t.low_hp {
            return strongest
                .map(EnemyAction::Ability)
                .unwrap_or(EnemyAction::Attack { stance: AttackStance::Reckless });
        }

        if let Some(index) = strongest {
            if rng.gen_bool(t.berserker_ability_chance) {
                return EnemyAction::Ability(index);
            }
        }

        EnemyAction::Attack { stance: AttackStance::Aggressive }
    }

    fn tactician(&self, ctx: &DecisionContext, rng: &mut dyn RngCore) -> EnemyAction {
        let t = &self.tuning;
        let traits = ctx.traits();

        match ctx.strategy {
            PlayerStrategy::Aggressive => {
                if rng.gen_bool(t.tactician_defend_chance) {
                    return traits
                        .and_then(|tr| best_by_type(tr, EffectTag::BuffDefense))
                        .map(EnemyAction::Ability)
                        .unwrap_or(EnemyAction::Defend);
                }
                traits
                    .and_then(strongest_available)
                    .map(EnemyAction::Ability)
                    .unwrap_or(EnemyAction::Attack { stance: AttackStance::Normal })
            }
            PlayerStrategy::ItemHeavy => traits
                .and_then(strongest_available)
                .map(EnemyAction::Ability)
                .unwrap_or(EnemyAction::Attack { stance: AttackStance::Aggressive }),
            PlayerStrategy::Defensive => traits
                .and_then(|tr| {
                    best_by_type(tr, EffectTag::DebuffDefense)
                        .or_else(|| best_by_type(tr, EffectTag::DebuffAttack))
                })
                .map(EnemyAction::Ability)
                .unwrap_or(EnemyAction::Attack { stance: AttackStance::Normal }),
            PlayerStrategy::Balanced => {
                if ctx.own_hp_fraction() < t.low_hp {
                    if let Some(index) = traits.and_then(|tr| best_by_type(tr, EffectTag::Heal)) {
                        return EnemyAction::Ability(index);
                    }
                }
                if ctx.player_hp_fraction() < t.low_hp {
                    return traits
                        .and_then(strongest_available)
                        .map(EnemyAction::Ability)
                        .unwrap_or(EnemyAction::Attack { stance: AttackStance::Aggressive });
                }
                EnemyAction::Attack { stance: AttackStance::Normal }
            }
        }
    }
}

impl BattleAI for InstinctAi {
    fn decide(&mut self, context: &DecisionContext, rng: &mut dyn RngCore) -> EnemyAction {
        let action = match self.instinct {
            Instinct::Predator => self.predator(context, rng),
            Instinct::Trickster => self.trickster(context, rng),
            Instinct::Guardian => self.guardian(context, rng),
            Instinct::Berserker => self.berserker(context, rng),
            Instinct::Tactician => self.tactician(context, rng),
        };
        tracing::debug!(instinct = ?self.instinct, ?action, threat = ?context.threat, "enemy decided");
        action
    }

    fn instinct(&self) -> Instinct {
        self.instinct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ability::{Ability, AbilityEffect, DamageValue};
    use crate::battle::combatant::{Combatant, EnemyTraits};
    use crate::core::types::{EnemyId, Tier};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn enemy(instinct: Instinct) -> Combatant {
        let traits = EnemyTraits::new(EnemyId::new("test"), instinct, Tier::new(1)).with_abilities(vec![
            Ability::new("Bite", DamageValue::Range(5, 9), AbilityEffect::Damage, 2),
            Ability::new("Crush", DamageValue::Fixed(14), AbilityEffect::Damage, 3),
            Ability::new("Mend", DamageValue::Fixed(20), AbilityEffect::Heal, 3),
            Ability::new("Harden", DamageValue::Fixed(10), AbilityEffect::BuffDefense, 2),
            Ability::new("Hex", DamageValue::Fixed(10), AbilityEffect::DebuffDefense, 2),
        ]);
        Combatant::enemy("Test", 1, 100, 8, 3, 5, traits)
    }

    fn player() -> Combatant {
        Combatant::player("Hero", 1, 100, 100, 100)
    }

    fn decide(instinct: Instinct, enemy: &Combatant, player: &Combatant, strategy: PlayerStrategy, seed: u64) -> EnemyAction {
        let mut ai = InstinctAi::new(instinct, AiTuning::default());
        let threat = ThreatLevel::assess(player, &AiTuning::default());
        let ctx = DecisionContext::new(enemy, player, 1, threat, strategy);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        ai.decide(&ctx, &mut rng)
    }

    #[test]
    fn test_predator_escalates_on_critical_player() {
        let e = enemy(Instinct::Predator);
        let mut p = player();
        p.hp.set(20);
        for seed in 0..20 {
            assert_eq!(decide(Instinct::Predator, &e, &p, PlayerStrategy::Balanced, seed), EnemyAction::Ability(1));
        }
    }

    #[test]
    fn test_predator_never_defends_when_healthy() {
        let e = enemy(Instinct::Predator);
        let p = player();
        for seed in 0..50 {
            let action = decide(Instinct::Predator, &e, &p, PlayerStrategy::Balanced, seed);
            assert!(matches!(
                action,
                EnemyAction::Ability(1) | EnemyAction::Attack { stance: AttackStance::Aggressive }
            ));
        }
    }

    #[test]
    fn test_guardian_forced_heal_when_low() {
        let e = enemy(Instinct::Guardian).with_current_hp(20);
        let p = player();
        for seed in 0..20 {
            assert_eq!(decide(Instinct::Guardian, &e, &p, PlayerStrategy::Balanced, seed), EnemyAction::Ability(2));
        }
    }

    #[test]
    fn test_guardian_turtles_when_wary() {
        let e = enemy(Instinct::Guardian).with_current_hp(40);
        let p = player();
        assert_eq!(decide(Instinct::Guardian, &e, &p, PlayerStrategy::Balanced, 1), EnemyAction::Ability(3));
    }

    #[test]
    fn test_guardian_aggressive_when_player_critical() {
        let e = enemy(Instinct::Guardian);
        let mut p = player();
        p.hp.set(10);
        assert_eq!(decide(Instinct::Guardian, &e, &p, PlayerStrategy::Balanced, 1), EnemyAction::Ability(1));
    }

    #[test]
    fn test_berserker_goes_all_in_when_low() {
        let mut e = enemy(Instinct::Berserker).with_current_hp(10);
        let p = player();
        assert_eq!(decide(Instinct::Berserker, &e, &p, PlayerStrategy::Balanced, 3), EnemyAction::Ability(1));

        if let Some(traits) = e.enemy.as_mut() {
            traits.cooldowns.insert("Bite".into(), 2);
            traits.cooldowns.insert("Crush".into(), 2);
        }
        assert_eq!(
            decide(Instinct::Berserker, &e, &p, PlayerStrategy::Balanced, 3),
            EnemyAction::Attack { stance: AttackStance::Reckless }
        );
    }

    #[test]
    fn test_trickster_defends_against_full_gauge() {
        let e = enemy(Instinct::Trickster);
        let p = player();
        let mut defended = 0;
        for seed in 0..100 {
            match decide(Instinct::Trickster, &e, &p, PlayerStrategy::Balanced, seed) {
                EnemyAction::Defend => defended += 1,
                EnemyAction::Ability(_) => {}
                other => panic!("unexpected {other:?}"),
            }
        }
        // Roughly 70% of turns skip the random-ability branch
        assert!(defended > 50, "defended only {defended} times");
    }

    #[test]
    fn test_tactician_counters_defensive_player_with_debuff() {
        let e = enemy(Instinct::Tactician);
        let p = player();
        assert_eq!(decide(Instinct::Tactician, &e, &p, PlayerStrategy::Defensive, 1), EnemyAction::Ability(4));
    }

    #[test]
    fn test_tactician_pressures_item_users() {
        let e = enemy(Instinct::Tactician);
        let p = player();
        assert_eq!(decide(Instinct::Tactician, &e, &p, PlayerStrategy::ItemHeavy, 1), EnemyAction::Ability(1));
    }

    #[test]
    fn test_tuning_validation() {
        let mut tuning = AiTuning::default();
        assert!(tuning.validate().is_ok());
        tuning.threat_low = 0.9;
        assert!(tuning.validate().is_err());
    }
}
