//! Ability selection helpers
//!
//! All helpers only consider off-cooldown abilities and break ties by
//! declaration order, so the same RNG draw always gives the same pick.

use rand::{Rng, RngCore};

use crate::battle::ability::EffectTag;
use crate::battle::combatant::EnemyTraits;

/// Highest-value offensive ability that is off cooldown
pub fn strongest_available(traits: &EnemyTraits) -> Option<usize> {
    best_matching(traits, |tag| {
        matches!(
            tag,
            EffectTag::Damage | EffectTag::MultiHit | EffectTag::Poison | EffectTag::Stun
        )
    })
}

/// Highest-value off-cooldown ability with the requested effect tag
pub fn best_by_type(traits: &EnemyTraits, tag: EffectTag) -> Option<usize> {
    best_matching(traits, |t| t == tag)
}

/// Uniform draw over off-cooldown abilities
pub fn random_available(traits: &EnemyTraits, rng: &mut dyn RngCore) -> Option<usize> {
    let available = traits.available_abilities();
    if available.is_empty() {
        return None;
    }
    let pick = rng.gen_range(0..available.len());
    Some(available[pick])
}

fn best_matching(traits: &EnemyTraits, wanted: impl Fn(EffectTag) -> bool) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for index in traits.available_abilities() {
        let ability = &traits.abilities[index];
        if !wanted(ability.effect.tag()) {
            continue;
        }
        let value = ability.value.nominal();
        // Strictly greater keeps the earliest declaration on ties
        if best.map_or(true, |(_, v)| value > v) {
            best = Some((index, value));
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ability::{Ability, AbilityEffect, DamageValue};
    use crate::battle::ai::Instinct;
    use crate::core::types::{EnemyId, Tier};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn traits() -> EnemyTraits {
        EnemyTraits::new(EnemyId::new("bear"), Instinct::Berserker, Tier::new(2)).with_abilities(vec![
            Ability::new("Swipe", DamageValue::Range(6, 12), AbilityEffect::Damage, 0),
            Ability::new("Maul", DamageValue::Fixed(12), AbilityEffect::Damage, 2),
            Ability::new("Lick Wounds", DamageValue::Fixed(40), AbilityEffect::Heal, 3),
            Ability::new("Roar", DamageValue::Fixed(10), AbilityEffect::DebuffAttack, 2),
            Ability::new("Growl", DamageValue::Fixed(15), AbilityEffect::DebuffAttack, 2),
        ])
    }

    #[test]
    fn test_strongest_ties_break_by_declaration() {
        let t = traits();
        // Swipe (max 12) and Maul (12) tie; the heal is ignored
        assert_eq!(strongest_available(&t), Some(0));
    }

    #[test]
    fn test_strongest_skips_cooldowns() {
        let mut t = traits();
        t.start_cooldown(0);
        // Swipe has no cooldown so it stays available
        assert_eq!(strongest_available(&t), Some(0));

        t.cooldowns.insert("Swipe".into(), 1);
        assert_eq!(strongest_available(&t), Some(1));
    }

    #[test]
    fn test_by_type_picks_highest_value() {
        let t = traits();
        assert_eq!(best_by_type(&t, EffectTag::DebuffAttack), Some(4));
        assert_eq!(best_by_type(&t, EffectTag::Heal), Some(2));
        assert_eq!(best_by_type(&t, EffectTag::BuffDefense), None);
    }

    #[test]
    fn test_random_is_deterministic_per_seed() {
        let t = traits();
        let mut a = ChaCha8Rng::seed_from_u64(11);
        let mut b = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..20 {
            assert_eq!(random_available(&t, &mut a), random_available(&t, &mut b));
        }
    }

    #[test]
    fn test_random_with_nothing_available() {
        let mut t = traits();
        for ability in &t.abilities.clone() {
            t.cooldowns.insert(ability.name.clone(), 2);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(random_available(&t, &mut rng), None);
    }
}
