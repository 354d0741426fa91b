//! Battle constants - default tuning values in one place
//!
//! `BattleConfig::default()` is built from these. Balance data, not contract.

// Gauges
pub const GAUGE_MAX: u32 = 100;
pub const PLAYER_ATTACK_REGEN: u32 = 8;
pub const PLAYER_DEFENSE_REGEN: u32 = 5;
pub const ENEMY_ATTACK_REGEN: u32 = 4;
pub const ENEMY_DEFENSE_REGEN: u32 = 3;
pub const FOCUS_PER_ATTACK: u32 = 15;
pub const FOCUS_PER_DEFEND: u32 = 10;
pub const ENEMY_DEFENSE_GAUGE_FACTOR: u32 = 5;

// Costs (attack gauge)
pub const BASIC_ATTACK_COST: u32 = 10;
pub const ENEMY_ATTACK_COST: u32 = 10;
pub const ENEMY_ABILITY_COST: u32 = 15;
pub const FIREBALL_COST: u32 = 25;
pub const STAR_SHIELD_COST: u32 = 15;
pub const FROST_ORB_COST: u32 = 20;
pub const POISON_DART_COST: u32 = 15;
pub const THUNDER_COST: u32 = 35;

// Damage
pub const PLAYER_STRIKE_MIN: u32 = 12;
pub const PLAYER_STRIKE_MAX: u32 = 18;
pub const PLAYER_STRIKE_PER_LEVEL: u32 = 1;
pub const ENEMY_STRIKE_SPREAD: u32 = 2;
pub const SPECIAL_MIN: u32 = 30;
pub const SPECIAL_MAX: u32 = 45;
pub const SPECIAL_PER_LEVEL: u32 = 2;
pub const SPECIAL_UNLOCK_LEVEL: u32 = 5;
pub const AGGRESSIVE_MULTIPLIER: f32 = 1.2;
pub const RECKLESS_MULTIPLIER: f32 = 1.5;
pub const POTION_HEAL: u32 = 30;
pub const FIREBALL_MIN: u32 = 20;
pub const FIREBALL_MAX: u32 = 28;
pub const THUNDER_MIN: u32 = 30;
pub const THUNDER_MAX: u32 = 40;
pub const STAR_SHIELD_CHARGES: u32 = 2;
pub const FROST_ORB_TURNS: u32 = 1;
pub const POISON_DART_DAMAGE: u32 = 5;
pub const POISON_DART_TURNS: u32 = 3;
pub const FIREBALL_BURN_DAMAGE: u32 = 3;
pub const FIREBALL_BURN_TURNS: u32 = 2;
// Weakened / gauge debuffs from enemy abilities
pub const DEBUFF_TURNS: u32 = 2;

// Flee
pub const FLEE_BASE_CHANCE: f64 = 0.9;
pub const FLEE_PER_TIER: f64 = 0.1;
pub const FLEE_FLOOR: f64 = 0.3;

// Fairness override
pub const FAIRNESS_TURN_THRESHOLD: u32 = 5;
pub const MINIMUM_SPECIAL_USES: u32 = 3;

// Self-heal capability triggers below this HP fraction
pub const SELF_HEAL_HP_THRESHOLD: f32 = 0.5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_costs_in_special_band() {
        for cost in [FIREBALL_COST, STAR_SHIELD_COST, FROST_ORB_COST, POISON_DART_COST, THUNDER_COST] {
            assert!((15..=35).contains(&cost));
        }
    }

    #[test]
    fn test_multiplier_ordering() {
        assert!(RECKLESS_MULTIPLIER > AGGRESSIVE_MULTIPLIER);
        assert!(AGGRESSIVE_MULTIPLIER > 1.0);
    }

    #[test]
    fn test_player_regen_outpaces_enemy() {
        assert!(PLAYER_ATTACK_REGEN > ENEMY_ATTACK_REGEN);
        assert!(PLAYER_DEFENSE_REGEN > ENEMY_DEFENSE_REGEN);
    }
}
