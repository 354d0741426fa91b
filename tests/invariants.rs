//! Property tests over random battles
//!
//! Run with: PROPTEST_CASES=5000 cargo test --release --test invariants

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use habit_arena::battle::*;
use habit_arena::core::types::Tier;
use habit_arena::core::BattleConfig;
use habit_arena::ports::ProgressionRecord;

const CATALOG: &str = include_str!("../data/enemies.toml");

fn action(code: u8) -> PlayerAction {
    match code % 10 {
        0 | 1 | 2 => PlayerAction::Attack,
        3 => PlayerAction::Defend,
        4 => PlayerAction::Special,
        5 => PlayerAction::Flee,
        n => PlayerAction::UseItem(ItemKind::ALL[(n as usize + code as usize / 10) % ItemKind::ALL.len()]),
    }
}

fn session(enemy_index: usize, level: u32, seed: u64) -> BattleSession {
    let catalog = TomlCatalog::from_toml_str(CATALOG).unwrap();
    let definitions: Vec<&EnemyDefinition> = catalog.iter().collect();
    let definition = definitions[enemy_index % definitions.len()];

    let mut record = ProgressionRecord {
        level,
        ..Default::default()
    };
    for item in ItemKind::ALL {
        record = record.with_item(item.item_id(), 2);
    }
    let mut session = BattleSession::from_encounter(BattleConfig::default(), &record, definition, None, seed);
    session.start();
    session
}

fn assert_bounds(c: &Combatant) -> Result<(), TestCaseError> {
    prop_assert!(c.hp.value() <= c.hp.max());
    prop_assert!(c.attack.value() <= c.attack.max());
    prop_assert!(c.defense.value() <= c.defense.max());
    prop_assert!(c.attack.max() <= GAUGE_MAX);
    if let Some(focus) = c.focus {
        prop_assert!(focus.value() <= GAUGE_MAX);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Random play never breaks gauge bounds, and rejections never mutate
    #[test]
    fn prop_random_battles_hold_invariants(
        seed in any::<u64>(),
        enemy_index in 0usize..32,
        level in 1u32..=8,
        codes in prop::collection::vec(any::<u8>(), 1..80),
    ) {
        let mut session = session(enemy_index, level, seed);
        let mut enemy_turns = session.enemy_turns();

        for code in codes {
            let action = action(code);
            let before_state = session.state();
            let before_player = session.player().snapshot();
            let before_enemy = session.enemy().snapshot();
            let before_items = session.inventory().clone();
            let before_log = session.log().len();

            match session.submit(action) {
                Ok(state) => {
                    prop_assert!(state == BattleState::PlayerTurn || state.is_terminal());
                    prop_assert!(session.enemy_turns() >= enemy_turns);
                }
                Err(err) => {
                    prop_assert!(err.is_rejection(), "unexpected error {err}");
                    prop_assert_eq!(session.state(), before_state);
                    prop_assert_eq!(session.player().snapshot(), before_player);
                    prop_assert_eq!(session.enemy().snapshot(), before_enemy);
                    prop_assert_eq!(session.inventory(), &before_items);
                    let narrated = session.log().len() - before_log;
                    if before_state.is_terminal() {
                        prop_assert_eq!(narrated, 0);
                    } else {
                        prop_assert_eq!(narrated, 1);
                    }
                }
            }
            enemy_turns = session.enemy_turns();

            assert_bounds(session.player())?;
            assert_bounds(session.enemy())?;

            if session.enemy().is_dead() {
                prop_assert_eq!(session.state(), BattleState::Victory);
            } else if session.player().is_dead() {
                prop_assert_eq!(session.state(), BattleState::Defeat);
            }
            if before_state.is_terminal() {
                prop_assert_eq!(session.state(), before_state);
            }
        }
    }

    /// Same seed, same script, same battle
    #[test]
    fn prop_battles_are_reproducible(
        seed in any::<u64>(),
        enemy_index in 0usize..32,
        codes in prop::collection::vec(any::<u8>(), 1..40),
    ) {
        let mut a = session(enemy_index, 5, seed);
        let mut b = session(enemy_index, 5, seed);
        for code in codes {
            let ra = a.submit(action(code)).map_err(|e| e.to_string());
            let rb = b.submit(action(code)).map_err(|e| e.to_string());
            prop_assert_eq!(ra, rb);
        }
        prop_assert_eq!(a.log().entries(), b.log().entries());
    }
}

#[test]
fn test_flee_rate_matches_tier_one_chance() {
    let catalog = TomlCatalog::from_toml_str(CATALOG).unwrap();
    let slime = catalog.iter().find(|e| e.tier == Tier::new(1)).unwrap();
    let record = ProgressionRecord::default();

    let runs = 10_000;
    let mut fled = 0;
    for seed in 0..runs {
        let mut session = BattleSession::from_encounter(BattleConfig::default(), &record, slime, None, seed);
        session.start();
        if session.submit(PlayerAction::Flee).unwrap() == BattleState::Fled {
            fled += 1;
        }
    }
    let rate = fled as f64 / runs as f64;
    assert!((rate - 0.8).abs() <= 0.02, "flee rate {rate}");
}
