//! Async runner: pacing, audio cues and terminal write-back

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use habit_arena::battle::ai::Instinct;
use habit_arena::battle::*;
use habit_arena::core::error::ArenaError;
use habit_arena::core::types::{EnemyId, Side, Tier};
use habit_arena::core::BattleConfig;
use habit_arena::ports::{
    AudioCue, AudioHooks, BehaviorMemory, InMemoryBehaviorMemory, InMemoryProgression, NoAudio, Pacing,
    PresentationSink,
};

#[derive(Clone, Copy)]
enum Mode {
    Immediate,
    AtLeast(Duration),
    DroppedSignal,
    NeverReady,
}

struct Recorder {
    mode: Mode,
    lines: Vec<String>,
    animations: Vec<AnimationKind>,
    states: Vec<BattleState>,
    terminal: Option<(BattleState, i64)>,
    held: Vec<oneshot::Sender<()>>,
}

impl Recorder {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            lines: Vec::new(),
            animations: Vec::new(),
            states: Vec::new(),
            terminal: None,
            held: Vec::new(),
        }
    }

    fn pacing(&mut self) -> Pacing {
        match self.mode {
            Mode::Immediate => Pacing::Immediate,
            Mode::AtLeast(duration) => Pacing::AtLeast(duration),
            Mode::DroppedSignal => {
                let (_tx, rx) = oneshot::channel();
                Pacing::Until(rx)
            }
            Mode::NeverReady => {
                let (tx, rx) = oneshot::channel();
                self.held.push(tx);
                Pacing::Until(rx)
            }
        }
    }
}

impl PresentationSink for Recorder {
    fn on_log_message(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    fn on_action_animation(&mut self, kind: AnimationKind, _side: Side, _magnitude: u32) -> Pacing {
        self.animations.push(kind);
        self.pacing()
    }

    fn on_state_change(&mut self, state: BattleState) {
        self.states.push(state);
    }

    fn on_terminal(&mut self, result: BattleState, loot: &Loot) -> Pacing {
        self.terminal = Some((result, loot.xp_delta));
        Pacing::Immediate
    }
}

#[derive(Clone, Default)]
struct Cues(Arc<Mutex<Vec<AudioCue>>>);

impl AudioHooks for Cues {
    fn cue(&mut self, cue: AudioCue) {
        if let Ok(mut cues) = self.0.lock() {
            cues.push(cue);
        }
    }
}

fn session(config: BattleConfig, enemy_hp: u32) -> BattleSession {
    let traits = EnemyTraits::new(EnemyId::new("slime"), Instinct::Guardian, Tier::new(1));
    let enemy = Combatant::enemy("Slime", 1, enemy_hp, 4, 0, 5, traits);
    let player = Combatant::player("Hero", 1, 100, 100, 100);
    BattleSession::new(config, player, enemy, 17)
}

#[tokio::test]
async fn test_at_least_pacing_holds_the_runner() {
    let sink = Recorder::new(Mode::AtLeast(Duration::from_millis(30)));
    let mut runner = BattleRunner::new(session(BattleConfig::default(), 500), sink, NoAudio);
    runner.start().await.unwrap();

    let started = Instant::now();
    runner.submit(PlayerAction::Attack).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(30));
    assert!(runner.sink().animations.contains(&AnimationKind::Strike));
}

#[tokio::test]
async fn test_dropped_ready_signal_does_not_stall() {
    let sink = Recorder::new(Mode::DroppedSignal);
    let mut runner = BattleRunner::new(session(BattleConfig::default(), 500), sink, NoAudio);
    runner.start().await.unwrap();

    let started = Instant::now();
    let state = runner.submit(PlayerAction::Attack).await.unwrap();
    assert_eq!(state, BattleState::PlayerTurn);
    // default timeout is five seconds; a dropped sender resolves at once
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_presentation_timeout_lets_battle_continue() {
    let mut config = BattleConfig::default();
    config.pacing.presentation_timeout_ms = 20;
    let sink = Recorder::new(Mode::NeverReady);
    let mut runner = BattleRunner::new(session(config, 500), sink, NoAudio);
    runner.start().await.unwrap();

    let started = Instant::now();
    let state = runner.submit(PlayerAction::Attack).await.unwrap();
    assert_eq!(state, BattleState::PlayerTurn);
    assert!(started.elapsed() >= Duration::from_millis(20));
    assert!(!runner.sink().held.is_empty());
}

#[tokio::test]
async fn test_min_turn_delay_applied_between_actions() {
    let mut config = BattleConfig::default();
    config.pacing.min_turn_delay_ms = 25;
    let mut runner = BattleRunner::headless(session(config, 500));
    runner.start().await.unwrap();

    let started = Instant::now();
    runner.submit(PlayerAction::Defend).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(25));
}

#[tokio::test]
async fn test_rejection_is_still_narrated() {
    let mut runner = BattleRunner::new(session(BattleConfig::default(), 500), Recorder::new(Mode::Immediate), NoAudio);
    runner.start().await.unwrap();
    let lines_before = runner.sink().lines.len();

    let result = runner.submit(PlayerAction::UseItem(ItemKind::Thunder)).await;
    assert!(matches!(result, Err(ArenaError::MissingItem(ItemKind::Thunder))));
    assert_eq!(runner.sink().lines.len(), lines_before + 1);
}

#[tokio::test]
async fn test_victory_cues_notifies_and_writes_back() {
    let cues = Cues::default();
    let mut runner = BattleRunner::new(session(BattleConfig::default(), 1), Recorder::new(Mode::Immediate), cues.clone());
    runner.start().await.unwrap();
    assert_eq!(runner.submit(PlayerAction::Attack).await.unwrap(), BattleState::Victory);

    let mut store = InMemoryProgression::default();
    let mut memory = InMemoryBehaviorMemory::new();
    let loot = runner.finish(&mut store, &mut memory).await.unwrap();

    let heard = cues.0.lock().unwrap().clone();
    assert_eq!(heard.first(), Some(&AudioCue::BattleStart));
    assert_eq!(heard.last(), Some(&AudioCue::Victory));
    assert!(heard.contains(&AudioCue::Hit));

    assert_eq!(store.saves(), 1);
    assert_eq!(store.record().xp, loot.xp_delta as u64);

    let profile = memory.profile(&EnemyId::new("slime")).unwrap();
    assert_eq!(profile.encounters, 1);
    assert_eq!(profile.attack_frequency, 1.0);

    assert!(!runner.is_open());
    assert!(runner.session().is_none());
    assert!(matches!(
        runner.finish(&mut store, &mut memory).await,
        Err(ArenaError::SessionClosed)
    ));
    assert_eq!(store.saves(), 1);
}

#[tokio::test]
async fn test_sink_sees_terminal_and_state_changes() {
    let mut runner = BattleRunner::new(session(BattleConfig::default(), 1), Recorder::new(Mode::Immediate), NoAudio);
    runner.start().await.unwrap();
    runner.submit(PlayerAction::Attack).await.unwrap();

    let states = runner.sink().states.clone();
    assert_eq!(states.first(), Some(&BattleState::PlayerTurn));
    assert_eq!(states.last(), Some(&BattleState::Victory));

    let mut store = InMemoryProgression::default();
    let loot = runner.finish(&mut store, &mut habit_arena::ports::NoMemory).await.unwrap();
    assert_eq!(runner.sink().terminal, Some((BattleState::Victory, loot.xp_delta)));
    assert!(runner.sink().lines.iter().any(|l| l.starts_with("Gained")));
}
