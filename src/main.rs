//! Habit Arena - headless battle runner
//!
//! Loads the battle config and enemy catalog, plays a scripted player
//! against a catalog enemy and prints a JSON (or text) summary.

use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::runtime::Runtime;

use habit_arena::battle::{
    BattleRunner, BattleSession, BattleState, EnemyCatalog, ItemKind, LogEntry, PlayerAction, StatusKind,
    TomlCatalog,
};
use habit_arena::core::error::{ArenaError, Result};
use habit_arena::core::types::{EnemyId, Tier};
use habit_arena::core::BattleConfig;
use habit_arena::ports::{BehaviorMemory, InMemoryBehaviorMemory, InMemoryProgression, ProgressionRecord, ProgressionStore};

/// Headless battle runner - scripted player vs catalog enemy
#[derive(Parser, Debug)]
#[command(name = "habit-arena")]
#[command(about = "Simulate a battle and print the result")]
struct Args {
    /// Battle tuning file
    #[arg(long, default_value = "data/battle.toml")]
    config: PathBuf,

    /// Enemy catalog
    #[arg(long, default_value = "data/enemies.toml")]
    catalog: PathBuf,

    /// Fight this enemy instead of drawing one
    #[arg(long)]
    enemy: Option<String>,

    /// Difficulty tier to draw from
    #[arg(long, default_value_t = 1)]
    tier: u8,

    /// Player level
    #[arg(long, default_value_t = 1)]
    level: u32,

    /// Potions in the starting inventory
    #[arg(long, default_value_t = 2)]
    potions: u32,

    /// Give up after this many player actions
    #[arg(long, default_value_t = 200)]
    max_actions: u32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Include the full battle log in the output
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct BattleSummary {
    result: BattleState,
    enemy: String,
    tier: u8,
    turns: u32,
    enemy_turns: u32,
    player_hp: u32,
    enemy_hp: u32,
    xp_delta: i64,
    items_gained: Vec<String>,
    items_lost: Vec<String>,
    seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<Vec<LogEntry>>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("habit_arena=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let rt = Runtime::new()?;
    rt.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    let seed = args.seed.unwrap_or_else(rand::random);

    let config = if args.config.exists() {
        BattleConfig::load(&args.config)?
    } else {
        tracing::warn!(path = %args.config.display(), "config file not found, using defaults");
        BattleConfig::default()
    };
    let catalog = TomlCatalog::load(&args.catalog)?;

    let mut pick_rng = StdRng::seed_from_u64(seed);
    let definition = match &args.enemy {
        Some(id) => catalog.get(&EnemyId::new(id.as_str())),
        None => catalog.select(args.level, Tier::new(args.tier), &mut pick_rng),
    }
    .ok_or_else(|| ArenaError::Catalog(format!("no enemy for tier {} at level {}", args.tier, args.level)))?;

    let record = ProgressionRecord {
        level: args.level,
        ..Default::default()
    }
    .with_item(ItemKind::Potion.item_id(), args.potions);
    let mut store = InMemoryProgression::new(record);
    let mut memory = InMemoryBehaviorMemory::new();

    let profile = memory.profile(&definition.id);
    let session = BattleSession::from_encounter(config, &store.load()?, definition, profile, seed);
    let mut runner = BattleRunner::headless(session);
    runner.start().await?;

    let mut actions = 0;
    let mut state = BattleState::PlayerTurn;
    while !state.is_terminal() && actions < args.max_actions {
        let Some(session) = runner.session() else { break };
        let action = choose_action(session);
        state = match runner.submit(action).await {
            Ok(state) => state,
            Err(err) if err.is_rejection() => {
                tracing::debug!(%err, "scripted action rejected, fleeing");
                runner.submit(PlayerAction::Flee).await?
            }
            Err(err) => return Err(err),
        };
        actions += 1;
    }

    if !state.is_terminal() {
        tracing::warn!(actions, "battle did not finish, force-closing");
        runner.force_close();
        return Err(ArenaError::NotTerminal { state });
    }

    let (turns, enemy_turns, player_hp, enemy_hp, log) = match runner.session() {
        Some(s) => (
            s.turn_count(),
            s.enemy_turns(),
            s.player().hp.value(),
            s.enemy().hp.value(),
            s.log().entries().to_vec(),
        ),
        None => return Err(ArenaError::SessionClosed),
    };
    let loot = runner.finish(&mut store, &mut memory).await?;

    let summary = BattleSummary {
        result: state,
        enemy: definition.name.clone(),
        tier: definition.tier.value(),
        turns,
        enemy_turns,
        player_hp,
        enemy_hp,
        xp_delta: loot.xp_delta,
        items_gained: loot.items_gained.iter().map(|i| i.as_str().to_string()).collect(),
        items_lost: loot.items_lost.iter().map(|i| i.as_str().to_string()).collect(),
        seed,
        log: args.verbose.then_some(log),
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        if let Some(log) = &summary.log {
            for entry in log {
                println!("[{:>3}] {}", entry.turn, entry.text);
            }
        }
        println!(
            "{:?} vs {} after {} turns (HP {}), XP {:+}",
            summary.result, summary.enemy, summary.turns, summary.player_hp, summary.xp_delta
        );
    }

    Ok(())
}

/// Potion when low, focus strike when ready, attack when affordable, else defend
fn choose_action(session: &BattleSession) -> PlayerAction {
    let player = session.player();
    let config = session.config();

    if player.hp_fraction() < 0.4 && session.item_count(ItemKind::Potion) > 0 {
        return PlayerAction::UseItem(ItemKind::Potion);
    }
    let focus_ready = player.focus.map(|f| f.is_full()).unwrap_or(false);
    if focus_ready && player.level >= config.damage.special_unlock_level {
        return PlayerAction::Special;
    }
    if player.attack.can_afford(config.costs.basic_attack) {
        return PlayerAction::Attack;
    }
    if player.statuses.has(StatusKind::DefendBlocked) {
        return PlayerAction::Flee;
    }
    PlayerAction::Defend
}
