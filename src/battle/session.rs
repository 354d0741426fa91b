//! Battle session state machine
//!
//! Initializing -> PlayerTurn <-> Animating <-> EnemyTurn -> {Victory | Defeat | Fled}
//!
//! `submit` processes one player action to completion: the action itself,
//! then every enemy turn and status tick it cascades into, until control is
//! back with the player or the battle is over. Presentation events are
//! queued on the log while this runs; the async runner drains them.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battle::ability::{AbilityEffect, SpecialAbility};
use crate::battle::actions::{AttackStance, EnemyAction, ItemKind, PlayerAction};
use crate::battle::ai::{BattleAI, DecisionContext, FairnessTracker, InstinctAi, PlayerStrategy, ThreatLevel};
use crate::battle::catalog::EnemyDefinition;
use crate::battle::combatant::Combatant;
use crate::battle::constants::SELF_HEAL_HP_THRESHOLD;
use crate::battle::log::{AnimationKind, BattleLog, LogKind, PresentationEvent};
use crate::battle::outcome::{Loot, LootTable, OutcomeResolver};
use crate::battle::resolution::{
    mitigate_armor, resolve_gauge, resolve_heal, resolve_hit, resolve_status, scale, Hit,
};
use crate::battle::status::{tick_start_of_turn, Affliction, SkipReason, StatusKind, TickReport};
use crate::core::config::{BattleConfig, FleeConfig};
use crate::core::error::{ArenaError, Result};
use crate::core::types::{GaugeKind, ItemId, SessionId, Side, Tier, Turn};
use crate::ports::memory::{BehaviorProfile, BehaviorTally};
use crate::ports::progression::ProgressionRecord;

/// Battle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BattleState {
    #[default]
    Initializing,
    PlayerTurn,
    /// Transient while an action's effects are applied and narrated
    Animating,
    EnemyTurn,
    Victory,
    Defeat,
    Fled,
}

impl BattleState {
    /// Terminal states are absorbing
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat | Self::Fled)
    }
}

/// Flee success chance against an enemy of `tier`
pub fn flee_chance(config: &FleeConfig, tier: Tier) -> f64 {
    (config.base_chance - tier.value() as f64 * config.per_tier)
        .max(config.floor)
        .clamp(0.0, 1.0)
}

/// One encounter between the player and a single enemy
pub struct BattleSession {
    id: SessionId,
    config: BattleConfig,
    player: Combatant,
    enemy: Combatant,
    loot_table: Option<LootTable>,
    inventory: BTreeMap<ItemId, u32>,
    state: BattleState,
    turn_count: Turn,
    enemy_turns: u32,
    /// Enemy turns that reached a decision; frozen or skipped turns don't count
    enemy_actions: u32,
    /// Player lost a turn since their last action
    player_skipped: bool,
    log: BattleLog,
    fairness: FairnessTracker,
    strategy: PlayerStrategy,
    tally: BehaviorTally,
    ai: Box<dyn BattleAI>,
    outcome: OutcomeResolver,
    rng: ChaCha8Rng,
}

impl BattleSession {
    /// Session with an instinct AI matching the enemy and an empty inventory
    pub fn new(config: BattleConfig, player: Combatant, enemy: Combatant, seed: u64) -> Self {
        let instinct = enemy.enemy.as_ref().map(|t| t.instinct).unwrap_or_default();
        let ai = Box::new(InstinctAi::new(instinct, config.ai.clone()));
        let fairness = FairnessTracker::new(&config.fairness);
        Self {
            id: SessionId::new(),
            config,
            player,
            enemy,
            loot_table: None,
            inventory: BTreeMap::new(),
            state: BattleState::Initializing,
            turn_count: 1,
            enemy_turns: 0,
            enemy_actions: 0,
            player_skipped: false,
            log: BattleLog::new(),
            fairness,
            strategy: PlayerStrategy::Balanced,
            tally: BehaviorTally::default(),
            ai,
            outcome: OutcomeResolver::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seed both combatants from the progression record and a catalog entry
    pub fn from_encounter(
        config: BattleConfig,
        record: &ProgressionRecord,
        definition: &EnemyDefinition,
        profile: Option<BehaviorProfile>,
        seed: u64,
    ) -> Self {
        let player = Combatant::player(
            record.name.clone(),
            record.level,
            record.max_hp,
            record.attack,
            record.defense,
        )
        .with_current_hp(record.hp);
        let enemy = definition.spawn(record.level, &config);
        Self::new(config, player, enemy, seed)
            .with_inventory(record.inventory.clone())
            .with_loot_table(definition.loot.clone())
            .with_behavior_profile(profile)
    }

    pub fn with_inventory(mut self, inventory: BTreeMap<ItemId, u32>) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn with_item(mut self, item: ItemKind, count: u32) -> Self {
        self.inventory.insert(item.item_id(), count);
        self
    }

    pub fn with_loot_table(mut self, table: Option<LootTable>) -> Self {
        self.loot_table = table;
        self
    }

    /// Classify the player from past encounters; no memory reads as balanced
    pub fn with_behavior_profile(mut self, profile: Option<BehaviorProfile>) -> Self {
        self.strategy = match profile {
            Some(profile) => PlayerStrategy::classify(&profile, &self.config.ai),
            None => {
                tracing::warn!(enemy = %self.enemy.name, "no behavior memory, assuming balanced player");
                PlayerStrategy::Balanced
            }
        };
        self
    }

    /// Swap in a different decision engine
    pub fn with_ai(mut self, ai: Box<dyn BattleAI>) -> Self {
        self.ai = ai;
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn player(&self) -> &Combatant {
        &self.player
    }

    pub fn enemy(&self) -> &Combatant {
        &self.enemy
    }

    /// Direct access for scripted setups
    pub fn player_mut(&mut self) -> &mut Combatant {
        &mut self.player
    }

    pub fn enemy_mut(&mut self) -> &mut Combatant {
        &mut self.enemy
    }

    pub fn turn_count(&self) -> Turn {
        self.turn_count
    }

    pub fn enemy_turns(&self) -> u32 {
        self.enemy_turns
    }

    pub fn enemy_actions(&self) -> u32 {
        self.enemy_actions
    }

    pub fn log(&self) -> &BattleLog {
        &self.log
    }

    pub fn fairness(&self) -> &FairnessTracker {
        &self.fairness
    }

    pub fn strategy(&self) -> PlayerStrategy {
        self.strategy
    }

    pub fn tally(&self) -> BehaviorTally {
        self.tally
    }

    pub fn inventory(&self) -> &BTreeMap<ItemId, u32> {
        &self.inventory
    }

    pub fn item_count(&self, item: ItemKind) -> u32 {
        self.inventory.get(&item.item_id()).copied().unwrap_or(0)
    }

    pub fn outcome(&self) -> Option<&Loot> {
        self.outcome.loot()
    }

    pub fn drain_events(&mut self) -> Vec<PresentationEvent> {
        self.log.drain_events()
    }

    /// Open the battle and hand the first turn to the player
    pub fn start(&mut self) {
        if self.state != BattleState::Initializing {
            return;
        }
        tracing::info!(
            session = %self.id.0,
            player = %self.player.name,
            enemy = %self.enemy.name,
            tier = self.enemy.tier().value(),
            "battle started"
        );
        self.log.push(
            self.turn_count,
            LogKind::BattleStarted,
            format!("A wild {} appears!", self.enemy.name),
        );
        self.push_stats();
        self.set_state(BattleState::PlayerTurn);
    }

    /// Check an action against the current state, gauges and inventory
    ///
    /// Rejections other than `NotPlayerTurn` leave exactly one log entry.
    pub fn validate(&mut self, action: PlayerAction) -> Result<()> {
        if self.state != BattleState::PlayerTurn {
            return Err(ArenaError::NotPlayerTurn { state: self.state });
        }
        match self.check_legal(action) {
            Ok(()) => Ok(()),
            Err(err) => {
                let kind = match err {
                    ArenaError::ActionBlocked { .. } | ArenaError::SpecialLocked { .. } => LogKind::Blocked,
                    _ => LogKind::InsufficientResource,
                };
                self.log.push(self.turn_count, kind, err.to_string());
                tracing::debug!(action = %action.label(), reason = %err, "player action rejected");
                Err(err)
            }
        }
    }

    fn check_legal(&self, action: PlayerAction) -> Result<()> {
        let statuses = &self.player.statuses;
        match action {
            PlayerAction::Attack => self.check_gauge(self.config.costs.basic_attack),
            PlayerAction::Defend => {
                if statuses.has(StatusKind::DefendBlocked) {
                    return Err(ArenaError::ActionBlocked {
                        action: action.label(),
                        by: StatusKind::DefendBlocked.label().to_string(),
                    });
                }
                Ok(())
            }
            PlayerAction::Special => {
                let required = self.config.damage.special_unlock_level;
                if self.player.level < required {
                    return Err(ArenaError::SpecialLocked {
                        level: self.player.level,
                        required,
                    });
                }
                match self.player.focus {
                    Some(focus) if focus.is_full() => Ok(()),
                    focus => Err(ArenaError::FocusNotReady {
                        focus: focus.map(|f| f.value()).unwrap_or(0),
                    }),
                }
            }
            PlayerAction::UseItem(item) => {
                if item == ItemKind::Fireball && statuses.has(StatusKind::FireballBlocked) {
                    return Err(ArenaError::ActionBlocked {
                        action: action.label(),
                        by: StatusKind::FireballBlocked.label().to_string(),
                    });
                }
                if self.item_count(item) == 0 {
                    return Err(ArenaError::MissingItem(item));
                }
                self.check_gauge(item.cost(&self.config))
            }
            PlayerAction::Flee => Ok(()),
        }
    }

    fn check_gauge(&self, cost: u32) -> Result<()> {
        if self.player.attack.can_afford(cost) {
            Ok(())
        } else {
            Err(ArenaError::InsufficientGauge {
                gauge: GaugeKind::Attack,
                cost,
                available: self.player.attack.value(),
            })
        }
    }

    /// Run one player action and everything it cascades into
    ///
    /// Returns the state control lands in: `PlayerTurn` or a terminal state.
    pub fn submit(&mut self, action: PlayerAction) -> Result<BattleState> {
        self.validate(action)?;

        self.player_skipped = false;
        self.set_state(BattleState::Animating);
        let fled = self.execute_player_action(action);
        self.push_stats();

        if fled {
            self.enter_terminal(BattleState::Fled);
            return Ok(self.state);
        }
        if let Some(terminal) = self.detect_terminal() {
            self.enter_terminal(terminal);
            return Ok(self.state);
        }

        self.run_enemy_phase();
        Ok(self.state)
    }

    /// Returns true when the player got away
    fn execute_player_action(&mut self, action: PlayerAction) -> bool {
        let turn = self.turn_count;
        let name = self.player.name.clone();
        tracing::debug!(turn, action = %action.label(), "player acts");

        match action {
            PlayerAction::Attack => {
                self.tally.attacks += 1;
                self.player.attack.spend(self.config.costs.basic_attack);
                self.log.push(turn, LogKind::Action, format!("{name} attacks!"));
                let roll = self.roll_player_strike();
                let raw = mitigate_armor(roll, self.enemy.armor);
                resolve_hit(&mut self.player, &mut self.enemy, Hit::strike(raw), &mut self.rng, &mut self.log, turn);
                self.gain_focus(self.config.gauges.focus_per_attack);
            }
            PlayerAction::Defend => {
                self.tally.defends += 1;
                self.player.is_defending = true;
                self.log.push(turn, LogKind::Action, format!("{name} braces for the next blow"));
                self.log.animate(AnimationKind::Defend, Side::Player, 0);
                self.gain_focus(self.config.gauges.focus_per_defend);
            }
            PlayerAction::Special => {
                self.tally.specials += 1;
                if let Some(focus) = self.player.focus.as_mut() {
                    focus.empty();
                }
                self.log.push(turn, LogKind::Action, format!("{name} unleashes a focus strike!"));
                let roll = self.roll_focus_strike();
                resolve_hit(&mut self.player, &mut self.enemy, Hit::guaranteed(roll), &mut self.rng, &mut self.log, turn);
            }
            PlayerAction::UseItem(item) => {
                self.tally.items += 1;
                if let Some(count) = self.inventory.get_mut(&item.item_id()) {
                    *count = count.saturating_sub(1);
                }
                self.player.attack.spend(item.cost(&self.config));
                self.log.push(turn, LogKind::Action, format!("{name} uses {}!", item.label()));
                self.use_item(item, turn);
            }
            PlayerAction::Flee => {
                self.tally.flees += 1;
                let chance = flee_chance(&self.config.flee, self.enemy.tier());
                let escaped = self.rng.gen_bool(chance);
                self.log.animate(AnimationKind::Flee, Side::Player, 0);
                if escaped {
                    self.log.push(turn, LogKind::Flee, format!("{name} got away safely!"));
                } else {
                    self.log.push(turn, LogKind::Flee, format!("{name} couldn't escape!"));
                }
                tracing::debug!(chance, escaped, "flee attempt");
                return escaped;
            }
        }
        false
    }

    fn use_item(&mut self, item: ItemKind, turn: Turn) {
        let d = self.config.damage.clone();
        match item {
            ItemKind::Potion => {
                resolve_heal(&mut self.player, d.potion_heal, &mut self.log, turn);
            }
            ItemKind::StarShield => {
                self.player.statuses.add_shield(d.star_shield_charges);
                self.log.push(
                    turn,
                    LogKind::StatusApplied,
                    format!(
                        "{} is surrounded by a star shield ({} charges)",
                        self.player.name,
                        self.player.statuses.shield_charges()
                    ),
                );
                self.log.animate(AnimationKind::Status, Side::Player, d.star_shield_charges);
            }
            ItemKind::FrostOrb => {
                resolve_status(&mut self.enemy, Affliction::Frozen, d.frost_orb_turns, &mut self.log, turn);
            }
            ItemKind::Fireball | ItemKind::Thunder | ItemKind::PoisonDart => {
                if let Some((min, max)) = item.damage_range(&d) {
                    let raw = self.rng.gen_range(min.min(max)..=max.max(min));
                    resolve_hit(&mut self.player, &mut self.enemy, Hit::item(raw), &mut self.rng, &mut self.log, turn);
                }
                if self.enemy.is_dead() {
                    return;
                }
                match item {
                    ItemKind::Fireball if d.fireball_burn_turns > 0 => {
                        let burn = Affliction::Burn { damage: d.fireball_burn_damage };
                        resolve_status(&mut self.enemy, burn, d.fireball_burn_turns, &mut self.log, turn);
                    }
                    ItemKind::PoisonDart => {
                        let poison = Affliction::Poison { damage: d.poison_dart_damage };
                        resolve_status(&mut self.enemy, poison, d.poison_dart_turns, &mut self.log, turn);
                    }
                    _ => {}
                }
            }
        }
    }

    fn roll_player_strike(&mut self) -> u32 {
        let d = &self.config.damage;
        let bonus = d.player_strike_per_level * self.player.level.saturating_sub(1);
        let min = d.player_strike_min + bonus;
        let max = (d.player_strike_max + bonus).max(min);
        self.rng.gen_range(min..=max)
    }

    fn roll_focus_strike(&mut self) -> u32 {
        let d = &self.config.damage;
        let bonus = d.special_per_level * self.player.level.saturating_sub(1);
        let min = d.special_min + bonus;
        let max = (d.special_max + bonus).max(min);
        self.rng.gen_range(min..=max)
    }

    fn gain_focus(&mut self, amount: u32) {
        if let Some(focus) = self.player.focus.as_mut() {
            focus.add(amount);
        }
    }

    /// Enemy turns until control rests with a player who can act, or the battle ends
    fn run_enemy_phase(&mut self) {
        loop {
            self.set_state(BattleState::EnemyTurn);
            self.enemy_turns += 1;

            if let Some(traits) = self.enemy.enemy.as_mut() {
                traits.tick_cooldowns();
            }
            self.enemy.is_defending = false;

            let report = tick_start_of_turn(&mut self.enemy, &mut self.rng);
            self.narrate_tick(Side::Enemy, &report);
            if report.died {
                self.push_stats();
                self.enter_terminal(BattleState::Victory);
                return;
            }

            if report.skipped.is_none() {
                self.set_state(BattleState::Animating);
                self.enemy_act();
                self.push_stats();
                if let Some(terminal) = self.detect_terminal() {
                    self.enter_terminal(terminal);
                    return;
                }
            }

            // Control returns to the player: the turn pair is complete
            self.turn_count += 1;
            self.regenerate();
            self.set_state(BattleState::PlayerTurn);
            self.player.is_defending = false;

            let report = tick_start_of_turn(&mut self.player, &mut self.rng);
            self.narrate_tick(Side::Player, &report);
            self.push_stats();
            if report.died {
                self.enter_terminal(BattleState::Defeat);
                return;
            }
            if report.skipped.is_none() {
                return;
            }
            self.player_skipped = true;
        }
    }

    fn enemy_act(&mut self) {
        self.enemy_actions += 1;
        let enemy_turn = self.enemy_turns;

        if let Some(index) = self.roll_special(self.enemy_actions) {
            self.execute_enemy_action(EnemyAction::Special(index));
            return;
        }
        if self.roll_self_heal() {
            self.execute_enemy_action(EnemyAction::SelfHeal);
            return;
        }

        let threat = ThreatLevel::assess(&self.player, &self.config.ai);
        let context = DecisionContext::new(&self.enemy, &self.player, enemy_turn, threat, self.strategy);
        let action = self.ai.decide(&context, &mut self.rng);
        self.execute_enemy_action(action);
    }

    /// First flagged special whose fairness-adjusted roll succeeds
    fn roll_special(&mut self, enemy_action: u32) -> Option<usize> {
        let specials = self.enemy.enemy.as_ref().map(|t| t.specials.clone())?;
        for (index, special) in specials.iter().enumerate() {
            let key = special.ability.key();
            let chance = self.fairness.effective_chance(key, special.chance, enemy_action);
            if self.fairness.is_forced(key, enemy_action) {
                tracing::debug!(special = key, enemy_action, "fairness override forces special");
            }
            if self.rng.gen_bool(chance) {
                return Some(index);
            }
        }
        None
    }

    fn roll_self_heal(&mut self) -> bool {
        let Some(traits) = self.enemy.enemy.as_ref() else {
            return false;
        };
        let Some(heal) = traits.capabilities.self_heal else {
            return false;
        };
        if traits.self_heals_left() == 0 || self.enemy.hp_fraction() >= SELF_HEAL_HP_THRESHOLD {
            return false;
        }
        self.rng.gen_bool(heal.chance.clamp(0.0, 1.0))
    }

    fn execute_enemy_action(&mut self, action: EnemyAction) {
        let turn = self.turn_count;
        let name = self.enemy.name.clone();
        tracing::debug!(turn, enemy_turn = self.enemy_turns, ?action, "enemy acts");

        match action {
            EnemyAction::Attack { stance } => {
                if !self.enemy.attack.spend(self.config.costs.enemy_attack) {
                    self.enemy_fallback_defend("too winded to attack");
                    return;
                }
                let verb = match stance {
                    AttackStance::Normal => "attacks",
                    AttackStance::Aggressive => "attacks fiercely",
                    AttackStance::Reckless => "attacks recklessly",
                };
                self.log.push(turn, LogKind::Action, format!("{name} {verb}!"));
                let roll = self.roll_enemy_strike();
                let scaled = scale(roll, stance.multiplier(&self.config.damage));
                let raw = mitigate_armor(scaled, self.player.armor);
                resolve_hit(&mut self.enemy, &mut self.player, Hit::strike(raw), &mut self.rng, &mut self.log, turn);
            }
            EnemyAction::Defend => {
                self.enemy.is_defending = true;
                self.log.push(turn, LogKind::Action, format!("{name} takes a defensive stance"));
                self.log.animate(AnimationKind::Defend, Side::Enemy, 0);
            }
            EnemyAction::Ability(index) => {
                let Some(ability) = self
                    .enemy
                    .enemy
                    .as_ref()
                    .and_then(|t| t.abilities.get(index))
                    .cloned()
                else {
                    self.enemy_fallback_defend("hesitates");
                    return;
                };
                if !self.enemy.attack.spend(self.config.costs.enemy_ability) {
                    self.enemy_fallback_defend("too winded to use an ability");
                    return;
                }
                if let Some(traits) = self.enemy.enemy.as_mut() {
                    traits.start_cooldown(index);
                }
                self.log.push(turn, LogKind::Action, format!("{name} uses {}!", ability.name));
                let roll = ability.value.roll(&mut self.rng);
                self.apply_ability(&ability.effect, roll, turn);
                if let AbilityEffect::MultiHit { hits } = ability.effect {
                    for _ in 1..hits {
                        if self.enemy.is_dead() || self.player.is_dead() {
                            break;
                        }
                        let roll = ability.value.roll(&mut self.rng);
                        self.enemy_hit(roll, turn);
                    }
                }
            }
            EnemyAction::Special(index) => {
                let Some(special) = self
                    .enemy
                    .enemy
                    .as_ref()
                    .and_then(|t| t.specials.get(index))
                    .map(|s| s.ability)
                else {
                    self.enemy_fallback_defend("hesitates");
                    return;
                };
                self.fairness.record(special.key());
                self.apply_special(special, turn);
            }
            EnemyAction::SelfHeal => {
                let Some(heal) = self.enemy.enemy.as_ref().and_then(|t| t.capabilities.self_heal) else {
                    return;
                };
                if let Some(traits) = self.enemy.enemy.as_mut() {
                    traits.self_heals_used += 1;
                }
                self.log.push(turn, LogKind::Action, format!("{name} tends its wounds"));
                let amount = self.enemy.hp.max() * heal.percent / 100;
                resolve_heal(&mut self.enemy, amount, &mut self.log, turn);
            }
        }
    }

    fn enemy_fallback_defend(&mut self, reason: &str) {
        let turn = self.turn_count;
        self.log.push(
            turn,
            LogKind::InsufficientResource,
            format!("{} is {} and defends instead", self.enemy.name, reason),
        );
        self.execute_enemy_action(EnemyAction::Defend);
    }

    fn roll_enemy_strike(&mut self) -> u32 {
        let spread = self.config.damage.enemy_strike_spread;
        let power = self.enemy.power;
        self.rng.gen_range(power.saturating_sub(spread)..=power + spread)
    }

    fn enemy_hit(&mut self, roll: u32, turn: Turn) {
        let raw = mitigate_armor(roll, self.player.armor);
        resolve_hit(&mut self.enemy, &mut self.player, Hit::strike(raw), &mut self.rng, &mut self.log, turn);
    }

    fn apply_ability(&mut self, effect: &AbilityEffect, roll: u32, turn: Turn) {
        match *effect {
            AbilityEffect::Damage | AbilityEffect::MultiHit { .. } => self.enemy_hit(roll, turn),
            AbilityEffect::Heal => {
                resolve_heal(&mut self.enemy, roll, &mut self.log, turn);
            }
            AbilityEffect::BuffAttack => {
                resolve_gauge(&mut self.enemy, GaugeKind::Attack, roll as i64, &mut self.log, turn);
            }
            AbilityEffect::BuffDefense => {
                resolve_gauge(&mut self.enemy, GaugeKind::Defense, roll as i64, &mut self.log, turn);
            }
            AbilityEffect::DebuffAttack => {
                let weakened = Affliction::Weakened { percent: roll.min(100) };
                self.afflict_player(weakened, self.config.damage.debuff_turns, turn);
            }
            AbilityEffect::DebuffDefense => {
                resolve_gauge(&mut self.player, GaugeKind::Defense, -(roll as i64), &mut self.log, turn);
            }
            AbilityEffect::Poison { damage, turns } => {
                if roll > 0 {
                    self.enemy_hit(roll, turn);
                }
                if self.player.is_alive() {
                    self.afflict_player(Affliction::Poison { damage }, turns, turn);
                }
            }
            AbilityEffect::Stun { turns } => {
                if roll > 0 {
                    self.enemy_hit(roll, turn);
                }
                if self.player.is_alive() {
                    self.afflict_player(Affliction::Stunned, turns, turn);
                }
            }
        }
    }

    fn apply_special(&mut self, special: SpecialAbility, turn: Turn) {
        let name = self.enemy.name.clone();
        self.log.push(turn, LogKind::Action, format!("{name} uses its {} special!", special.key()));
        let (affliction, duration) = match special {
            SpecialAbility::Petrify { turns } => (Affliction::Petrified, turns),
            SpecialAbility::Sleep { turns } => (Affliction::Asleep, turns),
            SpecialAbility::Freeze { turns } => (Affliction::Frozen, turns),
            SpecialAbility::Drench { turns } => (Affliction::FireballBlocked, turns),
            SpecialAbility::Hug { turns } => (Affliction::DefendBlocked, turns),
            SpecialAbility::Poison { damage, turns } => (Affliction::Poison { damage }, turns),
            SpecialAbility::Overthink { delay } => (Affliction::Overthink, delay),
            SpecialAbility::Mushroom { turns, miss_chance } => (Affliction::Confused { miss_chance }, turns),
            SpecialAbility::Honey { turns, drain, slow_percent } => {
                (Affliction::Honey { drain, slow_percent }, turns)
            }
            SpecialAbility::StarShield { charges } => {
                self.enemy.statuses.add_shield(charges);
                self.log.push(
                    turn,
                    LogKind::StatusApplied,
                    format!(
                        "{name} is surrounded by a star shield ({} charges)",
                        self.enemy.statuses.shield_charges()
                    ),
                );
                self.log.animate(AnimationKind::Status, Side::Enemy, charges);
                return;
            }
        };
        self.afflict_player(affliction, duration, turn);
    }

    /// Land an enemy effect on the player
    ///
    /// Once the player has lost a turn, further turn-skipping effects slide
    /// off until they act again, so every `submit` hands control back.
    fn afflict_player(&mut self, affliction: Affliction, duration: u32, turn: Turn) {
        if self.player_skipped && affliction.skips_turns() {
            let label = affliction.kind().label();
            self.log.push(
                turn,
                LogKind::Resisted,
                format!("{} shakes off the {label}", self.player.name),
            );
            tracing::debug!(status = label, "turn-skipping status resisted");
            return;
        }
        resolve_status(&mut self.player, affliction, duration, &mut self.log, turn);
    }

    /// Both sides regenerate at the end of a turn pair, unless frozen
    ///
    /// Frozen is checked after the enemy's own tick, so an enemy whose freeze
    /// just expired already regenerates in that pair.
    fn regenerate(&mut self) {
        let g = &self.config.gauges;
        if !self.player.statuses.suppresses_regen() {
            self.player.attack.add(g.player_attack_regen);
            self.player.defense.add(g.player_defense_regen);
        }
        if !self.enemy.statuses.suppresses_regen() {
            self.enemy.attack.add(g.enemy_attack_regen);
            self.enemy.defense.add(g.enemy_defense_regen);
        }
    }

    fn narrate_tick(&mut self, side: Side, report: &TickReport) {
        let turn = self.turn_count;
        let name = match side {
            Side::Player => self.player.name.clone(),
            Side::Enemy => self.enemy.name.clone(),
        };

        for (kind, amount) in &report.damage {
            self.log.push(
                turn,
                LogKind::StatusTick,
                format!("{name} takes {amount} {} damage", kind.label()),
            );
            self.log.animate(AnimationKind::Status, side, *amount);
        }
        let (attack, defense) = report.drained;
        if attack > 0 || defense > 0 {
            self.log.push(
                turn,
                LogKind::Gauge,
                format!("Honey drains {attack} attack and {defense} defense from {name}"),
            );
        }
        if report.died {
            return;
        }
        match report.skipped {
            Some(SkipReason::Incapacitated(kind)) => {
                self.log.push(
                    turn,
                    LogKind::TurnSkipped,
                    format!("{name} is {} and cannot act!", kind.label()),
                );
            }
            Some(SkipReason::Confused) => {
                self.log.push(
                    turn,
                    LogKind::TurnSkipped,
                    format!("{name} is confused and stumbles around!"),
                );
            }
            None => {}
        }
        for kind in &report.expired {
            self.log.push(
                turn,
                LogKind::StatusExpired,
                format!("{name} is no longer {}", kind.label()),
            );
        }
        if report.backfire_armed {
            self.log.push(
                turn,
                LogKind::StatusApplied,
                format!("{name} is lost in thought... the next attack will go wrong"),
            );
        }
        if report.total_damage() > 0 || report.skipped.is_some() {
            tracing::debug!(?side, damage = report.total_damage(), skipped = ?report.skipped, "status tick");
        }
    }

    fn detect_terminal(&self) -> Option<BattleState> {
        if self.enemy.is_dead() {
            Some(BattleState::Victory)
        } else if self.player.is_dead() {
            Some(BattleState::Defeat)
        } else {
            None
        }
    }

    fn enter_terminal(&mut self, terminal: BattleState) {
        let turn = self.turn_count;
        match terminal {
            BattleState::Victory => {
                self.log.push(turn, LogKind::Defeated, format!("{} is defeated!", self.enemy.name));
                self.log.animate(AnimationKind::Faint, Side::Enemy, 0);
            }
            BattleState::Defeat => {
                self.log.push(turn, LogKind::Defeated, format!("{} has fallen...", self.player.name));
                self.log.animate(AnimationKind::Faint, Side::Player, 0);
            }
            _ => {}
        }
        self.log.push(turn, LogKind::BattleEnded, format!("Battle over: {terminal:?}"));
        self.set_state(terminal);
        tracing::info!(
            session = %self.id.0,
            result = ?terminal,
            turns = self.turn_count,
            enemy_turns = self.enemy_turns,
            "battle ended"
        );
    }

    fn set_state(&mut self, state: BattleState) {
        self.state = state;
        self.log.state(state);
    }

    fn push_stats(&mut self) {
        self.log.stats(Side::Player, self.player.snapshot());
        self.log.stats(Side::Enemy, self.enemy.snapshot());
    }

    /// Run the outcome resolver against `record`; only once, only when terminal
    pub fn resolve_outcome(&mut self, record: &mut ProgressionRecord) -> Result<Loot> {
        let loot = self.outcome.resolve(
            self.state,
            &self.player,
            &self.enemy,
            self.loot_table.as_ref(),
            &self.inventory,
            &self.config.outcome,
            record,
            &mut self.rng,
        )?;
        let summary = match loot.xp_delta {
            xp if xp > 0 => format!("Gained {xp} XP"),
            xp if xp < 0 => format!("Lost {} XP", -xp),
            _ => "No XP change".to_string(),
        };
        self.log.push(self.turn_count, LogKind::Outcome, summary);
        for item in &loot.items_gained {
            self.log.push(self.turn_count, LogKind::Outcome, format!("Found {}", item.as_str()));
        }
        for item in &loot.items_lost {
            self.log.push(self.turn_count, LogKind::Outcome, format!("Dropped {}", item.as_str()));
        }
        Ok(loot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ability::{Ability, DamageValue, SpecialMove};
    use crate::battle::ai::Instinct;
    use crate::battle::combatant::EnemyTraits;
    use crate::core::types::EnemyId;

    fn slime(hp: u32) -> Combatant {
        let traits = EnemyTraits::new(EnemyId::new("slime"), Instinct::Guardian, Tier::new(1));
        Combatant::enemy("Slime", 1, hp, 6, 3, 5, traits)
    }

    fn session(enemy: Combatant) -> BattleSession {
        let player = Combatant::player("Hero", 1, 100, 100, 100);
        let mut s = BattleSession::new(BattleConfig::default(), player, enemy, 7);
        s.start();
        s
    }

    #[test]
    fn test_start_hands_turn_to_player() {
        let s = session(slime(35));
        assert_eq!(s.state(), BattleState::PlayerTurn);
        assert_eq!(s.log().count(LogKind::BattleStarted), 1);
    }

    #[test]
    fn test_submit_before_start_rejected_silently() {
        let player = Combatant::player("Hero", 1, 100, 100, 100);
        let mut s = BattleSession::new(BattleConfig::default(), player, slime(35), 1);
        let result = s.submit(PlayerAction::Attack);
        assert!(matches!(result, Err(ArenaError::NotPlayerTurn { .. })));
        assert!(s.log().is_empty());
    }

    #[test]
    fn test_insufficient_gauge_single_entry_no_mutation() {
        let mut s = session(slime(35));
        s.player_mut().attack.set(5);
        let before_player = s.player().snapshot();
        let before_enemy = s.enemy().snapshot();
        let before_len = s.log().len();

        let result = s.submit(PlayerAction::Attack);
        assert!(matches!(result, Err(ArenaError::InsufficientGauge { cost: 10, available: 5, .. })));
        assert_eq!(s.log().len(), before_len + 1);
        assert_eq!(s.log().count(LogKind::InsufficientResource), 1);
        assert_eq!(s.player().snapshot(), before_player);
        assert_eq!(s.enemy().snapshot(), before_enemy);
        assert_eq!(s.state(), BattleState::PlayerTurn);
    }

    #[test]
    fn test_missing_item_rejected() {
        let mut s = session(slime(35));
        let result = s.submit(PlayerAction::UseItem(ItemKind::Potion));
        assert!(matches!(result, Err(ArenaError::MissingItem(ItemKind::Potion))));
    }

    #[test]
    fn test_special_locked_below_unlock_level() {
        let mut s = session(slime(35));
        if let Some(focus) = s.player_mut().focus.as_mut() {
            focus.fill();
        }
        let result = s.submit(PlayerAction::Special);
        assert!(matches!(result, Err(ArenaError::SpecialLocked { level: 1, required: 5 })));
        assert_eq!(s.log().count(LogKind::Blocked), 1);
    }

    #[test]
    fn test_defend_blocked_by_hug() {
        let mut s = session(slime(35));
        s.player_mut().statuses.apply(Affliction::DefendBlocked, 2);
        let result = s.submit(PlayerAction::Defend);
        assert!(matches!(result, Err(ArenaError::ActionBlocked { .. })));
    }

    #[test]
    fn test_attack_builds_focus_and_spends_gauge() {
        let mut s = session(slime(200));
        s.submit(PlayerAction::Attack).unwrap();
        // 100 - 10 cost + 8 regen
        assert_eq!(s.player().attack.value(), 98);
        assert_eq!(s.player().focus.map(|f| f.value()), Some(15));
        assert_eq!(s.turn_count(), 2);
        assert_eq!(s.enemy_turns(), 1);
    }

    #[test]
    fn test_frozen_enemy_yields_player_turn() {
        let mut s = session(slime(200)).with_item(ItemKind::FrostOrb, 1);
        let state = s.submit(PlayerAction::UseItem(ItemKind::FrostOrb)).unwrap();
        assert_eq!(state, BattleState::PlayerTurn);
        assert_eq!(s.log().count(LogKind::TurnSkipped), 1);
        assert_eq!(s.item_count(ItemKind::FrostOrb), 0);
        // enemy never acted, player untouched
        assert_eq!(s.player().hp.value(), 100);
    }

    #[test]
    fn test_asleep_player_lets_enemy_act_again() {
        let mut s = session(slime(200));
        s.player_mut().statuses.apply(Affliction::Asleep, 2);
        assert!(s.submit(PlayerAction::Defend).is_ok());
        assert_eq!(s.state(), BattleState::PlayerTurn);
        assert!(s.enemy_turns() >= 2);
        assert!(s.log().count(LogKind::TurnSkipped) >= 1);
    }

    #[test]
    fn test_flee_chance_formula() {
        let flee = FleeConfig::default();
        assert!((flee_chance(&flee, Tier::new(1)) - 0.8).abs() < 1e-9);
        assert!((flee_chance(&flee, Tier::new(5)) - 0.4).abs() < 1e-9);
        assert!((flee_chance(&flee, Tier::new(9)) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_terminal_state_absorbs_actions() {
        let mut s = session(slime(1));
        assert_eq!(s.submit(PlayerAction::Attack).unwrap(), BattleState::Victory);
        let again = s.submit(PlayerAction::Attack);
        assert!(matches!(again, Err(ArenaError::NotPlayerTurn { state: BattleState::Victory })));
    }

    #[test]
    fn test_specials_recorded_by_fairness() {
        let traits = EnemyTraits::new(EnemyId::new("medusa"), Instinct::Guardian, Tier::new(1))
            .with_abilities(vec![Ability::new("Gaze", DamageValue::Fixed(3), AbilityEffect::Damage, 0)])
            .with_specials(vec![SpecialMove {
                ability: SpecialAbility::Hug { turns: 2 },
                chance: 1.0,
            }]);
        let enemy = Combatant::enemy("Medusa", 1, 500, 6, 3, 5, traits);
        let mut s = session(enemy);
        s.submit(PlayerAction::Attack).unwrap();
        assert_eq!(s.fairness().uses("hug"), 1);
        assert!(s.player().statuses.has(StatusKind::DefendBlocked));
    }
}
