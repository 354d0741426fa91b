//! Presentation and audio ports
//!
//! The engine notifies the sink synchronously. A handler may hand back a
//! `Pacing` the runner awaits before advancing; the engine never waits on
//! anything else.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::battle::combatant::StatSnapshot;
use crate::battle::log::{AnimationKind, PresentationEvent};
use crate::battle::outcome::Loot;
use crate::battle::session::BattleState;
use crate::core::types::Side;

/// How long the runner should hold before the next event
#[derive(Debug, Default)]
pub enum Pacing {
    #[default]
    Immediate,
    AtLeast(Duration),
    /// Resolves when the presentation layer reports it is done
    Until(oneshot::Receiver<()>),
}

/// Notifications from the engine to whatever draws the battle
pub trait PresentationSink: Send {
    fn on_log_message(&mut self, _text: &str) {}

    fn on_stat_update(&mut self, _side: Side, _snapshot: &StatSnapshot) {}

    fn on_action_animation(&mut self, _kind: AnimationKind, _side: Side, _magnitude: u32) -> Pacing {
        Pacing::Immediate
    }

    fn on_state_change(&mut self, _state: BattleState) {}

    fn on_terminal(&mut self, _result: BattleState, _loot: &Loot) -> Pacing {
        Pacing::Immediate
    }

    /// Route one queued event to the matching notification
    fn dispatch(&mut self, event: &PresentationEvent) -> Pacing {
        match event {
            PresentationEvent::Log(text) => {
                self.on_log_message(text);
                Pacing::Immediate
            }
            PresentationEvent::Stats { side, snapshot } => {
                self.on_stat_update(*side, snapshot);
                Pacing::Immediate
            }
            PresentationEvent::Animation { kind, side, magnitude } => {
                self.on_action_animation(*kind, *side, *magnitude)
            }
            PresentationEvent::State(state) => {
                self.on_state_change(*state);
                Pacing::Immediate
            }
        }
    }
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresentation;

impl PresentationSink for NullPresentation {}

/// Sound cues; fire-and-forget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCue {
    BattleStart,
    Hit,
    Heal,
    Miss,
    Victory,
    Defeat,
    Fled,
}

impl AudioCue {
    /// Cue matching an animation, if any
    pub fn for_animation(kind: AnimationKind) -> Option<Self> {
        match kind {
            AnimationKind::Strike | AnimationKind::Special | AnimationKind::Item | AnimationKind::Deflect => {
                Some(Self::Hit)
            }
            AnimationKind::Heal => Some(Self::Heal),
            AnimationKind::Miss | AnimationKind::ShieldBlock => Some(Self::Miss),
            AnimationKind::Defend | AnimationKind::Status | AnimationKind::Flee | AnimationKind::Faint => None,
        }
    }

    pub fn for_terminal(state: BattleState) -> Option<Self> {
        match state {
            BattleState::Victory => Some(Self::Victory),
            BattleState::Defeat => Some(Self::Defeat),
            BattleState::Fled => Some(Self::Fled),
            _ => None,
        }
    }
}

pub trait AudioHooks: Send {
    fn cue(&mut self, cue: AudioCue);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoAudio;

impl AudioHooks for NoAudio {
    fn cue(&mut self, _cue: AudioCue) {}
}
