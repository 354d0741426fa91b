//! Battle narration and presentation queue
//!
//! The log is append-only. Every entry is also queued as a presentation
//! event, next to animation and stat events, in the order they happened.

use serde::{Deserialize, Serialize};

use crate::battle::combatant::StatSnapshot;
use crate::battle::session::BattleState;
use crate::core::types::{Side, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogKind {
    BattleStarted,
    Action,
    Damage,
    Heal,
    Evaded,
    Deflected,
    Shielded,
    Absorbed,
    Backfire,
    StatusApplied,
    Resisted,
    StatusTick,
    StatusExpired,
    TurnSkipped,
    InsufficientResource,
    Blocked,
    Gauge,
    Flee,
    Defeated,
    BattleEnded,
    Outcome,
}

/// One narrated event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub turn: Turn,
    pub kind: LogKind,
    pub text: String,
}

/// Animation classes the presentation layer can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKind {
    Strike,
    Special,
    Item,
    Heal,
    Miss,
    Deflect,
    ShieldBlock,
    Defend,
    Status,
    Flee,
    Faint,
}

/// Something the presentation sink should hear about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PresentationEvent {
    Log(String),
    Stats { side: Side, snapshot: StatSnapshot },
    Animation { kind: AnimationKind, side: Side, magnitude: u32 },
    State(BattleState),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleLog {
    entries: Vec<LogEntry>,
    #[serde(skip)]
    pending: Vec<PresentationEvent>,
}

impl BattleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn, kind: LogKind, text: impl Into<String>) {
        let text = text.into();
        tracing::trace!(turn, ?kind, "{}", text);
        self.pending.push(PresentationEvent::Log(text.clone()));
        self.entries.push(LogEntry { turn, kind, text });
    }

    pub fn animate(&mut self, kind: AnimationKind, side: Side, magnitude: u32) {
        self.pending
            .push(PresentationEvent::Animation { kind, side, magnitude });
    }

    pub fn stats(&mut self, side: Side, snapshot: StatSnapshot) {
        self.pending.push(PresentationEvent::Stats { side, snapshot });
    }

    pub fn state(&mut self, state: BattleState) {
        self.pending.push(PresentationEvent::State(state));
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn count(&self, kind: LogKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Take every queued presentation event
    pub fn drain_events(&mut self) -> Vec<PresentationEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_mirrors_to_presentation_queue() {
        let mut log = BattleLog::new();
        log.push(1, LogKind::Damage, "Slime takes 9 damage");
        log.animate(AnimationKind::Strike, Side::Enemy, 9);

        assert_eq!(log.len(), 1);
        let events = log.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], PresentationEvent::Log("Slime takes 9 damage".into()));
        assert!(log.drain_events().is_empty());
        // Narration survives draining
        assert_eq!(log.count(LogKind::Damage), 1);
    }
}
