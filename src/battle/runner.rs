//! Async boundary between the session and presentation
//!
//! The session advances synchronously; the runner forwards the queued
//! events to the sink, honours whatever pacing the sink asks for, and
//! performs the terminal write-back.

use tokio::time::{sleep, timeout};

use crate::battle::actions::PlayerAction;
use crate::battle::log::PresentationEvent;
use crate::battle::outcome::Loot;
use crate::battle::session::{BattleSession, BattleState};
use crate::core::config::PacingConfig;
use crate::core::error::{ArenaError, Result};
use crate::ports::memory::BehaviorMemory;
use crate::ports::presentation::{AudioCue, AudioHooks, NoAudio, NullPresentation, Pacing, PresentationSink};
use crate::ports::progression::{ProgressionRecord, ProgressionStore};

pub struct BattleRunner<S: PresentationSink = NullPresentation, A: AudioHooks = NoAudio> {
    session: Option<BattleSession>,
    sink: S,
    audio: A,
    pacing: PacingConfig,
    /// Resolved outcome whose save failed, kept for the next `finish`
    unsaved: Option<(ProgressionRecord, Loot)>,
}

impl BattleRunner<NullPresentation, NoAudio> {
    /// Runner with no presentation attached
    pub fn headless(session: BattleSession) -> Self {
        Self::new(session, NullPresentation, NoAudio)
    }
}

impl<S: PresentationSink, A: AudioHooks> BattleRunner<S, A> {
    pub fn new(session: BattleSession, sink: S, audio: A) -> Self {
        let pacing = session.config().pacing.clone();
        Self {
            session: Some(session),
            sink,
            audio,
            pacing,
            unsaved: None,
        }
    }

    pub fn session(&self) -> Option<&BattleSession> {
        self.session.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn session_mut(&mut self) -> Result<&mut BattleSession> {
        self.session.as_mut().ok_or(ArenaError::SessionClosed)
    }

    pub async fn start(&mut self) -> Result<BattleState> {
        let session = self.session_mut()?;
        session.start();
        let state = session.state();
        self.audio.cue(AudioCue::BattleStart);
        self.flush().await?;
        Ok(state)
    }

    /// Submit a player action and play out everything it caused
    pub async fn submit(&mut self, action: PlayerAction) -> Result<BattleState> {
        let result = self.session_mut()?.submit(action);
        // Rejections still narrate a reason
        self.flush().await?;
        let state = result?;
        if !state.is_terminal() {
            let delay = self.pacing.min_turn_delay();
            if !delay.is_zero() {
                sleep(delay).await;
            }
        }
        Ok(state)
    }

    async fn flush(&mut self) -> Result<()> {
        let events = self.session_mut()?.drain_events();
        for event in events {
            if let PresentationEvent::Animation { kind, .. } = &event {
                if let Some(cue) = AudioCue::for_animation(*kind) {
                    self.audio.cue(cue);
                }
            }
            let pacing = self.sink.dispatch(&event);
            self.await_pacing(pacing).await;
        }
        Ok(())
    }

    async fn await_pacing(&self, pacing: Pacing) {
        match pacing {
            Pacing::Immediate => {}
            Pacing::AtLeast(duration) => sleep(duration).await,
            Pacing::Until(ready) => match timeout(self.pacing.presentation_timeout(), ready).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => tracing::warn!("presentation dropped its ready signal, continuing"),
                Err(_) => tracing::warn!(
                    timeout_ms = self.pacing.presentation_timeout_ms,
                    "presentation did not report ready in time, continuing"
                ),
            },
        }
    }

    /// Commit the outcome, notify collaborators, wait out the cooldown and close
    ///
    /// A failed save leaves the session open; calling again retries the save
    /// with the same resolved record.
    pub async fn finish<P, M>(&mut self, progression: &mut P, memory: &mut M) -> Result<Loot>
    where
        P: ProgressionStore + ?Sized,
        M: BehaviorMemory + ?Sized,
    {
        let state = self.session_mut()?.state();
        if !state.is_terminal() {
            return Err(ArenaError::NotTerminal { state });
        }

        let (record, loot) = match self.unsaved.take() {
            Some(unsaved) => unsaved,
            None => {
                let mut record = progression.load()?;
                let loot = self.session_mut()?.resolve_outcome(&mut record)?;
                (record, loot)
            }
        };
        if let Err(err) = progression.save(&record) {
            tracing::warn!(error = %err, "progression save failed, outcome kept for retry");
            self.unsaved = Some((record, loot));
            return Err(err);
        }

        let session = self.session_mut()?;
        let enemy_id = session.enemy().enemy.as_ref().map(|t| t.id.clone());
        let tally = session.tally();
        match enemy_id {
            Some(id) => memory.record(&id, &tally),
            None => tracing::warn!("enemy has no identifier, behavior not recorded"),
        }

        self.flush().await?;
        if let Some(cue) = AudioCue::for_terminal(state) {
            self.audio.cue(cue);
        }
        let pacing = self.sink.on_terminal(state, &loot);
        self.await_pacing(pacing).await;

        let cooldown = self.pacing.post_battle_cooldown();
        if !cooldown.is_zero() {
            sleep(cooldown).await;
        }
        if let Some(session) = self.session.take() {
            tracing::info!(session = %session.id().0, result = ?state, "battle session closed");
        }
        Ok(loot)
    }

    /// Drop the session without committing anything
    pub fn force_close(&mut self) -> Option<BattleState> {
        let session = self.session.take()?;
        tracing::warn!(session = %session.id().0, state = ?session.state(), "battle force-closed");
        Some(session.state())
    }
}
