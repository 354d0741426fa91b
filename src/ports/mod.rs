//! Collaborator interfaces the engine consumes or notifies

pub mod memory;
pub mod presentation;
pub mod progression;

pub use memory::{BehaviorMemory, BehaviorProfile, BehaviorTally, InMemoryBehaviorMemory, NoMemory};
pub use presentation::{AudioCue, AudioHooks, NoAudio, NullPresentation, Pacing, PresentationSink};
pub use progression::{InMemoryProgression, ProgressionRecord, ProgressionStore};
