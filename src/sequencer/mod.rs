// Sequencer module
// Patterns, step counters, tempo and the clock that drives them

pub mod clock;
pub mod generator;
pub mod note;
pub mod pattern;
pub mod resolver;
pub mod scheduler;
pub mod store;
pub mod timeline;
pub mod track;
pub mod transport;

pub use clock::SequencerClock;
pub use pattern::{LockParam, Pattern, PatternSlot, StepLock};
pub use resolver::{ParameterResolver, VoiceSpec};
pub use scheduler::{ManualTickScheduler, SchedulerError, ThreadTickScheduler, TickScheduler};
pub use store::PatternStore;
pub use timeline::Tempo;
pub use track::{TrackId, VoiceFamily};
pub use transport::{SequencerState, StepTrigger, TransportState};
