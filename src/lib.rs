// Groovebox - step sequencer and drum machine engine
// Library exports for the demo binary, tests and benchmarks

pub mod audio;
pub mod clipboard;
pub mod config;
pub mod groovebox;
pub mod messaging;
pub mod project;
pub mod sequencer;
pub mod settings;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::{AudioError, ExportError, ExportSettings, OfflineRender, SampleBuffer};
pub use clipboard::ClipboardError;
pub use config::EngineConfig;
pub use groovebox::Groovebox;
pub use messaging::{Notification, NotificationCategory, NotificationLevel};
pub use project::ProjectError;
pub use sequencer::{
    LockParam, Pattern, PatternSlot, SequencerClock, StepTrigger, Tempo, TrackId, TransportState,
    VoiceSpec,
};
pub use settings::{FxSettings, TrackSettings, TrackSettingsRegistry};
pub use synth::{AcidSettings, VoiceEngine};
