// Audio - tone backends, voice dispatch, offline render and WAV export

pub mod backend;
pub mod dispatch;
pub mod dsp_utils;
pub mod engine;
pub mod export;
pub mod format_conversion;
pub mod offline;
pub mod timing;

pub use backend::{LazyBackend, RecordingBackend, ToneBackend};
pub use dispatch::VoiceDispatch;
pub use engine::LiveBackend;
pub use export::{ExportError, ExportSettings, WavExporter};
pub use offline::{OfflineBackend, OfflineRender, RenderJob, SampleBuffer, render_pattern_offline};
pub use timing::AudioTiming;

/// Live backend failures
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Audio backend not initialised")]
    NotInitialized,

    #[error("Device configuration error: {0}")]
    Config(String),

    #[error("Unsupported sample format: {0}. Supported formats: F32, I16, U16")]
    UnsupportedFormat(String),

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Sequencer clock error: {0}")]
    Clock(#[from] crate::sequencer::scheduler::SchedulerError),
}
