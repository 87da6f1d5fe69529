// Synthesis - deterministic tone generation shared by live and offline output

pub mod acid_presets;
pub mod automation;
pub mod envelope;
pub mod filter;
pub mod mixer;
pub mod oscillator;
pub mod voice;
pub mod voices;

pub use automation::ParamCurve;
pub use envelope::{AdsrParams, AdsrPatch};
pub use mixer::{MasterBus, MasterFilter, VoiceMixer};
pub use oscillator::WaveformType;
pub use voice::Voice;
pub use acid_presets::{ACID_PRESETS, AcidPreset};
pub use voices::{AcidSettings, VoiceEngine, acid_voice, build_voice, preview_voice};
