// Settings module
// Per-track base parameters, track lengths and master effects data

pub mod fx;
pub mod registry;
pub mod track;

pub use fx::{FxSettings, FxSettingsPatch};
pub use registry::{DEFAULT_TRACK_LENGTH, TrackSettingsRegistry};
pub use track::{FxType, LfoSettings, LfoTarget, TrackSettings, TrackSettingsPatch};
