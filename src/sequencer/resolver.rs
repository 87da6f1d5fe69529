// Parameter resolver
// Base track settings + per-step locks + shared accent -> one voice specification

use crate::sequencer::note::frequency_or_default;
use crate::sequencer::pattern::Pattern;
use crate::sequencer::track::{TrackId, VoiceFamily};
use crate::settings::registry::TrackSettingsRegistry;
use crate::settings::track::TrackSettings;

/// Fully resolved parameters of one sound event
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSpec {
    pub track: TrackId,
    /// Track step the trigger was read from
    pub step: usize,
    pub frequency: f32,
    /// `base level × velocity lock`
    pub level: f32,
    /// `base decay × decay lock`, seconds
    pub decay: f32,
    /// Multiplier the voice applies to its filter cutoff
    pub filter_mod: f32,
    /// Shared accent flag; the voice decides how much to boost
    pub accent: bool,
    /// Remaining base parameters (pan, detune, envelope, LFO, voice fields)
    pub settings: TrackSettings,
}

impl VoiceSpec {
    pub fn family(&self) -> VoiceFamily {
        self.track.family()
    }
}

/// Read-only view over the data a resolution needs
#[derive(Debug, Clone, Copy)]
pub struct ParameterResolver<'a> {
    pattern: &'a Pattern,
    registry: &'a TrackSettingsRegistry,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(pattern: &'a Pattern, registry: &'a TrackSettingsRegistry) -> Self {
        Self { pattern, registry }
    }

    /// Resolve the voice of `track` at `step`.
    ///
    /// `accent_step` indexes the shared accent row. During playback it is the
    /// global 16-step counter, not the track's own step.
    pub fn resolve(&self, track: TrackId, step: usize, accent_step: usize) -> VoiceSpec {
        let note = self.pattern.lane(track).note(step).unwrap_or("");
        let frequency = frequency_or_default(note);
        self.resolve_with_frequency(track, step, accent_step, frequency)
    }

    /// Same as [`resolve`](Self::resolve) with an explicit pitch (note preview)
    pub fn resolve_with_frequency(
        &self,
        track: TrackId,
        step: usize,
        accent_step: usize,
        frequency: f32,
    ) -> VoiceSpec {
        let base = self.registry.get(track);
        let lock = self.pattern.lock(track, step);

        VoiceSpec {
            track,
            step,
            frequency,
            level: base.level * lock.velocity_or_unity(),
            decay: base.base_decay(track.family()) * lock.decay_or_unity(),
            filter_mod: lock.filter_or_unity(),
            accent: self.pattern.accent(accent_step),
            settings: base.clone(),
        }
    }
}
