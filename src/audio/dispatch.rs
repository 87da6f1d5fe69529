// Voice dispatch - routes resolved voice specs to tone engines
//
// Family defaults come first; a per-track override table can swap in another
// engine (the acid bass) without touching the other tracks. The acid engine
// remembers the last pitch it played so a slid step can glide from it.

use crate::audio::backend::ToneBackend;
use crate::sequencer::resolver::VoiceSpec;
use crate::sequencer::track::TrackId;
use crate::synth::voice::Voice;
use crate::synth::voices::{AcidSettings, VoiceEngine, acid_voice, build_voice};
use std::collections::BTreeMap;

/// Track that the acid engine replaces when enabled
pub const ACID_TRACK: TrackId = TrackId::Bass1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceDispatch {
    overrides: BTreeMap<TrackId, VoiceEngine>,
    last_acid_frequency: Option<f32>,
}

impl VoiceDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine a track currently plays through
    pub fn engine_for(&self, track: TrackId) -> VoiceEngine {
        self.overrides
            .get(&track)
            .copied()
            .unwrap_or_else(|| VoiceEngine::for_family(track.family()))
    }

    /// Route `track` to `engine`; `None` restores the family default
    pub fn set_route(&mut self, track: TrackId, engine: Option<VoiceEngine>) {
        match engine {
            Some(engine) => {
                log::debug!("{} routed to {}", track, engine.name());
                self.overrides.insert(track, engine);
            }
            None => {
                self.overrides.remove(&track);
            }
        }
    }

    pub fn enable_acid_bass(&mut self, settings: AcidSettings) {
        self.set_route(ACID_TRACK, Some(VoiceEngine::Acid(settings)));
    }

    pub fn disable_acid_bass(&mut self) {
        self.set_route(ACID_TRACK, None);
    }

    pub fn acid_bass(&self) -> Option<AcidSettings> {
        match self.overrides.get(&ACID_TRACK) {
            Some(VoiceEngine::Acid(settings)) => Some(*settings),
            _ => None,
        }
    }

    /// Forget the last acid pitch, so the next slid step starts flat
    pub fn reset_voice_state(&mut self) {
        self.last_acid_frequency = None;
    }

    pub fn last_acid_frequency(&self) -> Option<f32> {
        self.last_acid_frequency
    }

    /// Build the sequenced voice for `spec` starting at `time`
    pub fn build(&mut self, time: f64, spec: &VoiceSpec, sample_rate: f32) -> Voice {
        let voice = match self.engine_for(spec.track) {
            VoiceEngine::Acid(acid) => {
                let voice = acid_voice(&acid, spec, self.last_acid_frequency, sample_rate);
                self.last_acid_frequency = Some(spec.frequency);
                voice
            }
            engine => build_voice(&engine, spec, sample_rate),
        };
        voice.at(time)
    }

    /// Build and hand the voice to `backend`
    pub fn dispatch(&mut self, backend: &mut dyn ToneBackend, time: f64, spec: &VoiceSpec) {
        let voice = self.build(time, spec, backend.sample_rate());
        backend.create_voice(voice);
    }

    /// Play `spec` outside the sequence: never slides, leaves the acid pitch alone
    pub fn audition(&self, backend: &mut dyn ToneBackend, time: f64, spec: &VoiceSpec) {
        let voice = build_voice(&self.engine_for(spec.track), spec, backend.sample_rate());
        backend.create_voice(voice.at(time));
    }
}
