// Transport - run state and step counters of the sequencer
// One tick function drives both live playback and the offline renderer

use crate::sequencer::pattern::{BASE_STEPS, Pattern};
use crate::sequencer::resolver::{ParameterResolver, VoiceSpec};
use crate::sequencer::track::{TRACK_COUNT, TrackId};
use crate::settings::registry::TrackSettingsRegistry;

/// Transport state (play/stop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }
}

/// A voice produced by one tick
#[derive(Debug, Clone, PartialEq)]
pub struct StepTrigger {
    pub track: TrackId,
    /// Track step that fired
    pub step: usize,
    /// Global counter value of the tick (accent index)
    pub global_step: usize,
    pub spec: VoiceSpec,
}

/// Global and per-track step counters
///
/// The global counter wraps at 16 and only selects the accent; each track
/// wraps at its own length, which is what makes tracks drift (polyrhythm).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequencerState {
    current_step: usize,
    track_steps: [usize; TRACK_COUNT],
}

impl SequencerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter
    pub fn reset(&mut self) {
        self.current_step = 0;
        self.track_steps = [0; TRACK_COUNT];
    }

    /// Global step (0..16)
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn track_step(&self, track: TrackId) -> usize {
        self.track_steps[track.index()]
    }

    /// Advance one sixteenth.
    ///
    /// For each track in order: fire if its current step is set and the track
    /// is audible, then advance its counter modulo its length. Muted tracks
    /// still advance. The global counter moves last.
    pub fn tick(&mut self, pattern: &Pattern, registry: &TrackSettingsRegistry) -> Vec<StepTrigger> {
        let resolver = ParameterResolver::new(pattern, registry);
        let global_step = self.current_step;
        let mut triggers = Vec::new();

        for track in TrackId::ALL {
            let step = self.track_steps[track.index()];
            if pattern.trigger(track, step) && registry.audible(track) {
                triggers.push(StepTrigger {
                    track,
                    step,
                    global_step,
                    spec: resolver.resolve(track, step, global_step),
                });
            }
            let length = registry.track_length(track).max(1);
            self.track_steps[track.index()] = (step + 1) % length;
        }

        self.current_step = (self.current_step + 1) % BASE_STEPS;
        triggers
    }
}
