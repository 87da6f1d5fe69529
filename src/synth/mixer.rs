// Voice mixer - sample-accurate start times and automatic cleanup
//
// Shared by the realtime callback and the offline renderer. Voices wait in a
// pending list until their start sample, play until their last layer ends and
// are then dropped.

use super::filter::{Biquad, FilterType};
use super::voice::Voice;
use crate::audio::dsp_utils::flush_denormals_to_zero;

/// Room reserved up front so the realtime path rarely reallocates
const INITIAL_CAPACITY: usize = 64;

/// Cutoff of the master lowpass
pub const MASTER_LOWPASS_HZ: f32 = 12_000.0;

pub struct VoiceMixer {
    sample_rate: f32,
    position: u64,
    pending: Vec<(u64, Voice)>,
    active: Vec<Voice>,
}

impl VoiceMixer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            position: 0,
            pending: Vec::with_capacity(INITIAL_CAPACITY),
            active: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Frames rendered so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Mixer clock in seconds
    pub fn current_time(&self) -> f64 {
        self.position as f64 / self.sample_rate as f64
    }

    /// Queue a voice at its start time. Late voices start on the next frame.
    pub fn add(&mut self, voice: Voice) {
        let start = (voice.start_time().max(0.0) * self.sample_rate as f64).round() as u64;
        if start <= self.position {
            self.active.push(voice);
        } else {
            // Sorted by start; equal starts keep arrival order
            let index = self.pending.partition_point(|(s, _)| *s <= start);
            self.pending.insert(index, (start, voice));
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Nothing playing and nothing scheduled
    pub fn is_idle(&self) -> bool {
        self.active.is_empty() && self.pending.is_empty()
    }

    /// Mix one stereo frame
    pub fn next_frame(&mut self) -> (f32, f32) {
        let due = self.pending.partition_point(|(s, _)| *s <= self.position);
        if due > 0 {
            self.active.extend(self.pending.drain(..due).map(|(_, v)| v));
        }

        let mut left = 0.0;
        let mut right = 0.0;
        for voice in &mut self.active {
            let (l, r) = voice.next_frame();
            left += l;
            right += r;
        }
        self.active.retain(|v| !v.is_finished());

        self.position += 1;
        (flush_denormals_to_zero(left), flush_denormals_to_zero(right))
    }

    /// Fill planar stereo buffers
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.next_frame();
        }
    }
}

/// Upper bound of the master gain
pub const MAX_MASTER_GAIN: f32 = 1.5;

/// Master lowpass cutoff and resonance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterFilter {
    pub cutoff: f32,
    pub resonance: f32,
}

impl Default for MasterFilter {
    fn default() -> Self {
        Self {
            cutoff: MASTER_LOWPASS_HZ,
            resonance: 0.7,
        }
    }
}

impl MasterFilter {
    /// Cutoff within 20 Hz..=20 kHz, resonance within 0.1..=20
    pub fn new(cutoff: f32, resonance: f32) -> Self {
        let default = Self::default();
        let cutoff = if cutoff.is_finite() { cutoff } else { default.cutoff };
        let resonance = if resonance.is_finite() { resonance } else { default.resonance };
        Self {
            cutoff: cutoff.clamp(20.0, 20_000.0),
            resonance: resonance.clamp(0.1, 20.0),
        }
    }
}

/// Master lowpass followed by the output gain
pub struct MasterBus {
    left: Biquad,
    right: Biquad,
    filter: MasterFilter,
    gain: f32,
}

impl MasterBus {
    pub fn new(sample_rate: f32, gain: f32) -> Self {
        let filter = MasterFilter::default();
        Self {
            left: Biquad::new(FilterType::LowPass, filter.cutoff, filter.resonance, sample_rate),
            right: Biquad::new(FilterType::LowPass, filter.cutoff, filter.resonance, sample_rate),
            filter,
            gain,
        }
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    /// Retune the lowpass; filter state is kept so there is no click
    pub fn set_filter(&mut self, filter: MasterFilter) {
        self.filter = filter;
        self.left.set_params(filter.cutoff, filter.resonance);
        self.right.set_params(filter.cutoff, filter.resonance);
    }

    pub fn filter(&self) -> MasterFilter {
        self.filter
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    #[inline]
    pub fn process(&mut self, (left, right): (f32, f32)) -> (f32, f32) {
        (
            self.left.process(left) * self.gain,
            self.right.process(right) * self.gain,
        )
    }
}
