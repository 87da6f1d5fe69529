// Timeline - tempo and step timing
// A step is one sixteenth note; four steps make a beat, sixteen a bar

use std::fmt;
use std::time::Duration;

/// Lowest accepted tempo
pub const MIN_BPM: f64 = 20.0;
/// Highest accepted tempo
pub const MAX_BPM: f64 = 300.0;
/// Steps per beat (sixteenth-note resolution)
pub const STEPS_PER_BEAT: u32 = 4;
/// Steps per bar
pub const STEPS_PER_BAR: u32 = 16;

/// Tempo in BPM (Beats Per Minute)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo, clamped to [20, 300] BPM.
    /// Non-finite input falls back to the default tempo.
    pub fn new(bpm: f64) -> Self {
        let bpm = if bpm.is_finite() {
            bpm.clamp(MIN_BPM, MAX_BPM)
        } else {
            Self::default().bpm
        };
        Self { bpm }
    }

    /// Check a tempo without clamping it
    pub fn is_valid_bpm(bpm: f64) -> bool {
        bpm.is_finite() && (MIN_BPM..=MAX_BPM).contains(&bpm)
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Duration of one step in seconds (`60 / bpm / 4`)
    pub fn step_duration_seconds(&self) -> f64 {
        self.beat_duration_seconds() / STEPS_PER_BEAT as f64
    }

    /// Tick interval in milliseconds (`60000 / bpm / 4`)
    pub fn step_interval_ms(&self) -> f64 {
        60_000.0 / self.bpm / STEPS_PER_BEAT as f64
    }

    /// Tick interval for a timer
    pub fn step_interval(&self) -> Duration {
        Duration::from_secs_f64(self.step_duration_seconds())
    }

    /// Start time of an absolute step on a virtual time axis
    pub fn step_time(&self, step: u32) -> f64 {
        step as f64 * self.step_duration_seconds()
    }

    /// Length of `bars` bars in seconds
    pub fn bars_duration_seconds(&self, bars: u32) -> f64 {
        self.step_time(bars * STEPS_PER_BAR)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 128.0 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}
