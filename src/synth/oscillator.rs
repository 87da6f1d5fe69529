// Oscillators - waveform generators and seeded noise

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

pub trait Oscillator {
    fn next_sample(&mut self) -> f32;
    fn set_frequency(&mut self, freq: f32);
    fn reset(&mut self);
}

/// Waveform shape, serialized with the names the settings document uses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformType {
    Sine,
    Square,
    #[serde(rename = "sawtooth")]
    Saw,
    Triangle,
}

impl WaveformType {
    /// Value of the waveform at a phase in [0, 1)
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            WaveformType::Sine => (phase * 2.0 * PI).sin(),
            WaveformType::Square => {
                if phase < 0.5 { 1.0 } else { -1.0 }
            }
            WaveformType::Saw => (phase * 2.0) - 1.0,
            WaveformType::Triangle => {
                if phase < 0.5 {
                    (phase * 4.0) - 1.0
                } else {
                    3.0 - (phase * 4.0)
                }
            }
        }
    }
}

pub struct SimpleOscillator {
    waveform: WaveformType,
    phase: f32,
    phase_increment: f32,
    sample_rate: f32,
}

impl SimpleOscillator {
    pub fn new(waveform: WaveformType, sample_rate: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            phase_increment: 0.0,
            sample_rate,
        }
    }
}

impl Oscillator for SimpleOscillator {
    fn next_sample(&mut self) -> f32 {
        let sample = self.waveform.sample(self.phase);

        self.phase += self.phase_increment;
        // Negative increments come from deep FM
        if !(0.0..1.0).contains(&self.phase) {
            self.phase -= self.phase.floor();
            if self.phase >= 1.0 {
                self.phase = 0.0;
            }
        }

        sample
    }

    fn set_frequency(&mut self, freq: f32) {
        self.phase_increment = freq / self.sample_rate;
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// White noise from a xorshift generator.
///
/// Seeded per voice so that rendering the same pattern twice yields the same
/// samples.
pub struct NoiseSource {
    state: u32,
}

impl NoiseSource {
    pub fn new(seed: u32) -> Self {
        // xorshift has a fixed point at zero
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    /// Uniform sample in [-1, 1)
    pub fn next_sample(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        (x >> 8) as f32 / (1u32 << 23) as f32 - 1.0
    }
}

/// Frequency multiplier for a detune in cents
pub fn cents_to_ratio(cents: f32) -> f32 {
    2f32.powf(cents / 1200.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;
    const EPSILON: f32 = 0.001;

    #[test]
    fn test_oscillator_frequency() {
        let mut osc = SimpleOscillator::new(WaveformType::Sine, SAMPLE_RATE);
        osc.set_frequency(440.0);

        let expected_increment = 440.0 / SAMPLE_RATE;
        assert!((osc.phase_increment - expected_increment).abs() < EPSILON);
    }

    #[test]
    fn test_oscillator_reset() {
        let mut osc = SimpleOscillator::new(WaveformType::Sine, SAMPLE_RATE);
        osc.set_frequency(440.0);
        for _ in 0..100 {
            osc.next_sample();
        }
        assert!(osc.phase > 0.0);

        osc.reset();
        assert_eq!(osc.phase, 0.0);
    }

    #[test]
    fn test_sine_starts_at_zero() {
        let mut osc = SimpleOscillator::new(WaveformType::Sine, SAMPLE_RATE);
        osc.set_frequency(440.0);
        let first_sample = osc.next_sample();
        assert!(first_sample.abs() < EPSILON, "First sample: {}", first_sample);
    }

    #[test]
    fn test_waveforms_stay_in_range() {
        for waveform in [
            WaveformType::Sine,
            WaveformType::Square,
            WaveformType::Saw,
            WaveformType::Triangle,
        ] {
            let mut osc = SimpleOscillator::new(waveform, SAMPLE_RATE);
            osc.set_frequency(440.0);
            for _ in 0..1000 {
                let sample = osc.next_sample();
                assert!((-1.0..=1.0).contains(&sample), "{:?} sample {}", waveform, sample);
                assert!(osc.phase >= 0.0 && osc.phase < 1.0);
            }
        }
    }

    #[test]
    fn test_negative_frequency_wraps_phase() {
        let mut osc = SimpleOscillator::new(WaveformType::Saw, SAMPLE_RATE);
        osc.set_frequency(-300.0);
        for _ in 0..1000 {
            osc.next_sample();
            assert!(osc.phase >= 0.0 && osc.phase < 1.0);
        }
    }

    #[test]
    fn test_noise_is_seeded() {
        let mut a = NoiseSource::new(42);
        let mut b = NoiseSource::new(42);
        for _ in 0..256 {
            let sample = a.next_sample();
            assert_eq!(sample, b.next_sample());
            assert!((-1.0..1.0).contains(&sample));
        }
    }

    #[test]
    fn test_waveform_wire_names() {
        assert_eq!(serde_json::to_string(&WaveformType::Saw).unwrap(), "\"sawtooth\"");
        let wave: WaveformType = serde_json::from_str("\"triangle\"").unwrap();
        assert_eq!(wave, WaveformType::Triangle);
    }

    #[test]
    fn test_cents_to_ratio() {
        assert!((cents_to_ratio(1200.0) - 2.0).abs() < 1e-5);
        assert_eq!(cents_to_ratio(0.0), 1.0);
    }
}
