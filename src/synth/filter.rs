// Filter - RBJ biquad
//
// Second-order IIR filter with coefficients from Robert Bristow-Johnson's
// "Audio EQ Cookbook". Stable across the whole audio band, which the hat and
// noise voices need (cutoffs up to 16 kHz).
//
// Characteristics:
// - 12dB/octave slope (2-pole)
// - Transposed direct form II
// - Coefficients recomputed on demand when the cutoff is automated

use std::f32::consts::PI;

/// Filter type/mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Low-pass filter (12dB/octave)
    #[default]
    LowPass,
    /// High-pass filter (12dB/octave)
    HighPass,
    /// Band-pass filter (constant 0 dB peak gain)
    BandPass,
}

/// Biquad filter state and coefficients
#[derive(Debug, Clone)]
pub struct Biquad {
    filter_type: FilterType,
    sample_rate: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(filter_type: FilterType, cutoff: f32, q: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            filter_type,
            sample_rate,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        };
        filter.set_params(cutoff, q);
        filter
    }

    /// Recompute coefficients. Cutoff is kept inside (10 Hz, 0.49 × Fs).
    pub fn set_params(&mut self, cutoff: f32, q: f32) {
        let nyquist_guard = self.sample_rate * 0.49;
        let cutoff = if cutoff.is_finite() {
            cutoff.clamp(10.0, nyquist_guard)
        } else {
            nyquist_guard
        };
        let q = if q.is_finite() { q.max(0.0001) } else { 0.707 };

        let w0 = 2.0 * PI * cutoff / self.sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);

        let (b0, b1, b2) = match self.filter_type {
            FilterType::LowPass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterType::HighPass => {
                let b1 = -(1.0 + cos_w0);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
            FilterType::BandPass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = (-2.0 * cos_w0) / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    /// Process one sample
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    /// Clear the delay line
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}
