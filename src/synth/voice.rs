// Voice - one scheduled sound event
//
// A voice is a set of layers mixed to mono and panned. Each layer runs its
// sources through a chain of filters and an automated gain. All automation
// is in voice-local seconds, so the same voice renders identically whether
// the live engine or the offline renderer plays it.

use super::automation::ParamCurve;
use super::filter::{Biquad, FilterType};
use super::oscillator::{NoiseSource, Oscillator, SimpleOscillator, WaveformType};
use std::f32::consts::PI;

/// Filter coefficients are refreshed every this many samples
const CONTROL_INTERVAL: u64 = 16;

/// Where an LFO is applied inside a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LfoDestination {
    /// Added to every oscillator frequency (Hz)
    Pitch,
    /// Added to the cutoff of one filter stage (Hz)
    Cutoff(usize),
    /// Added to every filter cutoff (Hz)
    AllCutoffs,
}

/// Sine LFO with an absolute depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoMod {
    pub rate: f32,
    pub depth: f32,
    pub destination: LfoDestination,
    /// Local time the LFO stops
    pub until: f32,
}

impl LfoMod {
    fn value_at(&self, t: f32) -> f32 {
        if t >= self.until {
            0.0
        } else {
            self.depth * (2.0 * PI * self.rate * t).sin()
        }
    }
}

enum SourceKind {
    Osc {
        osc: SimpleOscillator,
        frequency: ParamCurve,
        ratio: f32,
    },
    Noise(NoiseSource),
    Fm {
        carrier: SimpleOscillator,
        modulator: SimpleOscillator,
        frequency: f32,
        mod_ratio: f32,
        mod_depth: ParamCurve,
    },
}

/// Sound source of a layer
pub struct Source {
    kind: SourceKind,
    gain: f32,
}

impl Source {
    /// Oscillator following a frequency curve; `cents` detunes it
    pub fn osc(wave: WaveformType, frequency: ParamCurve, cents: f32, sample_rate: f32) -> Self {
        Self {
            kind: SourceKind::Osc {
                osc: SimpleOscillator::new(wave, sample_rate),
                frequency,
                ratio: super::oscillator::cents_to_ratio(cents),
            },
            gain: 1.0,
        }
    }

    /// Oscillator at a fixed frequency
    pub fn tone(wave: WaveformType, frequency: f32, cents: f32, sample_rate: f32) -> Self {
        Self::osc(wave, ParamCurve::constant(frequency), cents, sample_rate)
    }

    pub fn noise(seed: u32) -> Self {
        Self {
            kind: SourceKind::Noise(NoiseSource::new(seed)),
            gain: 1.0,
        }
    }

    /// Two-operator FM: a sine carrier whose frequency is pushed by a sine
    /// modulator at `frequency × mod_ratio` scaled by `mod_depth` (Hz)
    pub fn fm(frequency: f32, mod_ratio: f32, mod_depth: ParamCurve, sample_rate: f32) -> Self {
        Self {
            kind: SourceKind::Fm {
                carrier: SimpleOscillator::new(WaveformType::Sine, sample_rate),
                modulator: SimpleOscillator::new(WaveformType::Sine, sample_rate),
                frequency,
                mod_ratio,
                mod_depth,
            },
            gain: 1.0,
        }
    }

    /// Fixed mix level of this source
    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    fn next_sample(&mut self, t: f32, pitch_offset: f32) -> f32 {
        let sample = match &mut self.kind {
            SourceKind::Osc {
                osc,
                frequency,
                ratio,
            } => {
                osc.set_frequency((frequency.value_at(t) + pitch_offset) * *ratio);
                osc.next_sample()
            }
            SourceKind::Noise(noise) => noise.next_sample(),
            SourceKind::Fm {
                carrier,
                modulator,
                frequency,
                mod_ratio,
                mod_depth,
            } => {
                modulator.set_frequency(*frequency * *mod_ratio);
                let deviation = modulator.next_sample() * mod_depth.value_at(t);
                carrier.set_frequency(*frequency + deviation + pitch_offset);
                carrier.next_sample()
            }
        };
        sample * self.gain
    }
}

struct FilterStage {
    biquad: Biquad,
    cutoff: ParamCurve,
    q: f32,
}

/// Sources -> filter chain -> shaper -> gain stages
pub struct Layer {
    sources: Vec<Source>,
    filters: Vec<FilterStage>,
    gains: Vec<ParamCurve>,
    drive: Option<f32>,
    lfo: Option<LfoMod>,
    start: f32,
    stop: f32,
    sample_rate: f32,
}

impl Layer {
    /// Layer sounding from `start` until `stop` (voice-local seconds)
    pub fn new(start: f32, stop: f32, sample_rate: f32) -> Self {
        Self {
            sources: Vec::new(),
            filters: Vec::new(),
            gains: Vec::new(),
            drive: None,
            lfo: None,
            start: start.max(0.0),
            stop: stop.max(start),
            sample_rate,
        }
    }

    pub fn source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    pub fn filter(mut self, filter_type: FilterType, cutoff: ParamCurve, q: f32) -> Self {
        let biquad = Biquad::new(filter_type, cutoff.value_at(0.0), q, self.sample_rate);
        self.filters.push(FilterStage { biquad, cutoff, q });
        self
    }

    /// Add a gain stage. Curves are in voice time (not layer time); several
    /// stages multiply.
    pub fn gain(mut self, gain: ParamCurve) -> Self {
        self.gains.push(gain);
        self
    }

    /// Soft saturation `(π + k)x / (π + k|x|)` with `k = drive × 50`
    pub fn drive(mut self, drive: f32) -> Self {
        self.drive = Some(drive * 50.0);
        self
    }

    pub fn lfo(mut self, lfo: LfoMod) -> Self {
        self.lfo = Some(lfo);
        self
    }

    fn next_sample(&mut self, t: f32, position: u64) -> f32 {
        if t < self.start || t >= self.stop {
            return 0.0;
        }

        let lfo = self.lfo.map(|l| (l.destination, l.value_at(t)));
        let pitch_offset = match lfo {
            Some((LfoDestination::Pitch, v)) => v,
            _ => 0.0,
        };

        let mut sample: f32 = self
            .sources
            .iter_mut()
            .map(|s| s.next_sample(t, pitch_offset))
            .sum();

        let refresh = position % CONTROL_INTERVAL == 0;
        for (index, stage) in self.filters.iter_mut().enumerate() {
            if refresh {
                let offset = match lfo {
                    Some((LfoDestination::AllCutoffs, v)) => v,
                    Some((LfoDestination::Cutoff(target), v)) if target == index => v,
                    _ => 0.0,
                };
                stage.biquad.set_params(stage.cutoff.value_at(t) + offset, stage.q);
            }
            sample = stage.biquad.process(sample);
        }

        if let Some(k) = self.drive
            && k > 0.0
        {
            sample = (PI + k) * sample / (PI + k * sample.abs());
        }

        self.gains.iter().fold(sample, |acc, gain| acc * gain.value_at(t))
    }
}

/// A fully built sound event, scheduled at an absolute backend time
pub struct Voice {
    start_time: f64,
    gain_left: f32,
    gain_right: f32,
    layers: Vec<Layer>,
    sample_rate: f32,
    position: u64,
    length: u64,
}

impl Voice {
    pub fn new(sample_rate: f32, pan: f32) -> Self {
        let (gain_left, gain_right) = constant_power_pan(pan);
        Self {
            start_time: 0.0,
            gain_left,
            gain_right,
            layers: Vec::new(),
            sample_rate,
            position: 0,
            length: 0,
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        let end = (layer.stop * self.sample_rate).round() as u64;
        self.length = self.length.max(end);
        self.layers.push(layer);
        self
    }

    pub fn at(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Absolute start time in backend seconds
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Total length in samples
    pub fn length_samples(&self) -> u64 {
        self.length
    }

    pub fn duration_secs(&self) -> f32 {
        self.length as f32 / self.sample_rate
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.length
    }

    /// Next stereo frame
    pub fn next_frame(&mut self) -> (f32, f32) {
        if self.is_finished() {
            return (0.0, 0.0);
        }
        let t = self.position as f32 / self.sample_rate;
        let position = self.position;
        let mono: f32 = self
            .layers
            .iter_mut()
            .map(|layer| layer.next_sample(t, position))
            .sum();
        self.position += 1;
        (mono * self.gain_left, mono * self.gain_right)
    }
}

/// Equal-power stereo gains for a pan in [-1, 1]
pub fn constant_power_pan(pan: f32) -> (f32, f32) {
    let pan = if pan.is_finite() { pan.clamp(-1.0, 1.0) } else { 0.0 };
    let angle = (pan + 1.0) * PI / 4.0;
    (angle.cos(), angle.sin())
}
