// Voice builders - one function per tone engine
//
// Every builder turns a resolved VoiceSpec into a bounded Voice. The live
// engine and the offline renderer both go through `build_voice`, so a trigger
// sounds the same on either path.

use super::automation::ParamCurve;
use super::filter::FilterType;
use super::oscillator::WaveformType;
use super::voice::{Layer, LfoDestination, LfoMod, Source, Voice};
use crate::sequencer::pattern::MAX_STEPS;
use crate::sequencer::resolver::VoiceSpec;
use crate::sequencer::track::VoiceFamily;
use crate::settings::track::{FxType, LfoTarget};
use serde::{Deserialize, Serialize};

/// Near-silence used as the floor of exponential envelopes
const FLOOR: f32 = 0.0001;

/// Tone engine a trigger is rendered with
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceEngine {
    Kick,
    Snare,
    Hat,
    Bass,
    /// FX sub-voice picked from the track's `type` field
    Fx,
    /// TB-303 style bass with its own parameter set
    Acid(AcidSettings),
}

impl VoiceEngine {
    /// Default engine of a voice family
    pub fn for_family(family: VoiceFamily) -> Self {
        match family {
            VoiceFamily::Kick => VoiceEngine::Kick,
            VoiceFamily::Snare => VoiceEngine::Snare,
            VoiceFamily::Hat => VoiceEngine::Hat,
            VoiceFamily::Bass => VoiceEngine::Bass,
            VoiceFamily::Fx => VoiceEngine::Fx,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VoiceEngine::Kick => "kick",
            VoiceEngine::Snare => "snare",
            VoiceEngine::Hat => "hat",
            VoiceEngine::Bass => "bass",
            VoiceEngine::Fx => "fx",
            VoiceEngine::Acid(_) => "acid",
        }
    }
}

/// LFO of the acid engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcidLfo {
    pub enabled: bool,
    pub rate: f32,
    /// Cutoff swing in Hz (pitch target uses a tenth of it)
    pub depth: f32,
    pub target: LfoTarget,
}

impl Default for AcidLfo {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: 0.5,
            depth: 2400.0,
            target: LfoTarget::Filter,
        }
    }
}

/// Parameters of the acid bass engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AcidSettings {
    /// Filter cutoff, 30..5000 Hz
    pub cutoff: f32,
    /// 0..30, self-oscillation around 20
    pub resonance: f32,
    /// Envelope amount in percent
    pub env_mod: f32,
    /// Seconds
    pub decay: f32,
    /// Accent intensity in percent
    pub accent: f32,
    pub waveform: WaveformType,
    /// Sub oscillator mix, 0..1
    pub sub_osc: f32,
    pub level: f32,
    /// Soft saturation amount, 0..1
    pub drive: f32,
    pub lfo: AcidLfo,
    /// Glide length of a slid step, seconds
    pub slide_time: f32,
    /// Slide flags only glide while this is on
    pub slide_enabled: bool,
    /// Engine accents per track step, OR'd with the pattern accent
    pub accent_steps: [bool; MAX_STEPS],
    /// Steps that glide from the previous acid note
    pub slide_steps: [bool; MAX_STEPS],
}

impl AcidSettings {
    pub fn is_accented(&self, step: usize, pattern_accent: bool) -> bool {
        pattern_accent || self.accent_steps.get(step).copied().unwrap_or(false)
    }

    /// Frequency a step glides from, if it slides at all
    pub fn slide_origin(&self, step: usize, previous: Option<f32>) -> Option<f32> {
        let flagged = self.slide_steps.get(step).copied().unwrap_or(false);
        previous.filter(|f| self.slide_enabled && flagged && *f > 0.0)
    }
}

impl Default for AcidSettings {
    fn default() -> Self {
        Self {
            cutoff: 400.0,
            resonance: 8.0,
            env_mod: 60.0,
            decay: 0.3,
            accent: 50.0,
            waveform: WaveformType::Saw,
            sub_osc: 0.3,
            level: 0.75,
            drive: 0.2,
            lfo: AcidLfo::default(),
            slide_time: 0.06,
            slide_enabled: false,
            accent_steps: [false; MAX_STEPS],
            slide_steps: [false; MAX_STEPS],
        }
    }
}

/// Deterministic noise seed of a trigger, identical on both render paths
pub fn voice_seed(spec: &VoiceSpec) -> u32 {
    let track = spec.track.index() as u32 + 1;
    let step = spec.step as u32 + 1;
    track.wrapping_mul(0x9E37_79B9) ^ step.wrapping_mul(0x85EB_CA6B)
}

/// Build the voice of `spec` with `engine`
pub fn build_voice(engine: &VoiceEngine, spec: &VoiceSpec, sample_rate: f32) -> Voice {
    let seed = voice_seed(spec);
    match engine {
        VoiceEngine::Kick => kick(spec, sample_rate),
        VoiceEngine::Snare => snare(spec, sample_rate, seed),
        VoiceEngine::Hat => hat(spec, sample_rate, seed),
        VoiceEngine::Bass => bass(spec, sample_rate),
        VoiceEngine::Fx => fx(spec, sample_rate, seed),
        VoiceEngine::Acid(settings) => acid_voice(settings, spec, None, sample_rate),
    }
}

fn sweep(start: f32, end: f32, at: f32) -> ParamCurve {
    ParamCurve::constant(start).set(0.0, start).exponential(at, end)
}

fn lfo_if_active(spec: &VoiceSpec, depth: f32, destination: LfoDestination, until: f32) -> Option<LfoMod> {
    spec.settings.lfo.is_active().then_some(LfoMod {
        rate: spec.settings.lfo.rate,
        depth,
        destination,
        until,
    })
}

fn with_optional_lfo(layer: Layer, lfo: Option<LfoMod>) -> Layer {
    match lfo {
        Some(lfo) => layer.lfo(lfo),
        None => layer,
    }
}

fn kick(spec: &VoiceSpec, sr: f32) -> Voice {
    let f = spec.frequency;
    let settings = &spec.settings;
    let decay = spec.decay;
    let release = settings.adsr.release;
    let gain = ((if spec.accent { 1.0 } else { 0.9 }) * spec.level).min(1.0);
    let start_freq = f * if spec.accent { 1.2 } else { 1.0 };

    let pitch = ParamCurve::constant(start_freq * 3.5)
        .set(0.0, start_freq * 3.5)
        .exponential(0.025, start_freq)
        .exponential(0.15, f * 0.5);
    let body_gain = ParamCurve::constant(FLOOR)
        .set(0.0, FLOOR)
        .exponential(0.005, gain)
        .set(0.005, gain)
        .exponential(decay * 0.3, gain * 0.5)
        .exponential(decay + release, FLOOR);

    let lfo = match settings.lfo.target {
        LfoTarget::Pitch => lfo_if_active(spec, start_freq * settings.lfo.depth * 0.3, LfoDestination::Pitch, 0.5),
        LfoTarget::Filter => None,
    };
    let body = Layer::new(0.0, decay + release + 0.1, sr)
        .source(Source::osc(settings.wave.unwrap_or(WaveformType::Sine), pitch, settings.detune, sr))
        .gain(body_gain);

    let sub_gain = ParamCurve::constant(FLOOR)
        .set(0.0, FLOOR)
        .exponential(0.008, gain * 0.6 * spec.filter_mod)
        .exponential(decay * 0.9, FLOOR);
    let sub = Layer::new(0.0, decay + 0.15, sr)
        .source(Source::osc(WaveformType::Sine, sweep(f * 0.9, f * 0.4, 0.25), 0.0, sr))
        .gain(sub_gain);

    Voice::new(sr, settings.pan)
        .with_layer(with_optional_lfo(body, lfo))
        .with_layer(sub)
}

fn snare(spec: &VoiceSpec, sr: f32, seed: u32) -> Voice {
    let f = spec.frequency;
    let settings = &spec.settings;
    let decay = spec.decay;
    let gain = ((if spec.accent { 0.95 } else { 0.8 }) * spec.level).min(1.0);

    let noise_gain = ParamCurve::constant(FLOOR)
        .set(0.0, FLOOR)
        .exponential(0.003, gain * 0.8)
        .exponential(decay * 0.35, gain * 0.4)
        .exponential(decay, FLOOR);
    let lfo = lfo_if_active(spec, f * settings.lfo.depth * 1.5, LfoDestination::Cutoff(0), decay + 0.1);
    let noise = Layer::new(0.0, decay + 0.05, sr)
        .source(Source::noise(seed))
        .filter(FilterType::BandPass, ParamCurve::constant(f * 1.2 * spec.filter_mod), 1.2)
        .filter(FilterType::HighPass, ParamCurve::constant(120.0), 0.707)
        .gain(noise_gain);

    let tone_gain = ParamCurve::constant(FLOOR)
        .set(0.0, FLOOR)
        .exponential(0.002, gain * 0.6)
        .exponential(0.07, FLOOR);
    let tone = Layer::new(0.0, 0.08, sr)
        .source(Source::osc(WaveformType::Triangle, sweep(f * 2.5, f * 0.5, 0.04), settings.detune, sr))
        .gain(tone_gain);

    Voice::new(sr, settings.pan)
        .with_layer(with_optional_lfo(noise, lfo))
        .with_layer(tone)
}

fn hat(spec: &VoiceSpec, sr: f32, seed: u32) -> Voice {
    let f = spec.frequency;
    let settings = &spec.settings;
    let decay = spec.decay;
    let gain = ((if spec.accent { 0.7 } else { 0.55 }) * spec.level).min(0.9);

    let high_cut = (f * 0.6 * spec.filter_mod).max(4000.0);
    let noise_gain = ParamCurve::constant(FLOOR)
        .set(0.0, FLOOR)
        .exponential(0.002, gain)
        .exponential(decay, FLOOR);
    let metal_gain = ParamCurve::constant(FLOOR)
        .set(0.0, FLOOR)
        .exponential(0.002, gain * 0.4)
        .exponential(decay * 0.7, FLOOR);
    let lfo_depth = f * settings.lfo.depth * 1.2;
    let lfo_for = |stage| match settings.lfo.target {
        LfoTarget::Filter => lfo_if_active(spec, lfo_depth, LfoDestination::Cutoff(stage), decay + 0.1),
        LfoTarget::Pitch => None,
    };

    // Squares -> bandpass -> metal gain -> shared highpass -> noise gain
    let base = f / 10.0;
    let mut metal = Layer::new(0.0, decay + 0.02, sr);
    for ratio in [1.0, 1.4471, 1.6170] {
        metal = metal.source(Source::tone(WaveformType::Square, base * ratio, 0.0, sr));
    }
    let metal = metal
        .filter(FilterType::BandPass, ParamCurve::constant(f * spec.filter_mod), 1.5)
        .filter(FilterType::HighPass, ParamCurve::constant(high_cut), 0.5)
        .gain(metal_gain)
        .gain(noise_gain.clone());

    let noise = Layer::new(0.0, decay + 0.05, sr)
        .source(Source::noise(seed))
        .filter(FilterType::HighPass, ParamCurve::constant(high_cut), 0.5)
        .gain(noise_gain);

    Voice::new(sr, settings.pan)
        .with_layer(with_optional_lfo(metal, lfo_for(1)))
        .with_layer(with_optional_lfo(noise, lfo_for(0)))
}

fn bass(spec: &VoiceSpec, sr: f32) -> Voice {
    let f = spec.frequency;
    let settings = &spec.settings;
    let adsr = settings.adsr;
    let decay = spec.decay;
    let gain = ((if spec.accent { 0.85 } else { 0.7 }) * spec.level).min(0.95);
    let wave = settings.wave.unwrap_or(WaveformType::Saw);
    let second_wave = if wave == WaveformType::Saw {
        WaveformType::Square
    } else {
        WaveformType::Saw
    };

    let filter_base = f * spec.filter_mod;
    let cutoff = ParamCurve::constant(filter_base)
        .set(0.0, filter_base)
        .linear(adsr.attack * 0.4, filter_base * 8.0)
        .exponential(adsr.attack + decay, filter_base * 2.0);
    let amp = ParamCurve::constant(FLOOR)
        .set(0.0, FLOOR)
        .exponential(adsr.attack, gain)
        .set(adsr.attack + decay, gain * adsr.sustain)
        .exponential(adsr.attack + decay + adsr.release, FLOOR);
    let stop = adsr.attack + decay + adsr.release + 0.1;

    let lfo = match settings.lfo.target {
        LfoTarget::Filter => lfo_if_active(spec, f * settings.lfo.depth * 5.0, LfoDestination::Cutoff(0), stop),
        LfoTarget::Pitch => lfo_if_active(spec, f * settings.lfo.depth * 0.3, LfoDestination::Pitch, stop),
    };
    let cutoff_lfo = lfo.filter(|l| l.destination != LfoDestination::Pitch);

    // The sub sine stays out of the pitch LFO, so it gets its own copy of the
    // (linear) filter and amp chain
    let main = Layer::new(0.0, stop, sr)
        .source(Source::tone(wave, f, settings.detune, sr))
        .source(Source::tone(second_wave, f * 1.003, settings.detune + 8.0, sr))
        .filter(FilterType::LowPass, cutoff.clone(), 6.0)
        .gain(amp.clone());
    let sub = Layer::new(0.0, stop, sr)
        .source(Source::tone(WaveformType::Sine, f * 0.5, 0.0, sr))
        .filter(FilterType::LowPass, cutoff, 6.0)
        .gain(amp);

    Voice::new(sr, settings.pan)
        .with_layer(with_optional_lfo(main, lfo))
        .with_layer(with_optional_lfo(sub, cutoff_lfo))
}

/// Acid bass voice. `previous` is the frequency of the last acid note; a
/// flagged step glides from it when slides are enabled.
pub fn acid_voice(acid: &AcidSettings, spec: &VoiceSpec, previous: Option<f32>, sr: f32) -> Voice {
    let f = spec.frequency;
    let accent = acid.is_accented(spec.step, spec.accent);
    let pitch = match acid.slide_origin(spec.step, previous) {
        Some(from) => ParamCurve::constant(f)
            .set(0.0, from)
            .exponential(acid.slide_time.max(0.001), f),
        None => ParamCurve::constant(f),
    };

    let cutoff = acid.cutoff * spec.filter_mod;
    let env_depth = acid.env_mod / 100.0 * 4000.0;
    let accent_boost = if accent { acid.accent / 100.0 * 3000.0 } else { 0.0 };
    let peak = (cutoff + env_depth + accent_boost).min(18_000.0);
    let filter_decay = if accent { acid.decay * 0.7 } else { acid.decay };

    let safe = |hz: f32| hz.clamp(30.0, sr / 2.5);
    let envelope = ParamCurve::constant(safe(cutoff))
        .set(0.0, safe(cutoff))
        .exponential(0.005, safe(peak))
        .exponential(0.005 + filter_decay, safe(cutoff));

    let level = acid.level * spec.level * if accent { 1.3 } else { 1.0 };
    let amp = ParamCurve::constant(0.0)
        .set(0.0, 0.0)
        .linear(0.005, level)
        .set(0.1, level)
        .exponential(acid.decay + 0.3, 0.001);
    let stop = acid.decay + 0.5;

    let mut layer = Layer::new(0.0, stop, sr)
        .source(
            Source::osc(acid.waveform, pitch.clone(), spec.settings.detune, sr)
                .with_gain(1.0 - acid.sub_osc * 0.5),
        )
        .source(Source::osc(WaveformType::Sine, pitch.scaled(0.5), 0.0, sr).with_gain(acid.sub_osc));

    // Four-stage ladder, resonance peaking on the last stage
    let stage_q = 0.5 + acid.resonance / 30.0 * 2.0;
    for stage in 0..4 {
        let q = if stage == 3 {
            (acid.resonance * 1.2).min(25.0)
        } else {
            stage_q
        };
        layer = layer.filter(FilterType::LowPass, envelope.clone(), q);
    }

    if acid.lfo.enabled && acid.lfo.depth > 0.0 {
        let (depth, destination) = match acid.lfo.target {
            LfoTarget::Filter => (acid.lfo.depth, LfoDestination::AllCutoffs),
            LfoTarget::Pitch => (acid.lfo.depth / 10.0, LfoDestination::Pitch),
        };
        layer = layer.lfo(LfoMod {
            rate: acid.lfo.rate,
            depth,
            destination,
            until: stop,
        });
    }

    Voice::new(sr, spec.settings.pan).with_layer(layer.drive(acid.drive).gain(amp))
}

fn fx(spec: &VoiceSpec, sr: f32, seed: u32) -> Voice {
    let p = spec.frequency;
    let level = spec.level * if spec.accent { 1.1 } else { 1.0 };
    let settings = &spec.settings;
    let attack = settings.adsr.attack;
    let detune = settings.detune;
    let voice = Voice::new(sr, settings.pan);

    // Attack from silence, then an exponential fall to 0.01
    let swell = |peak: f32, rise: f32, end: f32| {
        ParamCurve::constant(0.0)
            .set(0.0, 0.0)
            .linear(rise, peak)
            .exponential(end, 0.01)
    };

    match settings.fx_type.unwrap_or_default() {
        FxType::Cowbell => {
            let end = attack + spec.decay;
            voice.with_layer(
                Layer::new(0.0, end, sr)
                    .source(Source::tone(WaveformType::Square, p, detune, sr))
                    .source(Source::tone(WaveformType::Square, p * 0.675, detune, sr))
                    .gain(swell(0.25 * level, attack, end)),
            )
        }
        FxType::Gunshot => voice.with_layer(
            Layer::new(0.0, 0.1, sr)
                .source(Source::noise(seed))
                .filter(FilterType::LowPass, sweep(8000.0, p, 0.1), 0.707)
                .gain(swell(0.7 * level, attack, 0.1)),
        ),
        FxType::Creaky => voice.with_layer(
            Layer::new(0.0, 0.4, sr)
                .source(Source::noise(seed))
                .filter(FilterType::BandPass, sweep(3000.0, p, 0.4), 30.0)
                .gain(swell(0.5 * level, attack, 0.4)),
        ),
        FxType::Clap => (0..3u32).fold(voice, |voice, burst| {
            let at = burst as f32 * 0.01;
            let gain = ParamCurve::constant(0.0)
                .set(at, 0.0)
                .linear(at + 0.002, 0.3 * level)
                .exponential(at + 0.05, 0.01);
            voice.with_layer(
                Layer::new(at, at + 0.05, sr)
                    .source(Source::noise(seed.wrapping_add(burst)))
                    .filter(FilterType::BandPass, ParamCurve::constant(2000.0), 2.0)
                    .gain(gain),
            )
        }),
        FxType::Rimshot => voice.with_layer(
            Layer::new(0.0, 0.05, sr)
                .source(Source::osc(WaveformType::Triangle, sweep(p * 5.0, p, 0.01), 0.0, sr))
                .gain(swell(0.4 * level, 0.001, 0.05)),
        ),
        FxType::AcidStab => voice.with_layer(
            Layer::new(0.0, 0.2, sr)
                .source(Source::tone(WaveformType::Saw, p, detune, sr))
                .source(Source::tone(WaveformType::Square, p * 1.005, detune + 7.0, sr))
                .filter(FilterType::LowPass, sweep(p * 8.0, p * 0.5, 0.15), 18.0)
                .gain(swell(0.35 * level, 0.005, 0.2)),
        ),
        FxType::Hoover => {
            let mut layer = Layer::new(0.0, 0.4, sr);
            for _ in 0..5 {
                layer = layer.source(Source::osc(WaveformType::Saw, sweep(p * 1.5, p * 0.7, 0.3), 0.0, sr));
            }
            voice.with_layer(
                layer
                    .filter(FilterType::LowPass, sweep(p * 6.0, p * 2.0, 0.3), 4.0)
                    .gain(swell(0.25 * level, 0.02, 0.4)),
            )
        }
        FxType::RaveStab => {
            let gain = ParamCurve::constant(0.0)
                .set(0.0, 0.0)
                .linear(0.001, 0.3 * level)
                .set(0.05, 0.25 * level)
                .exponential(0.15, 0.01);
            voice.with_layer(
                Layer::new(0.0, 0.15, sr)
                    .source(Source::tone(WaveformType::Saw, p, 0.0, sr))
                    .source(Source::tone(WaveformType::Saw, p * 2.0, 0.0, sr))
                    .source(Source::tone(WaveformType::Square, p * 1.5, 0.0, sr))
                    .filter(FilterType::BandPass, ParamCurve::constant(p * 4.0), 3.0)
                    .gain(gain),
            )
        }
        FxType::Laser => voice.with_layer(
            Layer::new(0.0, 0.15, sr)
                .source(Source::osc(WaveformType::Sine, sweep(p * 10.0, p * 0.2, 0.15), 0.0, sr))
                .gain(sweep(0.4 * level, 0.01, 0.15)),
        ),
        FxType::Reese => {
            let mut layer = Layer::new(0.0, 0.4, sr);
            for i in 0..4 {
                let cents = (i as f32 - 1.5) * 15.0 + detune;
                layer = layer.source(Source::tone(WaveformType::Saw, p, cents, sr));
            }
            voice.with_layer(
                layer
                    .filter(FilterType::LowPass, ParamCurve::constant(p * 4.0), 2.0)
                    .gain(swell(0.4 * level, 0.01, 0.4)),
            )
        }
        FxType::FmBell => voice.with_layer(
            Layer::new(0.0, 0.6, sr)
                .source(Source::fm(p, 3.5, sweep(p * 2.0, p * 0.1, 0.5), sr))
                .gain(swell(0.35 * level, 0.001, 0.6)),
        ),
        FxType::WhiteNoise => {
            let cutoff = if p > 500.0 {
                sweep(200.0, p * 4.0, 0.3)
            } else {
                sweep(p * 8.0, 100.0, 0.3)
            };
            voice.with_layer(
                Layer::new(0.0, 0.35, sr)
                    .source(Source::noise(seed))
                    .filter(FilterType::BandPass, cutoff, 8.0)
                    .gain(swell(0.35 * level, 0.1, 0.35)),
            )
        }
    }
}

/// Short saw/square blip used when auditioning a note
pub fn preview_voice(frequency: f32, sample_rate: f32) -> Voice {
    let gain = ParamCurve::constant(0.0)
        .set(0.0, 0.0)
        .linear(0.01, 0.5)
        .linear(0.1, 0.3)
        .exponential(0.4, 0.001);
    Voice::new(sample_rate, 0.0).with_layer(
        Layer::new(0.0, 0.4, sample_rate)
            .source(Source::tone(WaveformType::Saw, frequency, 0.0, sample_rate))
            .source(Source::tone(WaveformType::Square, frequency * 1.003, 0.0, sample_rate))
            .filter(FilterType::LowPass, sweep(frequency * 6.0, frequency * 1.5, 0.2), 4.0)
            .gain(gain),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::pattern::Pattern;
    use crate::sequencer::resolver::ParameterResolver;
    use crate::sequencer::track::TrackId;
    use crate::settings::registry::TrackSettingsRegistry;

    const SAMPLE_RATE: f32 = 44100.0;

    fn spec_for(track: TrackId, accent: bool) -> VoiceSpec {
        let mut pattern = Pattern::create_empty();
        if accent {
            pattern.toggle_accent(0);
        }
        let registry = TrackSettingsRegistry::new();
        ParameterResolver::new(&pattern, &registry).resolve(track, 0, 0)
    }

    fn render(mut voice: Voice) -> Vec<(f32, f32)> {
        let mut frames = Vec::new();
        while !voice.is_finished() {
            frames.push(voice.next_frame());
        }
        frames
    }

    fn peak(frames: &[(f32, f32)]) -> f32 {
        frames.iter().map(|(l, r)| l.abs().max(r.abs())).fold(0.0, f32::max)
    }

    #[test]
    fn test_every_engine_is_bounded_and_audible() {
        for track in TrackId::ALL {
            let spec = spec_for(track, false);
            let engine = VoiceEngine::for_family(track.family());
            let frames = render(build_voice(&engine, &spec, SAMPLE_RATE));
            assert!(!frames.is_empty(), "{} rendered nothing", track);
            assert!(frames.len() < SAMPLE_RATE as usize * 2, "{} too long", track);
            assert!(frames.iter().all(|(l, r)| l.is_finite() && r.is_finite()));
            assert!(peak(&frames) > 0.001, "{} is silent", track);
        }
    }

    #[test]
    fn test_every_fx_type_renders() {
        let mut spec = spec_for(TrackId::Fx1, false);
        for fx_type in FxType::ALL {
            spec.settings.fx_type = Some(fx_type);
            let frames = render(build_voice(&VoiceEngine::Fx, &spec, SAMPLE_RATE));
            assert!(peak(&frames) > 0.0001, "{} is silent", fx_type);
            assert!(frames.iter().all(|(l, _)| l.is_finite()), "{} blew up", fx_type);
        }
    }

    #[test]
    fn test_same_spec_same_samples() {
        let spec = spec_for(TrackId::Snare1, true);
        let a = render(build_voice(&VoiceEngine::Snare, &spec, SAMPLE_RATE));
        let b = render(build_voice(&VoiceEngine::Snare, &spec, SAMPLE_RATE));
        assert_eq!(a, b);
    }

    #[test]
    fn test_accent_is_louder() {
        let plain = peak(&render(build_voice(&VoiceEngine::Kick, &spec_for(TrackId::Kick1, false), SAMPLE_RATE)));
        let accented = peak(&render(build_voice(&VoiceEngine::Kick, &spec_for(TrackId::Kick1, true), SAMPLE_RATE)));
        assert!(accented > plain);
    }

    #[test]
    fn test_acid_voice_length_follows_decay() {
        let spec = spec_for(TrackId::Bass1, false);
        let acid = AcidSettings::default();
        let voice = build_voice(&VoiceEngine::Acid(acid), &spec, SAMPLE_RATE);
        assert!((voice.duration_secs() - 0.8).abs() < 0.001);
        assert!(peak(&render(voice)) > 0.01);
    }

    #[test]
    fn test_acid_settings_partial_json() {
        let acid: AcidSettings = serde_json::from_str(r#"{"cutoff": 800, "subOsc": 0.5}"#).unwrap();
        assert_eq!(acid.cutoff, 800.0);
        assert_eq!(acid.sub_osc, 0.5);
        assert_eq!(acid.resonance, 8.0);
        assert!(acid.lfo.enabled);
    }

    #[test]
    fn test_acid_step_accent_matches_pattern_accent() {
        let spec = spec_for(TrackId::Bass1, false);
        let mut acid = AcidSettings::default();
        let plain = render(acid_voice(&acid, &spec, None, SAMPLE_RATE));
        let pattern_accent = render(acid_voice(&acid, &spec_for(TrackId::Bass1, true), None, SAMPLE_RATE));

        acid.accent_steps[0] = true;
        let step_accent = render(acid_voice(&acid, &spec, None, SAMPLE_RATE));
        assert_ne!(step_accent, plain);
        assert!(peak(&step_accent) > peak(&plain));
        assert!(acid.is_accented(0, false));
        assert!(!acid.is_accented(1, false));
        assert_eq!(pattern_accent.len(), step_accent.len());
    }

    #[test]
    fn test_acid_slide_needs_flag_toggle_and_previous_note() {
        let spec = spec_for(TrackId::Bass1, false);
        let mut acid = AcidSettings::default();
        acid.slide_steps[0] = true;
        let straight = render(acid_voice(&acid, &spec, None, SAMPLE_RATE));

        // Flag alone does nothing while slides are off
        assert_eq!(render(acid_voice(&acid, &spec, Some(110.0), SAMPLE_RATE)), straight);

        acid.slide_enabled = true;
        assert_eq!(acid.slide_origin(0, Some(110.0)), Some(110.0));
        assert_eq!(acid.slide_origin(0, None), None);
        assert_eq!(acid.slide_origin(1, Some(110.0)), None);
        let slid = render(acid_voice(&acid, &spec, Some(110.0), SAMPLE_RATE));
        assert_eq!(slid.len(), straight.len());
        assert_ne!(slid, straight);
    }

    #[test]
    fn test_preview_voice() {
        let voice = preview_voice(440.0, SAMPLE_RATE);
        assert_eq!(voice.length_samples(), 17640);
        assert!(peak(&render(voice)) > 0.05);
    }

    #[test]
    fn test_seed_depends_on_track_and_step() {
        let a = spec_for(TrackId::Hat1, false);
        let mut b = a.clone();
        b.step = 3;
        assert_ne!(voice_seed(&a), voice_seed(&b));
        assert_eq!(voice_seed(&a), voice_seed(&a.clone()));
    }
}
