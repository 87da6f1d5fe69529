// Track settings - base synthesis parameters of one track
// Field names follow the settings document (camelCase, `type` for the FX voice)

use crate::sequencer::track::{TrackId, VoiceFamily};
use crate::synth::envelope::{AdsrParams, AdsrPatch};
use crate::synth::oscillator::WaveformType;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Level range accepted by the registry and the importer
pub const LEVEL_RANGE: std::ops::RangeInclusive<f32> = 0.0..=1.5;

/// Pan range (-1 hard left, 1 hard right)
pub const PAN_RANGE: std::ops::RangeInclusive<f32> = -1.0..=1.0;

/// FX sub-voice selected by an FX track's `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FxType {
    #[default]
    Cowbell,
    Gunshot,
    Creaky,
    Clap,
    Rimshot,
    AcidStab,
    Hoover,
    RaveStab,
    Laser,
    Reese,
    FmBell,
    WhiteNoise,
}

impl FxType {
    pub const ALL: [FxType; 12] = [
        FxType::Cowbell,
        FxType::Gunshot,
        FxType::Creaky,
        FxType::Clap,
        FxType::Rimshot,
        FxType::AcidStab,
        FxType::Hoover,
        FxType::RaveStab,
        FxType::Laser,
        FxType::Reese,
        FxType::FmBell,
        FxType::WhiteNoise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FxType::Cowbell => "cowbell",
            FxType::Gunshot => "gunshot",
            FxType::Creaky => "creaky",
            FxType::Clap => "clap",
            FxType::Rimshot => "rimshot",
            FxType::AcidStab => "acidstab",
            FxType::Hoover => "hoover",
            FxType::RaveStab => "ravestab",
            FxType::Laser => "laser",
            FxType::Reese => "reese",
            FxType::FmBell => "fmbell",
            FxType::WhiteNoise => "whitenoise",
        }
    }

    /// Parse a voice name. Unknown names play the cowbell.
    pub fn from_name(name: &str) -> Self {
        FxType::ALL
            .iter()
            .copied()
            .find(|fx| fx.as_str() == name)
            .unwrap_or_default()
    }
}

impl fmt::Display for FxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FxType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FxType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(FxType::from_name(&name))
    }
}

/// Where a track's LFO is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LfoTarget {
    #[default]
    Pitch,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LfoSettings {
    /// Rate in Hz
    pub rate: f32,
    /// Depth, 0 disables the LFO
    pub depth: f32,
    #[serde(default)]
    pub target: LfoTarget,
}

impl LfoSettings {
    pub fn new(target: LfoTarget) -> Self {
        Self {
            rate: 0.0,
            depth: 0.0,
            target,
        }
    }

    pub fn is_active(&self) -> bool {
        self.depth > 0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LfoPatch {
    #[serde(default)]
    pub rate: Option<f32>,
    #[serde(default)]
    pub depth: Option<f32>,
    #[serde(default)]
    pub target: Option<LfoTarget>,
}

impl LfoPatch {
    pub fn apply(&self, lfo: &mut LfoSettings) {
        if let Some(rate) = self.rate {
            lfo.rate = rate;
        }
        if let Some(depth) = self.depth {
            lfo.depth = depth;
        }
        if let Some(target) = self.target {
            lfo.target = target;
        }
    }
}

/// Base parameters of one track
///
/// Voice-specific fields are optional: kicks carry `freq`/`wave`, snares and
/// hats `tone`/`decay`, bass `wave`, FX `type`/`pitch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave: Option<WaveformType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay: Option<f32>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub fx_type: Option<FxType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    pub level: f32,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub solo: bool,
    #[serde(default)]
    pub pan: f32,
    /// Detune in cents
    #[serde(default)]
    pub detune: f32,
    #[serde(default)]
    pub lfo: LfoSettings,
    pub adsr: AdsrParams,
}

impl TrackSettings {
    fn base(level: f32, lfo_target: LfoTarget, adsr: AdsrParams) -> Self {
        Self {
            freq: None,
            wave: None,
            tone: None,
            decay: None,
            fx_type: None,
            pitch: None,
            level,
            mute: false,
            solo: false,
            pan: 0.0,
            detune: 0.0,
            lfo: LfoSettings::new(lfo_target),
            adsr,
        }
    }

    /// Factory settings of a track
    pub fn default_for(track: TrackId) -> Self {
        let adsr = |attack, decay, sustain, release| AdsrParams {
            attack,
            decay,
            sustain,
            release,
        };
        match track {
            TrackId::Kick1 => Self {
                freq: Some(55.0),
                wave: Some(WaveformType::Sine),
                ..Self::base(1.0, LfoTarget::Pitch, adsr(0.003, 0.45, 0.0, 0.3))
            },
            TrackId::Kick2 => Self {
                freq: Some(70.0),
                wave: Some(WaveformType::Sine),
                ..Self::base(0.8, LfoTarget::Pitch, adsr(0.003, 0.35, 0.0, 0.25))
            },
            TrackId::Snare1 => Self {
                tone: Some(200.0),
                decay: Some(0.22),
                ..Self::base(0.9, LfoTarget::Pitch, adsr(0.002, 0.22, 0.0, 0.15))
            },
            TrackId::Snare2 => Self {
                tone: Some(280.0),
                decay: Some(0.15),
                ..Self::base(0.7, LfoTarget::Pitch, adsr(0.002, 0.15, 0.0, 0.1))
            },
            TrackId::Hat1 => Self {
                tone: Some(8000.0),
                decay: Some(0.06),
                ..Self::base(0.7, LfoTarget::Filter, adsr(0.001, 0.06, 0.0, 0.05))
            },
            TrackId::Hat2 => Self {
                tone: Some(6000.0),
                decay: Some(0.25),
                ..Self::base(0.6, LfoTarget::Filter, adsr(0.001, 0.25, 0.0, 0.2))
            },
            TrackId::Bass1 => Self {
                wave: Some(WaveformType::Saw),
                ..Self::base(0.85, LfoTarget::Filter, adsr(0.008, 0.3, 0.5, 0.3))
            },
            TrackId::Bass2 => Self {
                wave: Some(WaveformType::Square),
                ..Self::base(0.65, LfoTarget::Filter, adsr(0.008, 0.25, 0.4, 0.25))
            },
            TrackId::Fx1 => Self {
                fx_type: Some(FxType::Cowbell),
                pitch: Some(800.0),
                ..Self::base(0.75, LfoTarget::Pitch, adsr(0.003, 0.18, 0.0, 0.12))
            },
            TrackId::Fx2 => Self {
                fx_type: Some(FxType::AcidStab),
                pitch: Some(200.0),
                ..Self::base(0.8, LfoTarget::Pitch, adsr(0.003, 0.25, 0.0, 0.18))
            },
        }
    }

    /// Decay the resolver starts from before the lock multiplier.
    ///
    /// Drums read their own `decay` field (0.2 s when absent); bass and FX
    /// voices are shaped by their ADSR decay.
    pub fn base_decay(&self, family: VoiceFamily) -> f32 {
        if family.uses_decay_fallback() {
            self.decay.filter(|d| *d != 0.0).unwrap_or(0.2)
        } else {
            self.adsr.decay
        }
    }

    /// Copy every field of `other` except the mute and solo flags
    pub fn assign_keeping_flags(&mut self, other: &TrackSettings) {
        let (mute, solo) = (self.mute, self.solo);
        *self = other.clone();
        self.mute = mute;
        self.solo = solo;
    }

    /// Range checks applied to imported and edited values
    pub fn validate(&self) -> Result<(), String> {
        if !self.level.is_finite() || !LEVEL_RANGE.contains(&self.level) {
            return Err(format!("level {} outside 0..=1.5", self.level));
        }
        if !self.pan.is_finite() || !PAN_RANGE.contains(&self.pan) {
            return Err(format!("pan {} outside -1..=1", self.pan));
        }
        if !self.detune.is_finite() {
            return Err("detune is not a finite number".to_string());
        }
        if !self.adsr.is_valid() {
            return Err(format!("invalid envelope {:?}", self.adsr));
        }
        let optional = [self.freq, self.tone, self.decay, self.pitch];
        if optional.iter().flatten().any(|v| !v.is_finite() || *v < 0.0) {
            return Err("voice parameters must be finite and non-negative".to_string());
        }
        if !self.lfo.rate.is_finite() || !self.lfo.depth.is_finite() {
            return Err("lfo values must be finite".to_string());
        }
        Ok(())
    }
}

/// Partial update of one track's settings, as found in an imported document
///
/// A missing voice field keeps the current value; an explicit `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSettingsPatch {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub freq: Option<Option<f32>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub wave: Option<Option<WaveformType>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub tone: Option<Option<f32>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub decay: Option<Option<f32>>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub fx_type: Option<Option<FxType>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub pitch: Option<Option<f32>>,
    #[serde(default)]
    pub level: Option<f32>,
    #[serde(default)]
    pub mute: Option<bool>,
    #[serde(default)]
    pub solo: Option<bool>,
    #[serde(default)]
    pub pan: Option<f32>,
    #[serde(default)]
    pub detune: Option<f32>,
    #[serde(default)]
    pub lfo: Option<LfoPatch>,
    #[serde(default)]
    pub adsr: Option<AdsrPatch>,
}

/// Present-but-null maps to `Some(None)`; a missing field stays `None` through `default`
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TrackSettingsPatch {
    /// Apply the fields present in the patch, merging `adsr` and `lfo` per field
    pub fn apply(&self, target: &mut TrackSettings) {
        if let Some(freq) = self.freq {
            target.freq = freq;
        }
        if let Some(wave) = self.wave {
            target.wave = wave;
        }
        if let Some(tone) = self.tone {
            target.tone = tone;
        }
        if let Some(decay) = self.decay {
            target.decay = decay;
        }
        if let Some(fx_type) = self.fx_type {
            target.fx_type = fx_type;
        }
        if let Some(pitch) = self.pitch {
            target.pitch = pitch;
        }
        if let Some(level) = self.level {
            target.level = level;
        }
        if let Some(mute) = self.mute {
            target.mute = mute;
        }
        if let Some(solo) = self.solo {
            target.solo = solo;
        }
        if let Some(pan) = self.pan {
            target.pan = pan;
        }
        if let Some(detune) = self.detune {
            target.detune = detune;
        }
        if let Some(lfo) = &self.lfo {
            lfo.apply(&mut target.lfo);
        }
        if let Some(adsr) = &self.adsr {
            adsr.apply(&mut target.adsr);
        }
    }
}

impl From<&TrackSettings> for TrackSettingsPatch {
    fn from(settings: &TrackSettings) -> Self {
        Self {
            freq: Some(settings.freq),
            wave: Some(settings.wave),
            tone: Some(settings.tone),
            decay: Some(settings.decay),
            fx_type: Some(settings.fx_type),
            pitch: Some(settings.pitch),
            level: Some(settings.level),
            mute: Some(settings.mute),
            solo: Some(settings.solo),
            pan: Some(settings.pan),
            detune: Some(settings.detune),
            lfo: Some(LfoPatch {
                rate: Some(settings.lfo.rate),
                depth: Some(settings.lfo.depth),
                target: Some(settings.lfo.target),
            }),
            adsr: Some(AdsrPatch {
                attack: Some(settings.adsr.attack),
                decay: Some(settings.adsr.decay),
                sustain: Some(settings.adsr.sustain),
                release: Some(settings.adsr.release),
            }),
        }
    }
}
