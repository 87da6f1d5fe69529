// Master effects settings
// Stored and exchanged as data; the engine does not process them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistortionSettings {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverbSettings {
    #[serde(rename = "type")]
    pub kind: String,
    pub mix: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelaySettings {
    pub time: f32,
    pub feedback: f32,
    pub mix: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorSettings {
    pub threshold: f32,
    pub ratio: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxSettings {
    pub distortion: DistortionSettings,
    pub reverb: ReverbSettings,
    pub delay: DelaySettings,
    pub compressor: CompressorSettings,
}

impl Default for FxSettings {
    fn default() -> Self {
        Self {
            distortion: DistortionSettings {
                kind: "soft".to_string(),
                amount: 0.0,
            },
            reverb: ReverbSettings {
                kind: "room".to_string(),
                mix: 0.2,
            },
            delay: DelaySettings {
                time: 0.25,
                feedback: 0.3,
                mix: 0.0,
            },
            compressor: CompressorSettings {
                threshold: -12.0,
                ratio: 4.0,
            },
        }
    }
}

impl FxSettings {
    pub fn validate(&self) -> Result<(), String> {
        let values = [
            self.distortion.amount,
            self.reverb.mix,
            self.delay.time,
            self.delay.feedback,
            self.delay.mix,
            self.compressor.threshold,
            self.compressor.ratio,
        ];
        if values.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err("fx settings must be finite numbers".to_string())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistortionPatch {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReverbPatch {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub mix: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DelayPatch {
    #[serde(default)]
    pub time: Option<f32>,
    #[serde(default)]
    pub feedback: Option<f32>,
    #[serde(default)]
    pub mix: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressorPatch {
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default)]
    pub ratio: Option<f32>,
}

/// Partial effects block of an imported document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FxSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distortion: Option<DistortionPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverb: Option<ReverbPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelayPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressor: Option<CompressorPatch>,
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

impl FxSettingsPatch {
    /// Merge the present fields over `target`
    pub fn apply(&self, target: &mut FxSettings) {
        if let Some(distortion) = &self.distortion {
            set(&mut target.distortion.kind, &distortion.kind);
            set(&mut target.distortion.amount, &distortion.amount);
        }
        if let Some(reverb) = &self.reverb {
            set(&mut target.reverb.kind, &reverb.kind);
            set(&mut target.reverb.mix, &reverb.mix);
        }
        if let Some(delay) = &self.delay {
            set(&mut target.delay.time, &delay.time);
            set(&mut target.delay.feedback, &delay.feedback);
            set(&mut target.delay.mix, &delay.mix);
        }
        if let Some(compressor) = &self.compressor {
            set(&mut target.compressor.threshold, &compressor.threshold);
            set(&mut target.compressor.ratio, &compressor.ratio);
        }
    }
}

impl From<&FxSettings> for FxSettingsPatch {
    fn from(fx: &FxSettings) -> Self {
        Self {
            distortion: Some(DistortionPatch {
                kind: Some(fx.distortion.kind.clone()),
                amount: Some(fx.distortion.amount),
            }),
            reverb: Some(ReverbPatch {
                kind: Some(fx.reverb.kind.clone()),
                mix: Some(fx.reverb.mix),
            }),
            delay: Some(DelayPatch {
                time: Some(fx.delay.time),
                feedback: Some(fx.delay.feedback),
                mix: Some(fx.delay.mix),
            }),
            compressor: Some(CompressorPatch {
                threshold: Some(fx.compressor.threshold),
                ratio: Some(fx.compressor.ratio),
            }),
        }
    }
}
