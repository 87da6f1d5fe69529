// ADSR envelope parameters
//
// Attack-Decay-Sustain-Release times shared by every track. Voices turn them
// into gain automation curves when they are built.

use serde::{Deserialize, Serialize};

/// ADSR Envelope parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdsrParams {
    /// Attack time in seconds
    pub attack: f32,
    /// Decay time in seconds
    pub decay: f32,
    /// Sustain level (0.0 to 1.0)
    pub sustain: f32,
    /// Release time in seconds
    pub release: f32,
}

impl AdsrParams {
    /// Create ADSR parameters with validation
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.clamp(0.001, 5.0),
            decay: decay.clamp(0.001, 5.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.clamp(0.001, 5.0),
        }
    }

    /// Attack + decay + release, the length of a one-shot note
    pub fn one_shot_length(&self) -> f32 {
        self.attack + self.decay + self.release
    }

    /// All fields finite and non-negative, sustain within 0..=1
    pub fn is_valid(&self) -> bool {
        let times = [self.attack, self.decay, self.release];
        times.iter().all(|t| t.is_finite() && *t >= 0.0)
            && self.sustain.is_finite()
            && (0.0..=1.0).contains(&self.sustain)
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack: 0.01, // 10ms attack
            decay: 0.1,   // 100ms decay
            sustain: 0.7, // 70% sustain level
            release: 0.2, // 200ms release
        }
    }
}

/// Partial ADSR update, every field optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AdsrPatch {
    #[serde(default)]
    pub attack: Option<f32>,
    #[serde(default)]
    pub decay: Option<f32>,
    #[serde(default)]
    pub sustain: Option<f32>,
    #[serde(default)]
    pub release: Option<f32>,
}

impl AdsrPatch {
    /// Overwrite the fields present in the patch
    pub fn apply(&self, params: &mut AdsrParams) {
        if let Some(attack) = self.attack {
            params.attack = attack;
        }
        if let Some(decay) = self.decay {
            params.decay = decay;
        }
        if let Some(sustain) = self.sustain {
            params.sustain = sustain;
        }
        if let Some(release) = self.release {
            params.release = release;
        }
    }
}
