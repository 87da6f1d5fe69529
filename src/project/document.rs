// Settings document
//
// Every top-level field is optional on import. A document is first staged
// against the current state (merged and validated as a whole) and only then
// committed, so a bad document never leaves anything half applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::project::ProjectError;
use crate::sequencer::pattern::{MAX_STEPS, Pattern, PatternSlot};
use crate::sequencer::timeline::{MAX_BPM, MIN_BPM};
use crate::sequencer::track::{TRACK_COUNT, TrackId};
use crate::settings::fx::{FxSettings, FxSettingsPatch};
use crate::settings::registry::TrackSettingsRegistry;
use crate::settings::track::{LEVEL_RANGE, PAN_RANGE, TrackSettings, TrackSettingsPatch};

/// Version written by `export_settings`
pub const DOCUMENT_VERSION: &str = "5.0";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    /// Keyed by track id; unknown ids are skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_settings: Option<BTreeMap<String, TrackSettingsPatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_lengths: Option<BTreeMap<String, i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx_settings: Option<FxSettingsPatch>,
    /// Keyed by slot letter; unknown slots are skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<BTreeMap<String, Pattern>>,
}

/// Merged result of a document, ready to be committed
#[derive(Debug, Clone)]
pub struct StagedImport {
    pub bpm: Option<f64>,
    pub settings: [TrackSettings; TRACK_COUNT],
    pub lengths: [usize; TRACK_COUNT],
    pub fx_settings: Option<FxSettings>,
    pub patterns: Vec<(PatternSlot, Pattern)>,
}

impl SettingsDocument {
    /// Snapshot of the full current state
    pub fn capture(
        bpm: f64,
        registry: &TrackSettingsRegistry,
        fx_settings: &FxSettings,
        patterns: &[Pattern; 4],
    ) -> Self {
        Self {
            version: Some(DOCUMENT_VERSION.to_string()),
            bpm: Some(bpm),
            track_settings: Some(
                registry
                    .iter()
                    .map(|(track, settings)| (track.to_string(), TrackSettingsPatch::from(settings)))
                    .collect(),
            ),
            track_lengths: Some(
                registry
                    .lengths()
                    .map(|(track, length)| (track.to_string(), length as i64))
                    .collect(),
            ),
            fx_settings: Some(FxSettingsPatch::from(fx_settings)),
            patterns: Some(
                PatternSlot::ALL
                    .iter()
                    .map(|slot| (slot.to_string(), patterns[slot.index()].clone()))
                    .collect(),
            ),
        }
    }

    /// Range checks on the fields that do not depend on current state
    pub fn validate(&self) -> Result<(), ProjectError> {
        if let Some(bpm) = self.bpm
            && (!bpm.is_finite() || !(MIN_BPM..=MAX_BPM).contains(&bpm))
        {
            return Err(ProjectError::ValidationFailed(format!(
                "bpm {} outside {}..={}",
                bpm, MIN_BPM, MAX_BPM
            )));
        }

        for (key, length) in self.track_lengths.iter().flatten() {
            if !(1..=MAX_STEPS as i64).contains(length) {
                return Err(ProjectError::ValidationFailed(format!(
                    "track length {} of {} outside 1..={}",
                    length, key, MAX_STEPS
                )));
            }
        }

        for (key, patch) in self.track_settings.iter().flatten() {
            if let Some(level) = patch.level
                && (!level.is_finite() || !LEVEL_RANGE.contains(&level))
            {
                return Err(ProjectError::ValidationFailed(format!(
                    "{}: level {} outside 0..=1.5",
                    key, level
                )));
            }
            if let Some(pan) = patch.pan
                && (!pan.is_finite() || !PAN_RANGE.contains(&pan))
            {
                return Err(ProjectError::ValidationFailed(format!(
                    "{}: pan {} outside -1..=1",
                    key, pan
                )));
            }
        }

        Ok(())
    }

    /// Merge the present fields over `registry` and validate the result
    pub fn stage(
        &self,
        registry: &TrackSettingsRegistry,
        fx_settings: &FxSettings,
    ) -> Result<StagedImport, ProjectError> {
        self.validate()?;

        let mut settings = registry.settings_array().clone();
        for (key, patch) in self.track_settings.iter().flatten() {
            let Some(track) = parse_key::<TrackId>(key, "track") else {
                continue;
            };
            let merged = &mut settings[track.index()];
            patch.apply(merged);
            merged
                .validate()
                .map_err(|e| ProjectError::ValidationFailed(format!("{}: {}", track, e)))?;
        }

        let mut lengths = registry.lengths_array();
        for (key, length) in self.track_lengths.iter().flatten() {
            if let Some(track) = parse_key::<TrackId>(key, "track") {
                lengths[track.index()] = *length as usize;
            }
        }

        let fx_settings = match &self.fx_settings {
            Some(patch) => {
                let mut merged = fx_settings.clone();
                patch.apply(&mut merged);
                merged.validate().map_err(ProjectError::ValidationFailed)?;
                Some(merged)
            }
            None => None,
        };

        let patterns = self
            .patterns
            .iter()
            .flatten()
            .filter_map(|(key, pattern)| {
                parse_key::<PatternSlot>(key, "pattern slot").map(|slot| (slot, pattern.clone()))
            })
            .collect();

        Ok(StagedImport {
            bpm: self.bpm,
            settings,
            lengths,
            fx_settings,
            patterns,
        })
    }
}

fn parse_key<T: std::str::FromStr>(key: &str, what: &str) -> Option<T> {
    let parsed = key.parse().ok();
    if parsed.is_none() {
        log::warn!("Skipping unknown {} `{}` in settings document", what, key);
    }
    parsed
}
