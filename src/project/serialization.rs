// Serialization utilities for the settings document

use std::path::Path;

use chrono::NaiveDate;

use crate::project::ProjectError;
use crate::project::document::SettingsDocument;
use crate::sequencer::pattern::Pattern;
use crate::settings::fx::FxSettings;
use crate::settings::registry::TrackSettingsRegistry;

/// Pretty JSON of the full current state
pub fn export_settings(
    bpm: f64,
    registry: &TrackSettingsRegistry,
    fx_settings: &FxSettings,
    patterns: &[Pattern; 4],
) -> Result<String, ProjectError> {
    let document = SettingsDocument::capture(bpm, registry, fx_settings, patterns);
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Parse and validate a document without touching any state
pub fn parse_settings(json: &str) -> Result<SettingsDocument, ProjectError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if !value.is_object() {
        return Err(ProjectError::InvalidStructure(
            "settings document must be a JSON object".to_string(),
        ));
    }
    let document: SettingsDocument = serde_json::from_value(value)?;
    document.validate()?;
    Ok(document)
}

pub fn save_settings(path: &Path, json: &str) -> Result<(), ProjectError> {
    std::fs::write(path, json)?;
    log::info!("Settings saved to {}", path.display());
    Ok(())
}

pub fn load_settings(path: &Path) -> Result<String, ProjectError> {
    Ok(std::fs::read_to_string(path)?)
}

/// `groovebox_settings_YYYY-MM-DD.json`
pub fn settings_file_name_for(date: NaiveDate) -> String {
    format!("groovebox_settings_{}.json", date.format("%Y-%m-%d"))
}

/// Suggested settings file name for today (local time)
pub fn settings_file_name() -> String {
    settings_file_name_for(chrono::Local::now().date_naive())
}
