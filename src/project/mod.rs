// Project persistence
// The settings document: export, validated partial import, file helpers

pub mod document;
pub mod serialization;

pub use document::{DOCUMENT_VERSION, SettingsDocument, StagedImport};
pub use serialization::{
    export_settings, load_settings, parse_settings, save_settings, settings_file_name,
    settings_file_name_for,
};

/// Project error types
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid settings structure: {0}")]
    InvalidStructure(String),

    #[error("Settings validation failed: {0}")]
    ValidationFailed(String),
}
