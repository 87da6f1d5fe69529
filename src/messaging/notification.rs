// User notices - status and error messages drained by the UI layer

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Sequencer,
    Pattern,
    Settings,
    Audio,
    Export,
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationCategory::Sequencer => "sequencer",
            NotificationCategory::Pattern => "pattern",
            NotificationCategory::Settings => "settings",
            NotificationCategory::Audio => "audio",
            NotificationCategory::Export => "export",
        };
        f.write_str(name)
    }
}

/// Notice with a creation timestamp
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    /// Unix time in milliseconds
    pub timestamp: u64,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl Notification {
    pub fn new(level: NotificationLevel, category: NotificationCategory, message: String) -> Self {
        Self {
            level,
            category,
            message,
            timestamp: now_millis(),
        }
    }

    pub fn info(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Info, category, message)
    }

    pub fn warning(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Warning, category, message)
    }

    pub fn error(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Error, category, message)
    }

    /// Younger than `max_age_ms`
    pub fn is_recent(&self, max_age_ms: u64) -> bool {
        now_millis().saturating_sub(self.timestamp) < max_age_ms
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_creation() {
        let notice = Notification::error(NotificationCategory::Settings, "Import failed".to_string());
        assert_eq!(notice.level, NotificationLevel::Error);
        assert_eq!(notice.category, NotificationCategory::Settings);
        assert_eq!(notice.message, "Import failed");
        assert!(notice.timestamp > 0);
        assert_eq!(notice.to_string(), "[settings] Import failed");
    }

    #[test]
    fn test_notification_helpers() {
        let info = Notification::info(NotificationCategory::Pattern, "Pattern A copied!".to_string());
        let warning = Notification::warning(NotificationCategory::Pattern, "Nothing to paste!".to_string());
        let error = Notification::error(NotificationCategory::Export, "Render failed".to_string());

        assert_eq!(info.level, NotificationLevel::Info);
        assert_eq!(warning.level, NotificationLevel::Warning);
        assert_eq!(error.level, NotificationLevel::Error);
    }

    #[test]
    fn test_notification_is_recent() {
        let notice = Notification::info(NotificationCategory::Sequencer, "Playing".to_string());
        assert!(notice.is_recent(10_000));
    }
}
