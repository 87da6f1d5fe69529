// Track settings registry
// Base parameters and active step length of every track, plus the settings clipboard

use crate::clipboard::{Clipboard, ClipboardError};
use crate::sequencer::pattern::MAX_STEPS;
use crate::sequencer::track::{TRACK_COUNT, TrackId};
use crate::settings::track::TrackSettings;

/// Length every track starts with
pub const DEFAULT_TRACK_LENGTH: usize = 16;

#[derive(Debug, Clone)]
pub struct TrackSettingsRegistry {
    settings: [TrackSettings; TRACK_COUNT],
    lengths: [usize; TRACK_COUNT],
    clipboard: Clipboard<TrackSettings>,
}

impl Default for TrackSettingsRegistry {
    fn default() -> Self {
        Self {
            settings: std::array::from_fn(|i| TrackSettings::default_for(TrackId::ALL[i])),
            lengths: [DEFAULT_TRACK_LENGTH; TRACK_COUNT],
            clipboard: Clipboard::new(),
        }
    }
}

impl TrackSettingsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, track: TrackId) -> &TrackSettings {
        &self.settings[track.index()]
    }

    pub fn get_mut(&mut self, track: TrackId) -> &mut TrackSettings {
        &mut self.settings[track.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrackId, &TrackSettings)> {
        TrackId::ALL.into_iter().zip(self.settings.iter())
    }

    /// `!mute && (no track is solo || track.solo)`
    pub fn audible(&self, track: TrackId) -> bool {
        let settings = self.get(track);
        if settings.mute {
            return false;
        }
        let any_solo = self.settings.iter().any(|s| s.solo);
        !any_solo || settings.solo
    }

    pub fn set_mute(&mut self, track: TrackId, mute: bool) {
        self.get_mut(track).mute = mute;
    }

    pub fn set_solo(&mut self, track: TrackId, solo: bool) {
        self.get_mut(track).solo = solo;
    }

    /// Active step length (1..=32)
    pub fn track_length(&self, track: TrackId) -> usize {
        self.lengths[track.index()]
    }

    /// Set a track's active length, clamped to 1..=32. Returns the stored value.
    pub fn set_track_length(&mut self, track: TrackId, length: i64) -> usize {
        let clamped = length.clamp(1, MAX_STEPS as i64) as usize;
        self.lengths[track.index()] = clamped;
        clamped
    }

    pub fn lengths(&self) -> impl Iterator<Item = (TrackId, usize)> + '_ {
        TrackId::ALL.into_iter().zip(self.lengths.iter().copied())
    }

    pub fn copy_track_settings(&mut self, track: TrackId) {
        let settings = self.get(track).clone();
        self.clipboard.copy(settings);
    }

    /// Paste the copied settings onto `track`, keeping its mute/solo flags
    pub fn paste_track_settings(&mut self, track: TrackId) -> Result<(), ClipboardError> {
        let copied = self.clipboard.paste()?;
        self.get_mut(track).assign_keeping_flags(&copied);
        Ok(())
    }

    /// Restore factory settings, keeping mute/solo
    pub fn reset_track_settings(&mut self, track: TrackId) {
        let defaults = TrackSettings::default_for(track);
        self.get_mut(track).assign_keeping_flags(&defaults);
    }

    /// Replace the settings and lengths of every track
    pub(crate) fn replace_all(
        &mut self,
        settings: [TrackSettings; TRACK_COUNT],
        lengths: [usize; TRACK_COUNT],
    ) {
        self.settings = settings;
        self.lengths = lengths;
    }

    pub(crate) fn settings_array(&self) -> &[TrackSettings; TRACK_COUNT] {
        &self.settings
    }

    pub(crate) fn lengths_array(&self) -> [usize; TRACK_COUNT] {
        self.lengths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audible_without_flags() {
        let registry = TrackSettingsRegistry::new();
        assert!(TrackId::ALL.iter().all(|t| registry.audible(*t)));
    }

    #[test]
    fn test_solo_overrides_others() {
        let mut registry = TrackSettingsRegistry::new();
        registry.set_solo(TrackId::Snare1, true);
        registry.set_mute(TrackId::Hat1, true);
        for track in TrackId::ALL {
            assert_eq!(registry.audible(track), track == TrackId::Snare1);
        }
    }

    #[test]
    fn test_mute_beats_solo() {
        let mut registry = TrackSettingsRegistry::new();
        registry.set_solo(TrackId::Bass1, true);
        registry.set_mute(TrackId::Bass1, true);
        assert!(!registry.audible(TrackId::Bass1));
        assert!(!registry.audible(TrackId::Kick1));
    }

    #[test]
    fn test_track_length_is_clamped() {
        let mut registry = TrackSettingsRegistry::new();
        assert_eq!(registry.track_length(TrackId::Fx1), 16);
        assert_eq!(registry.set_track_length(TrackId::Fx1, 0), 1);
        assert_eq!(registry.set_track_length(TrackId::Fx1, 99), 32);
        assert_eq!(registry.set_track_length(TrackId::Fx1, 7), 7);
        assert_eq!(registry.track_length(TrackId::Fx1), 7);
    }

    #[test]
    fn test_paste_settings_keeps_destination_flags() {
        let mut registry = TrackSettingsRegistry::new();
        assert_eq!(registry.paste_track_settings(TrackId::Kick2), Err(ClipboardError::Empty));

        registry.get_mut(TrackId::Kick1).level = 1.2;
        registry.set_solo(TrackId::Kick1, true);
        registry.copy_track_settings(TrackId::Kick1);
        registry.set_mute(TrackId::Kick2, true);

        registry.paste_track_settings(TrackId::Kick2).unwrap();
        let kick2 = registry.get(TrackId::Kick2);
        assert_eq!(kick2.level, 1.2);
        assert!(kick2.mute);
        assert!(!kick2.solo);
    }

    #[test]
    fn test_reset_keeps_flags() {
        let mut registry = TrackSettingsRegistry::new();
        registry.get_mut(TrackId::Hat2).level = 0.1;
        registry.set_mute(TrackId::Hat2, true);
        registry.reset_track_settings(TrackId::Hat2);
        let hat2 = registry.get(TrackId::Hat2);
        assert_eq!(hat2.level, 0.6);
        assert!(hat2.mute);
    }
}
