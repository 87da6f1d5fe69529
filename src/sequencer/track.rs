// Track identifiers and voice families
// The machine has a fixed, ordered set of ten tracks grouped in five families

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of tracks in the machine
pub const TRACK_COUNT: usize = 10;

/// Voice family, derived from the track id prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceFamily {
    Kick,
    Snare,
    Hat,
    Bass,
    Fx,
}

impl VoiceFamily {
    /// Base decay used when a drum track has no explicit decay field.
    /// Bass and FX voices read their decay from the ADSR instead.
    pub fn uses_decay_fallback(&self) -> bool {
        matches!(self, VoiceFamily::Kick | VoiceFamily::Snare | VoiceFamily::Hat)
    }
}

impl fmt::Display for VoiceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VoiceFamily::Kick => "kick",
            VoiceFamily::Snare => "snare",
            VoiceFamily::Hat => "hat",
            VoiceFamily::Bass => "bass",
            VoiceFamily::Fx => "fx",
        };
        write!(f, "{}", name)
    }
}

/// Track identifier
///
/// Serialized as the lowercase id used by the settings document (`kick1`, `fx2`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackId {
    Kick1,
    Kick2,
    Snare1,
    Snare2,
    Hat1,
    Hat2,
    Bass1,
    Bass2,
    Fx1,
    Fx2,
}

impl TrackId {
    /// All tracks, in the order the sequencer processes them on every tick
    pub const ALL: [TrackId; TRACK_COUNT] = [
        TrackId::Kick1,
        TrackId::Kick2,
        TrackId::Snare1,
        TrackId::Snare2,
        TrackId::Hat1,
        TrackId::Hat2,
        TrackId::Bass1,
        TrackId::Bass2,
        TrackId::Fx1,
        TrackId::Fx2,
    ];

    /// Position of this track in [`TrackId::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Lowercase id as used in the settings document
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackId::Kick1 => "kick1",
            TrackId::Kick2 => "kick2",
            TrackId::Snare1 => "snare1",
            TrackId::Snare2 => "snare2",
            TrackId::Hat1 => "hat1",
            TrackId::Hat2 => "hat2",
            TrackId::Bass1 => "bass1",
            TrackId::Bass2 => "bass2",
            TrackId::Fx1 => "fx1",
            TrackId::Fx2 => "fx2",
        }
    }

    /// Family this track belongs to (its id prefix)
    pub fn family(&self) -> VoiceFamily {
        match self {
            TrackId::Kick1 | TrackId::Kick2 => VoiceFamily::Kick,
            TrackId::Snare1 | TrackId::Snare2 => VoiceFamily::Snare,
            TrackId::Hat1 | TrackId::Hat2 => VoiceFamily::Hat,
            TrackId::Bass1 | TrackId::Bass2 => VoiceFamily::Bass,
            TrackId::Fx1 | TrackId::Fx2 => VoiceFamily::Fx,
        }
    }

    /// Note assigned to every step of a freshly created pattern.
    ///
    /// `fx1` has its own entry here; every other unlisted track falls to `C3`.
    pub fn default_note(&self) -> &'static str {
        match self {
            TrackId::Fx1 => "A4",
            _ => self.cleared_note(),
        }
    }

    /// Note written back by a pattern clear.
    ///
    /// Only the four drum/bass prefixes are recognised, so both FX tracks get `C3`.
    pub fn cleared_note(&self) -> &'static str {
        match self.family() {
            VoiceFamily::Kick => "C2",
            VoiceFamily::Snare => "D3",
            VoiceFamily::Hat => "F#4",
            VoiceFamily::Bass => "A1",
            VoiceFamily::Fx => "C3",
        }
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown track id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown track id: {0}")]
pub struct UnknownTrack(pub String);

impl FromStr for TrackId {
    type Err = UnknownTrack;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackId::ALL
            .iter()
            .copied()
            .find(|track| track.as_str() == s)
            .ok_or_else(|| UnknownTrack(s.to_string()))
    }
}
