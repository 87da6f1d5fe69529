// Pattern - step data for every track of one pattern slot
// Triggers, notes and parameter locks live in fixed 32-step lanes; the accent
// row is shared by all tracks.

use crate::sequencer::track::{TRACK_COUNT, TrackId};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Storage capacity of every step lane, independent of a track's active length
pub const MAX_STEPS: usize = 32;

/// Number of steps in the base bar (global counter modulus, morph range)
pub const BASE_STEPS: usize = 16;

/// Per-step parameter overrides
///
/// `None` inherits the base value; `Some(x)` multiplies it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StepLock {
    #[serde(default)]
    pub velocity: Option<f32>,
    #[serde(default)]
    pub decay: Option<f32>,
    #[serde(default)]
    pub filter: Option<f32>,
}

impl StepLock {
    /// Velocity multiplier, 1.0 when unlocked
    pub fn velocity_or_unity(&self) -> f32 {
        self.velocity.unwrap_or(1.0)
    }

    /// Decay multiplier, 1.0 when unlocked
    pub fn decay_or_unity(&self) -> f32 {
        self.decay.unwrap_or(1.0)
    }

    /// Filter cutoff modifier, 1.0 when unlocked
    pub fn filter_or_unity(&self) -> f32 {
        self.filter.unwrap_or(1.0)
    }

    /// Check that no field is locked
    pub fn is_empty(&self) -> bool {
        self.velocity.is_none() && self.decay.is_none() && self.filter.is_none()
    }

    fn set(&mut self, param: LockParam, value: Option<f32>) {
        match param {
            LockParam::Velocity => self.velocity = value,
            LockParam::Decay => self.decay = value,
            LockParam::Filter => self.filter = value,
        }
    }
}

/// Lockable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockParam {
    Velocity,
    Decay,
    Filter,
}

impl FromStr for LockParam {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "velocity" => Ok(LockParam::Velocity),
            "decay" => Ok(LockParam::Decay),
            "filter" => Ok(LockParam::Filter),
            other => Err(format!("Unknown lock parameter: {}", other)),
        }
    }
}

/// Pattern slot name
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PatternSlot {
    #[default]
    A,
    B,
    C,
    D,
}

impl PatternSlot {
    pub const ALL: [PatternSlot; 4] = [PatternSlot::A, PatternSlot::B, PatternSlot::C, PatternSlot::D];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternSlot::A => "A",
            PatternSlot::B => "B",
            PatternSlot::C => "C",
            PatternSlot::D => "D",
        }
    }
}

impl fmt::Display for PatternSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatternSlot::ALL
            .iter()
            .copied()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| format!("Unknown pattern slot: {}", s))
    }
}

/// Step data of one track inside a pattern
#[derive(Debug, Clone, PartialEq)]
pub struct TrackLane {
    pub triggers: [bool; MAX_STEPS],
    pub notes: Vec<String>,
    pub locks: [StepLock; MAX_STEPS],
}

impl TrackLane {
    fn filled(note: &str) -> Self {
        Self {
            triggers: [false; MAX_STEPS],
            notes: vec![note.to_string(); MAX_STEPS],
            locks: [StepLock::default(); MAX_STEPS],
        }
    }

    /// Note name at `step`, or `None` past the lane capacity
    pub fn note(&self, step: usize) -> Option<&str> {
        self.notes.get(step).map(String::as_str)
    }

    /// Number of active triggers in the first `length` steps
    pub fn active_steps(&self, length: usize) -> usize {
        self.triggers.iter().take(length).filter(|t| **t).count()
    }
}

/// A complete pattern: ten track lanes plus the shared accent row
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub accent: [bool; MAX_STEPS],
    lanes: [TrackLane; TRACK_COUNT],
}

impl Pattern {
    /// Empty pattern with creation note defaults (`fx1` gets `A4`)
    pub fn create_empty() -> Self {
        Self {
            accent: [false; MAX_STEPS],
            lanes: std::array::from_fn(|i| TrackLane::filled(TrackId::ALL[i].default_note())),
        }
    }

    /// Reset every trigger, accent and lock, and write the clear note defaults
    pub fn clear(&mut self) {
        self.accent = [false; MAX_STEPS];
        for track in TrackId::ALL {
            self.lanes[track.index()] = TrackLane::filled(track.cleared_note());
        }
    }

    pub fn lane(&self, track: TrackId) -> &TrackLane {
        &self.lanes[track.index()]
    }

    pub fn lane_mut(&mut self, track: TrackId) -> &mut TrackLane {
        &mut self.lanes[track.index()]
    }

    /// Trigger flag; steps past the capacity are never active
    pub fn trigger(&self, track: TrackId, step: usize) -> bool {
        self.lane(track).triggers.get(step).copied().unwrap_or(false)
    }

    /// Lock record at a step; out of range reads as fully unlocked
    pub fn lock(&self, track: TrackId, step: usize) -> StepLock {
        self.lane(track).locks.get(step).copied().unwrap_or_default()
    }

    /// Shared accent flag for an absolute step
    pub fn accent(&self, step: usize) -> bool {
        self.accent.get(step).copied().unwrap_or(false)
    }

    /// Set or clear one lock field. Returns false (and changes nothing)
    /// when the step is outside the lane.
    pub fn set_param_lock(
        &mut self,
        track: TrackId,
        step: usize,
        param: LockParam,
        value: Option<f32>,
    ) -> bool {
        match self.lane_mut(track).locks.get_mut(step) {
            Some(lock) => {
                lock.set(param, value);
                true
            }
            None => false,
        }
    }

    /// Flip a trigger, returning the new state
    pub fn toggle_step(&mut self, track: TrackId, step: usize) -> Option<bool> {
        let slot = self.lane_mut(track).triggers.get_mut(step)?;
        *slot = !*slot;
        Some(*slot)
    }

    pub fn set_step_note(&mut self, track: TrackId, step: usize, note: &str) -> bool {
        match self.lane_mut(track).notes.get_mut(step) {
            Some(slot) => {
                *slot = note.to_string();
                true
            }
            None => false,
        }
    }

    pub fn toggle_accent(&mut self, step: usize) -> Option<bool> {
        let slot = self.accent.get_mut(step)?;
        *slot = !*slot;
        Some(*slot)
    }

    /// Combine two patterns over the base bar.
    ///
    /// A step triggers if it triggers in either source. The note comes from
    /// `a` whenever `a` triggers on that step, otherwise from `b`. Steps 16..32,
    /// accents and locks keep the empty-pattern defaults.
    pub fn morph(a: &Pattern, b: &Pattern) -> Pattern {
        let mut result = Pattern::create_empty();
        for track in TrackId::ALL {
            let (lane_a, lane_b) = (a.lane(track), b.lane(track));
            let out = result.lane_mut(track);
            for step in 0..BASE_STEPS {
                out.triggers[step] = lane_a.triggers[step] || lane_b.triggers[step];
                out.notes[step] = if lane_a.triggers[step] {
                    lane_a.notes[step].clone()
                } else {
                    lane_b.notes[step].clone()
                };
            }
        }
        result
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::create_empty()
    }
}

// Wire format: a flat map keyed `accent`, `<track>`, `<track>Notes`, `<track>Locks`.

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + TRACK_COUNT * 3))?;
        map.serialize_entry("accent", &self.accent[..])?;
        for track in TrackId::ALL {
            let lane = self.lane(track);
            map.serialize_entry(track.as_str(), &lane.triggers[..])?;
            map.serialize_entry(&format!("{}Notes", track), &lane.notes)?;
            map.serialize_entry(&format!("{}Locks", track), &lane.locks[..])?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut raw: BTreeMap<String, serde_json::Value> = BTreeMap::deserialize(deserializer)?;
        let mut pattern = Pattern::create_empty();

        if let Some(value) = raw.remove("accent") {
            fill_steps(&mut pattern.accent, take_array::<bool, D::Error>(value, "accent")?);
        }

        for track in TrackId::ALL {
            let lane = pattern.lane_mut(track);
            if let Some(value) = raw.remove(track.as_str()) {
                fill_steps(&mut lane.triggers, take_array::<bool, D::Error>(value, track.as_str())?);
            }

            let notes_key = format!("{}Notes", track);
            if let Some(value) = raw.remove(&notes_key) {
                let notes = take_array::<String, D::Error>(value, &notes_key)?;
                for (slot, note) in lane.notes.iter_mut().zip(notes) {
                    if let Some(note) = note {
                        *slot = note;
                    }
                }
            }

            let locks_key = format!("{}Locks", track);
            if let Some(value) = raw.remove(&locks_key) {
                fill_steps(&mut lane.locks, take_array::<StepLock, D::Error>(value, &locks_key)?);
            }
        }

        Ok(pattern)
    }
}

/// Decode a JSON array whose entries may be null
fn take_array<T, E>(value: serde_json::Value, key: &str) -> Result<Vec<Option<T>>, E>
where
    T: for<'a> Deserialize<'a>,
    E: de::Error,
{
    serde_json::from_value(value).map_err(|e| E::custom(format!("pattern field `{}`: {}", key, e)))
}

/// Copy decoded entries into a fixed lane; extra entries are dropped, missing
/// or null ones keep the lane default
fn fill_steps<T: Copy>(lane: &mut [T; MAX_STEPS], values: Vec<Option<T>>) {
    for (slot, value) in lane.iter_mut().zip(values) {
        if let Some(value) = value {
            *slot = value;
        }
    }
}
