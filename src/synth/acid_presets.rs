// Acid presets - classic 16-step basslines for the acid engine

use super::oscillator::WaveformType;
use super::voices::AcidSettings;
use crate::sequencer::pattern::{BASE_STEPS, Pattern};
use crate::sequencer::track::TrackId;

/// A bassline plus the engine settings it was voiced with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcidPreset {
    pub name: &'static str,
    pub notes: [&'static str; BASE_STEPS],
    pub accents: [u8; BASE_STEPS],
    pub slides: [u8; BASE_STEPS],
    pub cutoff: f32,
    pub resonance: f32,
    pub env_mod: f32,
    pub decay: f32,
    pub waveform: WaveformType,
    pub lfo_rate: f32,
    pub lfo_depth: f32,
}

pub const ACID_PRESETS: [AcidPreset; 4] = [
    AcidPreset {
        name: "Emmanuel Top - Tone",
        notes: [
            "A1", "A1", "A2", "A1", "E2", "A1", "A2", "G2", "A1", "A1", "C2", "A1", "E2", "A1", "D2", "A1",
        ],
        accents: [1, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0, 0, 1, 0, 1, 0],
        slides: [0, 0, 1, 0, 0, 0, 1, 1, 0, 0, 1, 0, 0, 0, 1, 0],
        cutoff: 350.0,
        resonance: 15.0,
        env_mod: 70.0,
        decay: 0.25,
        waveform: WaveformType::Saw,
        lfo_rate: 0.25,
        lfo_depth: 800.0,
    },
    AcidPreset {
        name: "Classic Acid",
        notes: [
            "C2", "C2", "C3", "C2", "D#2", "C2", "F2", "C2", "C2", "G2", "C3", "C2", "D#2", "F2", "G2", "C2",
        ],
        accents: [1, 0, 1, 0, 1, 0, 0, 0, 1, 0, 1, 0, 1, 0, 1, 0],
        slides: [0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0],
        cutoff: 400.0,
        resonance: 18.0,
        env_mod: 80.0,
        decay: 0.2,
        waveform: WaveformType::Saw,
        lfo_rate: 0.0,
        lfo_depth: 0.0,
    },
    AcidPreset {
        name: "Hardfloor Style",
        notes: [
            "A1", "A1", "A1", "A2", "A1", "C2", "A1", "D2", "A1", "A1", "E2", "A1", "A1", "F2", "E2", "D2",
        ],
        accents: [1, 0, 0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 0, 1, 1, 1],
        slides: [0, 0, 0, 1, 0, 1, 0, 1, 0, 0, 1, 0, 0, 1, 1, 1],
        cutoff: 300.0,
        resonance: 20.0,
        env_mod: 90.0,
        decay: 0.15,
        waveform: WaveformType::Square,
        lfo_rate: 0.0,
        lfo_depth: 0.0,
    },
    AcidPreset {
        name: "Wobble Bass",
        notes: [
            "E1", "E1", "E1", "E1", "E1", "E1", "E1", "E1", "G1", "G1", "G1", "G1", "A1", "A1", "B1", "B1",
        ],
        accents: [1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1, 0],
        slides: [0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1, 0],
        cutoff: 200.0,
        resonance: 12.0,
        env_mod: 40.0,
        decay: 0.4,
        waveform: WaveformType::Saw,
        lfo_rate: 4.0,
        lfo_depth: 2000.0,
    },
];

impl AcidPreset {
    pub fn find(name: &str) -> Option<&'static AcidPreset> {
        ACID_PRESETS.iter().find(|preset| preset.name == name)
    }

    /// Overwrite the engine parameters and the first 16 accent and slide
    /// flags. The LFO is enabled only when the preset gives it depth.
    pub fn apply_settings(&self, acid: &mut AcidSettings) {
        acid.cutoff = self.cutoff;
        acid.resonance = self.resonance;
        acid.env_mod = self.env_mod;
        acid.decay = self.decay;
        acid.waveform = self.waveform;
        acid.lfo.rate = self.lfo_rate;
        acid.lfo.depth = self.lfo_depth;
        acid.lfo.enabled = self.lfo_depth > 0.0;
        for step in 0..BASE_STEPS {
            acid.accent_steps[step] = self.accents[step] == 1;
            acid.slide_steps[step] = self.slides[step] == 1;
        }
    }

    /// Write the bassline onto the acid track: every one of the first 16
    /// steps triggers, with the preset's note
    pub fn write_bassline(&self, pattern: &mut Pattern, track: TrackId) {
        let lane = pattern.lane_mut(track);
        for (step, note) in self.notes.iter().enumerate() {
            lane.triggers[step] = true;
            lane.notes[step] = note.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::note::note_frequency;

    #[test]
    fn test_presets_use_known_notes() {
        for preset in &ACID_PRESETS {
            for note in preset.notes {
                assert!(note_frequency(note).is_some(), "{}: {}", preset.name, note);
            }
        }
    }

    #[test]
    fn test_apply_settings() {
        let mut acid = AcidSettings::default();
        acid.accent_steps[20] = true;
        let preset = AcidPreset::find("Classic Acid").unwrap();
        preset.apply_settings(&mut acid);
        assert_eq!(acid.cutoff, 400.0);
        assert_eq!(acid.resonance, 18.0);
        assert!(!acid.lfo.enabled);
        assert!(acid.accent_steps[0] && !acid.accent_steps[1]);
        assert!(acid.slide_steps[2]);
        // Steps past the preset are left alone
        assert!(acid.accent_steps[20]);
    }

    #[test]
    fn test_write_bassline() {
        let mut pattern = Pattern::create_empty();
        AcidPreset::find("Wobble Bass")
            .unwrap()
            .write_bassline(&mut pattern, TrackId::Bass1);
        assert!((0..16).all(|step| pattern.trigger(TrackId::Bass1, step)));
        assert!(!pattern.trigger(TrackId::Bass1, 16));
        assert_eq!(pattern.lane(TrackId::Bass1).note(8), Some("G1"));
    }

    #[test]
    fn test_unknown_preset() {
        assert!(AcidPreset::find("Nope").is_none());
    }
}
