// Beat generator - deterministic groove from a seed

use crate::sequencer::note::NOTE_NAMES;
use crate::sequencer::pattern::{BASE_STEPS, MAX_STEPS, Pattern};
use crate::sequencer::track::TrackId;

/// Seed used when none is given
pub const DEFAULT_SEED: i64 = 303;

/// Sine-hash pseudo random value in [0, 1)
pub fn seeded_random(seed: i64) -> f64 {
    let x = (seed as f64).sin() * 10000.0;
    x - x.floor()
}

struct SeededSequence {
    next: i64,
}

impl SeededSequence {
    fn next(&mut self) -> f64 {
        let value = seeded_random(self.next);
        self.next = self.next.wrapping_add(1);
        value
    }

    /// Note name at `offset + floor(r * span)`
    fn note(&mut self, offset: usize, span: usize) -> &'static str {
        let index = offset + (self.next() * span as f64).floor() as usize;
        NOTE_NAMES[index.min(NOTE_NAMES.len() - 1)]
    }
}

/// Overwrite `pattern` with a generated groove.
///
/// Clears every trigger and accent, sets every note to `C2` and leaves the
/// parameter locks alone. Then writes kick1 (quarters plus random hits),
/// snare1 (steps 4 and 12), random hat1 hits and bass1 with random notes and
/// accents.
pub fn generate_beat(pattern: &mut Pattern, seed: i64) {
    pattern.accent = [false; MAX_STEPS];
    for track in TrackId::ALL {
        let lane = pattern.lane_mut(track);
        lane.triggers = [false; MAX_STEPS];
        lane.notes.iter_mut().for_each(|n| *n = "C2".to_string());
    }

    let mut rng = SeededSequence { next: seed };

    for i in 0..BASE_STEPS {
        if i % 4 == 0 || rng.next() > 0.85 {
            let note = rng.note(12, 12);
            let lane = pattern.lane_mut(TrackId::Kick1);
            lane.triggers[i] = true;
            lane.notes[i] = note.to_string();
        }
    }

    for i in [4, 12] {
        let note = rng.note(24, 12);
        let lane = pattern.lane_mut(TrackId::Snare1);
        lane.triggers[i] = true;
        lane.notes[i] = note.to_string();
    }

    for i in 0..BASE_STEPS {
        if rng.next() > 0.3 {
            let note = rng.note(36, 12);
            let lane = pattern.lane_mut(TrackId::Hat1);
            lane.triggers[i] = true;
            lane.notes[i] = note.to_string();
        }
    }

    for i in 0..BASE_STEPS {
        if i % 4 == 0 || rng.next() > 0.65 {
            let note = rng.note(0, 24);
            let lane = pattern.lane_mut(TrackId::Bass1);
            lane.triggers[i] = true;
            lane.notes[i] = note.to_string();
            if rng.next() > 0.7 {
                pattern.accent[i] = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::pattern::LockParam;

    #[test]
    fn test_seeded_random_range() {
        for seed in -50..50 {
            let r = seeded_random(seed);
            assert!((0.0..1.0).contains(&r));
        }
        assert_eq!(seeded_random(0), 0.0);
    }

    #[test]
    fn test_same_seed_same_beat() {
        let mut a = Pattern::create_empty();
        let mut b = Pattern::create_empty();
        generate_beat(&mut a, 1234);
        generate_beat(&mut b, 1234);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fixed_hits() {
        let mut pattern = Pattern::create_empty();
        generate_beat(&mut pattern, DEFAULT_SEED);
        for i in (0..16).step_by(4) {
            assert!(pattern.trigger(TrackId::Kick1, i));
            assert!(pattern.trigger(TrackId::Bass1, i));
        }
        assert!(pattern.trigger(TrackId::Snare1, 4));
        assert!(pattern.trigger(TrackId::Snare1, 12));
        assert_eq!(pattern.lane(TrackId::Snare1).active_steps(32), 2);
        assert!(!pattern.trigger(TrackId::Kick2, 0));
        assert_eq!(pattern.lane(TrackId::Fx1).notes[0], "C2");
    }

    #[test]
    fn test_notes_come_from_family_octaves() {
        let mut pattern = Pattern::create_empty();
        generate_beat(&mut pattern, 77);
        let kick = pattern.lane(TrackId::Kick1);
        for i in 0..16 {
            if kick.triggers[i] {
                assert!(kick.notes[i].ends_with('2'), "kick note {}", kick.notes[i]);
            }
        }
        let snare = pattern.lane(TrackId::Snare1);
        assert!(snare.notes[4].ends_with('3'));
        let hat = pattern.lane(TrackId::Hat1);
        for i in 0..16 {
            if hat.triggers[i] {
                assert!(hat.notes[i].ends_with('4'));
            }
        }
    }

    #[test]
    fn test_locks_survive() {
        let mut pattern = Pattern::create_empty();
        pattern.set_param_lock(TrackId::Hat1, 3, LockParam::Velocity, Some(0.4));
        pattern.toggle_step(TrackId::Fx2, 9);
        generate_beat(&mut pattern, 9);
        assert_eq!(pattern.lock(TrackId::Hat1, 3).velocity, Some(0.4));
        assert!(!pattern.trigger(TrackId::Fx2, 9));
    }

    #[test]
    fn test_extreme_seeds() {
        let mut pattern = Pattern::create_empty();
        generate_beat(&mut pattern, i64::MAX);
        assert!(pattern.trigger(TrackId::Kick1, 0));
        generate_beat(&mut pattern, i64::MIN);
        assert!(pattern.trigger(TrackId::Snare1, 4));
    }
}
