// Note table - maps note names to frequencies
// Covers C1 to C5 in equal temperament, rounded to two decimals

/// Frequency used when a step carries a note name the table does not know
pub const DEFAULT_FREQUENCY: f32 = 65.0;

/// Note names in ascending pitch order (C1 .. C5)
pub const NOTE_NAMES: [&str; 49] = [
    "C1", "C#1", "D1", "D#1", "E1", "F1", "F#1", "G1", "G#1", "A1", "A#1", "B1", //
    "C2", "C#2", "D2", "D#2", "E2", "F2", "F#2", "G2", "G#2", "A2", "A#2", "B2", //
    "C3", "C#3", "D3", "D#3", "E3", "F3", "F#3", "G3", "G#3", "A3", "A#3", "B3", //
    "C4", "C#4", "D4", "D#4", "E4", "F4", "F#4", "G4", "G#4", "A4", "A#4", "B4", //
    "C5",
];

/// Frequencies matching [`NOTE_NAMES`] index for index
const NOTE_FREQUENCIES: [f32; 49] = [
    32.70, 34.65, 36.71, 38.89, 41.20, 43.65, 46.25, 49.00, 51.91, 55.00, 58.27, 61.74, //
    65.41, 69.30, 73.42, 77.78, 82.41, 87.31, 92.50, 98.00, 103.83, 110.00, 116.54, 123.47, //
    130.81, 138.59, 146.83, 155.56, 164.81, 174.61, 185.00, 196.00, 207.65, 220.00, 233.08,
    246.94, //
    261.63, 277.18, 293.66, 311.13, 329.63, 349.23, 369.99, 392.00, 415.30, 440.00, 466.16,
    493.88, //
    523.25,
];

/// Look up the frequency of a note name
pub fn note_frequency(name: &str) -> Option<f32> {
    NOTE_NAMES
        .iter()
        .position(|n| *n == name)
        .map(|index| NOTE_FREQUENCIES[index])
}

/// Frequency of a note name, or [`DEFAULT_FREQUENCY`] if the name is unknown
pub fn frequency_or_default(name: &str) -> f32 {
    note_frequency(name).unwrap_or(DEFAULT_FREQUENCY)
}

/// Check whether a note name is in the table
pub fn is_known_note(name: &str) -> bool {
    note_frequency(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_notes() {
        assert_eq!(note_frequency("A4"), Some(440.0));
        assert_eq!(note_frequency("C2"), Some(65.41));
        assert_eq!(note_frequency("F#4"), Some(369.99));
        assert_eq!(note_frequency("C5"), Some(523.25));
    }

    #[test]
    fn test_unknown_note_falls_back() {
        assert_eq!(note_frequency("H7"), None);
        assert_eq!(frequency_or_default("H7"), DEFAULT_FREQUENCY);
        assert_eq!(frequency_or_default(""), 65.0);
    }

    #[test]
    fn test_table_is_ascending() {
        for pair in NOTE_FREQUENCIES.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_octave_doubles() {
        let a1 = note_frequency("A1").unwrap();
        let a2 = note_frequency("A2").unwrap();
        assert!((a2 - 2.0 * a1).abs() < 0.01);
    }
}
