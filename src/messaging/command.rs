// Commands - control thread → audio callback

use crate::synth::mixer::MasterFilter;
use crate::synth::voice::Voice;

pub enum Command {
    /// Play a fully built voice at its start time
    Schedule(Box<Voice>),
    /// New master gain target (smoothed in the callback)
    SetMasterGain(f32),
    /// Retune the master lowpass
    SetMasterFilter(MasterFilter),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Schedule(voice) => write!(f, "Schedule(at {:.3}s)", voice.start_time()),
            Command::SetMasterGain(gain) => write!(f, "SetMasterGain({})", gain),
            Command::SetMasterFilter(filter) => write!(
                f,
                "SetMasterFilter({} Hz, Q {})",
                filter.cutoff, filter.resonance
            ),
        }
    }
}
