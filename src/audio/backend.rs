// Tone backend - where built voices go to be heard
//
// The live engine and the offline renderer implement the same trait, so the
// dispatch path is identical for both.

use crate::audio::AudioError;
use crate::synth::mixer::MasterFilter;
use crate::synth::voice::Voice;

pub trait ToneBackend {
    /// Current time on the backend's audio clock, in seconds
    fn current_time(&self) -> f64;

    fn sample_rate(&self) -> f32;

    /// Accept a voice; it starts at `voice.start_time()` and releases itself
    /// once its tail completes
    fn create_voice(&mut self, voice: Voice);

    /// Output gain applied after the master filter
    fn set_master_gain(&mut self, gain: f32);

    fn set_master_filter(&mut self, filter: MasterFilter);
}

pub type BackendFactory = Box<dyn FnMut() -> Result<Box<dyn ToneBackend>, AudioError>>;

/// Backend created on first use (first play or preview)
pub struct LazyBackend {
    backend: Option<Box<dyn ToneBackend>>,
    factory: BackendFactory,
}

impl LazyBackend {
    pub fn new(factory: BackendFactory) -> Self {
        Self {
            backend: None,
            factory,
        }
    }

    /// Backend that is already available
    pub fn ready(backend: Box<dyn ToneBackend>) -> Self {
        Self {
            backend: Some(backend),
            factory: Box::new(|| Err(AudioError::NotInitialized)),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    /// Initialise on first call. A failed attempt is retried next time.
    pub fn get_or_init(&mut self) -> Result<&mut (dyn ToneBackend + 'static), AudioError> {
        if self.backend.is_none() {
            let backend = (self.factory)()?;
            log::info!("Tone backend ready at {} Hz", backend.sample_rate());
            self.backend = Some(backend);
        }
        self.backend.as_deref_mut().ok_or(AudioError::NotInitialized)
    }

    pub fn get_mut(&mut self) -> Option<&mut (dyn ToneBackend + 'static)> {
        self.backend.as_deref_mut()
    }
}

/// Backend that only counts and keeps what it is given, for tests and
/// headless runs
pub struct RecordingBackend {
    sample_rate: f32,
    time: f64,
    voices: Vec<Voice>,
    master_gain: Option<f32>,
    master_filter: Option<MasterFilter>,
}

impl RecordingBackend {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            time: 0.0,
            voices: Vec::new(),
            master_gain: None,
            master_filter: None,
        }
    }

    /// Move the fake audio clock
    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn take_voices(&mut self) -> Vec<Voice> {
        std::mem::take(&mut self.voices)
    }

    /// Last master gain received
    pub fn master_gain(&self) -> Option<f32> {
        self.master_gain
    }

    pub fn master_filter(&self) -> Option<MasterFilter> {
        self.master_filter
    }
}

impl ToneBackend for RecordingBackend {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn create_voice(&mut self, voice: Voice) {
        self.voices.push(voice);
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = Some(gain);
    }

    fn set_master_filter(&mut self, filter: MasterFilter) {
        self.master_filter = Some(filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_lazy_backend_initialises_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut lazy = LazyBackend::new(Box::new(move || {
            counter.set(counter.get() + 1);
            Ok(Box::new(RecordingBackend::new(44100.0)) as Box<dyn ToneBackend>)
        }));

        assert!(!lazy.is_initialized());
        assert!(lazy.get_mut().is_none());
        assert!(lazy.get_or_init().is_ok());
        assert!(lazy.get_or_init().is_ok());
        assert!(lazy.is_initialized());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failed_init_is_retried() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut lazy = LazyBackend::new(Box::new(move || {
            counter.set(counter.get() + 1);
            if counter.get() == 1 {
                Err(AudioError::NoDevice)
            } else {
                Ok(Box::new(RecordingBackend::new(48000.0)) as Box<dyn ToneBackend>)
            }
        }));

        assert!(matches!(lazy.get_or_init(), Err(AudioError::NoDevice)));
        assert!(!lazy.is_initialized());
        let backend = lazy.get_or_init().map(|b| b.sample_rate());
        assert_eq!(backend.ok(), Some(48000.0));
    }

    #[test]
    fn test_recording_backend_keeps_voices() {
        let mut backend = RecordingBackend::new(44100.0);
        backend.set_time(1.5);
        assert_eq!(backend.current_time(), 1.5);
        backend.create_voice(Voice::new(44100.0, 0.0).at(1.5));
        assert_eq!(backend.voices().len(), 1);
        assert_eq!(backend.take_voices().len(), 1);
        assert!(backend.voices().is_empty());

        backend.set_master_gain(0.4);
        backend.set_master_filter(MasterFilter::new(900.0, 2.0));
        assert_eq!(backend.master_gain(), Some(0.4));
        assert_eq!(backend.master_filter().map(|f| f.cutoff), Some(900.0));
    }
}
