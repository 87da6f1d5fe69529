// Offline render - replays the sequencer on a virtual time axis
//
// No timer is involved: tick `n` lands at `n * step duration` and every voice
// goes through the same dispatch as live playback, into a mixer that renders
// as fast as it can.

use std::thread::{self, JoinHandle};

use crate::audio::backend::ToneBackend;
use crate::audio::dispatch::VoiceDispatch;
use crate::audio::dsp_utils::peak;
use crate::audio::export::ExportError;
use crate::config::EngineConfig;
use crate::sequencer::pattern::Pattern;
use crate::sequencer::timeline::{STEPS_PER_BAR, Tempo};
use crate::sequencer::transport::{SequencerState, StepTrigger};
use crate::settings::registry::TrackSettingsRegistry;
use crate::synth::mixer::{MasterBus, MasterFilter, VoiceMixer};
use crate::synth::voice::Voice;

/// Rendered stereo audio
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub sample_rate: u32,
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl SampleBuffer {
    pub fn silent(sample_rate: u32, frames: usize) -> Self {
        Self {
            sample_rate,
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    pub fn frames(&self) -> usize {
        self.left.len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample over both channels
    pub fn peak(&self) -> f32 {
        peak(&self.left).max(peak(&self.right))
    }

    /// L R L R ...
    pub fn interleaved(&self) -> Vec<f32> {
        self.left
            .iter()
            .zip(&self.right)
            .flat_map(|(l, r)| [*l, *r])
            .collect()
    }
}

/// Non-realtime backend: voices go straight into a mixer
pub struct OfflineBackend {
    mixer: VoiceMixer,
    master: MasterBus,
    sample_rate: u32,
}

impl OfflineBackend {
    /// Unity master gain until `set_master_gain` is called
    pub fn new(sample_rate: u32) -> Self {
        Self {
            mixer: VoiceMixer::new(sample_rate as f32),
            master: MasterBus::new(sample_rate as f32, 1.0),
            sample_rate,
        }
    }

    pub fn scheduled(&self) -> usize {
        self.mixer.pending_count() + self.mixer.active_count()
    }

    /// Render `frames` frames through the master bus
    pub fn render(mut self, frames: usize) -> SampleBuffer {
        let mut buffer = SampleBuffer::silent(self.sample_rate, frames);
        for (left, right) in buffer.left.iter_mut().zip(buffer.right.iter_mut()) {
            (*left, *right) = self.master.process(self.mixer.next_frame());
        }
        buffer
    }
}

impl ToneBackend for OfflineBackend {
    fn current_time(&self) -> f64 {
        self.mixer.current_time()
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate as f32
    }

    fn create_voice(&mut self, voice: Voice) {
        self.mixer.add(voice);
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master.set_gain(gain);
    }

    fn set_master_filter(&mut self, filter: MasterFilter) {
        self.master.set_filter(filter);
    }
}

/// Frozen copy of everything a render reads
///
/// Taking a snapshot lets the render run on another thread while the pattern
/// keeps being edited.
#[derive(Debug, Clone)]
pub struct OfflineRender {
    pub pattern: Pattern,
    pub registry: TrackSettingsRegistry,
    pub dispatch: VoiceDispatch,
    pub tempo: Tempo,
    pub sample_rate: u32,
    pub tail_seconds: f64,
    pub master_gain: f32,
    pub master_filter: MasterFilter,
}

impl OfflineRender {
    pub fn new(
        pattern: Pattern,
        registry: TrackSettingsRegistry,
        dispatch: VoiceDispatch,
        tempo: Tempo,
    ) -> Self {
        Self::with_config(pattern, registry, dispatch, tempo, &EngineConfig::default())
    }

    pub fn with_config(
        pattern: Pattern,
        registry: TrackSettingsRegistry,
        dispatch: VoiceDispatch,
        tempo: Tempo,
        config: &EngineConfig,
    ) -> Self {
        Self {
            pattern,
            registry,
            dispatch,
            tempo,
            sample_rate: config.offline_sample_rate,
            tail_seconds: config.render_tail_seconds,
            master_gain: config.offline_master_gain,
            master_filter: MasterFilter::default(),
        }
    }

    /// Every trigger of `bars` bars with its start time, in tick order
    ///
    /// Counters start from zero, exactly as they do after `play`.
    pub fn plan(&self, bars: u32) -> Vec<(f64, StepTrigger)> {
        let mut counters = SequencerState::new();
        let mut planned = Vec::new();
        for step in 0..bars * STEPS_PER_BAR {
            let time = self.tempo.step_time(step);
            planned.extend(
                counters
                    .tick(&self.pattern, &self.registry)
                    .into_iter()
                    .map(|trigger| (time, trigger)),
            );
        }
        planned
    }

    /// Voices of the planned triggers, built in tick order by a fresh copy
    /// of the routing so slides start the way they do after `play`
    pub fn voices(&self, bars: u32) -> Vec<Voice> {
        let mut dispatch = self.dispatch.clone();
        dispatch.reset_voice_state();
        let sample_rate = self.sample_rate as f32;
        self.plan(bars)
            .iter()
            .map(|(time, trigger)| dispatch.build(*time, &trigger.spec, sample_rate))
            .collect()
    }

    /// Frames of `bars` bars plus the tail
    pub fn length_frames(&self, bars: u32) -> usize {
        let seconds = self.tempo.bars_duration_seconds(bars) + self.tail_seconds.max(0.0);
        (seconds * self.sample_rate as f64).ceil() as usize
    }

    pub fn render(&self, bars: u32) -> Result<SampleBuffer, ExportError> {
        if bars == 0 {
            return Err(ExportError::EmptyRender);
        }

        let mut backend = OfflineBackend::new(self.sample_rate);
        backend.set_master_gain(self.master_gain);
        backend.set_master_filter(self.master_filter);
        let voices = self.voices(bars);
        log::debug!(
            "Offline render: {} bars at {}, {} voices",
            bars,
            self.tempo,
            voices.len()
        );
        for voice in voices {
            backend.create_voice(voice);
        }

        Ok(backend.render(self.length_frames(bars)))
    }

    /// Render on a background thread
    pub fn spawn(self, bars: u32) -> Result<RenderJob, ExportError> {
        let handle = thread::Builder::new()
            .name("groovebox-render".to_string())
            .spawn(move || self.render(bars))?;
        Ok(RenderJob { handle })
    }
}

/// Render running on its own thread
pub struct RenderJob {
    handle: JoinHandle<Result<SampleBuffer, ExportError>>,
}

impl RenderJob {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the render completes or fails
    pub fn join(self) -> Result<SampleBuffer, ExportError> {
        self.handle.join().map_err(|_| ExportError::RenderPanicked)?
    }
}

/// Render `bars` bars of `pattern` with default routing and configuration
pub fn render_pattern_offline(
    pattern: &Pattern,
    registry: &TrackSettingsRegistry,
    bpm: f64,
    bars: u32,
) -> Result<SampleBuffer, ExportError> {
    OfflineRender::new(
        pattern.clone(),
        registry.clone(),
        VoiceDispatch::new(),
        Tempo::new(bpm),
    )
    .render(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::track::TrackId;

    fn four_on_the_floor() -> Pattern {
        let mut pattern = Pattern::create_empty();
        for step in [0, 4, 8, 12] {
            pattern.toggle_step(TrackId::Kick1, step);
        }
        pattern
    }

    #[test]
    fn test_plan_uses_virtual_time() {
        let render = OfflineRender::new(
            four_on_the_floor(),
            TrackSettingsRegistry::new(),
            VoiceDispatch::new(),
            Tempo::new(120.0),
        );
        let plan = render.plan(2);
        assert_eq!(plan.len(), 8);
        // 120 BPM: a sixteenth is 0.125 s
        let times: Vec<f64> = plan.iter().map(|(t, _)| *t).collect();
        assert_eq!(times[..4], [0.0, 0.5, 1.0, 1.5]);
        assert_eq!(times[4], 2.0);
        assert!(plan.iter().all(|(_, t)| t.track == TrackId::Kick1));
    }

    #[test]
    fn test_render_length_includes_tail() {
        let render = OfflineRender::new(
            four_on_the_floor(),
            TrackSettingsRegistry::new(),
            VoiceDispatch::new(),
            Tempo::new(120.0),
        );
        let buffer = render.render(1).unwrap();
        // one bar at 120 BPM is 2 s, plus 2 s tail
        assert_eq!(buffer.frames(), 4 * 44100);
        assert_eq!(buffer.sample_rate, 44100);
        assert!(buffer.peak() > 0.05);
        assert!(buffer.left.iter().chain(&buffer.right).all(|s| s.is_finite()));
    }

    #[test]
    fn test_zero_bars_is_error() {
        let result = render_pattern_offline(
            &four_on_the_floor(),
            &TrackSettingsRegistry::new(),
            128.0,
            0,
        );
        assert!(matches!(result, Err(ExportError::EmptyRender)));
    }

    #[test]
    fn test_empty_pattern_renders_silence() {
        let buffer = render_pattern_offline(
            &Pattern::create_empty(),
            &TrackSettingsRegistry::new(),
            128.0,
            1,
        )
        .unwrap();
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut pattern = four_on_the_floor();
        pattern.toggle_step(TrackId::Hat1, 2);
        pattern.toggle_step(TrackId::Snare1, 4);
        let registry = TrackSettingsRegistry::new();
        let first = render_pattern_offline(&pattern, &registry, 128.0, 1).unwrap();
        let second = render_pattern_offline(&pattern, &registry, 128.0, 1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_spawned_render_matches_inline() {
        let render = OfflineRender::new(
            four_on_the_floor(),
            TrackSettingsRegistry::new(),
            VoiceDispatch::new(),
            Tempo::new(128.0),
        );
        let inline = render.render(1).unwrap();
        let job = render.spawn(1).unwrap();
        assert_eq!(job.join().unwrap(), inline);
    }

    #[test]
    fn test_master_settings_reach_the_render() {
        let mut render = OfflineRender::new(
            four_on_the_floor(),
            TrackSettingsRegistry::new(),
            VoiceDispatch::new(),
            Tempo::new(128.0),
        );
        let full = render.render(1).unwrap();

        render.master_gain = 0.35;
        let half = render.render(1).unwrap();
        assert!((half.peak() - full.peak() * 0.5).abs() < 1e-4);

        render.master_gain = 0.7;
        render.master_filter = MasterFilter::new(200.0, 0.7);
        let dark = render.render(1).unwrap();
        assert_ne!(dark, full);
    }

    #[test]
    fn test_interleaved() {
        let buffer = SampleBuffer {
            sample_rate: 44100,
            left: vec![0.1, 0.2],
            right: vec![-0.1, -0.2],
        };
        assert_eq!(buffer.interleaved(), vec![0.1, -0.1, 0.2, -0.2]);
        assert!((buffer.duration_secs() - 2.0 / 44100.0).abs() < 1e-12);
    }
}
