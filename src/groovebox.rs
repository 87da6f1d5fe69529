// Groovebox - the control surface
//
// Owns the pattern store, the track settings, the clock and the voice routing,
// and is driven from a single control thread: editing calls and `pump` never
// run concurrently, so ticks always see a consistent pattern.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::audio::AudioError;
use crate::audio::backend::{LazyBackend, ToneBackend};
use crate::audio::dispatch::{ACID_TRACK, VoiceDispatch};
use crate::audio::engine::LiveBackend;
use crate::audio::export::{ExportError, ExportSettings, WavExporter};
use crate::audio::offline::{OfflineRender, RenderJob, SampleBuffer};
use crate::clipboard::ClipboardError;
use crate::config::EngineConfig;
use crate::messaging::channels::{
    NotificationConsumer, NotificationProducer, create_notification_channel, drain_notifications,
};
use crate::messaging::notification::{Notification, NotificationCategory, NotificationLevel};
use crate::project::{self, ProjectError, StagedImport};
use crate::sequencer::clock::SequencerClock;
use crate::sequencer::generator;
use crate::sequencer::note::frequency_or_default;
use crate::sequencer::pattern::{LockParam, MAX_STEPS, Pattern, PatternSlot};
use crate::sequencer::resolver::ParameterResolver;
use crate::sequencer::scheduler::{ThreadTickScheduler, TickScheduler};
use crate::sequencer::store::PatternStore;
use crate::sequencer::timeline::Tempo;
use crate::sequencer::track::TrackId;
use crate::sequencer::transport::StepTrigger;
use crate::settings::fx::FxSettings;
use crate::settings::registry::TrackSettingsRegistry;
use crate::synth::mixer::{MAX_MASTER_GAIN, MasterFilter};
use crate::synth::acid_presets::AcidPreset;
use crate::synth::voices::{AcidSettings, preview_voice};

pub struct Groovebox<S: TickScheduler = ThreadTickScheduler> {
    config: EngineConfig,
    store: PatternStore,
    registry: TrackSettingsRegistry,
    clock: SequencerClock<S>,
    dispatch: VoiceDispatch,
    backend: LazyBackend,
    fx_settings: FxSettings,
    /// Master controls set by the user; `None` keeps the configured default
    master_gain: Option<f32>,
    master_filter: Option<MasterFilter>,
    notification_tx: Arc<Mutex<NotificationProducer>>,
    notification_rx: NotificationConsumer,
}

impl Groovebox<ThreadTickScheduler> {
    /// Groovebox playing through the default output device, opened on first
    /// play or preview
    pub fn new(config: EngineConfig) -> Self {
        let capacity = config.command_queue_capacity;
        let gain = config.live_master_gain;
        Self::assemble(config, ThreadTickScheduler::new(), move |tx| {
            LazyBackend::new(Box::new(move || {
                let backend = LiveBackend::new(capacity, gain, Arc::clone(&tx))?;
                Ok(Box::new(backend) as Box<dyn ToneBackend>)
            }))
        })
    }
}

impl<S: TickScheduler> Groovebox<S> {
    /// Groovebox with an explicit tick source and tone backend
    pub fn with_backend(config: EngineConfig, scheduler: S, backend: LazyBackend) -> Self {
        Self::assemble(config, scheduler, |_| backend)
    }

    fn assemble(
        config: EngineConfig,
        scheduler: S,
        backend: impl FnOnce(Arc<Mutex<NotificationProducer>>) -> LazyBackend,
    ) -> Self {
        let (tx, rx) = create_notification_channel(config.notification_capacity);
        let tx = Arc::new(Mutex::new(tx));
        let tempo = Tempo::new(config.default_bpm);
        Self {
            store: PatternStore::new(),
            registry: TrackSettingsRegistry::new(),
            clock: SequencerClock::new(scheduler, tempo),
            dispatch: VoiceDispatch::new(),
            backend: backend(Arc::clone(&tx)),
            fx_settings: FxSettings::default(),
            master_gain: None,
            master_filter: None,
            notification_tx: tx,
            notification_rx: rx,
            config,
        }
    }

    fn notify(&self, level: NotificationLevel, category: NotificationCategory, message: String) {
        match level {
            NotificationLevel::Error => log::error!("[{}] {}", category, message),
            NotificationLevel::Warning => log::warn!("[{}] {}", category, message),
            NotificationLevel::Info => log::info!("[{}] {}", category, message),
        }
        let notice = Notification::new(level, category, message);
        if let Ok(mut tx) = self.notification_tx.lock()
            && ringbuf::traits::Producer::try_push(&mut *tx, notice).is_err()
        {
            log::debug!("Notification queue full, notice dropped");
        }
    }

    /// Notices posted since the last call, oldest first
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        drain_notifications(&mut self.notification_rx)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open the backend on first use and hand it the current master controls
    fn ensure_backend(&mut self) -> Result<(), AudioError> {
        if self.backend.is_initialized() {
            return Ok(());
        }
        let backend = self.backend.get_or_init()?;
        if let Some(gain) = self.master_gain {
            backend.set_master_gain(gain);
        }
        if let Some(filter) = self.master_filter {
            backend.set_master_filter(filter);
        }
        Ok(())
    }

    // ---- Transport ----

    /// Start playback from step 0. Opens the audio backend on first use;
    /// if that fails the clock stays stopped.
    pub fn play(&mut self) -> Result<bool, AudioError> {
        if self.clock.is_playing() {
            return Ok(false);
        }
        if let Err(e) = self.ensure_backend() {
            self.notify(
                NotificationLevel::Error,
                NotificationCategory::Audio,
                format!("Audio unavailable: {}", e),
            );
            return Err(e);
        }
        self.store.init_patterns();
        self.dispatch.reset_voice_state();
        if let Err(e) = self.clock.play() {
            self.notify(
                NotificationLevel::Error,
                NotificationCategory::Audio,
                format!("Clock unavailable: {}", e),
            );
            return Err(e.into());
        }
        log::info!("Playing at {}", self.clock.tempo());
        Ok(true)
    }

    pub fn stop(&mut self) {
        self.clock.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    /// Set the tempo (clamped to 20..=300) and return the value in effect
    pub fn set_bpm(&mut self, bpm: f64) -> f64 {
        self.clock.set_bpm(bpm)
    }

    pub fn bpm(&self) -> f64 {
        self.clock.tempo().bpm()
    }

    pub fn tempo(&self) -> Tempo {
        self.clock.tempo()
    }

    pub fn clock(&self) -> &SequencerClock<S> {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SequencerClock<S> {
        &mut self.clock
    }

    /// Run every tick the timer produced since the last call and return
    /// the triggers they fired
    pub fn pump(&mut self) -> Vec<StepTrigger> {
        let due = self.clock.due_ticks();
        let mut fired = Vec::new();
        for _ in 0..due {
            fired.extend(self.tick());
        }
        fired
    }

    /// One tick body: advance the counters and dispatch what fired at the
    /// backend's current time
    pub fn tick(&mut self) -> Vec<StepTrigger> {
        let pattern = self.store.current_pattern();
        let triggers = self.clock.tick(pattern, &self.registry);
        if let Some(backend) = self.backend.get_mut() {
            let time = backend.current_time();
            for trigger in &triggers {
                self.dispatch.dispatch(backend, time, &trigger.spec);
            }
        }
        triggers
    }

    // ---- Patterns ----

    pub fn current_slot(&self) -> PatternSlot {
        self.store.current_slot()
    }

    pub fn select_pattern(&mut self, slot: PatternSlot) {
        self.store.select_pattern(slot);
    }

    pub fn current_pattern(&mut self) -> &Pattern {
        self.store.current_pattern()
    }

    pub fn pattern(&mut self, slot: PatternSlot) -> &Pattern {
        self.store.pattern(slot)
    }

    pub fn toggle_step(&mut self, track: TrackId, step: usize) -> Option<bool> {
        self.store.current_pattern_mut().toggle_step(track, step)
    }

    pub fn set_step_note(&mut self, track: TrackId, step: usize, note: &str) -> bool {
        self.store.current_pattern_mut().set_step_note(track, step, note)
    }

    pub fn toggle_accent(&mut self, step: usize) -> Option<bool> {
        self.store.current_pattern_mut().toggle_accent(step)
    }

    /// Set or clear (`None`) a lock on the current pattern
    pub fn set_param_lock(
        &mut self,
        track: TrackId,
        step: usize,
        param: LockParam,
        value: Option<f32>,
    ) -> bool {
        self.store.set_param_lock(track, step, param, value)
    }

    pub fn clear_pattern(&mut self) {
        self.store.clear_pattern();
        log::info!("Pattern {} cleared", self.store.current_slot());
    }

    pub fn copy_pattern(&mut self) {
        let slot = self.store.copy_pattern();
        self.notify(
            NotificationLevel::Info,
            NotificationCategory::Pattern,
            format!("Pattern {} copied!", slot),
        );
    }

    pub fn paste_pattern(&mut self) -> Result<(), ClipboardError> {
        match self.store.paste_pattern() {
            Ok(slot) => {
                self.notify(
                    NotificationLevel::Info,
                    NotificationCategory::Pattern,
                    format!("Pattern pasted to {}!", slot),
                );
                Ok(())
            }
            Err(e) => {
                self.notify(NotificationLevel::Warning, NotificationCategory::Pattern, e.to_string());
                Err(e)
            }
        }
    }

    /// Merge A and B into C
    pub fn morph_pattern(&mut self) {
        self.store.morph_pattern();
        self.notify(
            NotificationLevel::Info,
            NotificationCategory::Pattern,
            "Morphed A+B into Pattern C!".to_string(),
        );
    }

    /// Fill the current pattern with a seeded beat
    pub fn generate_beat(&mut self, seed: i64) {
        generator::generate_beat(self.store.current_pattern_mut(), seed);
        log::info!("Beat generated with seed {}", seed);
    }

    // ---- Tracks ----

    pub fn registry(&self) -> &TrackSettingsRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TrackSettingsRegistry {
        &mut self.registry
    }

    pub fn set_track_length(&mut self, track: TrackId, length: i64) -> usize {
        self.registry.set_track_length(track, length)
    }

    pub fn set_mute(&mut self, track: TrackId, mute: bool) {
        self.registry.set_mute(track, mute);
    }

    pub fn set_solo(&mut self, track: TrackId, solo: bool) {
        self.registry.set_solo(track, solo);
    }

    pub fn copy_track_settings(&mut self, track: TrackId) {
        self.registry.copy_track_settings(track);
        self.notify(
            NotificationLevel::Info,
            NotificationCategory::Settings,
            format!("{} settings copied!", track.as_str().to_uppercase()),
        );
    }

    pub fn paste_track_settings(&mut self, track: TrackId) -> Result<(), ClipboardError> {
        match self.registry.paste_track_settings(track) {
            Ok(()) => {
                self.notify(
                    NotificationLevel::Info,
                    NotificationCategory::Settings,
                    format!("Settings pasted to {}!", track.as_str().to_uppercase()),
                );
                Ok(())
            }
            Err(e) => {
                self.notify(NotificationLevel::Warning, NotificationCategory::Settings, e.to_string());
                Err(e)
            }
        }
    }

    pub fn reset_track_settings(&mut self, track: TrackId) {
        self.registry.reset_track_settings(track);
    }

    pub fn fx_settings(&self) -> &FxSettings {
        &self.fx_settings
    }

    pub fn set_fx_settings(&mut self, fx_settings: FxSettings) {
        self.fx_settings = fx_settings;
    }

    // ---- Routing ----

    pub fn dispatch(&self) -> &VoiceDispatch {
        &self.dispatch
    }

    pub fn dispatch_mut(&mut self) -> &mut VoiceDispatch {
        &mut self.dispatch
    }

    pub fn enable_acid_bass(&mut self, settings: AcidSettings) {
        self.dispatch.enable_acid_bass(settings);
    }

    pub fn disable_acid_bass(&mut self) {
        self.dispatch.disable_acid_bass();
    }

    /// Load a named acid bassline into the current pattern and route the
    /// acid track through the engine with the preset's voicing. Unknown names
    /// change nothing.
    pub fn load_acid_pattern(&mut self, name: &str) -> bool {
        let Some(preset) = AcidPreset::find(name) else {
            self.notify(
                NotificationLevel::Warning,
                NotificationCategory::Pattern,
                format!("Unknown acid pattern `{}`", name),
            );
            return false;
        };
        let mut acid = self.dispatch.acid_bass().unwrap_or_default();
        preset.apply_settings(&mut acid);
        self.dispatch.enable_acid_bass(acid);
        preset.write_bassline(self.store.current_pattern_mut(), ACID_TRACK);
        self.notify(
            NotificationLevel::Info,
            NotificationCategory::Pattern,
            format!("Acid pattern loaded: {}", preset.name),
        );
        true
    }

    // ---- Master ----

    /// Master gain in effect on live output
    pub fn master_gain(&self) -> f32 {
        self.master_gain.unwrap_or(self.config.live_master_gain)
    }

    /// Set the master gain (clamped to 0..=1.5) for live output and
    /// subsequent renders. Returns the value in effect.
    pub fn set_master_gain(&mut self, gain: f32) -> f32 {
        let gain = if gain.is_finite() {
            gain.clamp(0.0, MAX_MASTER_GAIN)
        } else {
            self.master_gain()
        };
        self.master_gain = Some(gain);
        if let Some(backend) = self.backend.get_mut() {
            backend.set_master_gain(gain);
        }
        gain
    }

    /// Volume fader position 0..=100, mapped onto a gentle power curve
    pub fn set_master_volume(&mut self, percent: f32) -> f32 {
        let position = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 100.0 };
        self.set_master_gain((position / 100.0).powf(1.2) * 1.2)
    }

    pub fn master_filter(&self) -> MasterFilter {
        self.master_filter.unwrap_or_default()
    }

    /// Retune the master lowpass for live output and subsequent renders
    pub fn set_master_filter(&mut self, cutoff: f32, resonance: f32) -> MasterFilter {
        let filter = MasterFilter::new(cutoff, resonance);
        self.master_filter = Some(filter);
        if let Some(backend) = self.backend.get_mut() {
            backend.set_master_filter(filter);
        }
        filter
    }

    // ---- Preview ----

    /// Play one step of the current pattern right now
    pub fn preview_step(&mut self, track: TrackId, step: usize) -> Result<(), AudioError> {
        let pattern = self.store.current_pattern();
        let spec = ParameterResolver::new(pattern, &self.registry).resolve(track, step, step);
        self.ensure_backend()?;
        let backend = self.backend.get_or_init()?;
        let time = backend.current_time();
        self.dispatch.audition(backend, time, &spec);
        Ok(())
    }

    /// Play `track` at the pitch of `note` with its base settings only
    pub fn preview_track_note(&mut self, track: TrackId, note: &str) -> Result<(), AudioError> {
        let pattern = self.store.current_pattern();
        // Past the last step: no lock, no accent
        let spec = ParameterResolver::new(pattern, &self.registry).resolve_with_frequency(
            track,
            MAX_STEPS,
            MAX_STEPS,
            frequency_or_default(note),
        );
        self.ensure_backend()?;
        let backend = self.backend.get_or_init()?;
        let time = backend.current_time();
        self.dispatch.audition(backend, time, &spec);
        Ok(())
    }

    /// Audition a note with the keyboard preview blip
    pub fn preview_note(&mut self, note: &str) -> Result<(), AudioError> {
        self.ensure_backend()?;
        let backend = self.backend.get_or_init()?;
        let voice = preview_voice(frequency_or_default(note), backend.sample_rate());
        let time = backend.current_time();
        backend.create_voice(voice.at(time));
        Ok(())
    }

    // ---- Offline render and export ----

    /// Snapshot of the current pattern, settings, routing, tempo and master
    /// controls. The configured offline gain applies until a master gain is set.
    pub fn offline_render(&mut self) -> OfflineRender {
        let pattern = self.store.current_pattern().clone();
        let mut render = OfflineRender::with_config(
            pattern,
            self.registry.clone(),
            self.dispatch.clone(),
            self.clock.tempo(),
            &self.config,
        );
        if let Some(gain) = self.master_gain {
            render.master_gain = gain;
        }
        render.master_filter = self.master_filter();
        render
    }

    pub fn render_offline(&mut self, bars: u32) -> Result<SampleBuffer, ExportError> {
        let result = self.offline_render().render(bars);
        if let Err(e) = &result {
            self.notify(
                NotificationLevel::Error,
                NotificationCategory::Export,
                format!("Render failed: {}", e),
            );
        }
        result
    }

    /// Render on a background thread; editing can continue meanwhile
    pub fn spawn_render(&mut self, bars: u32) -> Result<RenderJob, ExportError> {
        self.offline_render().spawn(bars)
    }

    /// Render `bars` bars and write them as WAV
    pub fn export_wav(&mut self, bars: u32, settings: ExportSettings) -> Result<PathBuf, ExportError> {
        let mut render = self.offline_render();
        render.sample_rate = settings.sample_rate;
        let result = render
            .render(bars)
            .and_then(|buffer| WavExporter::new(settings).write(&buffer));
        match &result {
            Ok(path) => self.notify(
                NotificationLevel::Info,
                NotificationCategory::Export,
                format!("Exported {}", path.display()),
            ),
            Err(e) => self.notify(
                NotificationLevel::Error,
                NotificationCategory::Export,
                format!("Export failed: {}", e),
            ),
        }
        result
    }

    // ---- Settings document ----

    pub fn export_settings(&mut self) -> Result<String, ProjectError> {
        let patterns = self.store.snapshot();
        project::export_settings(self.bpm(), &self.registry, &self.fx_settings, &patterns)
    }

    /// Merge a settings document into the current state.
    ///
    /// Nothing changes unless the whole document parses and validates.
    pub fn import_settings(&mut self, json: &str) -> Result<(), ProjectError> {
        let staged = project::parse_settings(json)
            .and_then(|doc| doc.stage(&self.registry, &self.fx_settings));
        match staged {
            Ok(staged) => {
                self.commit_import(staged);
                self.notify(
                    NotificationLevel::Info,
                    NotificationCategory::Settings,
                    "Settings imported!".to_string(),
                );
                Ok(())
            }
            Err(e) => {
                self.notify(
                    NotificationLevel::Error,
                    NotificationCategory::Settings,
                    format!("Import failed: {}", e),
                );
                Err(e)
            }
        }
    }

    fn commit_import(&mut self, staged: StagedImport) {
        if let Some(bpm) = staged.bpm {
            self.clock.set_bpm(bpm);
        }
        self.registry.replace_all(staged.settings, staged.lengths);
        if let Some(fx_settings) = staged.fx_settings {
            self.fx_settings = fx_settings;
        }
        for (slot, pattern) in staged.patterns {
            self.store.replace(slot, pattern);
        }
    }

    pub fn save_settings(&mut self, path: &Path) -> Result<(), ProjectError> {
        let json = self.export_settings()?;
        project::save_settings(path, &json)
    }

    pub fn load_settings(&mut self, path: &Path) -> Result<(), ProjectError> {
        match project::load_settings(path) {
            Ok(json) => self.import_settings(&json),
            Err(e) => {
                self.notify(
                    NotificationLevel::Error,
                    NotificationCategory::Settings,
                    format!("Import failed: {}", e),
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::backend::RecordingBackend;
    use crate::sequencer::scheduler::ManualTickScheduler;
    use crate::synth::voices::acid_voice;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Backend handle shared with the test so dispatched voices can be counted
    struct SharedBackend(Rc<RefCell<RecordingBackend>>);

    impl ToneBackend for SharedBackend {
        fn current_time(&self) -> f64 {
            self.0.borrow().current_time()
        }

        fn sample_rate(&self) -> f32 {
            self.0.borrow().sample_rate()
        }

        fn create_voice(&mut self, voice: crate::synth::voice::Voice) {
            self.0.borrow_mut().create_voice(voice);
        }

        fn set_master_gain(&mut self, gain: f32) {
            self.0.borrow_mut().set_master_gain(gain);
        }

        fn set_master_filter(&mut self, filter: MasterFilter) {
            self.0.borrow_mut().set_master_filter(filter);
        }
    }

    fn groovebox() -> (Groovebox<ManualTickScheduler>, Rc<RefCell<RecordingBackend>>) {
        let recorder = Rc::new(RefCell::new(RecordingBackend::new(44100.0)));
        let backend = LazyBackend::ready(Box::new(SharedBackend(Rc::clone(&recorder))));
        let groovebox =
            Groovebox::with_backend(EngineConfig::default(), ManualTickScheduler::new(), backend);
        (groovebox, recorder)
    }

    #[test]
    fn test_pump_dispatches_due_ticks() {
        let (mut gb, recorder) = groovebox();
        gb.toggle_step(TrackId::Kick1, 0);
        gb.toggle_step(TrackId::Hat1, 1);
        assert_eq!(gb.play().unwrap(), true);

        gb.clock_mut().scheduler_mut().fire(2);
        let fired = gb.pump();
        assert_eq!(fired.len(), 2);
        assert_eq!(recorder.borrow().voices().len(), 2);

        // Nothing pending
        assert!(gb.pump().is_empty());
    }

    #[test]
    fn test_no_ticks_after_stop() {
        let (mut gb, recorder) = groovebox();
        gb.toggle_step(TrackId::Kick1, 0);
        gb.play().unwrap();
        gb.stop();
        gb.clock_mut().scheduler_mut().fire(4);
        assert!(gb.pump().is_empty());
        assert!(recorder.borrow().voices().is_empty());
    }

    #[test]
    fn test_play_fails_without_backend() {
        let backend = LazyBackend::new(Box::new(|| Err(AudioError::NoDevice)));
        let mut gb =
            Groovebox::with_backend(EngineConfig::default(), ManualTickScheduler::new(), backend);
        assert!(matches!(gb.play(), Err(AudioError::NoDevice)));
        assert!(!gb.is_playing());
        let notices = gb.drain_notifications();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].category, NotificationCategory::Audio);
    }

    #[test]
    fn test_paste_without_copy_posts_notice() {
        let (mut gb, _) = groovebox();
        gb.toggle_step(TrackId::Snare1, 4);
        assert_eq!(gb.paste_pattern(), Err(ClipboardError::Empty));
        assert!(gb.current_pattern().trigger(TrackId::Snare1, 4));
        let notices = gb.drain_notifications();
        assert_eq!(notices[0].message, "Nothing to paste!");
        assert_eq!(notices[0].level, NotificationLevel::Warning);
    }

    #[test]
    fn test_copy_select_paste() {
        let (mut gb, _) = groovebox();
        gb.toggle_step(TrackId::Bass1, 3);
        gb.copy_pattern();
        gb.select_pattern(PatternSlot::D);
        gb.paste_pattern().unwrap();
        assert!(gb.pattern(PatternSlot::D).trigger(TrackId::Bass1, 3));
        let messages: Vec<String> = gb.drain_notifications().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, ["Pattern A copied!", "Pattern pasted to D!"]);
    }

    #[test]
    fn test_preview_uses_backend_clock() {
        let (mut gb, recorder) = groovebox();
        recorder.borrow_mut().set_time(3.0);
        gb.preview_step(TrackId::Snare2, 0).unwrap();
        gb.preview_note("C4").unwrap();
        gb.preview_track_note(TrackId::Bass2, "A2").unwrap();
        let recorder = recorder.borrow();
        assert_eq!(recorder.voices().len(), 3);
        assert!(recorder.voices().iter().all(|v| v.start_time() == 3.0));
    }

    #[test]
    fn test_import_failure_changes_nothing() {
        let (mut gb, _) = groovebox();
        gb.set_bpm(100.0);
        let before = gb.export_settings().unwrap();

        let bad = r#"{"bpm": 140, "trackLengths": {"kick1": 7}, "trackSettings": {"hat1": {"level": 9}}}"#;
        assert!(gb.import_settings(bad).is_err());
        assert_eq!(gb.bpm(), 100.0);
        assert_eq!(gb.registry().track_length(TrackId::Kick1), 16);
        assert_eq!(gb.export_settings().unwrap(), before);

        let notices = gb.drain_notifications();
        assert!(notices[0].message.starts_with("Import failed"));
    }

    #[test]
    fn test_partial_import_merges() {
        let (mut gb, _) = groovebox();
        gb.set_track_length(TrackId::Hat2, 5);
        gb.import_settings(r#"{"bpm": 90, "trackLengths": {"kick1": 3}}"#).unwrap();
        assert_eq!(gb.bpm(), 90.0);
        assert_eq!(gb.registry().track_length(TrackId::Kick1), 3);
        assert_eq!(gb.registry().track_length(TrackId::Hat2), 5);
    }

    #[test]
    fn test_master_controls_reach_backend_and_render() {
        let (mut gb, recorder) = groovebox();
        assert_eq!(gb.master_gain(), 0.8);
        assert_eq!(gb.offline_render().master_gain, 0.7);

        assert_eq!(gb.set_master_gain(3.0), MAX_MASTER_GAIN);
        let gain = gb.set_master_volume(50.0);
        assert!((gain - 0.5f32.powf(1.2) * 1.2).abs() < 1e-6);
        let filter = gb.set_master_filter(2500.0, 1.5);

        assert_eq!(recorder.borrow().master_gain(), Some(gain));
        assert_eq!(recorder.borrow().master_filter(), Some(filter));
        let render = gb.offline_render();
        assert_eq!(render.master_gain, gain);
        assert_eq!(render.master_filter, filter);
    }

    #[test]
    fn test_master_controls_applied_when_backend_opens() {
        let recorder = Rc::new(RefCell::new(RecordingBackend::new(44100.0)));
        let shared = Rc::clone(&recorder);
        let backend = LazyBackend::new(Box::new(move || {
            Ok(Box::new(SharedBackend(Rc::clone(&shared))) as Box<dyn ToneBackend>)
        }));
        let mut gb =
            Groovebox::with_backend(EngineConfig::default(), ManualTickScheduler::new(), backend);

        gb.set_master_gain(0.3);
        gb.set_master_filter(800.0, 0.9);
        assert_eq!(recorder.borrow().master_gain(), None);

        gb.play().unwrap();
        assert_eq!(recorder.borrow().master_gain(), Some(0.3));
        assert_eq!(recorder.borrow().master_filter().map(|f| f.cutoff), Some(800.0));
    }

    fn frames(mut voice: crate::synth::voice::Voice) -> Vec<(f32, f32)> {
        let mut frames = Vec::new();
        while !voice.is_finished() {
            frames.push(voice.next_frame());
        }
        frames
    }

    #[test]
    fn test_load_acid_pattern() {
        let (mut gb, _) = groovebox();
        assert!(gb.load_acid_pattern("Hardfloor Style"));
        let acid = gb.dispatch().acid_bass().unwrap();
        assert_eq!(acid.cutoff, 300.0);
        assert!(acid.slide_steps[3]);
        let pattern = gb.current_pattern();
        assert!((0..16).all(|step| pattern.trigger(ACID_TRACK, step)));
        assert_eq!(pattern.lane(ACID_TRACK).note(3), Some("A2"));

        assert!(!gb.load_acid_pattern("Missing"));
        let notices = gb.drain_notifications();
        assert_eq!(notices.last().unwrap().level, NotificationLevel::Warning);
    }

    #[test]
    fn test_slid_step_starts_at_previous_pitch_live_and_offline() {
        let (mut gb, recorder) = groovebox();
        assert!(gb.load_acid_pattern("Classic Acid"));
        let mut acid = gb.dispatch().acid_bass().unwrap();
        acid.slide_enabled = true;
        gb.enable_acid_bass(acid);

        // C2, C2, then C3 sliding up from C2
        gb.play().unwrap();
        gb.clock_mut().scheduler_mut().fire(3);
        let fired = gb.pump();
        let slid = &fired[2].spec;
        assert_eq!(slid.step, 2);
        let previous = fired[1].spec.frequency;
        assert!(slid.frequency > previous * 1.9);

        let expected = frames(acid_voice(&acid, slid, Some(previous), 44100.0));
        let unslid = frames(acid_voice(&acid, slid, None, 44100.0));
        assert_ne!(expected, unslid);

        let live = recorder.borrow_mut().take_voices();
        let live: Vec<_> = live.into_iter().map(frames).collect();
        assert_eq!(live[2], expected);

        let offline: Vec<_> = gb.offline_render().voices(1).into_iter().map(frames).collect();
        let bass: Vec<_> = offline.into_iter().take(3).collect();
        assert_eq!(bass[0], live[0]);
        assert_eq!(bass[2], expected);

        // A fresh play forgets the last pitch
        gb.stop();
        gb.play().unwrap();
        assert_eq!(gb.dispatch().last_acid_frequency(), None);
    }

    #[test]
    fn test_play_fails_when_clock_cannot_start() {
        let (mut gb, _) = groovebox();
        gb.clock_mut().scheduler_mut().fail_next_start();
        assert!(matches!(gb.play(), Err(AudioError::Clock(_))));
        assert!(!gb.is_playing());
        assert_eq!(gb.drain_notifications()[0].level, NotificationLevel::Error);
        assert_eq!(gb.play().unwrap(), true);
    }

    #[test]
    fn test_render_zero_bars_posts_error() {
        let (mut gb, _) = groovebox();
        assert!(matches!(gb.render_offline(0), Err(ExportError::EmptyRender)));
        assert_eq!(gb.drain_notifications()[0].category, NotificationCategory::Export);
    }
}
