// Sequencer clock - play/stop state machine driving the step counters

use crate::sequencer::pattern::Pattern;
use crate::sequencer::scheduler::{SchedulerError, ThreadTickScheduler, TickScheduler};
use crate::sequencer::timeline::Tempo;
use crate::sequencer::transport::{SequencerState, StepTrigger, TransportState};
use crate::settings::registry::TrackSettingsRegistry;

/// STOPPED <-> PLAYING state machine
///
/// Counters reset on every play and every stop. While playing, a tempo
/// change restarts the timer at the new interval straight away.
pub struct SequencerClock<S: TickScheduler = ThreadTickScheduler> {
    scheduler: S,
    state: TransportState,
    tempo: Tempo,
    counters: SequencerState,
}

impl<S: TickScheduler> SequencerClock<S> {
    pub fn new(scheduler: S, tempo: Tempo) -> Self {
        Self {
            scheduler,
            state: TransportState::Stopped,
            tempo,
            counters: SequencerState::new(),
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn counters(&self) -> &SequencerState {
        &self.counters
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// STOPPED -> PLAYING. Returns false if already playing.
    /// If the timer cannot start the clock stays STOPPED.
    pub fn play(&mut self) -> Result<bool, SchedulerError> {
        if self.state.is_playing() {
            return Ok(false);
        }
        self.counters.reset();
        self.scheduler.start(self.tempo.step_interval())?;
        self.state = TransportState::Playing;
        Ok(true)
    }

    /// Cancel the timer and zero the counters. Safe to call in any state.
    pub fn stop(&mut self) {
        self.scheduler.cancel();
        self.state = TransportState::Stopped;
        self.counters.reset();
    }

    /// Change the tempo (clamped to 20..=300) and return the value in effect.
    /// A timer that fails to restart stops the clock.
    pub fn set_bpm(&mut self, bpm: f64) -> f64 {
        self.tempo = Tempo::new(bpm);
        if self.state.is_playing()
            && let Err(e) = self.scheduler.start(self.tempo.step_interval())
        {
            log::error!("Stopping playback: {}", e);
            self.stop();
        }
        self.tempo.bpm()
    }

    /// Ticks that fired since the last call; always 0 when stopped
    pub fn due_ticks(&mut self) -> usize {
        if !self.state.is_playing() {
            return 0;
        }
        self.scheduler.take_due_ticks()
    }

    /// Run one tick body
    pub fn tick(&mut self, pattern: &Pattern, registry: &TrackSettingsRegistry) -> Vec<StepTrigger> {
        self.counters.tick(pattern, registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::scheduler::ManualTickScheduler;
    use crate::sequencer::track::TrackId;
    use std::time::Duration;

    fn clock() -> SequencerClock<ManualTickScheduler> {
        SequencerClock::new(ManualTickScheduler::new(), Tempo::new(120.0))
    }

    #[test]
    fn test_play_starts_timer_at_step_interval() {
        let mut clock = clock();
        assert!(clock.play().unwrap());
        assert!(clock.is_playing());
        assert_eq!(clock.scheduler().interval(), Some(Duration::from_millis(125)));
        assert!(!clock.play().unwrap());
        assert_eq!(clock.scheduler().starts().len(), 1);
    }

    #[test]
    fn test_stop_is_idempotent_and_resets() {
        let mut clock = clock();
        let pattern = Pattern::create_empty();
        let registry = TrackSettingsRegistry::new();
        clock.play().unwrap();
        clock.tick(&pattern, &registry);
        clock.stop();
        clock.stop();
        assert_eq!(clock.state(), TransportState::Stopped);
        assert_eq!(clock.counters().current_step(), 0);
        assert_eq!(clock.counters().track_step(TrackId::Kick1), 0);
        assert!(!clock.scheduler().is_running());
    }

    #[test]
    fn test_set_bpm_restarts_only_while_playing() {
        let mut clock = clock();
        clock.set_bpm(90.0);
        assert!(clock.scheduler().starts().is_empty());

        clock.play().unwrap();
        clock.scheduler_mut().fire(2);
        assert_eq!(clock.set_bpm(240.0), 240.0);
        assert_eq!(clock.scheduler().interval(), Some(Duration::from_micros(62_500)));
        // Pending ticks of the old interval are gone
        assert_eq!(clock.due_ticks(), 0);
    }

    #[test]
    fn test_play_resets_counters() {
        let mut clock = clock();
        let pattern = Pattern::create_empty();
        let registry = TrackSettingsRegistry::new();
        clock.play().unwrap();
        for _ in 0..5 {
            clock.tick(&pattern, &registry);
        }
        clock.stop();
        clock.play().unwrap();
        assert_eq!(clock.counters().current_step(), 0);
    }

    #[test]
    fn test_no_ticks_when_stopped() {
        let mut clock = clock();
        clock.scheduler_mut().fire(4);
        assert_eq!(clock.due_ticks(), 0);
    }

    #[test]
    fn test_failed_timer_start_stays_stopped() {
        let mut clock = clock();
        clock.scheduler_mut().fail_next_start();
        assert!(clock.play().is_err());
        assert_eq!(clock.state(), TransportState::Stopped);
        clock.scheduler_mut().fire(3);
        assert_eq!(clock.due_ticks(), 0);

        assert!(clock.play().unwrap());
        clock.scheduler_mut().fail_next_start();
        clock.set_bpm(100.0);
        assert!(!clock.is_playing());
    }
}
