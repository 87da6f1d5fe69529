// Tick scheduler - repeating timer behind the sequencer clock
//
// The timer thread only produces tick tokens into a lock-free ring buffer.
// The control thread drains them and runs each tick to completion, so ticks
// never overlap and never touch the pattern data from another thread.

use ringbuf::traits::Split;
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Pending ticks the queue can hold before the timer starts dropping them
const TICK_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Failed to spawn clock thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A repeating, cancellable tick source
pub trait TickScheduler {
    /// Start ticking every `interval`, replacing any running timer.
    /// The first tick is due one interval after the call. On error no timer
    /// is running.
    fn start(&mut self, interval: Duration) -> Result<(), SchedulerError>;

    /// Stop ticking. No tick is reported after this returns. Idempotent.
    fn cancel(&mut self);

    /// Number of ticks that fired since the last call
    fn take_due_ticks(&mut self) -> usize;

    /// Interval of the running timer, if any
    fn interval(&self) -> Option<Duration>;
}

struct TimerWorker {
    handle: JoinHandle<()>,
    stop: Arc<AtomicBool>,
    ticks: HeapCons<u64>,
    interval: Duration,
}

/// Timer thread producing ticks into a ring buffer
///
/// Each `start` builds a fresh queue, so tokens left by a cancelled timer are
/// dropped together with its consumer.
#[derive(Default)]
pub struct ThreadTickScheduler {
    worker: Option<TimerWorker>,
}

impl ThreadTickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(interval: Duration, stop: Arc<AtomicBool>, mut ticks: HeapProd<u64>) {
        let mut deadline = Instant::now() + interval;
        let mut sequence = 0u64;

        loop {
            // Sleep until the deadline; cancel() unparks us early
            loop {
                if stop.load(Ordering::Acquire) {
                    return;
                }
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                thread::park_timeout(deadline - now);
            }

            if stop.load(Ordering::Acquire) {
                return;
            }
            if ringbuf::traits::Producer::try_push(&mut ticks, sequence).is_err() {
                log::warn!("Tick queue full, dropping tick {}", sequence);
            }
            sequence += 1;
            // Fixed-period schedule: no drift from processing time
            deadline += interval;
        }
    }
}

impl TickScheduler for ThreadTickScheduler {
    fn start(&mut self, interval: Duration) -> Result<(), SchedulerError> {
        self.cancel();

        let interval = interval.max(Duration::from_millis(1));
        let (producer, consumer) = HeapRb::<u64>::new(TICK_QUEUE_CAPACITY).split();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("groovebox-clock".to_string())
            .spawn(move || Self::run(interval, thread_stop, producer))?;

        log::debug!("Clock thread started ({:?} per step)", interval);
        self.worker = Some(TimerWorker {
            handle,
            stop,
            ticks: consumer,
            interval,
        });
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Release);
            worker.handle.thread().unpark();
            if worker.handle.join().is_err() {
                log::error!("Clock thread panicked");
            }
            // worker.ticks is dropped here with any unread tokens
        }
    }

    fn take_due_ticks(&mut self) -> usize {
        let Some(worker) = self.worker.as_mut() else {
            return 0;
        };
        let mut count = 0;
        while ringbuf::traits::Consumer::try_pop(&mut worker.ticks).is_some() {
            count += 1;
        }
        count
    }

    fn interval(&self) -> Option<Duration> {
        self.worker.as_ref().map(|w| w.interval)
    }
}

impl Drop for ThreadTickScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Hand-driven scheduler for tests and offline tools
///
/// Ticks are injected with [`fire`](Self::fire) and only count while running.
#[derive(Debug, Default)]
pub struct ManualTickScheduler {
    interval: Option<Duration>,
    pending: usize,
    starts: Vec<Duration>,
    cancels: usize,
    fail_next_start: bool,
}

impl ManualTickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate `count` timer expirations
    pub fn fire(&mut self, count: usize) {
        if self.interval.is_some() {
            self.pending += count;
        }
    }

    /// Every interval passed to `start`, in order
    pub fn starts(&self) -> &[Duration] {
        &self.starts
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Make the next `start` fail as if no timer thread could be spawned
    pub fn fail_next_start(&mut self) {
        self.fail_next_start = true;
    }
}

impl TickScheduler for ManualTickScheduler {
    fn start(&mut self, interval: Duration) -> Result<(), SchedulerError> {
        self.cancel();
        if std::mem::take(&mut self.fail_next_start) {
            return Err(SchedulerError::Spawn(std::io::Error::other(
                "timer thread unavailable",
            )));
        }
        self.interval = Some(interval);
        self.starts.push(interval);
        Ok(())
    }

    fn cancel(&mut self) {
        if self.interval.take().is_some() {
            self.cancels += 1;
        }
        self.pending = 0;
    }

    fn take_due_ticks(&mut self) -> usize {
        std::mem::take(&mut self.pending)
    }

    fn interval(&self) -> Option<Duration> {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_scheduler_ticks() {
        let mut scheduler = ThreadTickScheduler::new();
        scheduler.start(Duration::from_millis(5)).unwrap();
        thread::sleep(Duration::from_millis(60));
        let ticks = scheduler.take_due_ticks();
        assert!(ticks >= 3, "only {} ticks", ticks);
        scheduler.cancel();
    }

    #[test]
    fn test_no_tick_after_cancel() {
        let mut scheduler = ThreadTickScheduler::new();
        scheduler.start(Duration::from_millis(2)).unwrap();
        thread::sleep(Duration::from_millis(20));
        scheduler.cancel();
        assert_eq!(scheduler.interval(), None);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(scheduler.take_due_ticks(), 0);

        // Cancel twice is fine
        scheduler.cancel();
    }

    #[test]
    fn test_restart_discards_stale_ticks() {
        let mut scheduler = ThreadTickScheduler::new();
        scheduler.start(Duration::from_millis(1)).unwrap();
        thread::sleep(Duration::from_millis(20));
        scheduler.start(Duration::from_secs(10)).unwrap();
        assert_eq!(scheduler.take_due_ticks(), 0);
        assert_eq!(scheduler.interval(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_manual_scheduler() {
        let mut scheduler = ManualTickScheduler::new();
        scheduler.fire(3);
        assert_eq!(scheduler.take_due_ticks(), 0);

        scheduler.start(Duration::from_millis(100)).unwrap();
        scheduler.fire(2);
        assert_eq!(scheduler.take_due_ticks(), 2);
        assert_eq!(scheduler.take_due_ticks(), 0);

        scheduler.fire(1);
        scheduler.cancel();
        assert_eq!(scheduler.take_due_ticks(), 0);
        assert_eq!(scheduler.cancel_count(), 1);
    }

    #[test]
    fn test_manual_scheduler_failed_start() {
        let mut scheduler = ManualTickScheduler::new();
        scheduler.fail_next_start();
        assert!(scheduler.start(Duration::from_millis(100)).is_err());
        assert!(!scheduler.is_running());
        scheduler.fire(2);
        assert_eq!(scheduler.take_due_ticks(), 0);
        assert!(scheduler.start(Duration::from_millis(100)).is_ok());
    }
}
