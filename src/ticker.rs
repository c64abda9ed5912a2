//! Periodic redraw, caret blink and autosave.
//!
//! [`FrameScheduler`] decides whether a tick is due and drops ticks that
//! arrive while the previous frame is still being drawn. [`spawn_tick_loop`]
//! drives a shared [`Drawer`] from a tokio interval.

use crate::draw::Renderer;
use crate::input::Drawer;
use log::{debug, trace};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Timer wakeups may land slightly before their deadline.
const TIMER_SLACK: Duration = Duration::from_millis(1);

/// What the caller should do at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// Not due yet; the next tick is this far away
    Wait(Duration),
    Run,
    /// Due, but the previous frame has not finished; this tick is dropped
    Skip,
}

/// Outcome of [`Drawer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickReport {
    Waiting(Duration),
    Skipped,
    Ran {
        /// Every draw call of the frame succeeded
        drawn: bool,
        /// Unsaved changes were written to the store
        saved: bool,
    },
}

/// Fixed-rate tick bookkeeping with single-frame-in-flight semantics.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Duration,
    next_tick: Instant,
    in_flight: bool,
    skipped: u64,
}

impl FrameScheduler {
    /// First tick is due one interval after `now`.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_tick: now + interval,
            in_flight: false,
            skipped: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Ticks dropped because a frame was still in flight.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn poll(&mut self, now: Instant) -> TickDecision {
        if now + TIMER_SLACK < self.next_tick {
            return TickDecision::Wait(self.next_tick - now);
        }
        if self.in_flight {
            self.skipped += 1;
            self.advance(now);
            trace!("Tick skipped ({} so far)", self.skipped);
            return TickDecision::Skip;
        }
        TickDecision::Run
    }

    /// Marks a frame as started. Returns `false` if one is already running.
    pub fn begin(&mut self, now: Instant) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        self.advance(now);
        true
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    /// Keeps deadlines on the original grid; falls back to `now + interval`
    /// after a long stall.
    fn advance(&mut self, now: Instant) {
        self.next_tick += self.interval;
        if self.next_tick <= now {
            self.next_tick = now + self.interval;
        }
    }
}

/// Handle to a running tick loop.
pub struct TickLoop {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TickLoop {
    /// Stops the loop and waits for the task to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(err) = (&mut self.task).await {
            debug!("Tick loop ended abnormally: {err}");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Ticks `drawer` every `interval` on `handle` until stopped.
///
/// A tick that finds the drawer locked (a host event is being handled) is
/// skipped rather than queued.
pub fn spawn_tick_loop<R>(
    handle: &Handle,
    drawer: Arc<Mutex<Drawer<R>>>,
    interval: Duration,
) -> TickLoop
where
    R: Renderer + Send + 'static,
{
    let (stop_tx, mut stop_rx) = oneshot::channel();
    let task = handle.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match drawer.try_lock() {
                        Ok(mut drawer) => {
                            let report = drawer.tick(Instant::now());
                            trace!("Tick: {report:?}");
                        }
                        Err(_) => trace!("Drawer busy; skipping tick"),
                    }
                }
                _ = &mut stop_rx => break,
            }
        }
        debug!("Tick loop stopped");
    });
    TickLoop {
        stop: Some(stop_tx),
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(100);

    #[test]
    fn first_tick_waits_one_interval() {
        let start = Instant::now();
        let mut scheduler = FrameScheduler::new(INTERVAL, start);
        assert_eq!(scheduler.poll(start), TickDecision::Wait(INTERVAL));
        assert_eq!(scheduler.poll(start + INTERVAL), TickDecision::Run);
    }

    #[test]
    fn tick_during_frame_is_skipped() {
        let start = Instant::now();
        let mut scheduler = FrameScheduler::new(INTERVAL, start);

        assert!(scheduler.begin(start + INTERVAL));
        assert!(!scheduler.begin(start + INTERVAL));
        assert_eq!(scheduler.poll(start + INTERVAL * 2), TickDecision::Skip);
        assert_eq!(scheduler.skipped(), 1);

        scheduler.finish();
        assert_eq!(
            scheduler.poll(start + Duration::from_millis(250)),
            TickDecision::Wait(Duration::from_millis(50))
        );
        assert_eq!(scheduler.poll(start + INTERVAL * 3), TickDecision::Run);
    }

    #[test]
    fn long_stall_reschedules_from_now() {
        let start = Instant::now();
        let mut scheduler = FrameScheduler::new(INTERVAL, start);
        let late = start + Duration::from_secs(5);
        assert_eq!(scheduler.poll(late), TickDecision::Run);
        assert!(scheduler.begin(late));
        scheduler.finish();
        assert_eq!(scheduler.poll(late), TickDecision::Wait(INTERVAL));
    }
}
