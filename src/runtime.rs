use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// How often the runner wakes up when no input arrives
pub const TICK_RATE_MS: u64 = 100;

/// One countdown step
pub const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => AppEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            // the receiver is gone once the app has quit
            if tx.send(forwarded).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source fed from a channel
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(TICK_RATE_MS))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on
    /// timeout. Fails once the event source has hung up.
    pub fn step(&self) -> Result<AppEvent, RecvError> {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => Ok(ev),
            Err(RecvTimeoutError::Timeout) => Ok(AppEvent::Tick),
            Err(RecvTimeoutError::Disconnected) => Err(RecvError),
        }
    }
}

/// Schedule/cancel seam for the session countdown
pub trait Scheduler {
    /// Arm the next firing `delay` after the pending one, or after now when
    /// nothing is pending
    fn schedule(&mut self, delay: Duration);
    /// Drop the pending firing, if any
    fn cancel(&mut self);
}

/// Deadline-based scheduler polled by the event loop
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    due_at: Option<Instant>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.due_at.is_some_and(|due| now >= due)
    }
}

impl Scheduler for Countdown {
    /// Re-arming while armed counts from the previous deadline so a late
    /// poll does not push every later firing back.
    fn schedule(&mut self, delay: Duration) {
        let from = self.due_at.unwrap_or_else(Instant::now);
        self.due_at = Some(from + delay);
    }

    fn cancel(&mut self) {
        self.due_at = None;
    }
}
