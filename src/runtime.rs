use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use tracing::debug;

use crate::app::{App, Flow};
use crate::timer::Millis;

#[derive(Clone, Debug)]
pub enum SessionEvent {
    Key(KeyEvent),
    Resize,
}

pub trait EventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError>;
}

/// Reads the terminal on a background thread and forwards keys and resizes.
pub struct CrosstermEventSource {
    rx: Receiver<SessionEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // key releases would count every press twice on some terminals
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    tx.send(SessionEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(SessionEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
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
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Feeds scripted events from a channel, for headless sessions.
pub struct ChannelEventSource {
    rx: Receiver<SessionEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<SessionEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Session time in milliseconds. Every timestamp the sequencer sees comes from here.
pub trait SessionTime {
    fn now_ms(&self) -> Millis;
}

#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    origin: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl SessionTime for SessionClock {
    fn now_ms(&self) -> Millis {
        Millis::try_from(self.origin.elapsed().as_millis()).unwrap_or(Millis::MAX)
    }
}

/// Virtual time that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Millis>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: Millis) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    pub fn set(&self, ms: Millis) {
        self.now.set(ms);
    }
}

impl SessionTime for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}

/// Drives an `App` one event at a time. Idle waits end at the earlier of
/// the next armed timer and one frame, so redraws keep up with the clock.
pub struct Runner<E: EventSource, C: SessionTime> {
    events: E,
    clock: C,
    frame: Duration,
}

impl<E: EventSource, C: SessionTime> Runner<E, C> {
    pub fn new(events: E, clock: C, frame: Duration) -> Self {
        Self {
            events,
            clock,
            frame,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn step(&self, app: &mut App) -> Flow {
        let wait = self.wait_for(app.sequencer.next_deadline());
        match self.events.recv_timeout(wait) {
            Ok(SessionEvent::Key(key)) => app.on_key(key, self.clock.now_ms()),
            Ok(SessionEvent::Resize) | Err(RecvTimeoutError::Timeout) => {
                app.on_tick(self.clock.now_ms());
                Flow::Continue
            }
            Err(RecvTimeoutError::Disconnected) => {
                debug!("event source closed");
                app.on_tick(self.clock.now_ms());
                Flow::Continue
            }
        }
    }

    fn wait_for(&self, deadline: Option<Millis>) -> Duration {
        match deadline {
            Some(due) => {
                let until = Duration::from_millis(due.saturating_sub(self.clock.now_ms()));
                until.min(self.frame)
            }
            None => self.frame,
        }
    }
}
