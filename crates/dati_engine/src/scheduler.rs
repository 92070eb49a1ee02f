//! Named, cancellable timers on a tokio runtime.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dati_logging::{dati_debug, dati_trace};
use tokio::runtime::Handle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Status/clock refresh.
    Refresh,
    /// Recognize-completion poll.
    RecognizePoll,
    /// One-off status refresh after a capture.
    DelayedStatus,
}

pub trait TickSink: Send + Sync {
    fn tick(&self, kind: TimerKind);
}

/// At most one timer per [`TimerKind`]; starting a kind cancels its
/// predecessor.
pub struct Scheduler {
    runtime: Handle,
    sink: Arc<dyn TickSink>,
    timers: HashMap<TimerKind, CancellationToken>,
}

impl Scheduler {
    pub fn new(runtime: Handle, sink: Arc<dyn TickSink>) -> Self {
        Self {
            runtime,
            sink,
            timers: HashMap::new(),
        }
    }

    /// Ticks every `period`, first tick one period from now.
    pub fn start_repeating(&mut self, kind: TimerKind, period: Duration) {
        let token = self.replace(kind);
        let sink = self.sink.clone();
        dati_debug!("timer {:?} every {:?}", kind, period);
        self.runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        dati_trace!("timer {:?} tick", kind);
                        sink.tick(kind);
                    }
                }
            }
        });
    }

    /// Ticks once after `delay`.
    pub fn start_once(&mut self, kind: TimerKind, delay: Duration) {
        let token = self.replace(kind);
        let sink = self.sink.clone();
        dati_debug!("timer {:?} once after {:?}", kind, delay);
        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = time::sleep(delay) => {
                    token.cancel();
                    sink.tick(kind);
                }
            }
        });
    }

    /// Cancels the timer of `kind`. Returns whether one was running.
    pub fn stop(&mut self, kind: TimerKind) -> bool {
        match self.timers.remove(&kind) {
            Some(token) => {
                let was_active = !token.is_cancelled();
                token.cancel();
                if was_active {
                    dati_debug!("timer {:?} stopped", kind);
                }
                was_active
            }
            None => false,
        }
    }

    pub fn is_active(&self, kind: TimerKind) -> bool {
        self.timers
            .get(&kind)
            .is_some_and(|token| !token.is_cancelled())
    }

    pub fn stop_all(&mut self) {
        for (_, token) in self.timers.drain() {
            token.cancel();
        }
    }

    fn replace(&mut self, kind: TimerKind) -> CancellationToken {
        self.stop(kind);
        let token = CancellationToken::new();
        self.timers.insert(kind, token.clone());
        token
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}
