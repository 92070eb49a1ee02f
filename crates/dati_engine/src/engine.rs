use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use dati_logging::{dati_info, dati_warn};

use crate::scheduler::{Scheduler, TickSink, TimerKind};
use crate::{ApiOutcome, ApiRequest, Backend, EngineEvent};

enum EngineCommand {
    Call(ApiRequest),
    StartRepeating { kind: TimerKind, period: Duration },
    StartOnce { kind: TimerKind, delay: Duration },
    Stop { kind: TimerKind },
}

/// Sends commands to the engine thread. Cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

/// Receiving end for request completions and timer ticks.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    /// Spawns the engine thread with its own tokio runtime. Every call runs as
    /// an independent task, so slow requests never hold up later ones.
    pub fn spawn(backend: Arc<dyn Backend>) -> (Self, EngineEvents) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let sink = Arc::new(ChannelTickSink::new(event_tx.clone()));
            let mut scheduler = Scheduler::new(runtime.handle().clone(), sink);

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Call(request) => {
                        let backend = backend.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let outcome = execute(backend.as_ref(), request).await;
                            let _ = event_tx.send(EngineEvent::Completed(outcome));
                        });
                    }
                    EngineCommand::StartRepeating { kind, period } => {
                        scheduler.start_repeating(kind, period);
                    }
                    EngineCommand::StartOnce { kind, delay } => {
                        scheduler.start_once(kind, delay);
                    }
                    EngineCommand::Stop { kind } => {
                        scheduler.stop(kind);
                    }
                }
            }
            scheduler.stop_all();
            dati_info!("engine command channel closed");
        });

        (Self { cmd_tx }, EngineEvents { event_rx })
    }

    pub fn call(&self, request: ApiRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Call(request));
    }

    pub fn start_repeating(&self, kind: TimerKind, period: Duration) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::StartRepeating { kind, period });
    }

    pub fn start_once(&self, kind: TimerKind, delay: Duration) {
        let _ = self.cmd_tx.send(EngineCommand::StartOnce { kind, delay });
    }

    pub fn stop(&self, kind: TimerKind) {
        let _ = self.cmd_tx.send(EngineCommand::Stop { kind });
    }
}

impl EngineEvents {
    /// Blocks until the next event; `None` once the engine is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

struct ChannelTickSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelTickSink {
    fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl TickSink for ChannelTickSink {
    fn tick(&self, kind: TimerKind) {
        let _ = self.tx.send(EngineEvent::Timer(kind));
    }
}

/// Runs one request against the backend.
pub async fn execute(backend: &dyn Backend, request: ApiRequest) -> ApiOutcome {
    let outcome = match request {
        ApiRequest::Status { seq } => ApiOutcome::Status {
            seq,
            result: backend.status().await,
        },
        ApiRequest::Start => ApiOutcome::Start(backend.start().await),
        ApiRequest::Stop => ApiOutcome::Stop(backend.stop().await),
        ApiRequest::Screenshot => ApiOutcome::Screenshot(backend.screenshot().await),
        ApiRequest::Recognize => ApiOutcome::Recognize(backend.recognize().await),
        ApiRequest::History => ApiOutcome::History(backend.history().await),
        ApiRequest::ClearHistory => ApiOutcome::ClearHistory(backend.clear_history().await),
        ApiRequest::HistoryRecord { id } => {
            let result = backend.history_record(&id).await;
            ApiOutcome::HistoryRecord { id, result }
        }
        ApiRequest::DeleteHistoryRecord { id } => {
            let result = backend.delete_history_record(&id).await;
            ApiOutcome::DeleteHistoryRecord { id, result }
        }
        ApiRequest::Image { path } => {
            let result = backend.image(&path).await;
            ApiOutcome::Image { path, result }
        }
    };
    if let Some(err) = outcome.error() {
        dati_warn!("{} failed: {}", outcome.name(), err);
    }
    outcome
}

impl ApiOutcome {
    /// Endpoint label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ApiOutcome::Status { .. } => "status",
            ApiOutcome::Start(_) => "start",
            ApiOutcome::Stop(_) => "stop",
            ApiOutcome::Screenshot(_) => "screenshot",
            ApiOutcome::Recognize(_) => "recognize",
            ApiOutcome::History(_) => "history",
            ApiOutcome::ClearHistory(_) => "clear history",
            ApiOutcome::HistoryRecord { .. } => "history record",
            ApiOutcome::DeleteHistoryRecord { .. } => "delete history record",
            ApiOutcome::Image { .. } => "image",
        }
    }

    /// Transport-level error, if the call did not produce a body.
    pub fn error(&self) -> Option<&crate::ApiError> {
        match self {
            ApiOutcome::Status { result, .. } => result.as_ref().err(),
            ApiOutcome::Start(result)
            | ApiOutcome::Stop(result)
            | ApiOutcome::Recognize(result)
            | ApiOutcome::ClearHistory(result) => result.as_ref().err(),
            ApiOutcome::Screenshot(result) => result.as_ref().err(),
            ApiOutcome::History(result) => result.as_ref().err(),
            ApiOutcome::HistoryRecord { result, .. } => result.as_ref().err(),
            ApiOutcome::DeleteHistoryRecord { result, .. } => result.as_ref().err(),
            ApiOutcome::Image { result, .. } => result.as_ref().err(),
        }
    }
}
