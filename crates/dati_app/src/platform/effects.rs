use std::sync::{mpsc, Arc};
use std::thread;

use chrono::Local;
use dati_core::{Effect, Msg, Response, Timestamp};
use dati_engine::{
    ApiOutcome, ApiRequest, ApiResult, Backend, EngineEvent, EngineEvents, EngineHandle, TimerKind,
};
use dati_logging::{dati_debug, dati_warn};

use super::app::AppEvent;

const CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Executes core effects. Implemented by the engine-backed runner and by
/// recorders in tests.
pub(crate) trait EffectSink {
    fn run(&self, effect: Effect);
}

pub(crate) struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(backend: Arc<dyn Backend>, event_tx: mpsc::Sender<AppEvent>) -> Self {
        let (engine, events) = EngineHandle::spawn(backend);
        spawn_event_loop(events, event_tx);
        Self { engine }
    }
}

impl EffectSink for EffectRunner {
    fn run(&self, effect: Effect) {
        dati_debug!("effect {:?}", effect);
        match effect {
            Effect::StartRefresh { period } => {
                self.engine.start_repeating(TimerKind::Refresh, period)
            }
            Effect::StopRefresh => self.engine.stop(TimerKind::Refresh),
            Effect::StartRecognizePoll { period } => {
                self.engine.start_repeating(TimerKind::RecognizePoll, period)
            }
            Effect::StopRecognizePoll => self.engine.stop(TimerKind::RecognizePoll),
            Effect::ScheduleStatusRefresh { delay } => {
                self.engine.start_once(TimerKind::DelayedStatus, delay)
            }
            Effect::FetchStatus { seq } => self.engine.call(ApiRequest::Status { seq }),
            Effect::StartService => self.engine.call(ApiRequest::Start),
            Effect::StopService => self.engine.call(ApiRequest::Stop),
            Effect::TakeScreenshot => self.engine.call(ApiRequest::Screenshot),
            Effect::Recognize => self.engine.call(ApiRequest::Recognize),
            Effect::LoadHistory => self.engine.call(ApiRequest::History),
            Effect::ClearHistory => self.engine.call(ApiRequest::ClearHistory),
            Effect::LoadHistoryRecord { id } => {
                self.engine.call(ApiRequest::HistoryRecord { id })
            }
            Effect::DeleteHistoryRecord { id } => {
                self.engine.call(ApiRequest::DeleteHistoryRecord { id })
            }
            Effect::LoadImage { path } => self.engine.call(ApiRequest::Image { path }),
            Effect::ConfirmClearHistory => {
                dati_warn!("clear-history confirmation reached the engine runner; ignoring");
            }
        }
    }
}

fn spawn_event_loop(events: EngineEvents, event_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        while let Some(event) = events.recv() {
            if event_tx.send(AppEvent::Msg(map_event(event))).is_err() {
                break;
            }
        }
    });
}

pub(crate) fn now() -> Timestamp {
    let now = Local::now();
    Timestamp::new(now.timestamp_millis(), now.format(CLOCK_FORMAT).to_string())
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Timer(TimerKind::Refresh) => Msg::RefreshTick { now: now() },
        EngineEvent::Timer(TimerKind::RecognizePoll) => Msg::RecognizePollTick { now: now() },
        EngineEvent::Timer(TimerKind::DelayedStatus) => Msg::StatusRefreshRequested,
        EngineEvent::Completed(outcome) => Msg::Response {
            at: now(),
            response: map_outcome(outcome),
        },
    }
}

fn map_outcome(outcome: ApiOutcome) -> Response {
    match outcome {
        ApiOutcome::Status { seq, result } => Response::Status {
            seq,
            result: stringify(result),
        },
        ApiOutcome::Start(result) => Response::Started(stringify(result)),
        ApiOutcome::Stop(result) => Response::Stopped(stringify(result)),
        ApiOutcome::Screenshot(result) => Response::ScreenshotTaken(stringify(result)),
        ApiOutcome::Recognize(result) => Response::RecognizeRequested(stringify(result)),
        ApiOutcome::History(result) => Response::HistoryLoaded(stringify(result)),
        ApiOutcome::ClearHistory(result) => Response::HistoryCleared(stringify(result)),
        ApiOutcome::HistoryRecord { id, result } => Response::HistoryRecordLoaded {
            id,
            result: stringify(result),
        },
        ApiOutcome::DeleteHistoryRecord { id, result } => Response::HistoryRecordDeleted {
            id,
            result: stringify(result),
        },
        ApiOutcome::Image { path, result } => Response::ImageLoaded {
            path,
            result: stringify(result),
        },
    }
}

fn stringify<T>(result: ApiResult<T>) -> Result<T, String> {
    result.map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dati_core::{Ack, Reply};
    use dati_engine::{ApiError, FailureKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn delayed_timer_becomes_status_refresh() {
        assert_eq!(
            map_event(EngineEvent::Timer(TimerKind::DelayedStatus)),
            Msg::StatusRefreshRequested
        );
    }

    #[test]
    fn refresh_timer_carries_a_clock_reading() {
        match map_event(EngineEvent::Timer(TimerKind::Refresh)) {
            Msg::RefreshTick { now } => {
                assert!(now.epoch_ms > 0);
                assert_eq!(now.display.len(), "2024-01-01 12:00:00".len());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn transport_errors_become_display_strings() {
        let outcome = ApiOutcome::DeleteHistoryRecord {
            id: "record_1".to_string(),
            result: Err(ApiError {
                kind: FailureKind::HttpStatus(404),
                message: "404 Not Found".to_string(),
            }),
        };
        assert_eq!(
            map_outcome(outcome),
            Response::HistoryRecordDeleted {
                id: "record_1".to_string(),
                result: Err("http status 404: 404 Not Found".to_string()),
            }
        );
    }

    #[test]
    fn replies_pass_through_unchanged() {
        let outcome = ApiOutcome::Start(Ok(Reply::Success(Ack {})));
        assert_eq!(
            map_outcome(outcome),
            Response::Started(Ok(Reply::Success(Ack {})))
        );
    }
}
