use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dati_core::{
    Ack, HistoryDetail, HistoryList, ImageInfo, Reply, ScreenshotTaken, StatusPayload,
};
use dati_engine::{
    ApiError, ApiOutcome, ApiRequest, ApiResult, Backend, EngineEvent, EngineHandle, TimerKind,
};

/// Backend double: running service, empty history, counts status calls.
#[derive(Default)]
struct FakeBackend {
    status_calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn status(&self) -> ApiResult<StatusPayload> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StatusPayload {
            is_running: true,
            ..StatusPayload::default()
        })
    }
    async fn start(&self) -> ApiResult<Reply<Ack>> {
        Ok(Reply::Success(Ack {}))
    }
    async fn stop(&self) -> ApiResult<Reply<Ack>> {
        Ok(Reply::failure("Service is not running"))
    }
    async fn screenshot(&self) -> ApiResult<Reply<ScreenshotTaken>> {
        Ok(Reply::Success(ScreenshotTaken {
            filepath: "shot.png".into(),
        }))
    }
    async fn recognize(&self) -> ApiResult<Reply<Ack>> {
        Ok(Reply::Success(Ack {}))
    }
    async fn history(&self) -> ApiResult<Reply<HistoryList>> {
        Ok(Reply::Success(HistoryList::default()))
    }
    async fn clear_history(&self) -> ApiResult<Reply<Ack>> {
        Ok(Reply::Success(Ack {}))
    }
    async fn history_record(&self, _id: &str) -> ApiResult<Reply<HistoryDetail>> {
        Ok(Reply::Failure { error: None })
    }
    async fn delete_history_record(&self, _id: &str) -> ApiResult<Reply<Ack>> {
        Ok(Reply::Success(Ack {}))
    }
    async fn image(&self, _path: &str) -> ApiResult<ImageInfo> {
        Err(ApiError {
            kind: dati_engine::FailureKind::HttpStatus(404),
            message: "404 Not Found".into(),
        })
    }
}

fn wait_for<F>(events: &dati_engine::EngineEvents, mut pick: F) -> EngineEvent
where
    F: FnMut(&EngineEvent) -> bool,
{
    for _ in 0..50 {
        if let Some(event) = events.recv_timeout(Duration::from_millis(100)) {
            if pick(&event) {
                return event;
            }
        }
    }
    panic!("event not received");
}

#[test]
fn calls_complete_with_their_identifiers() {
    let backend = Arc::new(FakeBackend::default());
    let (engine, events) = EngineHandle::spawn(backend.clone());

    engine.call(ApiRequest::Status { seq: 7 });
    let event = wait_for(&events, |event| matches!(event, EngineEvent::Completed(_)));
    match event {
        EngineEvent::Completed(ApiOutcome::Status { seq, result }) => {
            assert_eq!(seq, 7);
            assert!(result.expect("status").is_running);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 1);

    engine.call(ApiRequest::Image {
        path: "/screenshots/x.png?t=1".into(),
    });
    let event = wait_for(&events, |event| matches!(event, EngineEvent::Completed(_)));
    match event {
        EngineEvent::Completed(outcome @ ApiOutcome::Image { .. }) => {
            assert_eq!(outcome.name(), "image");
            assert_eq!(
                outcome.error().map(|err| err.to_string()),
                Some("http status 404: 404 Not Found".to_string())
            );
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn timers_tick_through_the_event_channel() {
    let (engine, events) = EngineHandle::spawn(Arc::new(FakeBackend::default()));

    engine.start_repeating(TimerKind::RecognizePoll, Duration::from_millis(20));
    let event = wait_for(&events, |event| matches!(event, EngineEvent::Timer(_)));
    assert_eq!(event, EngineEvent::Timer(TimerKind::RecognizePoll));

    engine.stop(TimerKind::RecognizePoll);
    engine.start_once(TimerKind::DelayedStatus, Duration::from_millis(10));
    let event = wait_for(&events, |event| {
        *event == EngineEvent::Timer(TimerKind::DelayedStatus)
    });
    assert_eq!(event, EngineEvent::Timer(TimerKind::DelayedStatus));
}
