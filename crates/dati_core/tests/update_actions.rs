use std::sync::Once;

use dati_core::{
    update, Ack, AppState, Effect, Msg, RecognitionResult, Reply, Response, ScreenshotTaken,
    Settings, StatusPayload, Timestamp, RECOGNIZE_POLL_RATE, SCREENSHOT_SETTLE_DELAY,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(dati_logging::initialize_for_tests);
}

fn at() -> Timestamp {
    Timestamp::new(1_714_557_600_000, "10:00:00")
}

fn respond(state: AppState, response: Response) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::Response {
            at: at(),
            response,
        },
    )
}

fn last_line(state: &AppState) -> String {
    state
        .view()
        .messages
        .last()
        .map(|line| line.message.clone())
        .unwrap_or_default()
}

fn fetch_seq(effects: &[Effect]) -> u64 {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchStatus { seq } => Some(*seq),
            _ => None,
        })
        .expect("fetch status effect")
}

fn status(state: AppState, seq: u64, payload: StatusPayload) -> (AppState, Vec<Effect>) {
    respond(
        state,
        Response::Status {
            seq,
            result: Ok(payload),
        },
    )
}

fn running_with_screenshot() -> AppState {
    let (state, effects) = update(AppState::new(), Msg::Init);
    let (mut state, _) = status(
        state,
        fetch_seq(&effects),
        StatusPayload {
            is_running: true,
            last_screenshot: Some("shot.png".into()),
            ..StatusPayload::default()
        },
    );
    state.take_dirty();
    state
}

#[test]
fn start_success_marks_running_and_hides_loader() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::StartClicked);
    assert_eq!(effects, vec![Effect::StartService]);
    assert_eq!(state.loading(), Some("Starting service..."));

    let (mut state, effects) = respond(state, Response::Started(Ok(Reply::Success(Ack {}))));
    assert!(effects.is_empty());
    assert!(state.is_running());
    assert_eq!(state.loading(), None);
    assert_eq!(last_line(&state), "Service started");
    let dirty = state.take_dirty();
    assert!(dirty.service);
    assert!(dirty.loading);
    assert!(dirty.messages);
}

#[test]
fn start_failure_reports_server_error() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::StartClicked);
    let (state, _) = respond(
        state,
        Response::Started(Ok(Reply::failure("Service is already running"))),
    );

    assert!(!state.is_running());
    assert_eq!(state.loading(), None);
    assert_eq!(
        last_line(&state),
        "Failed to start service: Service is already running"
    );
}

#[test]
fn start_transport_error_reports_message() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::StartClicked);
    let (state, _) = respond(state, Response::Started(Err("network error: refused".into())));

    assert_eq!(state.loading(), None);
    assert_eq!(
        last_line(&state),
        "Failed to start service: network error: refused"
    );
}

#[test]
fn failure_without_error_text_still_reports() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::StartClicked);
    let (state, _) = respond(state, Response::Started(Ok(Reply::Failure { error: None })));
    assert_eq!(last_line(&state), "Failed to start service: unknown error");
}

#[test]
fn stop_success_marks_stopped() {
    init_logging();
    let state = running_with_screenshot();
    let (state, effects) = update(state, Msg::StopClicked);
    assert_eq!(effects, vec![Effect::StopService]);

    let (state, _) = respond(state, Response::Stopped(Ok(Reply::Success(Ack {}))));
    assert!(!state.is_running());
    assert_eq!(state.loading(), None);
    assert_eq!(last_line(&state), "Service stopped");
}

#[test]
fn disabled_actions_are_ignored() {
    init_logging();
    let state = AppState::new();
    for msg in [Msg::StopClicked, Msg::ScreenshotClicked, Msg::RecognizeClicked] {
        let (next, effects) = update(state.clone(), msg);
        assert!(effects.is_empty());
        assert_eq!(next, state);
    }

    let state = running_with_screenshot();
    let (_, effects) = update(state, Msg::StartClicked);
    assert!(effects.is_empty());
}

#[test]
fn loader_blocks_other_actions() {
    init_logging();
    let state = running_with_screenshot();
    let (state, _) = update(state, Msg::ScreenshotClicked);
    assert!(state.loading().is_some());

    for msg in [
        Msg::StopClicked,
        Msg::ScreenshotClicked,
        Msg::RecognizeClicked,
        Msg::ClearHistoryClicked,
    ] {
        let (_, effects) = update(state.clone(), msg);
        assert!(effects.is_empty());
    }
}

#[test]
fn screenshot_success_schedules_a_status_refresh() {
    init_logging();
    let state = running_with_screenshot();
    let (state, effects) = update(state, Msg::ScreenshotClicked);
    assert_eq!(effects, vec![Effect::TakeScreenshot]);
    assert_eq!(state.loading(), Some("Taking screenshot..."));

    let (state, effects) = respond(
        state,
        Response::ScreenshotTaken(Ok(Reply::Success(ScreenshotTaken {
            filepath: "shot_2.png".into(),
        }))),
    );
    assert_eq!(
        effects,
        vec![Effect::ScheduleStatusRefresh {
            delay: SCREENSHOT_SETTLE_DELAY
        }]
    );
    assert_eq!(state.loading(), None);
    assert_eq!(last_line(&state), "Screenshot taken: shot_2.png");

    let (_, effects) = update(state, Msg::StatusRefreshRequested);
    assert!(matches!(effects.as_slice(), [Effect::FetchStatus { .. }]));
}

#[test]
fn screenshot_failure_hides_loader_without_refresh() {
    init_logging();
    let state = running_with_screenshot();
    let (state, _) = update(state, Msg::ScreenshotClicked);
    let (state, effects) = respond(
        state,
        Response::ScreenshotTaken(Ok(Reply::failure("capture unavailable"))),
    );
    assert!(effects.is_empty());
    assert_eq!(state.loading(), None);
    assert_eq!(last_line(&state), "Screenshot failed: capture unavailable");
}

#[test]
fn recognize_polls_until_a_result_arrives() {
    init_logging();
    let state = running_with_screenshot();
    assert_eq!(state.last_result(), None);

    let (state, effects) = update(state, Msg::RecognizeClicked);
    assert_eq!(effects, vec![Effect::Recognize]);
    let (mut state, effects) = respond(state, Response::RecognizeRequested(Ok(Reply::Success(Ack {}))));
    assert_eq!(
        effects,
        vec![Effect::StartRecognizePoll {
            period: RECOGNIZE_POLL_RATE
        }]
    );
    assert_eq!(last_line(&state), "Recognition requested, processing...");
    assert!(state.loading().is_some());
    state.take_dirty();

    let replies = [
        StatusPayload::default(),
        StatusPayload::default(),
        StatusPayload {
            last_result: Some(RecognitionResult::answer("答案：C")),
            ..StatusPayload::default()
        },
    ];

    let mut fetches = 0;
    let mut loader_hidden = 0;
    let mut stopped = 0;
    for payload in replies {
        let (next, effects) = update(
            state,
            Msg::RecognizePollTick {
                now: Timestamp::default(),
            },
        );
        let seq = fetch_seq(&effects);
        fetches += 1;
        let (mut next, effects) = status(next, seq, payload);
        if next.take_dirty().loading {
            loader_hidden += 1;
        }
        stopped += effects
            .iter()
            .filter(|effect| **effect == Effect::StopRecognizePoll)
            .count();
        state = next;
        if fetches < 3 {
            assert!(state.loading().is_some());
            assert!(state.is_waiting_for_recognition());
        }
    }

    assert_eq!(fetches, 3);
    assert_eq!(loader_hidden, 1);
    assert_eq!(stopped, 1);
    assert_eq!(state.loading(), None);
    assert!(!state.is_waiting_for_recognition());

    // A tick that was already queued only stops the timer again.
    let (_, effects) = update(
        state,
        Msg::RecognizePollTick {
            now: Timestamp::default(),
        },
    );
    assert_eq!(effects, vec![Effect::StopRecognizePoll]);
}

#[test]
fn recognize_wait_ends_on_an_already_displayed_result() {
    init_logging();
    let state = running_with_screenshot();
    let old = StatusPayload {
        last_result: Some(RecognitionResult::answer("old")),
        ..StatusPayload::default()
    };
    let (state, effects) = update(state, Msg::StatusRefreshRequested);
    let (state, _) = status(state, fetch_seq(&effects), old.clone());

    // A failed recognition leaves the stored result untouched on the server.
    let (state, _) = update(state, Msg::RecognizeClicked);
    let (state, _) = respond(state, Response::RecognizeRequested(Ok(Reply::Success(Ack {}))));
    assert!(state.is_waiting_for_recognition());

    let (state, effects) = update(
        state,
        Msg::RecognizePollTick {
            now: Timestamp::default(),
        },
    );
    let (state, effects) = status(state, fetch_seq(&effects), old);
    assert_eq!(effects, vec![Effect::StopRecognizePoll]);
    assert!(!state.is_waiting_for_recognition());
    assert_eq!(state.loading(), None);
    assert!(state.controls().recognize);
    assert!(state.controls().clear_history);
}

#[test]
fn recognize_request_failure_hides_loader() {
    init_logging();
    let state = running_with_screenshot();
    let (state, _) = update(state, Msg::RecognizeClicked);
    let (state, effects) = respond(
        state,
        Response::RecognizeRequested(Ok(Reply::failure("no screenshot available"))),
    );
    assert!(effects.is_empty());
    assert_eq!(state.loading(), None);
    assert!(!state.is_waiting_for_recognition());
    assert_eq!(
        last_line(&state),
        "Recognition request failed: no screenshot available"
    );
}

#[test]
fn bounded_recognize_wait_gives_up() {
    init_logging();
    let (state, effects) = update(
        AppState::with_settings(Settings {
            recognize_max_polls: Some(2),
        }),
        Msg::Init,
    );
    let (state, _) = status(
        state,
        fetch_seq(&effects),
        StatusPayload {
            last_screenshot: Some("s.png".into()),
            ..StatusPayload::default()
        },
    );
    let (state, _) = update(state, Msg::RecognizeClicked);
    let (mut state, _) = respond(state, Response::RecognizeRequested(Ok(Reply::Success(Ack {}))));

    for _ in 0..2 {
        let (next, effects) = update(
            state,
            Msg::RecognizePollTick {
                now: Timestamp::default(),
            },
        );
        let (next, _) = status(next, fetch_seq(&effects), StatusPayload::default());
        state = next;
    }

    let (state, effects) = update(
        state,
        Msg::RecognizePollTick {
            now: Timestamp::new(0, "10:00:03"),
        },
    );
    assert_eq!(effects, vec![Effect::StopRecognizePoll]);
    assert_eq!(state.loading(), None);
    assert!(!state.is_waiting_for_recognition());
    assert_eq!(
        last_line(&state),
        "Gave up waiting for a recognition result after 2 polls"
    );
}

#[test]
fn declining_clear_history_issues_nothing() {
    init_logging();
    let state = AppState::new();
    let (state, effects) = update(state, Msg::ClearHistoryClicked);
    assert_eq!(effects, vec![Effect::ConfirmClearHistory]);
    assert_eq!(state.loading(), None);

    let (state, effects) = update(state, Msg::ClearHistoryConfirmed(false));
    assert!(effects.is_empty());
    assert_eq!(state.loading(), None);
}

#[test]
fn accepted_clear_history_clears_then_reloads_once() {
    init_logging();
    let state = AppState::new();
    let (state, _) = update(state, Msg::ClearHistoryClicked);
    let (state, effects) = update(state, Msg::ClearHistoryConfirmed(true));
    assert_eq!(effects, vec![Effect::ClearHistory]);
    assert_eq!(state.loading(), Some("Clearing history..."));

    let (state, effects) = respond(state, Response::HistoryCleared(Ok(Reply::Success(Ack {}))));
    assert_eq!(effects, vec![Effect::LoadHistory]);
    assert_eq!(state.loading(), None);
    assert_eq!(last_line(&state), "History cleared");
}

#[test]
fn clear_history_failure_does_not_reload() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::ClearHistoryConfirmed(true));
    let (state, effects) = respond(state, Response::HistoryCleared(Err("timeout".into())));
    assert!(effects.is_empty());
    assert_eq!(state.loading(), None);
    assert_eq!(last_line(&state), "Failed to clear history: timeout");
}
