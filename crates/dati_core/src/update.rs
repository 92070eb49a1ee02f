use crate::model::{Fetched, Reply, StatusPayload};
use crate::state::{RECOGNIZE_POLL_RATE, REFRESH_RATE, SCREENSHOT_SETTLE_DELAY};
use crate::{AppState, Effect, Msg, Response, Timestamp};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Init => {
            let mut effects = Vec::with_capacity(4);
            if state.start_refresh() {
                effects.push(Effect::StopRefresh);
            }
            effects.push(Effect::FetchStatus {
                seq: state.next_status_seq(),
            });
            effects.push(Effect::LoadHistory);
            effects.push(Effect::StartRefresh {
                period: REFRESH_RATE,
            });
            effects
        }
        Msg::RefreshTick { now } => {
            if !state.refresh_active() {
                return (state, Vec::new());
            }
            state.set_clock(now.display);
            vec![Effect::FetchStatus {
                seq: state.next_status_seq(),
            }]
        }
        Msg::RefreshStopRequested => {
            if state.stop_refresh() {
                vec![Effect::StopRefresh]
            } else {
                Vec::new()
            }
        }
        Msg::StatusRefreshRequested => vec![Effect::FetchStatus {
            seq: state.next_status_seq(),
        }],
        Msg::RecognizePollTick { now } => {
            if !state.is_waiting_for_recognition() {
                return (state, vec![Effect::StopRecognizePoll]);
            }
            if state.count_recognize_poll() {
                vec![Effect::FetchStatus {
                    seq: state.next_status_seq(),
                }]
            } else {
                let max = state.settings().recognize_max_polls.unwrap_or_default();
                state.end_recognize_wait();
                state.hide_loading();
                state.push_status_line(
                    &now,
                    format!("Gave up waiting for a recognition result after {max} polls"),
                );
                vec![Effect::StopRecognizePoll]
            }
        }
        Msg::StartClicked => {
            if !state.controls().start {
                return (state, Vec::new());
            }
            state.show_loading("Starting service...");
            vec![Effect::StartService]
        }
        Msg::StopClicked => {
            if !state.controls().stop {
                return (state, Vec::new());
            }
            state.show_loading("Stopping service...");
            vec![Effect::StopService]
        }
        Msg::ScreenshotClicked => {
            if !state.controls().screenshot {
                return (state, Vec::new());
            }
            state.show_loading("Taking screenshot...");
            vec![Effect::TakeScreenshot]
        }
        Msg::RecognizeClicked => {
            if !state.controls().recognize {
                return (state, Vec::new());
            }
            state.show_loading("Recognizing image...");
            vec![Effect::Recognize]
        }
        Msg::ClearHistoryClicked => {
            if !state.controls().clear_history {
                return (state, Vec::new());
            }
            vec![Effect::ConfirmClearHistory]
        }
        Msg::ClearHistoryConfirmed(confirmed) => {
            if !confirmed || state.loading().is_some() {
                return (state, Vec::new());
            }
            state.show_loading("Clearing history...");
            vec![Effect::ClearHistory]
        }
        Msg::HistorySelected { id } => vec![Effect::LoadHistoryRecord { id }],
        Msg::DeleteHistoryClicked { id } => vec![Effect::DeleteHistoryRecord { id }],
        Msg::DialogClosed => {
            state.close_dialog();
            Vec::new()
        }
        Msg::Response { at, response } => apply_response(&mut state, &at, response),
    };

    (state, effects)
}

fn apply_response(state: &mut AppState, at: &Timestamp, response: Response) -> Vec<Effect> {
    match response {
        Response::Status { seq, result } => {
            if !state.accept_status_seq(seq) {
                return Vec::new();
            }
            match result {
                Ok(payload) => apply_status(state, at, payload),
                Err(error) => {
                    state.push_status_line(at, format!("Failed to fetch status: {error}"));
                    Vec::new()
                }
            }
        }
        Response::Started(result) => {
            if let Some(_ack) = settle(state, at, result, "Failed to start service") {
                state.set_running(true);
                state.push_status_line(at, "Service started");
            }
            state.hide_loading();
            Vec::new()
        }
        Response::Stopped(result) => {
            if let Some(_ack) = settle(state, at, result, "Failed to stop service") {
                state.set_running(false);
                state.push_status_line(at, "Service stopped");
            }
            state.hide_loading();
            Vec::new()
        }
        Response::ScreenshotTaken(result) => {
            let effects = match settle(state, at, result, "Screenshot failed") {
                Some(taken) => {
                    state.push_status_line(at, format!("Screenshot taken: {}", taken.filepath));
                    vec![Effect::ScheduleStatusRefresh {
                        delay: SCREENSHOT_SETTLE_DELAY,
                    }]
                }
                None => Vec::new(),
            };
            state.hide_loading();
            effects
        }
        Response::RecognizeRequested(result) => {
            match settle(state, at, result, "Recognition request failed") {
                Some(_ack) => {
                    // The loader stays up until a status poll reports a result.
                    state.push_status_line(at, "Recognition requested, processing...");
                    state.begin_recognize_wait();
                    vec![Effect::StartRecognizePoll {
                        period: RECOGNIZE_POLL_RATE,
                    }]
                }
                None => {
                    state.hide_loading();
                    Vec::new()
                }
            }
        }
        Response::HistoryLoaded(result) => {
            if let Some(list) = settle(state, at, result, "Failed to load history") {
                state.set_history(list.records);
            }
            Vec::new()
        }
        Response::HistoryCleared(result) => {
            let effects = match settle(state, at, result, "Failed to clear history") {
                Some(_ack) => {
                    state.push_status_line(at, "History cleared");
                    vec![Effect::LoadHistory]
                }
                None => Vec::new(),
            };
            state.hide_loading();
            effects
        }
        Response::HistoryRecordLoaded { id, result } => {
            let context = format!("Failed to load history record {id}");
            if let Some(detail) = settle(state, at, result, &context) {
                if let Some(record) = detail.record {
                    state.open_dialog(record);
                }
            }
            Vec::new()
        }
        Response::HistoryRecordDeleted { id, result } => {
            let context = format!("Failed to delete history record {id}");
            match settle(state, at, result, &context) {
                Some(_ack) => {
                    if state.dialog_record_id() == Some(id.as_str()) {
                        state.close_dialog();
                    }
                    state.push_status_line(at, format!("History record {id} deleted"));
                    vec![Effect::LoadHistory]
                }
                None => Vec::new(),
            }
        }
        Response::ImageLoaded { path, result } => {
            let error = result.as_ref().err().cloned();
            if state.apply_image(&path, result) {
                if let Some(error) = error {
                    state.push_status_line(at, format!("Failed to load screenshot: {error}"));
                }
            }
            Vec::new()
        }
    }
}

fn apply_status(state: &mut AppState, at: &Timestamp, payload: StatusPayload) -> Vec<Effect> {
    let mut effects = Vec::new();

    state.set_running(payload.is_running);
    state.set_server_time(payload.time);

    if let Some(filename) = payload
        .last_screenshot
        .as_deref()
        .filter(|name| !name.is_empty())
    {
        if let Some(path) = state.apply_screenshot(filename, at) {
            effects.push(Effect::LoadImage { path });
        }
    }

    if let Some(result) = payload.last_result {
        state.apply_result(result);
    }

    if !payload.status_messages.is_empty() {
        state.replace_status_messages(payload.status_messages);
    }

    if state.recognition_arrived() {
        state.end_recognize_wait();
        state.hide_loading();
        effects.push(Effect::StopRecognizePoll);
    }

    effects
}

/// Unwraps a successful reply. Transport and application failures become a
/// status line prefixed with `context`.
fn settle<T>(
    state: &mut AppState,
    at: &Timestamp,
    result: Fetched<Reply<T>>,
    context: &str,
) -> Option<T> {
    match result {
        Ok(Reply::Success(body)) => Some(body),
        Ok(Reply::Failure { error }) => {
            let error = error.as_deref().unwrap_or("unknown error");
            state.push_status_line(at, format!("{context}: {error}"));
            None
        }
        Err(error) => {
            state.push_status_line(at, format!("{context}: {error}"));
            None
        }
    }
}
