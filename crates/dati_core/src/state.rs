use std::time::Duration;

use crate::history::sort_newest_first;
use crate::model::{HistoryRecord, ImageInfo, RecognitionResult, StatusMessage};
use crate::view_model::{
    AppViewModel, ControlsView, DialogView, HistoryView, ImageState, ResultView, ScreenshotView,
    ServiceView,
};
use crate::Timestamp;

/// Period of the status/clock refresh timer.
pub const REFRESH_RATE: Duration = Duration::from_millis(2000);
/// Period of the recognize-completion poller.
pub const RECOGNIZE_POLL_RATE: Duration = Duration::from_millis(1000);
/// Delay before re-reading status after a manual capture.
pub const SCREENSHOT_SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    /// Give up waiting for a recognition result after this many polls.
    /// `None` waits indefinitely.
    pub recognize_max_polls: Option<u32>,
}

/// View surfaces changed since the last render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dirty {
    pub service: bool,
    pub screenshot: bool,
    pub result: bool,
    pub messages: bool,
    pub history: bool,
    pub dialog: bool,
    pub loading: bool,
    pub clock: bool,
}

impl Dirty {
    pub fn all() -> Self {
        Self {
            service: true,
            screenshot: true,
            result: true,
            messages: true,
            history: true,
            dialog: true,
            loading: true,
            clock: true,
        }
    }

    pub fn any(&self) -> bool {
        *self != Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Screenshot {
    filename: String,
    path: String,
    image: ImageState,
}

#[derive(Debug, Clone, PartialEq)]
struct RecognizeWait {
    polls: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    settings: Settings,
    is_running: bool,
    server_time: Option<String>,
    screenshot: Option<Screenshot>,
    recognize_enabled: bool,
    last_result: Option<RecognitionResult>,
    status_log: Vec<StatusMessage>,
    history: Vec<HistoryRecord>,
    dialog: Option<HistoryRecord>,
    loading: Option<String>,
    clock: Option<String>,
    refresh_active: bool,
    recognize_wait: Option<RecognizeWait>,
    issued_status_seq: u64,
    applied_status_seq: u64,
    dirty: Dirty,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            service: ServiceView::new(self.is_running, self.server_time.clone()),
            controls: self.controls(),
            screenshot: match &self.screenshot {
                Some(shot) => ScreenshotView::Image {
                    path: shot.path.clone(),
                    image: shot.image.clone(),
                },
                None => ScreenshotView::Placeholder,
            },
            result: self
                .last_result
                .as_ref()
                .map(ResultView::from_result)
                .unwrap_or_default(),
            messages: self.status_log.clone(),
            history: HistoryView::from_records(&self.history),
            dialog: self.dialog.as_ref().map(DialogView::from_record),
            loading: self.loading.clone(),
            clock: self.clock.clone(),
        }
    }

    /// Enabled actions. The loading overlay blocks all of them.
    pub fn controls(&self) -> ControlsView {
        let idle = self.loading.is_none();
        ControlsView {
            start: idle && !self.is_running,
            stop: idle && self.is_running,
            screenshot: idle && self.is_running,
            recognize: idle && self.recognize_enabled,
            clear_history: idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn last_screenshot(&self) -> Option<&str> {
        self.screenshot.as_ref().map(|shot| shot.filename.as_str())
    }

    pub fn last_result(&self) -> Option<&RecognitionResult> {
        self.last_result.as_ref()
    }

    pub fn history(&self) -> &[HistoryRecord] {
        &self.history
    }

    pub fn loading(&self) -> Option<&str> {
        self.loading.as_deref()
    }

    pub fn refresh_active(&self) -> bool {
        self.refresh_active
    }

    pub fn is_waiting_for_recognition(&self) -> bool {
        self.recognize_wait.is_some()
    }

    /// Returns and clears the changed surfaces.
    pub fn take_dirty(&mut self) -> Dirty {
        std::mem::take(&mut self.dirty)
    }

    pub fn consume_dirty(&mut self) -> bool {
        self.take_dirty().any()
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        if self.is_running != running {
            self.is_running = running;
            self.dirty.service = true;
        }
    }

    pub(crate) fn set_server_time(&mut self, time: Option<String>) {
        if self.server_time != time {
            self.server_time = time;
            self.dirty.service = true;
        }
    }

    /// Records a newly reported screenshot. Returns the image path to load, or
    /// `None` when the filename is the one already displayed.
    pub(crate) fn apply_screenshot(&mut self, filename: &str, at: &Timestamp) -> Option<String> {
        if self.last_screenshot() == Some(filename) {
            return None;
        }
        let path = format!("/screenshots/{}?t={}", filename, at.epoch_ms);
        self.screenshot = Some(Screenshot {
            filename: filename.to_string(),
            path: path.clone(),
            image: ImageState::Loading,
        });
        self.recognize_enabled = true;
        self.dirty.screenshot = true;
        Some(path)
    }

    /// Applies an image load outcome. Returns `false` when the path is no
    /// longer the displayed one.
    pub(crate) fn apply_image(&mut self, path: &str, outcome: Result<ImageInfo, String>) -> bool {
        let Some(shot) = self.screenshot.as_mut().filter(|shot| shot.path == path) else {
            return false;
        };
        shot.image = match outcome {
            Ok(info) => ImageState::Loaded(info),
            Err(error) => ImageState::Failed(error),
        };
        self.dirty.screenshot = true;
        true
    }

    /// Replaces the result when it differs structurally. Returns whether it did.
    pub(crate) fn apply_result(&mut self, result: RecognitionResult) -> bool {
        if self.last_result.as_ref() == Some(&result) {
            return false;
        }
        self.last_result = Some(result);
        self.dirty.result = true;
        true
    }

    pub(crate) fn replace_status_messages(&mut self, messages: Vec<StatusMessage>) {
        if self.status_log == messages {
            return;
        }
        self.status_log = messages;
        self.dirty.messages = true;
    }

    pub(crate) fn push_status_line(&mut self, at: &Timestamp, message: impl Into<String>) {
        self.status_log.push(StatusMessage {
            time: at.display.clone(),
            message: message.into(),
        });
        self.dirty.messages = true;
    }

    pub(crate) fn set_history(&mut self, mut records: Vec<HistoryRecord>) {
        sort_newest_first(&mut records);
        self.history = records;
        self.dirty.history = true;
    }

    pub(crate) fn open_dialog(&mut self, record: HistoryRecord) {
        self.dialog = Some(record);
        self.dirty.dialog = true;
    }

    pub(crate) fn dialog_record_id(&self) -> Option<&str> {
        self.dialog.as_ref().map(|record| record.id.as_str())
    }

    pub(crate) fn close_dialog(&mut self) {
        if self.dialog.take().is_some() {
            self.dirty.dialog = true;
        }
    }

    pub(crate) fn show_loading(&mut self, text: impl Into<String>) {
        self.loading = Some(text.into());
        self.dirty.loading = true;
    }

    pub(crate) fn hide_loading(&mut self) {
        if self.loading.take().is_some() {
            self.dirty.loading = true;
        }
    }

    pub(crate) fn set_clock(&mut self, display: String) {
        self.clock = Some(display);
        self.dirty.clock = true;
    }

    /// Marks the refresh timer active. Returns whether it already was.
    pub(crate) fn start_refresh(&mut self) -> bool {
        std::mem::replace(&mut self.refresh_active, true)
    }

    /// Marks the refresh timer stopped. Returns whether it was active.
    pub(crate) fn stop_refresh(&mut self) -> bool {
        std::mem::replace(&mut self.refresh_active, false)
    }

    pub(crate) fn begin_recognize_wait(&mut self) {
        self.recognize_wait = Some(RecognizeWait { polls: 0 });
    }

    /// Counts one poll. Returns `false` once the configured maximum is exceeded.
    pub(crate) fn count_recognize_poll(&mut self) -> bool {
        let Some(wait) = self.recognize_wait.as_mut() else {
            return false;
        };
        wait.polls += 1;
        match self.settings.recognize_max_polls {
            Some(max) => wait.polls <= max,
            None => true,
        }
    }

    /// Any displayed result ends the wait, including one shown before it began.
    pub(crate) fn recognition_arrived(&self) -> bool {
        self.recognize_wait.is_some() && self.last_result.is_some()
    }

    pub(crate) fn end_recognize_wait(&mut self) -> bool {
        self.recognize_wait.take().is_some()
    }

    pub(crate) fn next_status_seq(&mut self) -> u64 {
        self.issued_status_seq += 1;
        self.issued_status_seq
    }

    /// Accepts a status response unless a newer one was already applied.
    pub(crate) fn accept_status_seq(&mut self, seq: u64) -> bool {
        if seq < self.applied_status_seq {
            return false;
        }
        self.applied_status_seq = seq;
        true
    }
}
