use crate::format::{format_answer, FormattedAnswer};
use crate::history::{preview, PREVIEW_CHARS};
use crate::model::{HistoryRecord, ImageInfo, RecognitionResult, StatusMessage};

pub const RUNNING_LABEL: &str = "Service running";
pub const STOPPED_LABEL: &str = "Service stopped";
pub const NO_SCREENSHOT_TEXT: &str = "No screenshot yet";
pub const UNPARSED_ANSWER_TEXT: &str = "Could not parse answer";
pub const EMPTY_HISTORY_TEXT: &str = "No history records";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub service: ServiceView,
    pub controls: ControlsView,
    pub screenshot: ScreenshotView,
    pub result: ResultView,
    pub messages: Vec<StatusMessage>,
    pub history: HistoryView,
    pub dialog: Option<DialogView>,
    /// Loading overlay text while a blocking action is in flight.
    pub loading: Option<String>,
    pub clock: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceView {
    pub running: bool,
    pub label: &'static str,
    pub server_time: Option<String>,
}

impl ServiceView {
    pub fn new(running: bool, server_time: Option<String>) -> Self {
        Self {
            running,
            label: if running { RUNNING_LABEL } else { STOPPED_LABEL },
            server_time,
        }
    }
}

/// Which actions are currently enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlsView {
    pub start: bool,
    pub stop: bool,
    pub screenshot: bool,
    pub recognize: bool,
    pub clear_history: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScreenshotView {
    #[default]
    Placeholder,
    Image {
        /// Server-relative path including the cache-busting query.
        path: String,
        image: ImageState,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    Loading,
    Loaded(ImageInfo),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultView {
    /// Nothing recognized yet.
    #[default]
    Empty,
    Error(String),
    Answer(FormattedAnswer),
    /// A result without answer or error.
    Unparsed,
}

impl ResultView {
    /// Error wins over answer; neither means the answer could not be parsed.
    pub fn from_result(result: &RecognitionResult) -> Self {
        if let Some(error) = result.reported_error() {
            ResultView::Error(error.to_string())
        } else if let Some(answer) = result.parsed_answer() {
            ResultView::Answer(format_answer(answer))
        } else {
            ResultView::Unparsed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HistoryView {
    #[default]
    Empty,
    Rows(Vec<HistoryRowView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRowView {
    pub id: String,
    pub timestamp: String,
    pub preview: String,
}

impl HistoryView {
    /// Rows in the given order; the state keeps records sorted.
    pub fn from_records(records: &[HistoryRecord]) -> Self {
        if records.is_empty() {
            return HistoryView::Empty;
        }
        HistoryView::Rows(
            records
                .iter()
                .map(|record| HistoryRowView {
                    id: record.id.clone(),
                    timestamp: record.timestamp.clone(),
                    preview: preview(
                        record
                            .recognition_result
                            .parsed_answer()
                            .unwrap_or(UNPARSED_ANSWER_TEXT),
                        PREVIEW_CHARS,
                    ),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogView {
    pub record_id: String,
    pub title: String,
    /// Server-relative image path.
    pub image_path: String,
    /// Fully formatted, never truncated.
    pub body: ResultView,
}

impl DialogView {
    pub fn from_record(record: &HistoryRecord) -> Self {
        Self {
            record_id: record.id.clone(),
            title: format!("History - {}", record.timestamp),
            image_path: format!("/screenshots/{}", record.image_path),
            body: ResultView::from_result(&record.recognition_result),
        }
    }
}
