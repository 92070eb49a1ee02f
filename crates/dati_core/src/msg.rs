use crate::model::{
    Ack, Fetched, HistoryDetail, HistoryList, ImageInfo, Reply, ScreenshotTaken, StatusPayload,
};

/// Wall-clock reading supplied by the platform; the core never reads a clock.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub epoch_ms: i64,
    /// Local time as shown next to client-side status lines.
    pub display: String,
}

impl Timestamp {
    pub fn new(epoch_ms: i64, display: impl Into<String>) -> Self {
        Self {
            epoch_ms,
            display: display.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Client started: first status/history load and the refresh timer.
    Init,
    /// Primary refresh timer fired.
    RefreshTick { now: Timestamp },
    /// Stop the primary refresh timer (no-op when not running).
    RefreshStopRequested,
    /// Secondary recognize-completion timer fired.
    RecognizePollTick { now: Timestamp },
    /// One-off status refresh (delayed refresh after a capture, or user request).
    StatusRefreshRequested,
    StartClicked,
    StopClicked,
    ScreenshotClicked,
    RecognizeClicked,
    ClearHistoryClicked,
    /// Answer to the clear-history confirmation prompt.
    ClearHistoryConfirmed(bool),
    HistorySelected { id: String },
    DeleteHistoryClicked { id: String },
    DialogClosed,
    /// A backend call completed.
    Response { at: Timestamp, response: Response },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Status {
        seq: u64,
        result: Fetched<StatusPayload>,
    },
    Started(Fetched<Reply<Ack>>),
    Stopped(Fetched<Reply<Ack>>),
    ScreenshotTaken(Fetched<Reply<ScreenshotTaken>>),
    RecognizeRequested(Fetched<Reply<Ack>>),
    HistoryLoaded(Fetched<Reply<HistoryList>>),
    HistoryCleared(Fetched<Reply<Ack>>),
    HistoryRecordLoaded {
        id: String,
        result: Fetched<Reply<HistoryDetail>>,
    },
    HistoryRecordDeleted {
        id: String,
        result: Fetched<Reply<Ack>>,
    },
    ImageLoaded {
        path: String,
        result: Fetched<ImageInfo>,
    },
}
