use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start (or restart) the repeating status/clock timer.
    StartRefresh { period: Duration },
    StopRefresh,
    /// Start the repeating recognize-completion timer.
    StartRecognizePoll { period: Duration },
    StopRecognizePoll,
    /// Fire a single `StatusRefreshRequested` after `delay`.
    ScheduleStatusRefresh { delay: Duration },
    FetchStatus { seq: u64 },
    StartService,
    StopService,
    TakeScreenshot,
    Recognize,
    LoadHistory,
    ClearHistory,
    LoadHistoryRecord { id: String },
    DeleteHistoryRecord { id: String },
    /// Load an image by server-relative path (query string included).
    LoadImage { path: String },
    /// Ask the user to confirm clearing history; the answer comes back as
    /// `Msg::ClearHistoryConfirmed`.
    ConfirmClearHistory,
}
