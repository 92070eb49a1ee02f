//! Dati core: pure client state machine, view models and answer formatting.
mod effect;
mod format;
mod history;
mod model;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use format::{format_answer, FormattedAnswer, Segment};
pub use history::{parse_timestamp, preview, sort_newest_first, PREVIEW_CHARS};
pub use model::{
    Ack, Fetched, HistoryDetail, HistoryList, HistoryRecord, ImageInfo, RecognitionResult, Reply,
    ScreenshotTaken, StatusMessage, StatusPayload,
};
pub use msg::{Msg, Response, Timestamp};
pub use state::{
    AppState, Dirty, Settings, RECOGNIZE_POLL_RATE, REFRESH_RATE, SCREENSHOT_SETTLE_DELAY,
};
pub use update::update;
pub use view_model::{
    AppViewModel, ControlsView, DialogView, HistoryRowView, HistoryView, ImageState, ResultView,
    ScreenshotView, ServiceView, EMPTY_HISTORY_TEXT, NO_SCREENSHOT_TEXT, RUNNING_LABEL,
    STOPPED_LABEL, UNPARSED_ANSWER_TEXT,
};
