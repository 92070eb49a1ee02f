use std::fmt;

use dati_core::{
    Ack, HistoryDetail, HistoryList, ImageInfo, Reply, ScreenshotTaken, StatusPayload,
};

use crate::scheduler::TimerKind;

/// One backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    Status { seq: u64 },
    Start,
    Stop,
    Screenshot,
    Recognize,
    History,
    ClearHistory,
    HistoryRecord { id: String },
    DeleteHistoryRecord { id: String },
    /// Server-relative image path, query included.
    Image { path: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Completion of an [`ApiRequest`], carrying whatever identifies it.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    Status {
        seq: u64,
        result: ApiResult<StatusPayload>,
    },
    Start(ApiResult<Reply<Ack>>),
    Stop(ApiResult<Reply<Ack>>),
    Screenshot(ApiResult<Reply<ScreenshotTaken>>),
    Recognize(ApiResult<Reply<Ack>>),
    History(ApiResult<Reply<HistoryList>>),
    ClearHistory(ApiResult<Reply<Ack>>),
    HistoryRecord {
        id: String,
        result: ApiResult<Reply<HistoryDetail>>,
    },
    DeleteHistoryRecord {
        id: String,
        result: ApiResult<Reply<Ack>>,
    },
    Image {
        path: String,
        result: ApiResult<ImageInfo>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Completed(ApiOutcome),
    Timer(TimerKind),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "unexpected response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
