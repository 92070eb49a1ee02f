//! Backend wire model: the JSON bodies exchanged with the helper service.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Outcome of one recognition run.
///
/// Only `answer` and `error` drive rendering; every other field the backend
/// sends (timestamp, raw workflow output, debug url) is kept in `extra` so
/// change detection compares the whole object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecognitionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecognitionResult {
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            ..Self::default()
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// The answer text when present and non-empty.
    pub fn parsed_answer(&self) -> Option<&str> {
        self.answer.as_deref().filter(|answer| !answer.is_empty())
    }

    /// The error text when present and non-empty.
    pub fn reported_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|error| !error.is_empty())
    }
}

/// Server-side log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub time: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recognition_result: RecognitionResult,
}

/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_running: bool,
    #[serde(default)]
    pub last_screenshot: Option<String>,
    #[serde(default)]
    pub last_result: Option<RecognitionResult>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_messages: Vec<StatusMessage>,
    #[serde(default)]
    pub current_task: Option<Value>,
    /// Server clock at the time of the response.
    #[serde(default)]
    pub time: Option<String>,
}

/// Treats an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Success body carrying nothing beyond the `success` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ack {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotTaken {
    pub filepath: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryList {
    #[serde(default)]
    pub records: Vec<HistoryRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryDetail {
    #[serde(default)]
    pub record: Option<HistoryRecord>,
}

/// Metadata of a downloaded screenshot image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub byte_len: u64,
    pub content_type: Option<String>,
}

/// Application-level reply of an action endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    Success(T),
    Failure { error: Option<String> },
}

impl<T> Reply<T> {
    pub fn failure(error: impl Into<String>) -> Self {
        Reply::Failure {
            error: Some(error.into()),
        }
    }
}

/// Transport-level outcome: `Err` carries the failure text of a request that
/// never produced a usable body.
pub type Fetched<T> = Result<T, String>;
