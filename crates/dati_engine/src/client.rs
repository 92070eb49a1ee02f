use std::time::Duration;

use dati_core::{
    Ack, HistoryDetail, HistoryList, ImageInfo, Reply, ScreenshotTaken, StatusPayload,
};
use dati_logging::dati_debug;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::{ApiError, ApiResult, FailureKind};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Service root; endpoint paths are resolved against it.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_image_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_image_bytes: 20 * 1024 * 1024,
        }
    }
}

/// The helper service's HTTP API.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn status(&self) -> ApiResult<StatusPayload>;
    async fn start(&self) -> ApiResult<Reply<Ack>>;
    async fn stop(&self) -> ApiResult<Reply<Ack>>;
    async fn screenshot(&self) -> ApiResult<Reply<ScreenshotTaken>>;
    async fn recognize(&self) -> ApiResult<Reply<Ack>>;
    async fn history(&self) -> ApiResult<Reply<HistoryList>>;
    async fn clear_history(&self) -> ApiResult<Reply<Ack>>;
    async fn history_record(&self, id: &str) -> ApiResult<Reply<HistoryDetail>>;
    async fn delete_history_record(&self, id: &str) -> ApiResult<Reply<Ack>>;
    async fn image(&self, path: &str) -> ApiResult<ImageInfo>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> ApiResult<Self> {
        let base = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    /// Resolves a server-relative path (leading `/` optional, query allowed).
    pub fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn record_endpoint(&self, id: &str) -> ApiResult<Url> {
        let mut url = self.endpoint("api/history/")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::new(FailureKind::InvalidUrl, "base url cannot have a path"))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url) -> ApiResult<reqwest::Response> {
        dati_debug!("{} {}", method, url);
        let response = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(response)
    }

    async fn json(&self, method: Method, url: Url) -> ApiResult<Value> {
        let response = self.send(method, url).await?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }

    async fn reply<T>(&self, method: Method, path: &str) -> ApiResult<Reply<T>>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.endpoint(path)?;
        decode_reply(self.json(method, url).await?)
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn status(&self) -> ApiResult<StatusPayload> {
        let url = self.endpoint("api/status")?;
        let value = self.json(Method::GET, url).await?;
        serde_json::from_value(value)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }

    async fn start(&self) -> ApiResult<Reply<Ack>> {
        self.reply(Method::POST, "api/start").await
    }

    async fn stop(&self) -> ApiResult<Reply<Ack>> {
        self.reply(Method::POST, "api/stop").await
    }

    async fn screenshot(&self) -> ApiResult<Reply<ScreenshotTaken>> {
        self.reply(Method::POST, "api/screenshot").await
    }

    async fn recognize(&self) -> ApiResult<Reply<Ack>> {
        self.reply(Method::POST, "api/recognize").await
    }

    async fn history(&self) -> ApiResult<Reply<HistoryList>> {
        self.reply(Method::GET, "api/history").await
    }

    async fn clear_history(&self) -> ApiResult<Reply<Ack>> {
        self.reply(Method::POST, "api/history/clear").await
    }

    async fn history_record(&self, id: &str) -> ApiResult<Reply<HistoryDetail>> {
        let url = self.record_endpoint(id)?;
        decode_reply(self.json(Method::GET, url).await?)
    }

    async fn delete_history_record(&self, id: &str) -> ApiResult<Reply<Ack>> {
        let url = self.record_endpoint(id)?;
        decode_reply(self.json(Method::DELETE, url).await?)
    }

    async fn image(&self, path: &str) -> ApiResult<ImageInfo> {
        let url = self.endpoint(path)?;
        let response = self.send(Method::GET, url).await?;
        let max_bytes = self.settings.max_image_bytes;

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "image too large",
                ));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut byte_len = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            byte_len += chunk.len() as u64;
            if byte_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(byte_len),
                    },
                    "image too large",
                ));
            }
        }

        Ok(ImageInfo {
            byte_len,
            content_type,
        })
    }
}

/// Splits an action body on its `success` flag. A missing or non-boolean
/// flag counts as failure.
pub fn decode_reply<T: DeserializeOwned>(value: Value) -> ApiResult<Reply<T>> {
    let success = value
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if success {
        serde_json::from_value(value)
            .map(Reply::Success)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    } else {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        Ok(Reply::Failure { error })
    }
}

fn parse_base_url(raw: &str) -> ApiResult<Url> {
    let mut base =
        Url::parse(raw).map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(ApiError::new(FailureKind::InvalidUrl, "not a base url"));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
