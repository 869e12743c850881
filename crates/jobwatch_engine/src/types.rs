use std::fmt;

use jobwatch_core::{ProgressSnapshot, ResultRow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub kind: FailureKind,
    pub message: String,
    /// Error text supplied by the service in its response body, if any.
    pub detail: Option<String>,
}

impl ServiceError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail.filter(|text| !text.trim().is_empty());
        self
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.kind, detail),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ServiceError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Decode,
    Io,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Answer of the service's health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartBody<'a> {
    pub query: &'a str,
    pub location: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// `{message}` on success, `{error}` on failure.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    count: i64,
    #[serde(default)]
    target: i64,
    is_active: bool,
    #[serde(default)]
    download_ready: bool,
    #[serde(default)]
    error: Option<String>,
}

impl From<ProgressBody> for ProgressSnapshot {
    fn from(body: ProgressBody) -> Self {
        Self {
            status_text: body.status,
            current_count: non_negative(body.count),
            target_count: non_negative(body.target),
            is_active: body.is_active,
            download_ready: body.download_ready,
            error: body.error.filter(|text| !text.trim().is_empty()),
        }
    }
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Row fields arrive as strings, numbers or null depending on the extractor.
#[derive(Debug, Deserialize)]
pub(crate) struct RowBody {
    #[serde(default)]
    name: serde_json::Value,
    #[serde(default)]
    rating: serde_json::Value,
    #[serde(default)]
    reviews: serde_json::Value,
    #[serde(default)]
    phone: serde_json::Value,
    #[serde(default)]
    address: serde_json::Value,
    #[serde(default)]
    website: serde_json::Value,
    #[serde(default)]
    email: serde_json::Value,
}

impl From<RowBody> for ResultRow {
    fn from(row: RowBody) -> Self {
        Self {
            name: display_value(row.name).unwrap_or_else(|| "N/A".to_string()),
            rating: display_value(row.rating),
            reviews: display_value(row.reviews),
            phone: display_value(row.phone),
            address: display_value(row.address),
            website: display_value(row.website),
            email: display_value(row.email),
        }
    }
}

fn display_value(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) if text.trim().is_empty() => None,
        serde_json::Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}
