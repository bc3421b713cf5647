use std::collections::BTreeMap;

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Every way an execution can fail before a response is in hand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid method: {0}")]
    InvalidMethod(String),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    #[error("Request timed out")]
    Timeout,
    #[error("{0}")]
    Network(String),
}

/// Response body, parsed as JSON when possible.
///
/// `Text` is listed first so a stored text body reads back as text. A body
/// that is a bare JSON string is kept as `Text` for the same reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Text(String),
    Json(Value),
}

impl ResponseData {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::String(text)) => ResponseData::Text(text),
            Ok(value) => ResponseData::Json(value),
            Err(_) => ResponseData::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSuccess {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub data: ResponseData,
    /// Wall-clock seconds from dispatch to the last body byte.
    pub duration: f64,
}

/// Outcome of one execution. Failures are data, never errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success(ExecutionSuccess),
    Failure { error: String },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success(_))
    }

    pub fn success(&self) -> Option<&ExecutionSuccess> {
        match self {
            ExecutionResult::Success(success) => Some(success),
            ExecutionResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ExecutionResult::Success(_) => None,
            ExecutionResult::Failure { error } => Some(error),
        }
    }
}

impl From<ExecutionError> for ExecutionResult {
    fn from(err: ExecutionError) -> Self {
        ExecutionResult::Failure {
            error: err.to_string(),
        }
    }
}

impl Serialize for ExecutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExecutionResult::Success(success) => {
                let mut map = serializer.serialize_map(Some(5))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("status", &success.status)?;
                map.serialize_entry("headers", &success.headers)?;
                map.serialize_entry("data", &success.data)?;
                map.serialize_entry("duration", &success.duration)?;
                map.end()
            }
            ExecutionResult::Failure { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}
