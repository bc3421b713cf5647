use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::env::EnvMap;
use crate::executor::ExecutionSuccess;

use super::request::RequestTemplate;

pub type RecordId = u64;

pub const DEFAULT_REQUEST_NAME: &str = "Untitled Request";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRequest {
    pub id: RecordId,
    pub name: String,
    #[serde(flatten)]
    pub template: RequestTemplate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<RecordId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub name: Option<String>,
    pub template: RequestTemplate,
    pub collection_id: Option<RecordId>,
}

impl NewRequest {
    pub fn new(template: RequestTemplate) -> Self {
        Self {
            name: None,
            template,
            collection_id: None,
        }
    }
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct RequestUpdate {
    pub name: Option<String>,
    pub template: Option<RequestTemplate>,
    pub collection_id: Option<Option<RecordId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub variables: EnvMap,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct EnvironmentUpdate {
    pub name: Option<String>,
    pub variables: Option<EnvMap>,
}

/// Snapshot of one successful execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: RecordId,
    pub request: RequestTemplate,
    pub response: ExecutionSuccess,
    pub created_at: DateTime<Utc>,
}
