//! Persistence for requests, collections, environments and history.
//!
//! The store is an explicit handle: callers construct one and pass it to
//! [`crate::workbench::Workbench`]. Nothing here is global.

mod file;
mod memory;

use anyhow::Result;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::env::EnvMap;
use crate::executor::ExecutionSuccess;
use crate::model::{
    Collection, CollectionUpdate, Environment, EnvironmentUpdate, HistoryEntry, NewRequest,
    RecordId, RequestTemplate, RequestUpdate, StoredRequest,
};

pub use file::{FileStore, DEFAULT_STORE_FILE};
pub use memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: RecordId },
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, id: RecordId) -> Self {
        StoreError::NotFound { kind, id }
    }
}

/// CRUD over the workbench records.
///
/// Getters return `Ok(None)` for unknown ids; updates and deletes of unknown
/// ids fail with [`StoreError::NotFound`]. Lists are newest first.
pub trait DataStore {
    fn create_request(&mut self, request: NewRequest) -> Result<StoredRequest>;
    fn request(&self, id: RecordId) -> Result<Option<StoredRequest>>;
    fn list_requests(&self) -> Result<Vec<StoredRequest>>;
    fn update_request(&mut self, id: RecordId, update: RequestUpdate) -> Result<StoredRequest>;
    fn delete_request(&mut self, id: RecordId) -> Result<()>;

    fn create_collection(
        &mut self,
        name: String,
        description: Option<String>,
    ) -> Result<Collection>;
    fn collection(&self, id: RecordId) -> Result<Option<Collection>>;
    fn list_collections(&self) -> Result<Vec<Collection>>;
    /// Requests of a collection, in the order they were added.
    fn collection_requests(&self, id: RecordId) -> Result<Vec<StoredRequest>>;
    fn update_collection(&mut self, id: RecordId, update: CollectionUpdate)
        -> Result<Collection>;
    /// Removes the collection and detaches its requests.
    fn delete_collection(&mut self, id: RecordId) -> Result<()>;

    fn create_environment(&mut self, name: String, variables: EnvMap) -> Result<Environment>;
    fn environment(&self, id: RecordId) -> Result<Option<Environment>>;
    fn find_environment(&self, name: &str) -> Result<Option<Environment>>;
    fn list_environments(&self) -> Result<Vec<Environment>>;
    fn update_environment(
        &mut self,
        id: RecordId,
        update: EnvironmentUpdate,
    ) -> Result<Environment>;
    fn delete_environment(&mut self, id: RecordId) -> Result<()>;

    fn append_history(
        &mut self,
        request: RequestTemplate,
        response: ExecutionSuccess,
        created_at: DateTime<Utc>,
    ) -> Result<HistoryEntry>;
    fn history_entry(&self, id: RecordId) -> Result<Option<HistoryEntry>>;
    fn list_history(&self) -> Result<Vec<HistoryEntry>>;
    fn delete_history(&mut self, id: RecordId) -> Result<()>;
}
