use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::env::EnvMap;
use crate::executor::ExecutionSuccess;
use crate::model::{
    Collection, CollectionUpdate, Environment, EnvironmentUpdate, HistoryEntry, NewRequest,
    RecordId, RequestTemplate, RequestUpdate, StoredRequest, DEFAULT_REQUEST_NAME,
};

use super::{DataStore, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct LastIds {
    request: RecordId,
    collection: RecordId,
    environment: RecordId,
    history: RecordId,
}

fn next_id(last: &mut RecordId) -> RecordId {
    *last += 1;
    *last
}

/// Store kept entirely in memory, records in insertion order.
///
/// Also the on-disk shape of [`super::FileStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStore {
    requests: Vec<StoredRequest>,
    collections: Vec<Collection>,
    environments: Vec<Environment>,
    history: Vec<HistoryEntry>,
    last_ids: LastIds,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_collection(&self, id: Option<RecordId>) -> Result<()> {
        match id {
            Some(id) if !self.collections.iter().any(|c| c.id == id) => {
                Err(StoreError::not_found("collection", id).into())
            }
            _ => Ok(()),
        }
    }
}

fn position<T>(
    items: &[T],
    id: RecordId,
    kind: &'static str,
    key: impl Fn(&T) -> RecordId,
) -> Result<usize> {
    items
        .iter()
        .position(|item| key(item) == id)
        .ok_or_else(|| StoreError::not_found(kind, id).into())
}

fn newest_first<T: Clone>(items: &[T]) -> Vec<T> {
    items.iter().rev().cloned().collect()
}

impl DataStore for MemoryStore {
    fn create_request(&mut self, request: NewRequest) -> Result<StoredRequest> {
        self.ensure_collection(request.collection_id)?;
        let stored = StoredRequest {
            id: next_id(&mut self.last_ids.request),
            name: request
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REQUEST_NAME.to_string()),
            template: request.template,
            collection_id: request.collection_id,
            created_at: Utc::now(),
        };
        self.requests.push(stored.clone());
        Ok(stored)
    }

    fn request(&self, id: RecordId) -> Result<Option<StoredRequest>> {
        Ok(self.requests.iter().find(|r| r.id == id).cloned())
    }

    fn list_requests(&self) -> Result<Vec<StoredRequest>> {
        Ok(newest_first(&self.requests))
    }

    fn update_request(&mut self, id: RecordId, update: RequestUpdate) -> Result<StoredRequest> {
        if let Some(collection_id) = update.collection_id {
            self.ensure_collection(collection_id)?;
        }
        let index = position(&self.requests, id, "request", |r| r.id)?;
        let stored = &mut self.requests[index];
        if let Some(name) = update.name {
            stored.name = name;
        }
        if let Some(template) = update.template {
            stored.template = template;
        }
        if let Some(collection_id) = update.collection_id {
            stored.collection_id = collection_id;
        }
        Ok(stored.clone())
    }

    fn delete_request(&mut self, id: RecordId) -> Result<()> {
        let index = position(&self.requests, id, "request", |r| r.id)?;
        self.requests.remove(index);
        Ok(())
    }

    fn create_collection(
        &mut self,
        name: String,
        description: Option<String>,
    ) -> Result<Collection> {
        let collection = Collection {
            id: next_id(&mut self.last_ids.collection),
            name,
            description,
            created_at: Utc::now(),
        };
        self.collections.push(collection.clone());
        Ok(collection)
    }

    fn collection(&self, id: RecordId) -> Result<Option<Collection>> {
        Ok(self.collections.iter().find(|c| c.id == id).cloned())
    }

    fn list_collections(&self) -> Result<Vec<Collection>> {
        Ok(newest_first(&self.collections))
    }

    fn collection_requests(&self, id: RecordId) -> Result<Vec<StoredRequest>> {
        self.ensure_collection(Some(id))?;
        Ok(self
            .requests
            .iter()
            .filter(|r| r.collection_id == Some(id))
            .cloned()
            .collect())
    }

    fn update_collection(
        &mut self,
        id: RecordId,
        update: CollectionUpdate,
    ) -> Result<Collection> {
        let index = position(&self.collections, id, "collection", |c| c.id)?;
        let collection = &mut self.collections[index];
        if let Some(name) = update.name {
            collection.name = name;
        }
        if let Some(description) = update.description {
            collection.description = description;
        }
        Ok(collection.clone())
    }

    fn delete_collection(&mut self, id: RecordId) -> Result<()> {
        let index = position(&self.collections, id, "collection", |c| c.id)?;
        self.collections.remove(index);
        for request in self
            .requests
            .iter_mut()
            .filter(|r| r.collection_id == Some(id))
        {
            request.collection_id = None;
        }
        Ok(())
    }

    fn create_environment(&mut self, name: String, variables: EnvMap) -> Result<Environment> {
        let environment = Environment {
            id: next_id(&mut self.last_ids.environment),
            name,
            variables,
            created_at: Utc::now(),
        };
        self.environments.push(environment.clone());
        Ok(environment)
    }

    fn environment(&self, id: RecordId) -> Result<Option<Environment>> {
        Ok(self.environments.iter().find(|e| e.id == id).cloned())
    }

    fn find_environment(&self, name: &str) -> Result<Option<Environment>> {
        Ok(self
            .environments
            .iter()
            .rev()
            .find(|e| e.name == name)
            .cloned())
    }

    fn list_environments(&self) -> Result<Vec<Environment>> {
        Ok(newest_first(&self.environments))
    }

    fn update_environment(
        &mut self,
        id: RecordId,
        update: EnvironmentUpdate,
    ) -> Result<Environment> {
        let index = position(&self.environments, id, "environment", |e| e.id)?;
        let environment = &mut self.environments[index];
        if let Some(name) = update.name {
            environment.name = name;
        }
        if let Some(variables) = update.variables {
            environment.variables = variables;
        }
        Ok(environment.clone())
    }

    fn delete_environment(&mut self, id: RecordId) -> Result<()> {
        let index = position(&self.environments, id, "environment", |e| e.id)?;
        self.environments.remove(index);
        Ok(())
    }

    fn append_history(
        &mut self,
        request: RequestTemplate,
        response: ExecutionSuccess,
        created_at: DateTime<Utc>,
    ) -> Result<HistoryEntry> {
        let entry = HistoryEntry {
            id: next_id(&mut self.last_ids.history),
            request,
            response,
            created_at,
        };
        self.history.push(entry.clone());
        Ok(entry)
    }

    fn history_entry(&self, id: RecordId) -> Result<Option<HistoryEntry>> {
        Ok(self.history.iter().find(|h| h.id == id).cloned())
    }

    fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(newest_first(&self.history))
    }

    fn delete_history(&mut self, id: RecordId) -> Result<()> {
        let index = position(&self.history, id, "history entry", |h| h.id)?;
        self.history.remove(index);
        Ok(())
    }
}
