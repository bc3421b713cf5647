use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::env::EnvMap;
use crate::executor::ExecutionSuccess;
use crate::model::{
    Collection, CollectionUpdate, Environment, EnvironmentUpdate, HistoryEntry, NewRequest,
    RecordId, RequestTemplate, RequestUpdate, StoredRequest,
};

use super::{DataStore, MemoryStore};

pub const DEFAULT_STORE_FILE: &str = "apibench-data.json";

/// JSON-file backed store. The whole file is rewritten after every change.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let inner = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading store {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing store {}", path.display()))?
        } else {
            MemoryStore::new()
        };
        debug!(path = %path.display(), "opened store");
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, store: &MemoryStore) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating store directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(store).context("serializing store")?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, contents)
            .with_context(|| format!("writing store {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("replacing store {}", self.path.display()))?;
        Ok(())
    }

    /// Applies `change` to a copy and keeps it only once it is on disk.
    fn mutate<T>(&mut self, change: impl FnOnce(&mut MemoryStore) -> Result<T>) -> Result<T> {
        let mut staged = self.inner.clone();
        let value = change(&mut staged)?;
        self.persist(&staged)?;
        self.inner = staged;
        Ok(value)
    }
}

impl DataStore for FileStore {
    fn create_request(&mut self, request: NewRequest) -> Result<StoredRequest> {
        self.mutate(|store| store.create_request(request))
    }

    fn request(&self, id: RecordId) -> Result<Option<StoredRequest>> {
        self.inner.request(id)
    }

    fn list_requests(&self) -> Result<Vec<StoredRequest>> {
        self.inner.list_requests()
    }

    fn update_request(&mut self, id: RecordId, update: RequestUpdate) -> Result<StoredRequest> {
        self.mutate(|store| store.update_request(id, update))
    }

    fn delete_request(&mut self, id: RecordId) -> Result<()> {
        self.mutate(|store| store.delete_request(id))
    }

    fn create_collection(
        &mut self,
        name: String,
        description: Option<String>,
    ) -> Result<Collection> {
        self.mutate(|store| store.create_collection(name, description))
    }

    fn collection(&self, id: RecordId) -> Result<Option<Collection>> {
        self.inner.collection(id)
    }

    fn list_collections(&self) -> Result<Vec<Collection>> {
        self.inner.list_collections()
    }

    fn collection_requests(&self, id: RecordId) -> Result<Vec<StoredRequest>> {
        self.inner.collection_requests(id)
    }

    fn update_collection(
        &mut self,
        id: RecordId,
        update: CollectionUpdate,
    ) -> Result<Collection> {
        self.mutate(|store| store.update_collection(id, update))
    }

    fn delete_collection(&mut self, id: RecordId) -> Result<()> {
        self.mutate(|store| store.delete_collection(id))
    }

    fn create_environment(&mut self, name: String, variables: EnvMap) -> Result<Environment> {
        self.mutate(|store| store.create_environment(name, variables))
    }

    fn environment(&self, id: RecordId) -> Result<Option<Environment>> {
        self.inner.environment(id)
    }

    fn find_environment(&self, name: &str) -> Result<Option<Environment>> {
        self.inner.find_environment(name)
    }

    fn list_environments(&self) -> Result<Vec<Environment>> {
        self.inner.list_environments()
    }

    fn update_environment(
        &mut self,
        id: RecordId,
        update: EnvironmentUpdate,
    ) -> Result<Environment> {
        self.mutate(|store| store.update_environment(id, update))
    }

    fn delete_environment(&mut self, id: RecordId) -> Result<()> {
        self.mutate(|store| store.delete_environment(id))
    }

    fn append_history(
        &mut self,
        request: RequestTemplate,
        response: ExecutionSuccess,
        created_at: DateTime<Utc>,
    ) -> Result<HistoryEntry> {
        self.mutate(|store| store.append_history(request, response, created_at))
    }

    fn history_entry(&self, id: RecordId) -> Result<Option<HistoryEntry>> {
        self.inner.history_entry(id)
    }

    fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        self.inner.list_history()
    }

    fn delete_history(&mut self, id: RecordId) -> Result<()> {
        self.mutate(|store| store.delete_history(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ResponseData;
    use crate::model::RequestBody;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn open_starts_empty_when_file_missing() -> Result<()> {
        let temp = tempdir()?;
        let store = FileStore::open(temp.path().join("data.json"))?;
        assert!(store.list_requests()?.is_empty());
        assert!(!store.path().exists());
        Ok(())
    }

    #[test]
    fn records_survive_reopen() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("nested").join("data.json");

        let mut store = FileStore::open(&path)?;
        let collection = store.create_collection("Users".to_string(), None)?;
        let request = store.create_request(NewRequest {
            name: Some("Create user".to_string()),
            template: RequestTemplate::new("POST", "{{host}}/users")
                .header("Accept", "application/json")
                .body(json!({"name": "ada"})),
            collection_id: Some(collection.id),
        })?;
        let environment = store.create_environment(
            "dev".to_string(),
            EnvMap::from([("host".to_string(), "http://localhost:8080".to_string())]),
        )?;
        let entry = store.append_history(
            request.template.clone(),
            ExecutionSuccess {
                status: 201,
                headers: BTreeMap::from([("x-id".to_string(), "1".to_string())]),
                data: ResponseData::Text("created".to_string()),
                duration: 0.042,
            },
            Utc::now(),
        )?;

        let reopened = FileStore::open(&path)?;
        assert_eq!(reopened.request(request.id)?, Some(request.clone()));
        assert_eq!(reopened.collection(collection.id)?, Some(collection));
        assert_eq!(reopened.environment(environment.id)?, Some(environment));
        assert_eq!(reopened.history_entry(entry.id)?, Some(entry));
        assert_eq!(
            reopened.request(request.id)?.unwrap().template.body,
            Some(RequestBody::Json(json!({"name": "ada"})))
        );
        assert!(!path.with_extension("json.tmp").exists());
        Ok(())
    }

    #[test]
    fn ids_continue_after_reopen() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("data.json");

        let mut store = FileStore::open(&path)?;
        let first = store.create_environment("a".to_string(), EnvMap::new())?;
        store.delete_environment(first.id)?;

        let mut reopened = FileStore::open(&path)?;
        let second = reopened.create_environment("b".to_string(), EnvMap::new())?;
        assert_eq!(second.id, first.id + 1);
        Ok(())
    }

    #[test]
    fn open_reports_corrupt_files() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("data.json");
        fs::write(&path, "{not json")?;

        let err = FileStore::open(&path).unwrap_err();
        assert!(err.to_string().contains("parsing store"));
        Ok(())
    }

    #[test]
    fn failed_write_leaves_store_unchanged() -> Result<()> {
        let temp = tempdir()?;
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "not a directory")?;

        let mut store = FileStore::open(blocker.join("data.json"))?;
        let err = store
            .create_environment("dev".to_string(), EnvMap::new())
            .unwrap_err();

        assert!(err.to_string().contains("creating store directory"), "{err:#}");
        assert!(store.list_environments()?.is_empty());
        Ok(())
    }
}
