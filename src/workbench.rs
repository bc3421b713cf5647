use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::Utc;
use tracing::{debug, warn};

use crate::env::EnvMap;
use crate::executor::{execute, ExecutionResult};
use crate::model::{HistoryEntry, RecordId, RequestTemplate};
use crate::store::DataStore;

/// Outcome of [`Workbench::execute`]: the result plus the history entry
/// written for it, if any.
#[derive(Debug, Clone)]
pub struct WorkbenchRun {
    pub result: ExecutionResult,
    pub history: Option<HistoryEntry>,
}

/// Ties the executor to a data store: resolves environments before a run
/// and records history after a successful one.
///
/// The store lock is held only around individual store calls, never across
/// the network exchange, so one workbench can serve many executions at once.
pub struct Workbench<S> {
    store: Mutex<S>,
}

impl<S: DataStore> Workbench<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Locks the store. Do not hold the guard across an `.await`.
    pub fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.store
            .get_mut()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    pub fn into_store(self) -> S {
        self.store
            .into_inner()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    /// Variables of `environment_id`; unknown or absent ids give an empty map.
    pub fn resolve_variables(&self, environment_id: Option<RecordId>) -> Result<EnvMap> {
        let Some(id) = environment_id else {
            return Ok(EnvMap::new());
        };
        match self.store().environment(id)? {
            Some(environment) => {
                debug!(id, name = %environment.name, "using environment");
                Ok(environment.variables)
            }
            None => {
                warn!(id, "environment not found, executing without variables");
                Ok(EnvMap::new())
            }
        }
    }

    /// Executes `template` and appends a history entry when it succeeds.
    ///
    /// Execution failures are part of the returned result; only store
    /// errors surface as `Err`.
    pub async fn execute(
        &self,
        template: &RequestTemplate,
        environment_id: Option<RecordId>,
    ) -> Result<WorkbenchRun> {
        let vars = self.resolve_variables(environment_id)?;
        let result = execute(template, &vars).await;

        let history = match result.success() {
            Some(success) => Some(self.store().append_history(
                template.clone(),
                success.clone(),
                Utc::now(),
            )?),
            None => None,
        };

        Ok(WorkbenchRun { result, history })
    }

    /// Executes a stored request by id.
    pub async fn run_request(
        &self,
        request_id: RecordId,
        environment_id: Option<RecordId>,
    ) -> Result<WorkbenchRun> {
        let stored = self
            .store()
            .request(request_id)?
            .ok_or_else(|| anyhow!("request {request_id} not found"))?;
        self.execute(&stored.template, environment_id).await
    }
}
