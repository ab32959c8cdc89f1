//! Construction of the completion service and task store from config.

use crate::config::{AppConfig, Provider};
use crate::error::Result;
use inbox_domain::{CompletionService, TaskStore};
use inbox_llm::{LlmError, OllamaProvider, OpenAiCompatProvider};
use inbox_store::{MemoryTaskStore, SqliteTaskStore, StoreError};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Completion service selected at runtime.
pub type DynCompletion = dyn CompletionService<Error = LlmError>;

/// Task store selected at runtime.
pub type DynStore = dyn TaskStore<Error = StoreError>;

/// Build the configured completion service.
pub fn build_service(config: &AppConfig) -> Result<Arc<DynCompletion>> {
    let llm = &config.llm;
    let timeout = Duration::from_secs(llm.timeout_secs);

    let service: Arc<DynCompletion> = match llm.provider {
        Provider::Ollama => {
            let endpoint = llm
                .endpoint
                .as_deref()
                .unwrap_or(inbox_llm::ollama::DEFAULT_ENDPOINT);
            Arc::new(OllamaProvider::with_timeout(endpoint, &llm.model, timeout)?)
        }
        Provider::OpenaiCompat => {
            let endpoint = llm.endpoint.as_deref().ok_or_else(|| {
                LlmError::Configuration("llm.endpoint is required for openai_compat".to_string())
            })?;
            let mut provider = OpenAiCompatProvider::with_timeout(
                endpoint,
                llm.api_key.clone(),
                &llm.model,
                timeout,
            )?;
            if let Some(temperature) = llm.temperature {
                provider = provider.with_temperature(temperature);
            }
            Arc::new(provider)
        }
    };

    info!(backend = service.name(), model = %llm.model, "Completion service ready");
    Ok(service)
}

/// Open the SQLite store, creating its directory when needed.
pub fn open_store(config: &AppConfig) -> Result<Arc<SqliteTaskStore>> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    info!(path = %path.display(), "Opening task store");
    Ok(Arc::new(SqliteTaskStore::new(&path)?))
}

/// The store a batch writes to: in memory for dry runs, SQLite otherwise.
pub fn build_store(config: &AppConfig, dry_run: bool) -> Result<Arc<DynStore>> {
    if dry_run {
        info!("Dry run: tasks are kept in memory");
        return Ok(Arc::new(MemoryTaskStore::new()));
    }
    let store: Arc<DynStore> = open_store(config)?;
    Ok(store)
}
