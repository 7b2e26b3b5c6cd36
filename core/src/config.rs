//! Per-client configuration store.
//!
//! # Design
//! Connection parameters live in a `ConfigStore` scoped to one
//! `SubstackClient` instance — never in a process-wide static — so two
//! clients mounted in the same process cannot see each other's credentials.
//! The executor re-reads the store on every request; nothing captures the
//! configuration at construction time.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Fallback API host used when no `api_url` is configured.
pub const DEFAULT_API_URL: &str = "https://api.substackapi.dev";

/// The three connection parameters read at request time.
///
/// Always fully populated: a partial update merges field-by-field and never
/// unsets a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub api_url: String,
    pub api_key: String,
    pub publication_url: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            publication_url: String::new(),
        }
    }
}

/// Partial configuration update. Only the fields present are applied;
/// omitted fields remain unchanged in the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_url: Option<String>,
}

/// Mutable holder for one `ConnectionConfig`. Cheap to clone; all clones
/// share the same state.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    inner: Arc<RwLock<ConnectionConfig>>,
}

impl ConfigStore {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Snapshot of the current configuration.
    pub fn get(&self) -> ConnectionConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merge the provided fields over the current state, field by field.
    /// No validation: malformed values surface only as HTTP failures at
    /// request time. Cannot fail.
    pub fn set(&self, update: ConfigUpdate) {
        let mut config = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(api_url) = update.api_url {
            config.api_url = api_url;
        }
        if let Some(api_key) = update.api_key {
            config.api_key = api_key;
        }
        if let Some(publication_url) = update.publication_url {
            config.publication_url = publication_url;
        }
    }
}
