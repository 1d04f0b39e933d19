use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Adapter configuration.
///
/// ```toml
/// root_ref = "refs/heads/main"
///
/// [capabilities]
/// sort = false
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Revision queried when a request does not name one.
    pub root_ref: String,
    /// Push-down toggles; anything switched off is rejected at translation.
    pub capabilities: CapabilityToggles,
}

/// Push-down switches. All on by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityToggles {
    pub filter: bool,
    pub sort: bool,
    pub limit: bool,
    pub offset: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            root_ref: "HEAD".into(),
            capabilities: CapabilityToggles::default(),
        }
    }
}

impl Default for CapabilityToggles {
    fn default() -> Self {
        Self {
            filter: true,
            sort: true,
            limit: true,
            offset: true,
        }
    }
}

impl AdapterConfig {
    pub fn from_toml_str(content: &str) -> QueryResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| QueryError::Config(e.to_string()))?;
        if config.root_ref.trim().is_empty() {
            return Err(QueryError::Config("root_ref must not be empty".into()));
        }
        Ok(config)
    }

    /// Read a TOML file. An empty file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| QueryError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), root_ref = %config.root_ref, "loaded adapter config");
        Ok(config)
    }
}
