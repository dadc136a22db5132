use crate::error::{PanelError, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_RAG_BASE_PATH: &str = "/Rag_Using_Page";
pub const DEFAULT_PAGES_BASE_PATH: &str = "/Wikipedia_Pages";

/// Configuration shared by both panels
#[derive(Debug, Clone)]
pub struct PanelsConfig {
    /// Origin of the web application, e.g. `http://127.0.0.1:5000`
    pub server_url: String,
    /// Prefix of the RAG endpoints
    pub rag_base_path: String,
    /// Prefix of the document browser endpoints
    pub pages_base_path: String,
    pub request_timeout: Option<Duration>,
}

impl Default for PanelsConfig {
    fn default() -> Self {
        PanelsConfig {
            server_url: DEFAULT_SERVER_URL.to_string(),
            rag_base_path: DEFAULT_RAG_BASE_PATH.to_string(),
            pages_base_path: DEFAULT_PAGES_BASE_PATH.to_string(),
            request_timeout: None,
        }
    }
}

impl PanelsConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PanelsConfig::default();

        let server_url = lookup("PANELS_SERVER_URL").unwrap_or(defaults.server_url);
        let rag_base_path = lookup("RAG_PANEL_BASE_PATH").unwrap_or(defaults.rag_base_path);
        let pages_base_path = lookup("PAGES_PANEL_BASE_PATH").unwrap_or(defaults.pages_base_path);

        let request_timeout = match lookup("PANELS_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    PanelError::Config(format!("PANELS_REQUEST_TIMEOUT_SECS is not a number: {raw}"))
                })?;
                if secs == 0 {
                    return Err(PanelError::Config(
                        "PANELS_REQUEST_TIMEOUT_SECS must be positive".to_string(),
                    ));
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(PanelsConfig {
            server_url,
            rag_base_path,
            pages_base_path,
            request_timeout,
        }
        .normalized())
    }

    /// Override the server origin (used by the command line flag)
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        self.server_url = self.server_url.trim_end_matches('/').to_string();
        self.rag_base_path = normalize_base_path(&self.rag_base_path);
        self.pages_base_path = normalize_base_path(&self.pages_base_path);
        self
    }
}

/// Leading slash, no trailing slash
fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
