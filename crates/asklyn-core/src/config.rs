//! AskLyn configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AskLynError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskLynConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl AskLynConfig {
    /// Load config from `ASKLYN_CONFIG` or the default path (~/.asklyn/config.toml).
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var("ASKLYN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AskLynError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| AskLynError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the given path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AskLynError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the AskLyn home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".asklyn")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(origins) = std::env::var("ASKLYN_CORS_ORIGINS") {
            self.gateway.set_cors_origins(&origins);
        }
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.gateway.port == 0 {
            return Err(AskLynError::Config("gateway.port must be non-zero".into()));
        }
        if self.gateway.max_upload_bytes == 0 {
            return Err(AskLynError::Config(
                "gateway.max_upload_bytes must be non-zero".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(AskLynError::Config("retrieval.top_k must be at least 1".into()));
        }
        let min = self.retrieval.min_score;
        if !(0.0..1.0).contains(&min) {
            return Err(AskLynError::Config(format!(
                "retrieval.min_score must be in [0, 1), got {min}"
            )));
        }
        Ok(())
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Allowed CORS origins. Empty means same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 5000 }
fn default_max_upload_bytes() -> usize { 1_048_576 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_origins: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Replace the CORS origins from a comma-separated list.
    pub fn set_cors_origins(&mut self, raw: &str) {
        self.cors_origins = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }

    /// `host:port` string suitable for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Retrieval tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of documents returned per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Documents must score strictly above this to be returned.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

fn default_top_k() -> usize { 2 }
fn default_min_score() -> f64 { 0.1 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: default_min_score(),
        }
    }
}

/// Knowledge base seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Documents loaded into the store at startup, in order.
    #[serde(default = "default_seed_documents")]
    pub seed_documents: Vec<String>,
}

/// The four documents every fresh store starts with.
pub fn default_seed_documents() -> Vec<String> {
    vec![
        "AskLyn is an advanced AI assistant designed to help you with your tasks.",
        "The creator of AskLyn is an expert developer focusing on RAG applications.",
        "RAG stands for Retrieval-Augmented Generation, combining search with LLMs.",
        "You can upload text files to this knowledge base to expand AskLyn's mind.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            seed_documents: default_seed_documents(),
        }
    }
}

/// Assistant persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_persona")]
    pub name: String,
}

fn default_persona() -> String { "Lyn".into() }

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: default_persona(),
        }
    }
}
