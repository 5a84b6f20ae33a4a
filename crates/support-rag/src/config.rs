//! Configuration for the support pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_FILE_ENV: &str = "SUPPORT_RAG_CONFIG";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding provider configuration
    pub embeddings: EmbeddingConfig,
    /// Generation provider configuration
    pub generation: GenerationConfig,
    /// Knowledge store location
    pub knowledge_store: KnowledgeStoreConfig,
    /// Retrieval parameters
    pub retrieval: RetrievalConfig,
    /// Retry and timeout policy applied to every stage
    pub retry: RetryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

/// Which HTTP API a provider talks to
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBackend {
    /// OpenAI-compatible REST API (bearer credential)
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl FromStr for ProviderBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(Error::config(format!("Unknown provider backend: {}", other))),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend serving the embedding model
    pub backend: ProviderBackend,
    /// Base URL of the backend API
    pub base_url: String,
    /// Model to use
    pub model: String,
    /// Embedding dimensions, must match the knowledge store
    pub dimensions: usize,
    /// Inputs longer than this (in characters) are truncated before embedding
    pub max_input_chars: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: ProviderBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 1536,
            max_input_chars: 8000,
            timeout_secs: 30,
        }
    }
}

/// Generation (chat completion) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Backend serving the generation model
    pub backend: ProviderBackend,
    /// Base URL of the backend API
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// API credential (OpenAI backend only)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Temperature for every stage
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: ProviderBackend::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            temperature: 0.3,
            timeout_secs: 60,
        }
    }
}

/// Knowledge store location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeStoreConfig {
    /// Connection string, `file://` URL or plain directory path
    pub url: String,
    /// Database identifier
    pub database: String,
    /// Collection identifier
    pub collection: String,
}

impl Default for KnowledgeStoreConfig {
    fn default() -> Self {
        Self {
            url: "file://./data".to_string(),
            database: "support_kb".to_string(),
            collection: "knowledge_base".to_string(),
        }
    }
}

impl KnowledgeStoreConfig {
    /// Path of the collection snapshot: `<url>/<database>/<collection>.json`
    pub fn snapshot_path(&self) -> Result<PathBuf> {
        let root = match self.url.split_once("://") {
            Some(("file", rest)) => rest,
            Some((scheme, _)) => {
                return Err(Error::config(format!(
                    "Unsupported knowledge store scheme: {}",
                    scheme
                )))
            }
            None => self.url.as_str(),
        };
        Ok(Path::new(root)
            .join(&self.database)
            .join(format!("{}.json", self.collection)))
    }
}

/// Retrieval parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum documents surfaced per query
    pub top_k: usize,
    /// Minimum cosine similarity for a document to be used
    pub similarity_threshold: f32,
    /// Per-document excerpt bound inside the drafting prompt
    pub max_excerpt_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            similarity_threshold: 0.3,
            max_excerpt_chars: 2000,
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per stage, including the first
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds
    pub initial_backoff_ms: u64,
    /// Upper bound on a single delay in milliseconds
    pub max_backoff_ms: u64,
    /// Backoff growth factor
    pub multiplier: f64,
    /// Elapsed-time budget per stage in seconds
    pub stage_timeout_secs: u64,
    /// Randomise delays by up to ±25%
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 4000,
            multiplier: 2.0,
            stage_timeout_secs: 30,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Elapsed-time budget per stage
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}

impl SupportConfig {
    /// Load configuration from defaults, an optional TOML file, `.env` and the environment
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(Error::config(format!("Failed to read .env: {}", e)));
            }
        }

        let mut config = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Override fields from environment-style variables
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| keys.iter().find_map(|k| lookup(k)).filter(|v| !v.is_empty());

        if let Some(v) = get(&["HOST"]) {
            self.server.host = v;
        }
        if let Some(v) = get(&["PORT"]) {
            self.server.port = parse_var("PORT", &v)?;
        }

        if let Some(v) = get(&["KNOWLEDGE_STORE_URL", "MONGODB_URL"]) {
            self.knowledge_store.url = v;
        }
        if let Some(v) = get(&["DATABASE_NAME"]) {
            self.knowledge_store.database = v;
        }
        if let Some(v) = get(&["COLLECTION_NAME"]) {
            self.knowledge_store.collection = v;
        }

        if let Some(v) = get(&["EMBEDDING_BACKEND"]) {
            self.embeddings.backend = v.parse()?;
        }
        if let Some(v) = get(&["EMBEDDING_BASE_URL"]) {
            self.embeddings.base_url = v;
        }
        if let Some(v) = get(&["EMBEDDING_MODEL"]) {
            self.embeddings.model = v;
        }
        if let Some(v) = get(&["EMBEDDING_DIMENSIONS"]) {
            self.embeddings.dimensions = parse_var("EMBEDDING_DIMENSIONS", &v)?;
        }

        if let Some(v) = get(&["GENERATION_BACKEND"]) {
            self.generation.backend = v.parse()?;
        }
        if let Some(v) = get(&["GENERATION_BASE_URL"]) {
            self.generation.base_url = v;
        }
        if let Some(v) = get(&["GENERATION_MODEL", "OPENAI_MODEL"]) {
            self.generation.model = v;
        }
        if let Some(v) = get(&["OPENAI_API_KEY"]) {
            self.generation.api_key = Some(v);
        }
        if let Some(v) = get(&["AGENT_TEMPERATURE"]) {
            self.generation.temperature = parse_var("AGENT_TEMPERATURE", &v)?;
        }

        if let Some(v) = get(&["TOP_K"]) {
            self.retrieval.top_k = parse_var("TOP_K", &v)?;
        }
        if let Some(v) = get(&["SIMILARITY_THRESHOLD"]) {
            self.retrieval.similarity_threshold = parse_var("SIMILARITY_THRESHOLD", &v)?;
        }

        if let Some(v) = get(&["RETRY_MAX_ATTEMPTS"]) {
            self.retry.max_attempts = parse_var("RETRY_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = get(&["RETRY_INITIAL_BACKOFF_MS"]) {
            self.retry.initial_backoff_ms = parse_var("RETRY_INITIAL_BACKOFF_MS", &v)?;
        }
        if let Some(v) = get(&["RETRY_MAX_BACKOFF_MS"]) {
            self.retry.max_backoff_ms = parse_var("RETRY_MAX_BACKOFF_MS", &v)?;
        }
        if let Some(v) = get(&["STAGE_TIMEOUT_SECS"]) {
            self.retry.stage_timeout_secs = parse_var("STAGE_TIMEOUT_SECS", &v)?;
        }

        Ok(())
    }

    /// Check value ranges and required credentials
    pub fn validate(&self) -> Result<()> {
        if self.knowledge_store.url.trim().is_empty() {
            return Err(Error::config("KNOWLEDGE_STORE_URL is required"));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("TOP_K must be a positive integer"));
        }
        if !(-1.0..=1.0).contains(&self.retrieval.similarity_threshold) {
            return Err(Error::config("SIMILARITY_THRESHOLD must be between -1 and 1"));
        }
        if self.generation.temperature.is_nan() || self.generation.temperature < 0.0 {
            return Err(Error::config("AGENT_TEMPERATURE must be zero or greater"));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::config("EMBEDDING_DIMENSIONS must be positive"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config("RETRY_MAX_ATTEMPTS must be at least 1"));
        }
        if self.retry.multiplier < 1.0 {
            return Err(Error::config("retry multiplier must be at least 1.0"));
        }
        if self.retry.max_backoff_ms < self.retry.initial_backoff_ms {
            return Err(Error::config(
                "RETRY_MAX_BACKOFF_MS must not be below RETRY_INITIAL_BACKOFF_MS",
            ));
        }
        if self.retry.stage_timeout_secs == 0 {
            return Err(Error::config("STAGE_TIMEOUT_SECS must be positive"));
        }
        if self.generation.backend == ProviderBackend::OpenAi
            && self.generation.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::config(
                "OPENAI_API_KEY is required for the openai generation backend",
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("Invalid value for {}: {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn with_key() -> SupportConfig {
        let mut config = SupportConfig::default();
        config.generation.api_key = Some("sk-test".to_string());
        config
    }

    #[test]
    fn test_defaults() {
        let config = SupportConfig::default();
        assert_eq!(config.retrieval.top_k, 3);
        assert!((config.retrieval.similarity_threshold - 0.3).abs() < f32::EPSILON);
        assert!((config.generation.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.embeddings.dimensions, 1536);
        assert_eq!(config.knowledge_store.database, "support_kb");
        assert_eq!(config.knowledge_store.collection, "knowledge_base");
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("TOP_K", "5"),
            ("SIMILARITY_THRESHOLD", "0.9"),
            ("AGENT_TEMPERATURE", "0.7"),
            ("MONGODB_URL", "/srv/kb"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("GENERATION_BACKEND", "ollama"),
        ]);
        let mut config = SupportConfig::default();
        config.apply_env(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.retrieval.top_k, 5);
        assert!((config.retrieval.similarity_threshold - 0.9).abs() < f32::EPSILON);
        assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.knowledge_store.url, "/srv/kb");
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.generation.backend, ProviderBackend::Ollama);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unparseable_env_is_config_error() {
        let vars = env(&[("TOP_K", "three")]);
        let mut config = SupportConfig::default();
        let err = config.apply_env(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = with_key();
        assert!(config.validate().is_ok());

        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = with_key();
        config.retrieval.similarity_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = with_key();
        config.retrieval.similarity_threshold = -1.0;
        assert!(config.validate().is_ok());

        let mut config = with_key();
        config.generation.temperature = -0.1;
        assert!(config.validate().is_err());

        let mut config = with_key();
        config.retry.stage_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = with_key();
        config.retry.initial_backoff_ms = 500;
        config.retry.max_backoff_ms = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_stage_timeout_from_env_is_rejected() {
        let vars = env(&[("STAGE_TIMEOUT_SECS", "0"), ("GENERATION_BACKEND", "ollama")]);
        let mut config = SupportConfig::default();
        config.apply_env(|k| vars.get(k).cloned()).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_openai_backend_requires_key() {
        let config = SupportConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_snapshot_path() {
        let store = KnowledgeStoreConfig::default();
        assert_eq!(
            store.snapshot_path().unwrap(),
            PathBuf::from("./data/support_kb/knowledge_base.json")
        );

        let store = KnowledgeStoreConfig {
            url: "mongodb://localhost:27017".to_string(),
            ..Default::default()
        };
        assert!(store.snapshot_path().is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("support.toml");
        std::fs::write(
            &path,
            "[retrieval]\ntop_k = 7\n\n[generation]\nbackend = \"ollama\"\nmodel = \"llama3.2\"\n",
        )
        .unwrap();

        let config = SupportConfig::from_file(&path).unwrap();
        assert_eq!(config.retrieval.top_k, 7);
        assert!((config.retrieval.similarity_threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.generation.backend, ProviderBackend::Ollama);
        assert_eq!(config.generation.model, "llama3.2");
    }
}
