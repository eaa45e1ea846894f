//! Configuration for the health RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable naming an optional TOML config file
pub const CONFIG_ENV: &str = "HEALTH_RAG_CONFIG";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Question-answering server
    pub server: ServerConfig,
    /// Ingest/query gateway server
    pub gateway: GatewayConfig,
    /// Raw data sources
    pub data: DataConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Vector storage configuration
    pub vector_db: VectorDbConfig,
    /// Bulk daily-summary ingestion client
    pub daily: DailyIngestConfig,
}

impl RagConfig {
    /// Load configuration: defaults, then an optional TOML file, then environment overrides.
    ///
    /// When `path` is `None` the file named by `HEALTH_RAG_CONFIG` is used if set.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file; missing sections fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup`.
    ///
    /// The backend is settled first so `OLLAMA_URL` only reaches the LLM
    /// when the LLM is Ollama.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("LLM_BACKEND") {
            match backend.to_lowercase().as_str() {
                "ollama" => self.llm.backend = LlmBackend::Ollama,
                "openai" => self.llm.backend = LlmBackend::OpenAi,
                "perplexity" => self.llm.backend = LlmBackend::Perplexity,
                other => tracing::warn!("Ignoring unknown LLM_BACKEND '{}'", other),
            }
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.data.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.embeddings.base_url = url.clone();
            if self.llm.backend == LlmBackend::Ollama {
                self.llm.base_url = Some(url);
            }
        }
        if let Some(url) = lookup("WEAVIATE_URL") {
            self.vector_db.weaviate_url = url;
        }
        if let Some(url) = lookup("API_URL") {
            self.daily.api_url = url;
        }
    }

    /// Check invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be > 0".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be >= 1".to_string()));
        }
        if self.retrieval.preview_chars == 0 {
            return Err(Error::Config("retrieval.preview_chars must be >= 1".to_string()));
        }
        if self.embeddings.timeout_secs == 0 || self.llm.timeout_secs == 0 {
            return Err(Error::Config("provider timeouts must be > 0".to_string()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::Config("embeddings.batch_size must be > 0".to_string()));
        }
        if self.gateway.query_limit == 0 {
            return Err(Error::Config("gateway.query_limit must be >= 1".to_string()));
        }
        if self.daily.batch_size == 0 || self.daily.max_concurrent == 0 {
            return Err(Error::Config(
                "daily.batch_size and daily.max_concurrent must be >= 1".to_string(),
            ));
        }
        if self.daily.max_attempts == 0 || self.daily.timeout_secs == 0 {
            return Err(Error::Config(
                "daily.max_attempts and daily.timeout_secs must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Question-answering server configuration
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

/// Ingest/query gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Results returned per `/query`
    pub query_limit: usize,
    /// Backing store for the gateway
    pub store: StoreBackend,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            query_limit: 10,
            store: StoreBackend::Weaviate,
        }
    }
}

/// Gateway store selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Remote Weaviate instance
    #[default]
    Weaviate,
    /// Process-local cosine store
    Memory,
}

/// Raw data source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root directory holding `small/`, `medium/`, `large/` and `extra/`
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL serving the embedding model
    pub base_url: String,
    /// Embedding model, pinned for the lifetime of an index
    pub model: String,
    /// Embedding dimensions (384 for MiniLM)
    pub dimensions: usize,
    /// Texts per batch during index construction
    pub batch_size: usize,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient failures
    pub max_retries: u32,
    /// L2-normalize vectors before they reach the flat index
    pub normalize: bool,
    /// Maximum memoized embeddings
    pub cache_capacity: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            batch_size: 32,
            timeout_secs: 30,
            max_retries: 2,
            normalize: true,
            cache_capacity: 10_000,
        }
    }
}

impl EmbeddingConfig {
    /// Per-call deadline
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// LLM backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI chat completions
    #[serde(rename = "openai")]
    OpenAi,
    /// Perplexity (OpenAI-compatible API)
    Perplexity,
}

impl LlmBackend {
    /// Environment variable holding the API key, if the backend needs one
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            LlmBackend::Ollama => None,
            LlmBackend::OpenAi => Some("OPENAI_API_KEY"),
            LlmBackend::Perplexity => Some("PERPLEXITY_API_KEY"),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider
    pub backend: LlmBackend,
    /// Base URL override; each backend has its own default
    pub base_url: Option<String>,
    /// Generation model override; each backend has its own default
    pub model: Option<String>,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient failures
    pub max_retries: u32,
    /// Temperature for hypothetical documents
    pub hyde_temperature: f32,
    /// Token cap for hypothetical documents
    pub hyde_max_tokens: u32,
    /// Temperature for the self-evaluating prompt
    pub self_rag_temperature: f32,
    /// Temperature for the plain answer prompt
    pub answer_temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            base_url: None,
            model: None,
            timeout_secs: 120,
            max_retries: 2,
            hyde_temperature: 0.2,
            hyde_max_tokens: 500,
            self_rag_temperature: 0.1,
            answer_temperature: 0.2,
        }
    }
}

impl LlmConfig {
    /// Per-call deadline
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL for the configured backend
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.backend {
            LlmBackend::Ollama => "http://localhost:11434".to_string(),
            LlmBackend::OpenAi => "https://api.openai.com/v1".to_string(),
            LlmBackend::Perplexity => "https://api.perplexity.ai".to_string(),
        }
    }

    /// Generation model for the configured backend
    pub fn model_name(&self) -> String {
        if let Some(model) = &self.model {
            return model.clone();
        }
        match self.backend {
            LlmBackend::Ollama => "phi3".to_string(),
            LlmBackend::OpenAi => "gpt-4".to_string(),
            LlmBackend::Perplexity => "sonar".to_string(),
        }
    }

    /// Resolve the API key from the process environment
    pub fn api_key(&self) -> Result<Option<String>> {
        self.api_key_from(
            std::env::var("OPENAI_API_KEY").ok(),
            std::env::var("PERPLEXITY_API_KEY").ok(),
        )
    }

    /// Resolve the API key for remote backends.
    ///
    /// Exactly one of the OpenAI and Perplexity keys may be set, and it must
    /// belong to the selected backend. Ollama needs no key.
    pub fn api_key_from(
        &self,
        openai: Option<String>,
        perplexity: Option<String>,
    ) -> Result<Option<String>> {
        let openai = openai.filter(|k| !k.is_empty());
        let perplexity = perplexity.filter(|k| !k.is_empty());

        match self.backend {
            LlmBackend::Ollama => Ok(None),
            backend => {
                if openai.is_some() == perplexity.is_some() {
                    return Err(Error::Config(
                        "Exactly one of OPENAI_API_KEY or PERPLEXITY_API_KEY must be set".to_string(),
                    ));
                }
                let key = match backend {
                    LlmBackend::OpenAi => openai,
                    _ => perplexity,
                };
                key.map(Some).ok_or_else(|| {
                    Error::Config(format!(
                        "{} must be set for the {:?} backend",
                        backend.api_key_env().unwrap_or("API key"),
                        backend
                    ))
                })
            }
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question
    pub top_k: usize,
    /// Characters of chunk text exposed per source document
    pub preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            preview_chars: 200,
        }
    }
}

/// Vector storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Where the flat index is written after construction
    pub index_path: PathBuf,
    /// Weaviate base URL for the gateway
    pub weaviate_url: String,
    /// Weaviate class holding ingested sentences
    pub class_name: String,
    /// Attempts to reach the store at startup
    pub startup_retries: u32,
    /// Fixed delay between startup attempts, in seconds
    pub retry_delay_secs: u64,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("health_index.bin"),
            weaviate_url: "http://weaviate:8080".to_string(),
            class_name: "Sentence".to_string(),
            startup_retries: 10,
            retry_delay_secs: 2,
        }
    }
}

impl VectorDbConfig {
    /// Delay between startup attempts
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Special `api_url` that prints summaries instead of posting them
pub const PRINT_MODE: &str = "PRINT_MODE";

/// Bulk daily-summary ingestion client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyIngestConfig {
    /// Gateway `/ingest` endpoint, or `PRINT_MODE` for a dry run
    pub api_url: String,
    /// Dataset family under the data root holding the record arrays
    pub family: String,
    /// Summaries per batch
    pub batch_size: usize,
    /// Requests in flight at once within a batch
    pub max_concurrent: usize,
    /// Attempts per summary
    pub max_attempts: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DailyIngestConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/ingest".to_string(),
            family: "large".to_string(),
            batch_size: 100,
            max_concurrent: 10,
            max_attempts: 3,
            timeout_secs: 60,
        }
    }
}

impl DailyIngestConfig {
    /// Per-request deadline
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether summaries are printed rather than sent
    pub fn is_dry_run(&self) -> bool {
        self.api_url == PRINT_MODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.preview_chars, 200);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RagConfig::from_toml(
            r#"
            [chunking]
            chunk_size = 500

            [llm]
            backend = "openai"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.llm.backend, LlmBackend::OpenAi);
        assert_eq!(config.llm.model_name(), "gpt-4");
        assert_eq!(config.server.port, 8000);
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| pairs.get(key).cloned()
    }

    #[test]
    fn test_ollama_url_does_not_leak_to_remote_backend() {
        let mut config = RagConfig::default();
        config.apply_env_from(env(&[
            ("OLLAMA_URL", "http://ollama:11434"),
            ("LLM_BACKEND", "openai"),
        ]));

        assert_eq!(config.llm.backend, LlmBackend::OpenAi);
        assert_eq!(config.embeddings.base_url, "http://ollama:11434");
        assert_eq!(config.llm.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_ollama_url_reaches_ollama_llm() {
        let mut config = RagConfig::default();
        config.apply_env_from(env(&[
            ("OLLAMA_URL", "http://ollama:11434/"),
            ("LLM_BACKEND", "ollama"),
            ("API_URL", "PRINT_MODE"),
        ]));

        assert_eq!(config.llm.base_url(), "http://ollama:11434");
        assert!(config.daily.is_dry_run());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_exactly_one_api_key() {
        let mut llm = LlmConfig {
            backend: LlmBackend::OpenAi,
            ..Default::default()
        };

        assert!(llm.api_key_from(None, None).is_err());
        assert!(llm
            .api_key_from(Some("sk-a".into()), Some("pplx-b".into()))
            .is_err());
        assert_eq!(
            llm.api_key_from(Some("sk-a".into()), None).unwrap(),
            Some("sk-a".to_string())
        );

        // Key present but for the other backend
        llm.backend = LlmBackend::Perplexity;
        assert!(llm.api_key_from(Some("sk-a".into()), None).is_err());

        llm.backend = LlmBackend::Ollama;
        assert_eq!(llm.api_key_from(None, None).unwrap(), None);
    }
}
