use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SolaceError};

/// Top-level configuration for the Solace application.
///
/// Loaded from `~/.solace/config.toml` by default. Every section falls back to
/// its defaults when omitted, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolaceConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub risk: RiskConfig,
}

impl SolaceConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SolaceConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values that would make the retrieval or chat layers misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.corpus.chunk_size == 0 {
            return Err(SolaceError::Config(
                "corpus.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(SolaceError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(SolaceError::Config(
                "llm.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.chat.max_retained_messages < self.chat.history_window {
            return Err(SolaceError::Config(format!(
                "chat.max_retained_messages ({}) must be at least chat.history_window ({})",
                self.chat.max_retained_messages, self.chat.history_window
            )));
        }
        Ok(())
    }

    /// Resolve a configured path against the data directory.
    ///
    /// Absolute paths are returned unchanged; `~/` is expanded to the home
    /// directory; everything else is joined onto `general.data_dir`.
    pub fn resolve_path(&self, configured: &str) -> PathBuf {
        let expanded = expand_home(configured);
        if expanded.is_absolute() {
            return expanded;
        }
        expand_home(&self.general.data_dir).join(expanded)
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Base directory that relative corpus, index, and risk paths resolve against.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Document corpus and persisted index locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Directory of plain-text documents to ingest.
    pub docs_dir: String,
    /// Persisted embedding matrix.
    pub index_path: String,
    /// Persisted chunk list, row-aligned with the embedding matrix.
    pub chunks_path: String,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            docs_dir: "data/documents_txt".to_string(),
            index_path: "data/embeddings.json".to_string(),
            chunks_path: "data/docs.json".to_string(),
            chunk_size: 1000,
        }
    }
}

/// Which embedding backend to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Sentence-transformer ONNX model (all-MiniLM-L6-v2).
    #[default]
    Onnx,
    /// Deterministic hash vectors. Only useful for demos and tests.
    Hash,
}

/// Embedding model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// Directory holding `model.onnx` and `tokenizer.json`.
    pub model_dir: String,
    /// Expected embedding dimension.
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Onnx,
            model_dir: "models/all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
        }
    }
}

/// Per-turn retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved per dialogue turn.
    pub top_k: usize,
    /// Characters of each retrieved chunk passed to the generator.
    pub context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            context_chars: 1000,
        }
    }
}

/// Dialogue generator (chat-completions endpoint) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    pub endpoint: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            model: "openai/gpt-oss-20b".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 30,
            max_retries: 1,
        }
    }
}

/// How the session decides to surface the yes/no screening controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptSignal {
    /// Surface the controls only when the generated reply contains one of the
    /// suggestion phrases.
    #[default]
    Markers,
    /// Surface the controls whenever the cadence says a prompt is due, appending
    /// the canned suggestion if the reply left it out.
    Decision,
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Messages of history passed to the generator (5 user/bot pairs).
    pub history_window: usize,
    /// Messages retained in a session before the oldest are evicted.
    pub max_retained_messages: usize,
    pub prompt_signal: PromptSignal,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: 10,
            max_retained_messages: 200,
            prompt_signal: PromptSignal::Markers,
        }
    }
}

/// Risk-score side artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// File the overall risk level is written to once both screenings finish.
    pub output_path: String,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            output_path: "risk_score.txt".to_string(),
        }
    }
}
