//! Process configuration: filesystem layout and typed settings.
//!
//! Settings come from an optional `config.toml` next to the project root,
//! with environment variables taking precedence for deployment-sensitive
//! values (API key, port, allowed origins).

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

/// Standardized reusable paths for the process.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub docs_dir: PathBuf,
    pub log_dir: PathBuf,
    pub index_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let data_dir = env::var("DOCQA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| project_root.clone());
        let docs_dir = data_dir.join("data").join("docs");
        let log_dir = data_dir.join("logs");
        let index_path = data_dir.join("vector_store.json");
        let config_path = project_root.join("config.toml");

        for dir in [&docs_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            docs_dir,
            log_dir,
            index_path,
            config_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("DOCQA_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("Cargo.toml").exists() {
        return manifest_dir;
    }

    env::current_dir().unwrap_or(manifest_dir)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub translation: TranslationSettings,
    pub retrieval: RetrievalSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Base URL of an OpenAI-compatible embedding server.
    pub base_url: String,
    pub model: String,
    /// Expected output dimensionality; startup fails if the backend disagrees.
    pub dimension: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1234".to_string(),
            model: "text-embedding-all-minilm-l6-v2".to_string(),
            dimension: 384,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Base URL of an OpenAI-compatible chat-completions server.
    pub base_url: String,
    pub model: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    /// Filled from the environment, never from the settings file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            max_retries: 3,
            timeout_secs: 30,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub enabled: bool,
    pub base_url: String,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://translate.googleapis.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of passages retrieved per query.
    pub default_k: usize,
    /// Whitespace-token budget for the extractive answer mode.
    pub max_answer_tokens: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            default_k: 5,
            max_answer_tokens: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            allowed_origins: vec![
                "http://127.0.0.1:8501".to_string(),
                "http://localhost:8501".to_string(),
            ],
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` if present, then apply env overrides.
    pub fn load(paths: &AppPaths) -> anyhow::Result<Self> {
        let mut settings = if paths.config_path.exists() {
            let raw = fs::read_to_string(&paths.config_path)?;
            toml::from_str(&raw)?
        } else {
            Settings::default()
        };

        if let Ok(url) = env::var("EMBEDDING_BASE_URL") {
            settings.embedding.base_url = url;
        }
        if let Ok(url) = env::var("GENERATION_BASE_URL") {
            settings.generation.base_url = url;
        }
        settings.generation.api_key = env::var("GROQ_API_KEY").ok();
        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                settings.server.port = port;
            }
        }
        if let Ok(origins) = env::var("ALLOWED_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if !origins.is_empty() {
                settings.server.allowed_origins = origins;
            }
        }

        Ok(settings)
    }
}
