// Configuration for the styling pipeline

use super::types::{AnalysisMode, Stage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "atelier.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AtelierConfig {
    #[serde(default)]
    pub gemini: GeminiSettings,

    #[serde(default)]
    pub models: ModelTable,

    #[serde(default)]
    pub timeouts: StageTimeouts,

    #[serde(default)]
    pub request_log: RequestLogSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Usually supplied through `GOOGLE_API_KEY` instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Model identifiers for every stage of one mode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageModels {
    pub vision: String,
    pub trends: String,
    pub advice: String,
    #[serde(default = "default_image_model")]
    pub generation: String,
}

impl StageModels {
    pub fn for_stage(&self, stage: Stage) -> &str {
        match stage {
            Stage::Vision => &self.vision,
            Stage::Trends => &self.trends,
            Stage::Advice => &self.advice,
            Stage::Generation => &self.generation,
        }
    }
}

/// Mode to per-stage model lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelTable {
    #[serde(default = "default_quick_models")]
    pub quick: StageModels,

    #[serde(default = "default_deep_models")]
    pub deep: StageModels,
}

impl ModelTable {
    pub fn for_mode(&self, mode: AnalysisMode) -> &StageModels {
        match mode {
            AnalysisMode::Quick => &self.quick,
            AnalysisMode::Deep => &self.deep,
        }
    }

    pub fn model(&self, mode: AnalysisMode, stage: Stage) -> &str {
        self.for_mode(mode).for_stage(stage)
    }
}

/// Upper bound on each agent call, in seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageTimeouts {
    #[serde(default = "default_vision_timeout")]
    pub vision_secs: u64,

    #[serde(default = "default_trends_timeout")]
    pub trends_secs: u64,

    #[serde(default = "default_advice_timeout")]
    pub advice_secs: u64,

    #[serde(default = "default_generation_timeout")]
    pub generation_secs: u64,
}

impl StageTimeouts {
    /// Same limit for every stage
    pub fn uniform(limit: Duration) -> Self {
        let secs = limit.as_secs().max(1);
        Self {
            vision_secs: secs,
            trends_secs: secs,
            advice_secs: secs,
            generation_secs: secs,
        }
    }

    pub fn for_stage(&self, stage: Stage) -> Duration {
        Duration::from_secs(match stage {
            Stage::Vision => self.vision_secs,
            Stage::Trends => self.trends_secs,
            Stage::Advice => self.advice_secs,
            Stage::Generation => self.generation_secs,
        })
    }

    pub fn longest(&self) -> Duration {
        [Stage::Vision, Stage::Trends, Stage::Advice, Stage::Generation]
            .into_iter()
            .map(|stage| self.for_stage(stage))
            .max()
            .unwrap_or_default()
    }

    /// Worst-case wall time of a full run
    pub fn total(&self) -> Duration {
        [Stage::Vision, Stage::Trends, Stage::Advice, Stage::Generation]
            .into_iter()
            .map(|stage| self.for_stage(stage))
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestLogSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Append JSON lines here; logs through tracing when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_endpoint() -> String {
    gemini::DEFAULT_ENDPOINT.to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_quick_models() -> StageModels {
    StageModels {
        vision: "gemini-2.5-flash".to_string(),
        trends: "gemini-2.5-flash".to_string(),
        advice: "gemini-2.5-flash".to_string(),
        generation: default_image_model(),
    }
}

fn default_deep_models() -> StageModels {
    StageModels {
        vision: "gemini-2.5-pro".to_string(),
        trends: "gemini-2.5-pro".to_string(),
        advice: "gemini-2.5-pro".to_string(),
        generation: default_image_model(),
    }
}

fn default_vision_timeout() -> u64 {
    60
}

fn default_trends_timeout() -> u64 {
    45
}

fn default_advice_timeout() -> u64 {
    60
}

fn default_generation_timeout() -> u64 {
    90
}

fn default_true() -> bool {
    true
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
        }
    }
}

impl Default for ModelTable {
    fn default() -> Self {
        Self {
            quick: default_quick_models(),
            deep: default_deep_models(),
        }
    }
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            vision_secs: default_vision_timeout(),
            trends_secs: default_trends_timeout(),
            advice_secs: default_advice_timeout(),
            generation_secs: default_generation_timeout(),
        }
    }
}

impl Default for RequestLogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl AtelierConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Explicit path, then discovered file, then defaults; environment applied last
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit.map(Path::to_path_buf).or_else(find_config) {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                tracing::info!("No {} found, using default config", CONFIG_FILE);
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override settings from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GOOGLE_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Some(endpoint) = non_empty("GEMINI_ENDPOINT") {
            self.gemini.endpoint = endpoint;
        }
        if let Some(bind) = non_empty("ATELIER_BIND") {
            self.server.bind = bind;
        }
    }
}

fn find_config() -> Option<PathBuf> {
    // Try current directory first
    let local_config = PathBuf::from(CONFIG_FILE);
    if local_config.exists() {
        return Some(local_config);
    }

    let user_config = dirs::config_dir()?.join("atelier").join(CONFIG_FILE);
    user_config.exists().then_some(user_config)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}
