// Capability agents - one narrow trait per AI-calling stage

mod advice;
mod generation;
mod trends;
mod vision;

#[cfg(test)]
pub(crate) mod testing;

pub use advice::GeminiAdvisor;
pub use generation::{GeminiOutfitGenerator, build_generation_prompt};
pub use trends::GeminiTrendAnalyst;
pub use vision::GeminiVisionAnalyst;

use super::config::AtelierConfig;
use super::types::{AnalysisMode, ImageType, LogLevel, PipelineError, VisualAnalysis};
use async_trait::async_trait;
use gemini::GeminiClient;
use std::sync::Arc;
use std::time::Duration;

/// Input for the vision stage
#[derive(Debug, Clone, Copy)]
pub struct VisionInput<'a> {
    pub image: &'a [u8],
    pub image_type: ImageType,
    pub query: &'a str,
    pub mode: AnalysisMode,
}

/// Input for the trend stage; visual hints are absent when vision failed
#[derive(Debug, Clone, Copy)]
pub struct TrendInput<'a> {
    pub query: &'a str,
    pub gender_style: Option<&'a str>,
    pub occasion: Option<&'a str>,
    pub mode: AnalysisMode,
}

/// Input for the advice stage; `trends` carries a sentinel when no summary exists
#[derive(Debug, Clone, Copy)]
pub struct AdviceInput<'a> {
    pub query: &'a str,
    pub visual: Option<&'a VisualAnalysis>,
    pub trends: &'a str,
    pub mode: AnalysisMode,
}

/// Input for the generation stage
#[derive(Debug, Clone, Copy)]
pub struct GenerationInput<'a> {
    pub prompt: &'a str,
    pub advice: Option<&'a str>,
    pub image: &'a [u8],
    pub image_type: ImageType,
    pub mode: AnalysisMode,
}

/// Extracts visual features from the uploaded outfit
#[async_trait]
pub trait VisionAnalyst: Send + Sync {
    async fn analyze(&self, input: VisionInput<'_>) -> Result<VisualAnalysis, AgentError>;
}

/// Produces a trend summary for the outfit context
#[async_trait]
pub trait TrendAnalyst: Send + Sync {
    async fn summarize(&self, input: TrendInput<'_>) -> Result<String, AgentError>;
}

/// Writes the styling advice
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, input: AdviceInput<'_>) -> Result<String, AgentError>;
}

/// Renders the recommended outfit, returning an image URL
#[async_trait]
pub trait OutfitGenerator: Send + Sync {
    async fn generate(&self, input: GenerationInput<'_>) -> Result<String, AgentError>;
}

/// The four agents a pipeline runs with
#[derive(Clone)]
pub struct AgentSet {
    pub vision: Arc<dyn VisionAnalyst>,
    pub trends: Arc<dyn TrendAnalyst>,
    pub advisor: Arc<dyn Advisor>,
    pub generator: Arc<dyn OutfitGenerator>,
}

impl AgentSet {
    pub fn new(
        vision: Arc<dyn VisionAnalyst>,
        trends: Arc<dyn TrendAnalyst>,
        advisor: Arc<dyn Advisor>,
        generator: Arc<dyn OutfitGenerator>,
    ) -> Self {
        Self {
            vision,
            trends,
            advisor,
            generator,
        }
    }

    /// Gemini-backed agents sharing one HTTP client
    pub fn gemini(config: &AtelierConfig) -> Result<Self, PipelineError> {
        let api_key = config.gemini.api_key.clone().ok_or_else(|| {
            PipelineError::Config("GOOGLE_API_KEY is not set and gemini.api_key is empty".to_string())
        })?;

        // Per-stage timeouts are enforced by the orchestrator; this is only a
        // transport backstop
        let backstop = config.timeouts.longest() + Duration::from_secs(5);
        let client = GeminiClient::with_endpoint(api_key, config.gemini.endpoint.clone(), Some(backstop))
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let client = Arc::new(client);
        let models = config.models.clone();

        Ok(Self {
            vision: Arc::new(GeminiVisionAnalyst::new(client.clone(), models.clone())),
            trends: Arc::new(GeminiTrendAnalyst::new(client.clone(), models.clone())),
            advisor: Arc::new(GeminiAdvisor::new(client.clone(), models.clone())),
            generator: Arc::new(GeminiOutfitGenerator::new(client, models)),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Model error: {0}")]
    Model(#[from] gemini::GeminiError),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("{0}")]
    NoContent(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Agent panicked: {0}")]
    Panicked(String),
}

impl AgentError {
    /// Activity log level; a model that answered without content is only a warning
    pub fn log_level(&self) -> LogLevel {
        match self {
            AgentError::NoContent(_) => LogLevel::Warning,
            _ => LogLevel::Error,
        }
    }
}
