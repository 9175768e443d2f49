// Core types for the styling pipeline

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest accepted upload
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Query used when the caller leaves it blank
pub const DEFAULT_QUERY: &str = "What should I wear for a wedding?";

/// Handed to the advice agent in place of a trend summary it did not get
pub const NO_TREND_DATA: &str = "No trend data available.";

/// Request-level depth selector
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Faster models, trend stage skipped
    Quick,
    /// Full pipeline
    #[default]
    Deep,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Quick => "quick",
            AnalysisMode::Deep => "deep",
        }
    }

    /// Parse loosely, treating anything unrecognised as `Deep`
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for AnalysisMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(AnalysisMode::Quick),
            "deep" => Ok(AnalysisMode::Deep),
            other => Err(PipelineError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted upload formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageType {
    /// Detect image type from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageType::Png),
            "jpg" | "jpeg" => Some(ImageType::Jpeg),
            "gif" => Some(ImageType::Gif),
            "webp" => Some(ImageType::Webp),
            _ => None,
        }
    }

    /// Detect image type from a MIME type, ignoring parameters
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_lowercase();
        match essence.as_str() {
            "image/png" => Some(ImageType::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageType::Jpeg),
            "image/gif" => Some(ImageType::Gif),
            "image/webp" => Some(ImageType::Webp),
            _ => None,
        }
    }

    /// Detect image type from a filename like `look.JPG`
    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageType::Png => "image/png",
            ImageType::Jpeg => "image/jpeg",
            ImageType::Gif => "image/gif",
            ImageType::Webp => "image/webp",
        }
    }
}

/// Raw, unvalidated input as it arrives from a transport
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub image: Option<Vec<u8>>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
    pub query: Option<String>,
    pub mode: AnalysisMode,
}

impl Upload {
    pub fn new(mode: AnalysisMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_image(mut self, bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.image = Some(bytes);
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

/// Validated, immutable input to one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    image: Vec<u8>,
    image_type: ImageType,
    query: String,
    mode: AnalysisMode,
}

impl PipelineRequest {
    pub fn new(
        image: Vec<u8>,
        image_type: ImageType,
        query: impl Into<String>,
        mode: AnalysisMode,
    ) -> Result<Self, PipelineError> {
        if image.is_empty() {
            return Err(PipelineError::EmptyImage);
        }
        if image.len() > MAX_IMAGE_BYTES {
            return Err(PipelineError::ImageTooLarge {
                size: image.len(),
                max: MAX_IMAGE_BYTES,
            });
        }

        let query = query.into();
        let query = match query.trim() {
            "" => DEFAULT_QUERY.to_string(),
            trimmed => trimmed.to_string(),
        };

        Ok(Self {
            image,
            image_type,
            query,
            mode,
        })
    }

    /// Validate a raw upload; content type wins over the filename extension
    pub fn from_upload(upload: Upload) -> Result<Self, PipelineError> {
        let image = upload.image.ok_or(PipelineError::MissingImage)?;

        let image_type = upload
            .content_type
            .as_deref()
            .and_then(ImageType::from_mime)
            .or_else(|| upload.filename.as_deref().and_then(ImageType::from_filename))
            .ok_or_else(|| {
                PipelineError::UnsupportedImageType(
                    upload
                        .content_type
                        .or(upload.filename)
                        .unwrap_or_else(|| "unknown".to_string()),
                )
            })?;

        Self::new(image, image_type, upload.query.unwrap_or_default(), upload.mode)
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    pub fn byte_len(&self) -> usize {
        self.image.len()
    }

    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }
}

/// Visual features extracted from the uploaded outfit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisualAnalysis {
    pub gender_style: String,
    pub cut: String,
    pub color: String,
    pub fabric: String,
    pub occasion: String,
}

impl VisualAnalysis {
    /// Names of fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("gender_style", &self.gender_style),
            ("cut", &self.cut),
            ("color", &self.color),
            ("fabric", &self.fabric),
            ("occasion", &self.occasion),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// The four AI-calling steps
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Vision,
    Trends,
    Advice,
    Generation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Vision => "vision",
            Stage::Trends => "trends",
            Stage::Advice => "advice",
            Stage::Generation => "generation",
        }
    }

    /// Name the stage's agent goes by in activity logs
    pub fn agent_name(&self) -> &'static str {
        match self {
            Stage::Vision => "vision",
            Stage::Trends => "trends",
            Stage::Advice => "advisor",
            Stage::Generation => "generator",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded stage failure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// Maximum stored length of an activity log's details
const MAX_LOG_DETAILS: usize = 800;

/// Structured activity entry emitted on behalf of an agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentLogEntry {
    pub agent: String,
    pub message: String,
    pub level: LogLevel,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AgentLogEntry {
    pub fn new(agent: impl Into<String>, message: impl Into<String>, level: LogLevel) -> Self {
        Self {
            agent: agent.into(),
            message: message.into(),
            level,
            timestamp: chrono::Utc::now()
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(truncate_chars(&details.into(), MAX_LOG_DETAILS));
        self
    }
}

/// Errors that reject a run before any stage executes
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("No image file provided")]
    MissingImage,

    #[error("Image file is empty")]
    EmptyImage,

    #[error("File size {size} bytes exceeds the {max} byte limit")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Invalid file type '{0}'. Allowed: png, jpg, jpeg, gif, webp")]
    UnsupportedImageType(String),

    #[error("Unknown analysis mode: {0}")]
    InvalidMode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Cut `text` to at most `max` characters on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Encode bytes as a `data:` URL
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Split a base64 `data:` URL into its MIME type and decoded bytes
pub fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.as_bytes())
        .ok()?;
    Some((mime.to_string(), bytes))
}
