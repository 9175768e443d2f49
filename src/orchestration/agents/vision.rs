// Vision agent - extracts outfit features from the uploaded photo

use super::{AgentError, VisionAnalyst, VisionInput};
use crate::orchestration::config::ModelTable;
use crate::orchestration::types::{Stage, VisualAnalysis};
use async_trait::async_trait;
use gemini::{GeminiClient, GenerateContentRequest, GenerationConfig, Part};
use std::sync::Arc;

const VISION_PROMPT: &str = r#"You are a fashion analyst. Study the outfit in this photo.

Return a JSON object with exactly these string fields:
{
  "gender_style": "Gender presentation: masculine, feminine, unisex, or non-binary",
  "cut": "Detailed description of cut and silhouette",
  "color": "Dominant and accent colors",
  "fabric": "Fabric type and texture",
  "occasion": "Suitable occasions for this outfit"
}

Every field must be filled in. Respond ONLY with valid JSON, no other text."#;

/// Gemini multimodal analysis in JSON mode
pub struct GeminiVisionAnalyst {
    client: Arc<GeminiClient>,
    models: ModelTable,
}

impl GeminiVisionAnalyst {
    pub fn new(client: Arc<GeminiClient>, models: ModelTable) -> Self {
        Self { client, models }
    }

    fn build_request(input: &VisionInput<'_>) -> GenerateContentRequest {
        let prompt = format!("{}\n\nThe wearer asked: {}", VISION_PROMPT, input.query);
        GenerateContentRequest::user(vec![
            Part::text(prompt),
            Part::inline(input.image_type.mime_type(), input.image),
        ])
        .with_config(GenerationConfig::json())
    }
}

#[async_trait]
impl VisionAnalyst for GeminiVisionAnalyst {
    async fn analyze(&self, input: VisionInput<'_>) -> Result<VisualAnalysis, AgentError> {
        let model = self.models.model(input.mode, Stage::Vision);
        tracing::debug!(model, bytes = input.image.len(), "Requesting image analysis");

        let text = self
            .client
            .generate_text(model, &Self::build_request(&input))
            .await?;

        parse_visual_analysis(&text)
    }
}

/// Parse the model's JSON answer, tolerating a surrounding code fence
pub(crate) fn parse_visual_analysis(text: &str) -> Result<VisualAnalysis, AgentError> {
    let body = strip_code_fence(text);
    let analysis: VisualAnalysis = serde_json::from_str(body)
        .map_err(|e| AgentError::MalformedOutput(format!("visual analysis is not valid JSON: {}", e)))?;

    let missing = analysis.missing_fields();
    if !missing.is_empty() {
        return Err(AgentError::MalformedOutput(format!(
            "visual analysis is missing {}",
            missing.join(", ")
        )));
    }

    Ok(VisualAnalysis {
        gender_style: analysis.gender_style.trim().to_string(),
        cut: analysis.cut.trim().to_string(),
        color: analysis.color.trim().to_string(),
        fabric: analysis.fabric.trim().to_string(),
        occasion: analysis.occasion.trim().to_string(),
    })
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Drop an info string such as `json`, with or without a newline after it
    match rest.find(['{', '[']) {
        Some(start) => rest[start..].trim(),
        None => rest.trim(),
    }
}
