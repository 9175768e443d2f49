// Generator agent - renders the recommended outfit onto the uploaded photo

use super::{AgentError, GenerationInput, OutfitGenerator};
use crate::orchestration::config::ModelTable;
use crate::orchestration::types::{Stage, VisualAnalysis, data_url};
use async_trait::async_trait;
use gemini::{GeminiClient, GenerateContentRequest, GenerationConfig, Part};
use std::sync::Arc;

const EDIT_INSTRUCTION: &str = "Edit this photo to show the recommended outfit. Keep the exact same \
person, face, expression, pose, body type and background. Only change the clothing.";

/// Carried in every brief so the edit never replaces the wearer
const IDENTITY_LINES: &str = "Keep the exact same person, face, facial expression, pose, and background. \
Only change the clothing.";

const NO_IMAGE: &str = "image generation returned no content";

/// Image-capable Gemini model editing the reference photo
pub struct GeminiOutfitGenerator {
    client: Arc<GeminiClient>,
    models: ModelTable,
}

impl GeminiOutfitGenerator {
    pub fn new(client: Arc<GeminiClient>, models: ModelTable) -> Self {
        Self { client, models }
    }

    fn build_request(input: &GenerationInput<'_>) -> GenerateContentRequest {
        let mut parts = vec![Part::text(EDIT_INSTRUCTION)];
        if let Some(advice) = input.advice.filter(|a| !a.trim().is_empty()) {
            parts.push(Part::text(format!("Styling guidance to apply:\n{}", advice)));
        }
        parts.push(Part::text(input.prompt));
        parts.push(Part::inline(input.image_type.mime_type(), input.image));

        GenerateContentRequest::user(parts).with_config(GenerationConfig {
            temperature: Some(0.7),
            candidate_count: Some(1),
            response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
            ..Default::default()
        })
    }
}

#[async_trait]
impl OutfitGenerator for GeminiOutfitGenerator {
    async fn generate(&self, input: GenerationInput<'_>) -> Result<String, AgentError> {
        let model = self.models.model(input.mode, Stage::Generation);
        tracing::debug!(model, prompt_len = input.prompt.len(), "Requesting outfit image");

        let response = self
            .client
            .generate_content(model, &Self::build_request(&input))
            .await?;

        match response.first_image()? {
            Some(image) => Ok(data_url(&image.mime_type, &image.data)),
            None => Err(AgentError::NoContent(NO_IMAGE.to_string())),
        }
    }
}

/// Editorial brief for the image model, built from the advice and visual features.
///
/// Every input is optional in practice: missing pieces fall back to neutral
/// professional defaults so a brief always exists.
pub fn build_generation_prompt(
    advice: Option<&str>,
    visual: Option<&VisualAnalysis>,
    query: &str,
) -> String {
    let lead = advice
        .and_then(first_sentence)
        .unwrap_or_else(|| "Professional outfit".to_string());

    let pick = |value: Option<&String>, default: &'static str| -> String {
        value
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
            .to_string()
    };
    let cut = pick(visual.map(|v| &v.cut), "modern tailored fit");
    let color = pick(visual.map(|v| &v.color), "neutral professional tones");
    let fabric = pick(visual.map(|v| &v.fabric), "high-quality materials");
    let occasion = pick(visual.map(|v| &v.occasion), "professional setting");

    let request = match query.trim() {
        "" => "Tailor to the user's stated preference",
        trimmed => trimmed,
    };

    format!(
        "Fashion editorial photograph. {lead}.\n\
         Silhouette: {cut}.\n\
         Palette: {color}.\n\
         Materials: {fabric}.\n\
         Setting: {occasion}.\n\
         Personal request: {request}.\n\
         {IDENTITY_LINES}\n\
         Photorealistic, natural lighting, full outfit visible."
    )
}

fn first_sentence(text: &str) -> Option<String> {
    let text = text.trim();
    let end = text
        .char_indices()
        .find(|(_, c)| matches!(c, '.' | '!' | '?' | '\n'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let sentence = text[..end].trim().trim_start_matches(['#', '*', '-', ' ']).trim();
    (!sentence.is_empty()).then(|| sentence.to_string())
}
