// Trend agent - current fashion trends matched to the outfit context

use super::{AgentError, TrendAnalyst, TrendInput};
use crate::orchestration::config::ModelTable;
use crate::orchestration::types::Stage;
use async_trait::async_trait;
use gemini::{GeminiClient, GenerateContentRequest, GenerationConfig, Part};
use std::sync::Arc;

pub struct GeminiTrendAnalyst {
    client: Arc<GeminiClient>,
    models: ModelTable,
}

impl GeminiTrendAnalyst {
    pub fn new(client: Arc<GeminiClient>, models: ModelTable) -> Self {
        Self { client, models }
    }
}

/// Prompt for the trend summary; missing visual hints fall back to neutral defaults
pub(crate) fn build_trend_prompt(input: &TrendInput<'_>) -> String {
    let gender_style = input.gender_style.unwrap_or("unisex");
    let occasion = input.occasion.unwrap_or("casual");

    format!(
        r#"You are a fashion trend researcher. Summarize the fashion trends relevant to this outfit context.

Gender presentation: {gender_style}
Current occasion level: {occasion}
Wearer's styling goals: {query}

Trends must match the gender presentation, the formality level, the occasion type,
and the wearer's stated goals. Format the answer as a short markdown list of
3-5 trends, each with a bolded name and one sentence of explanation."#,
        query = input.query,
    )
}

#[async_trait]
impl TrendAnalyst for GeminiTrendAnalyst {
    async fn summarize(&self, input: TrendInput<'_>) -> Result<String, AgentError> {
        let model = self.models.model(input.mode, Stage::Trends);
        tracing::debug!(
            model,
            gender_style = input.gender_style.unwrap_or("unisex"),
            occasion = input.occasion.unwrap_or("casual"),
            "Requesting trend summary"
        );

        let request = GenerateContentRequest::user(vec![Part::text(build_trend_prompt(&input))])
            .with_config(GenerationConfig {
                temperature: Some(0.7),
                ..Default::default()
            });

        Ok(self.client.generate_text(model, &request).await?)
    }
}
