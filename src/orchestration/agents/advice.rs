// Advisor agent - synthesizes styling advice from whatever upstream data exists

use super::{AdviceInput, AgentError, Advisor};
use crate::orchestration::config::ModelTable;
use crate::orchestration::types::Stage;
use async_trait::async_trait;
use gemini::{GeminiClient, GenerateContentRequest, GenerationConfig, Part};
use std::sync::Arc;

pub struct GeminiAdvisor {
    client: Arc<GeminiClient>,
    models: ModelTable,
}

impl GeminiAdvisor {
    pub fn new(client: Arc<GeminiClient>, models: ModelTable) -> Self {
        Self { client, models }
    }
}

pub(crate) fn build_advice_prompt(input: &AdviceInput<'_>) -> String {
    let (gender_style, cut, color, fabric, occasion) = match input.visual {
        Some(v) => (
            v.gender_style.as_str(),
            v.cut.as_str(),
            v.color.as_str(),
            v.fabric.as_str(),
            v.occasion.as_str(),
        ),
        None => ("unisex", "unknown", "unknown", "unknown", "casual"),
    };

    format!(
        r#"You are a personal stylist. Write personalized styling advice.

Wearer's request: {query}
Gender presentation: {gender_style}
Current outfit cut: {cut}
Current colors: {color}
Current fabric: {fabric}
Current occasion level: {occasion}
Relevant fashion trends: {trends}

The advice must match the gender presentation, address the request directly,
be practical and actionable, reference appropriate trends, and keep or
appropriately elevate the outfit's formality. Answer in 3-5 sentences."#,
        query = input.query,
        trends = input.trends,
    )
}

#[async_trait]
impl Advisor for GeminiAdvisor {
    async fn advise(&self, input: AdviceInput<'_>) -> Result<String, AgentError> {
        let model = self.models.model(input.mode, Stage::Advice);
        tracing::debug!(model, has_visual = input.visual.is_some(), "Requesting styling advice");

        let request = GenerateContentRequest::user(vec![Part::text(build_advice_prompt(&input))])
            .with_config(GenerationConfig {
                temperature: Some(0.7),
                ..Default::default()
            });

        Ok(self.client.generate_text(model, &request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::types::{AnalysisMode, NO_TREND_DATA, VisualAnalysis};

    #[test]
    fn test_prompt_with_full_context() {
        let visual = VisualAnalysis {
            gender_style: "feminine".into(),
            cut: "wrap dress".into(),
            color: "terracotta".into(),
            fabric: "silk".into(),
            occasion: "evening".into(),
        };
        let prompt = build_advice_prompt(&AdviceInput {
            query: "Gallery opening",
            visual: Some(&visual),
            trends: "**Quiet luxury**",
            mode: AnalysisMode::Deep,
        });
        assert!(prompt.contains("Current outfit cut: wrap dress"));
        assert!(prompt.contains("Relevant fashion trends: **Quiet luxury**"));
    }

    #[test]
    fn test_prompt_tolerates_missing_upstream() {
        let prompt = build_advice_prompt(&AdviceInput {
            query: "Job interview",
            visual: None,
            trends: NO_TREND_DATA,
            mode: AnalysisMode::Quick,
        });
        assert!(prompt.contains("Gender presentation: unisex"));
        assert!(prompt.contains("Current fabric: unknown"));
        assert!(prompt.contains("Current occasion level: casual"));
        assert!(prompt.contains(NO_TREND_DATA));
    }
}
