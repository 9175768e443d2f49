// Result compiler - projects a finished run onto the response record

use super::state::{PipelineState, StageOutcome};
use super::types::{AgentLogEntry, AnalysisMode, StageError, VisualAnalysis};
use serde::{Deserialize, Serialize};

/// Response for one analysis run.
///
/// Every key is serialized even when empty; absent values become `null`.
/// `stage_errors` and `agent_logs` are diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResponse {
    pub visual_analysis: Option<VisualAnalysis>,
    pub trend_summary: Option<String>,
    pub final_report: Option<String>,
    pub generated_image_url: Option<String>,
    pub analysis_mode: AnalysisMode,
    pub generation_prompt: String,
    pub image_generation_error: Option<String>,
    #[serde(default)]
    pub stage_errors: Vec<StageError>,
    #[serde(default)]
    pub agent_logs: Vec<AgentLogEntry>,
}

/// Keys every serialized response carries
pub const RESPONSE_KEYS: [&str; 7] = [
    "visual_analysis",
    "trend_summary",
    "final_report",
    "generated_image_url",
    "analysis_mode",
    "generation_prompt",
    "image_generation_error",
];

/// Build the response from a terminal state
pub fn compile(state: PipelineState) -> AnalysisResponse {
    let parts = state.finish().into_parts();

    let (generated_image_url, image_generation_error) = match parts.generation {
        StageOutcome::Completed(url) => (Some(url), None),
        StageOutcome::Failed(message) => (None, Some(message)),
        StageOutcome::Pending | StageOutcome::Skipped => (None, None),
    };

    AnalysisResponse {
        visual_analysis: parts.vision.into_completed(),
        trend_summary: parts.trends.into_completed(),
        final_report: parts.advice.into_completed(),
        generated_image_url,
        analysis_mode: parts.mode,
        generation_prompt: parts.generation_prompt,
        image_generation_error,
        stage_errors: parts.stage_errors,
        agent_logs: parts.agent_logs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::types::{ImageType, PipelineRequest};

    fn state(mode: AnalysisMode) -> PipelineState {
        let request = PipelineRequest::new(vec![1, 2, 3], ImageType::Png, "Office party", mode).unwrap();
        PipelineState::new(&request)
    }

    #[test]
    fn test_empty_run_serializes_every_key() {
        let response = compile(state(AnalysisMode::Quick));
        let value = serde_json::to_value(&response).unwrap();
        let object = value.as_object().unwrap();

        for key in RESPONSE_KEYS {
            assert!(object.contains_key(key), "missing {}", key);
        }
        assert!(value["visual_analysis"].is_null());
        assert!(value["trend_summary"].is_null());
        assert!(value["generated_image_url"].is_null());
        assert!(value["image_generation_error"].is_null());
        assert_eq!(value["analysis_mode"], "quick");
        assert_eq!(value["generation_prompt"], "");
    }

    #[test]
    fn test_generation_outcome_is_exclusive() {
        let mut failed = state(AnalysisMode::Deep);
        failed.record_generation(StageOutcome::Failed("image generation returned no content".into()));
        let response = compile(failed);
        assert_eq!(response.generated_image_url, None);
        assert_eq!(
            response.image_generation_error.as_deref(),
            Some("image generation returned no content")
        );
        assert!(response.stage_errors.is_empty());

        let mut done = state(AnalysisMode::Deep);
        done.record_generation(StageOutcome::Completed("data:image/png;base64,AA==".into()));
        let response = compile(done);
        assert!(response.generated_image_url.is_some());
        assert!(response.image_generation_error.is_none());
    }

    #[test]
    fn test_failed_stages_project_to_null() {
        let mut state = state(AnalysisMode::Deep);
        state.record_vision(StageOutcome::Failed("boom".into()));
        state.record_trends(StageOutcome::Completed("Trends".into()));
        let response = compile(state);

        assert!(response.visual_analysis.is_none());
        assert_eq!(response.trend_summary.as_deref(), Some("Trends"));
        assert_eq!(response.stage_errors.len(), 1);
    }
}
