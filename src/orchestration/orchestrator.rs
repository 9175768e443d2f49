// Orchestrator - runs the styling stages in order and fails forward

use super::agents::{
    AdviceInput, AgentError, AgentSet, GenerationInput, TrendInput, VisionInput,
    build_generation_prompt,
};
use super::config::{AtelierConfig, StageTimeouts};
use super::report::{self, AnalysisResponse};
use super::request_log::{self, RequestLog, RequestLogEntry, TracingRequestLog};
use super::schedule::{self, Step};
use super::state::{PipelineState, StageOutcome};
use super::types::{
    AgentLogEntry, LogLevel, NO_TREND_DATA, PipelineError, PipelineRequest, Stage, Upload,
    truncate_chars,
};
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Longest stage failure message kept in a response
const MAX_ERROR_CHARS: usize = 300;

/// Sequential pipeline over the four agents.
///
/// Holds no per-request state, so one instance can serve concurrent
/// requests behind an `Arc`.
pub struct Orchestrator {
    agents: AgentSet,
    timeouts: StageTimeouts,
    request_log: Arc<dyn RequestLog>,
}

impl Orchestrator {
    pub fn new(agents: AgentSet, timeouts: StageTimeouts) -> Self {
        Self {
            agents,
            timeouts,
            request_log: Arc::new(TracingRequestLog),
        }
    }

    pub fn with_request_log(mut self, request_log: Arc<dyn RequestLog>) -> Self {
        self.request_log = request_log;
        self
    }

    /// Gemini agents, timeouts and request log as configured
    pub fn from_config(config: &AtelierConfig) -> Result<Self, PipelineError> {
        let agents = AgentSet::gemini(config)?;
        Ok(Self::new(agents, config.timeouts.clone())
            .with_request_log(request_log::from_settings(&config.request_log)))
    }

    pub fn timeouts(&self) -> &StageTimeouts {
        &self.timeouts
    }

    /// Validate a raw upload, then run the pipeline on it
    pub async fn analyze(&self, upload: Upload) -> Result<AnalysisResponse, PipelineError> {
        let request = PipelineRequest::from_upload(upload).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected analysis request");
        })?;
        Ok(self.run(&request).await)
    }

    /// Run every scheduled stage; always produces a response
    pub async fn run(&self, request: &PipelineRequest) -> AnalysisResponse {
        self.log_request(request);

        tracing::info!(
            mode = %request.mode(),
            image_bytes = request.byte_len(),
            image_type = request.image_type().mime_type(),
            "Starting outfit analysis"
        );

        let mut state = PipelineState::new(request);
        for transition in schedule::transitions(request.mode()) {
            debug_assert_eq!(state.phase(), transition.from);
            match transition.step {
                Step::Invoke(Stage::Vision) => self.run_vision(request, &mut state).await,
                Step::Invoke(Stage::Trends) => self.run_trends(&mut state).await,
                Step::Invoke(Stage::Advice) => self.run_advice(&mut state).await,
                Step::Invoke(Stage::Generation) => self.run_generation(request, &mut state).await,
                Step::Skip(stage) => {
                    tracing::info!(stage = %stage, mode = %request.mode(), "Skipping stage");
                    state.skip(stage);
                }
            }
            state.advance(transition.to);
        }

        tracing::info!(
            stage_errors = state.stage_errors().len(),
            has_image = state.generation().completed().is_some(),
            "Analysis complete"
        );
        report::compile(state)
    }

    /// Fire-and-forget; a failed write never affects the run
    fn log_request(&self, request: &PipelineRequest) {
        let sink = self.request_log.clone();
        let entry = RequestLogEntry::new(request.query(), request.mode(), request.byte_len());
        tokio::spawn(async move {
            if let Err(e) = sink.record(&entry).await {
                tracing::debug!(error = %e, "Request log write failed");
            }
        });
    }

    async fn run_vision(&self, request: &PipelineRequest, state: &mut PipelineState) {
        started(state, Stage::Vision, "Analyzing outfit image");
        let input = VisionInput {
            image: request.image(),
            image_type: request.image_type(),
            query: request.query(),
            mode: request.mode(),
        };

        match self.guarded(Stage::Vision, self.agents.vision.analyze(input)).await {
            Ok(analysis) => {
                let details = serde_json::to_string(&analysis).unwrap_or_default();
                finished(state, Stage::Vision, "Visual analysis complete", details);
                state.record_vision(StageOutcome::Completed(analysis));
            }
            Err(failure) => {
                failed(state, Stage::Vision, "Visual analysis failed", &failure);
                state.record_vision(StageOutcome::Failed(failure.message));
            }
        }
    }

    async fn run_trends(&self, state: &mut PipelineState) {
        started(state, Stage::Trends, "Fetching relevant trends");
        let visual = state.visual_analysis();
        let input = TrendInput {
            query: state.query(),
            gender_style: visual.map(|v| v.gender_style.as_str()),
            occasion: visual.map(|v| v.occasion.as_str()),
            mode: state.mode(),
        };

        match self.guarded(Stage::Trends, self.agents.trends.summarize(input)).await {
            Ok(summary) => {
                finished(state, Stage::Trends, "Trend summary ready", summary.clone());
                state.record_trends(StageOutcome::Completed(summary));
            }
            Err(failure) => {
                failed(state, Stage::Trends, "Trend lookup failed", &failure);
                state.record_trends(StageOutcome::Failed(failure.message));
            }
        }
    }

    async fn run_advice(&self, state: &mut PipelineState) {
        started(state, Stage::Advice, "Synthesizing styling advice");
        let input = AdviceInput {
            query: state.query(),
            visual: state.visual_analysis(),
            trends: state.trend_summary().unwrap_or(NO_TREND_DATA),
            mode: state.mode(),
        };

        match self.guarded(Stage::Advice, self.agents.advisor.advise(input)).await {
            Ok(advice) => {
                finished(state, Stage::Advice, "Styling advice ready", advice.clone());
                state.record_advice(StageOutcome::Completed(advice));
            }
            Err(failure) => {
                failed(state, Stage::Advice, "Styling advice failed", &failure);
                state.record_advice(StageOutcome::Failed(failure.message));
            }
        }
    }

    async fn run_generation(&self, request: &PipelineRequest, state: &mut PipelineState) {
        let prompt = build_generation_prompt(
            state.final_report(),
            state.visual_analysis(),
            state.query(),
        );
        tracing::debug!(prompt_len = prompt.len(), "Built generation prompt");
        state.set_generation_prompt(prompt.clone());
        started(state, Stage::Generation, "Generating outfit image");

        let input = GenerationInput {
            prompt: &prompt,
            advice: state.final_report(),
            image: request.image(),
            image_type: request.image_type(),
            mode: state.mode(),
        };

        match self.guarded(Stage::Generation, self.agents.generator.generate(input)).await {
            Ok(url) => {
                let details = format!("{} chars", url.len());
                finished(state, Stage::Generation, "Outfit image generated", details);
                state.record_generation(StageOutcome::Completed(url));
            }
            Err(failure) => {
                failed(state, Stage::Generation, "Image generation failed", &failure);
                state.record_generation(StageOutcome::Failed(failure.message));
            }
        }
    }

    /// Timeout and panic boundary around one agent call. Every failure
    /// comes back as a sanitized message.
    async fn guarded<T, F>(&self, stage: Stage, call: F) -> Result<T, StageFailure>
    where
        F: Future<Output = Result<T, AgentError>>,
    {
        let limit = self.timeouts.for_stage(stage);
        let error = match tokio::time::timeout(limit, AssertUnwindSafe(call).catch_unwind()).await {
            Ok(Ok(Ok(value))) => return Ok(value),
            Ok(Ok(Err(e))) => e,
            Ok(Err(payload)) => AgentError::Panicked(panic_message(payload.as_ref())),
            Err(_) => AgentError::Timeout(limit),
        };
        Err(StageFailure {
            level: error.log_level(),
            message: sanitize(&error.to_string()),
        })
    }
}

/// A captured agent failure, ready to record
struct StageFailure {
    level: LogLevel,
    message: String,
}

fn started(state: &mut PipelineState, stage: Stage, message: &str) {
    tracing::info!(stage = %stage, "{}", message);
    state.log(AgentLogEntry::new(stage.agent_name(), message, LogLevel::Info));
}

fn finished(state: &mut PipelineState, stage: Stage, message: &str, details: String) {
    tracing::info!(stage = %stage, "{}", message);
    tracing::debug!(stage = %stage, output_len = details.len(), "Stage output");
    state.log(AgentLogEntry::new(stage.agent_name(), message, LogLevel::Info).with_details(details));
}

fn failed(state: &mut PipelineState, stage: Stage, message: &str, failure: &StageFailure) {
    tracing::warn!(stage = %stage, error = %failure.message, "{}", message);
    state.log(
        AgentLogEntry::new(stage.agent_name(), message, failure.level)
            .with_details(failure.message.as_str()),
    );
}

/// Collapse whitespace and cap the length
pub(crate) fn sanitize(message: &str) -> String {
    let collapsed = message.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, MAX_ERROR_CHARS)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
