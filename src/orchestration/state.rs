// Per-run pipeline state

use super::types::{
    AgentLogEntry, AnalysisMode, LogLevel, PipelineRequest, Stage, StageError, VisualAnalysis,
};

/// Where one stage ended up
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StageOutcome<T> {
    /// Not reached yet
    #[default]
    Pending,
    Completed(T),
    Failed(String),
    /// Deliberately not run for this mode
    Skipped,
}

impl<T> StageOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            StageOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_completed(self) -> Option<T> {
        match self {
            StageOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StageOutcome::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, StageOutcome::Pending)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped)
    }
}

/// Position of a run in the stage sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Init,
    VisionDone,
    TrendsDone,
    AdviceDone,
    GenerationDone,
    Compiled,
}

/// Mutable record threaded through one run and dropped when it ends
#[derive(Debug)]
pub struct PipelineState {
    mode: AnalysisMode,
    query: String,
    phase: Phase,
    vision: StageOutcome<VisualAnalysis>,
    trends: StageOutcome<String>,
    advice: StageOutcome<String>,
    generation: StageOutcome<String>,
    generation_prompt: String,
    stage_errors: Vec<StageError>,
    agent_logs: Vec<AgentLogEntry>,
}

impl PipelineState {
    pub fn new(request: &PipelineRequest) -> Self {
        Self {
            mode: request.mode(),
            query: request.query().to_string(),
            phase: Phase::Init,
            vision: StageOutcome::Pending,
            trends: StageOutcome::Pending,
            advice: StageOutcome::Pending,
            generation: StageOutcome::Pending,
            generation_prompt: String::new(),
            stage_errors: Vec::new(),
            agent_logs: Vec::new(),
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn vision(&self) -> &StageOutcome<VisualAnalysis> {
        &self.vision
    }

    pub fn trends(&self) -> &StageOutcome<String> {
        &self.trends
    }

    pub fn advice(&self) -> &StageOutcome<String> {
        &self.advice
    }

    pub fn generation(&self) -> &StageOutcome<String> {
        &self.generation
    }

    pub fn visual_analysis(&self) -> Option<&VisualAnalysis> {
        self.vision.completed()
    }

    pub fn trend_summary(&self) -> Option<&str> {
        self.trends.completed().map(String::as_str)
    }

    pub fn final_report(&self) -> Option<&str> {
        self.advice.completed().map(String::as_str)
    }

    pub fn stage_errors(&self) -> &[StageError] {
        &self.stage_errors
    }

    pub fn agent_logs(&self) -> &[AgentLogEntry] {
        &self.agent_logs
    }

    /// Move forward; phases never go backwards
    pub fn advance(&mut self, to: Phase) {
        debug_assert!(to > self.phase, "phase {:?} does not follow {:?}", to, self.phase);
        if to > self.phase {
            self.phase = to;
        }
    }

    pub fn log(&mut self, entry: AgentLogEntry) {
        self.agent_logs.push(entry);
    }

    pub fn set_generation_prompt(&mut self, prompt: String) {
        self.generation_prompt = prompt;
    }

    pub fn record_vision(&mut self, outcome: StageOutcome<VisualAnalysis>) {
        if let Some(message) = write_once(Stage::Vision, &mut self.vision, outcome) {
            self.push_error(Stage::Vision, message);
        }
    }

    pub fn record_trends(&mut self, outcome: StageOutcome<String>) {
        if let Some(message) = write_once(Stage::Trends, &mut self.trends, outcome) {
            self.push_error(Stage::Trends, message);
        }
    }

    pub fn record_advice(&mut self, outcome: StageOutcome<String>) {
        if let Some(message) = write_once(Stage::Advice, &mut self.advice, outcome) {
            self.push_error(Stage::Advice, message);
        }
    }

    /// Generation failures surface through `image_generation_error` only
    pub fn record_generation(&mut self, outcome: StageOutcome<String>) {
        write_once(Stage::Generation, &mut self.generation, outcome);
    }

    /// Mark a stage as intentionally not run; no error is recorded
    pub fn skip(&mut self, stage: Stage) {
        match stage {
            Stage::Vision => self.record_vision(StageOutcome::Skipped),
            Stage::Trends => self.record_trends(StageOutcome::Skipped),
            Stage::Advice => self.record_advice(StageOutcome::Skipped),
            Stage::Generation => self.record_generation(StageOutcome::Skipped),
        }
        self.log(AgentLogEntry::new(
            stage.agent_name(),
            format!("Skipped in {} mode", self.mode),
            LogLevel::Info,
        ));
    }

    fn push_error(&mut self, stage: Stage, message: String) {
        self.stage_errors.push(StageError { stage, message });
    }

    /// Terminal transition; hands the state to the result compiler
    pub(crate) fn finish(mut self) -> Self {
        self.advance(Phase::Compiled);
        self
    }

    pub(crate) fn into_parts(self) -> StateParts {
        StateParts {
            mode: self.mode,
            vision: self.vision,
            trends: self.trends,
            advice: self.advice,
            generation: self.generation,
            generation_prompt: self.generation_prompt,
            stage_errors: self.stage_errors,
            agent_logs: self.agent_logs,
        }
    }
}

/// Owned pieces of a finished state
pub(crate) struct StateParts {
    pub mode: AnalysisMode,
    pub vision: StageOutcome<VisualAnalysis>,
    pub trends: StageOutcome<String>,
    pub advice: StageOutcome<String>,
    pub generation: StageOutcome<String>,
    pub generation_prompt: String,
    pub stage_errors: Vec<StageError>,
    pub agent_logs: Vec<AgentLogEntry>,
}

/// Store `outcome` if the slot is still pending, returning the failure
/// message to record if it was one
fn write_once<T>(stage: Stage, slot: &mut StageOutcome<T>, outcome: StageOutcome<T>) -> Option<String> {
    if !slot.is_pending() {
        tracing::warn!(stage = %stage, "Ignoring second outcome for stage");
        return None;
    }
    let failure = outcome.error().map(str::to_string);
    *slot = outcome;
    failure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::types::ImageType;

    fn state(mode: AnalysisMode) -> PipelineState {
        let request = PipelineRequest::new(vec![0xFF, 0xD8], ImageType::Jpeg, "", mode).unwrap();
        PipelineState::new(&request)
    }

    fn analysis() -> VisualAnalysis {
        VisualAnalysis {
            gender_style: "masculine".into(),
            cut: "slim".into(),
            color: "charcoal".into(),
            fabric: "wool".into(),
            occasion: "business".into(),
        }
    }

    #[test]
    fn test_new_state_is_pending() {
        let state = state(AnalysisMode::Deep);
        assert_eq!(state.phase(), Phase::Init);
        assert!(state.vision().is_pending());
        assert!(state.generation().is_pending());
        assert!(state.stage_errors().is_empty());
        assert_eq!(state.query(), crate::orchestration::types::DEFAULT_QUERY);
    }

    #[test]
    fn test_failures_accumulate_in_order() {
        let mut state = state(AnalysisMode::Deep);
        state.record_vision(StageOutcome::Failed("vision down".into()));
        state.record_trends(StageOutcome::Completed("wide legs".into()));
        state.record_advice(StageOutcome::Failed("advice down".into()));

        let stages: Vec<Stage> = state.stage_errors().iter().map(|e| e.stage).collect();
        assert_eq!(stages, vec![Stage::Vision, Stage::Advice]);
        assert!(state.visual_analysis().is_none());
        assert_eq!(state.trend_summary(), Some("wide legs"));
    }

    #[test]
    fn test_outcomes_are_written_once() {
        let mut state = state(AnalysisMode::Deep);
        state.record_vision(StageOutcome::Completed(analysis()));
        state.record_vision(StageOutcome::Failed("late failure".into()));
        assert_eq!(state.visual_analysis(), Some(&analysis()));
        assert!(state.stage_errors().is_empty());
    }

    #[test]
    fn test_skip_records_no_error() {
        let mut state = state(AnalysisMode::Quick);
        state.skip(Stage::Trends);
        assert!(state.trends().is_skipped());
        assert!(state.stage_errors().is_empty());
        assert_eq!(state.agent_logs().len(), 1);
        assert_eq!(state.agent_logs()[0].agent, "trends");
    }

    #[test]
    fn test_generation_failure_stays_out_of_stage_errors() {
        let mut state = state(AnalysisMode::Quick);
        state.record_generation(StageOutcome::Failed("no content".into()));
        assert_eq!(state.generation().error(), Some("no content"));
        assert!(state.stage_errors().is_empty());
    }

    #[test]
    fn test_phase_advances_forward() {
        let mut state = state(AnalysisMode::Deep);
        state.advance(Phase::VisionDone);
        state.advance(Phase::TrendsDone);
        assert_eq!(state.phase(), Phase::TrendsDone);
        let state = state.finish();
        assert_eq!(state.phase(), Phase::Compiled);
    }
}
