// Stage transition table, keyed by analysis mode

use super::state::Phase;
use super::types::{AnalysisMode, Stage};

/// What happens to a stage on its transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Invoke(Stage),
    Skip(Stage),
}

impl Step {
    pub fn stage(&self) -> Stage {
        match self {
            Step::Invoke(stage) | Step::Skip(stage) => *stage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub step: Step,
    pub to: Phase,
}

const fn transition(from: Phase, step: Step, to: Phase) -> Transition {
    Transition { from, step, to }
}

const QUICK: [Transition; 4] = [
    transition(Phase::Init, Step::Invoke(Stage::Vision), Phase::VisionDone),
    transition(Phase::VisionDone, Step::Skip(Stage::Trends), Phase::TrendsDone),
    transition(Phase::TrendsDone, Step::Invoke(Stage::Advice), Phase::AdviceDone),
    transition(Phase::AdviceDone, Step::Invoke(Stage::Generation), Phase::GenerationDone),
];

const DEEP: [Transition; 4] = [
    transition(Phase::Init, Step::Invoke(Stage::Vision), Phase::VisionDone),
    transition(Phase::VisionDone, Step::Invoke(Stage::Trends), Phase::TrendsDone),
    transition(Phase::TrendsDone, Step::Invoke(Stage::Advice), Phase::AdviceDone),
    transition(Phase::AdviceDone, Step::Invoke(Stage::Generation), Phase::GenerationDone),
];

/// Ordered transitions a run in `mode` walks through before compilation
pub fn transitions(mode: AnalysisMode) -> &'static [Transition] {
    match mode {
        AnalysisMode::Quick => &QUICK,
        AnalysisMode::Deep => &DEEP,
    }
}

/// Stages that will actually call an agent in `mode`
pub fn invoked_stages(mode: AnalysisMode) -> Vec<Stage> {
    transitions(mode)
        .iter()
        .filter_map(|t| match t.step {
            Step::Invoke(stage) => Some(stage),
            Step::Skip(_) => None,
        })
        .collect()
}
