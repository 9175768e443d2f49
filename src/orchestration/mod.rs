// Orchestration system - outfit analysis through a fixed chain of AI agents

pub mod agents;
pub mod config;
pub mod orchestrator;
pub mod report;
pub mod request_log;
pub mod schedule;
pub mod state;
pub mod types;

pub use agents::AgentSet;
pub use config::AtelierConfig;
pub use orchestrator::Orchestrator;
pub use report::AnalysisResponse;
pub use types::*;
