//! Atelier - outfit analysis through a fail-forward chain of AI agents

pub mod orchestration;
pub mod server;
