//! Fact-check orchestration

pub mod orchestrator;

pub use orchestrator::{FactCheckOrchestrator, OrchestratorSettings, KNOWLEDGE_BASE_UNAVAILABLE};
