//! Retrieval-augmented fact checking
//!
//! A statement is rewritten into a retrieval query, decomposed into atomic
//! claims, and each claim is checked against evidence retrieved by fusing
//! dense (Qdrant) and lexical (BM25) search. A language oracle labels each
//! evidence item and the labels are aggregated into per-claim and overall
//! verdicts.

pub mod api;
pub mod checker;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod logging;
pub mod metrics;
pub mod oracle;
pub mod retrieval;
pub mod verdict;

pub use checker::{FactCheckOrchestrator, OrchestratorSettings};
pub use config::Config;
pub use error::{FactCheckError, Result};
pub use verdict::{CheckOutcome, CheckResult, ClaimVerdict, Verdict};
