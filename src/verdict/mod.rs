//! Alignment labels, verdicts, and the aggregation policy

pub mod aggregation;
pub mod models;

pub use aggregation::{abstain, aggregate_claim, aggregate_overall};
pub use models::{Alignment, AlignmentLabel, CheckOutcome, CheckResult, ClaimVerdict, Verdict};
