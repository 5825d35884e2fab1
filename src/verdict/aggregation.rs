//! Verdict aggregation: alignments into a claim verdict, claim verdicts into
//! an overall verdict
//!
//! The policy is conservative: one credible contradiction outweighs any
//! amount of support, and a statement is only true if every claim is.

use super::models::{Alignment, AlignmentLabel, ClaimVerdict, Verdict};

pub const NO_EVIDENCE_REASONING: &str = "No relevant evidence found in the knowledge base.";
pub const INCONCLUSIVE_REASONING: &str = "The evidence is related to the claim but inconclusive.";

/// Verdict for a claim whose retrieval produced no evidence
pub fn abstain(claim: String) -> ClaimVerdict {
    ClaimVerdict {
        claim,
        verdict: Verdict::Abstain,
        reasoning: NO_EVIDENCE_REASONING.to_string(),
        evidence_alignments: Vec::new(),
    }
}

/// Aggregate the successful alignments of a claim that had evidence.
///
/// `alignments` must be in fused-evidence rank order: the highest-ranked
/// contradiction (or, failing that, support) provides the reasoning.
pub fn aggregate_claim(claim: String, alignments: Vec<Alignment>) -> ClaimVerdict {
    let first = |label: AlignmentLabel| alignments.iter().find(|a| a.label == label);

    let (verdict, reasoning) = if let Some(contradiction) = first(AlignmentLabel::Contradiction) {
        (Verdict::False, contradiction.reasoning.clone())
    } else if let Some(support) = first(AlignmentLabel::Support) {
        (Verdict::True, support.reasoning.clone())
    } else {
        (Verdict::Neutral, INCONCLUSIVE_REASONING.to_string())
    };

    ClaimVerdict {
        claim,
        verdict,
        reasoning,
        evidence_alignments: alignments,
    }
}

/// Combine claim verdicts: any False fails the statement, True needs every
/// claim True, Abstain needs every claim Abstain, everything else is Neutral.
pub fn aggregate_overall(verdicts: &[Verdict]) -> Verdict {
    if verdicts.contains(&Verdict::False) {
        Verdict::False
    } else if verdicts.is_empty() {
        Verdict::Abstain
    } else if verdicts.iter().all(|v| *v == Verdict::True) {
        Verdict::True
    } else if verdicts.iter().all(|v| *v == Verdict::Abstain) {
        Verdict::Abstain
    } else {
        Verdict::Neutral
    }
}
