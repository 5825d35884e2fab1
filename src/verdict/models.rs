//! Data models for alignments, verdicts, and check results

use crate::knowledge::Chunk;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Relationship between one claim and one evidence item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlignmentLabel {
    Support,
    Contradiction,
    Neutral,
}

impl AlignmentLabel {
    /// Parse a label as produced by the oracle.
    ///
    /// Accepts English variants and the Chinese vocabulary of the original
    /// prompts. Unknown labels yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().trim_matches(|c: char| c == '"' || c == '「' || c == '」');
        match normalized.to_lowercase().as_str() {
            "support" | "supports" | "supported" | "entailment" | "entails" | "支持" => {
                Some(AlignmentLabel::Support)
            }
            "contradiction" | "contradicts" | "contradicted" | "refuted" | "refutes" | "矛盾" => {
                Some(AlignmentLabel::Contradiction)
            }
            "neutral" | "inconclusive" | "not enough info" | "中立" => Some(AlignmentLabel::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlignmentLabel::Support => "Support",
            AlignmentLabel::Contradiction => "Contradiction",
            AlignmentLabel::Neutral => "Neutral",
        }
    }
}

/// The oracle's judgment of one (claim, evidence) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub claim: String,
    pub evidence: Chunk,
    pub label: AlignmentLabel,
    pub reasoning: String,
    /// Always within [0, 1]
    pub confidence: f32,
}

impl Alignment {
    pub fn new(
        claim: String,
        evidence: Chunk,
        label: AlignmentLabel,
        reasoning: String,
        confidence: f32,
    ) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        Self {
            claim,
            evidence,
            label,
            reasoning,
            confidence,
        }
    }
}

/// Verdict for a claim or for a whole check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    True,
    False,
    /// Evidence was found but was conflicting or insufficient
    Neutral,
    /// No evidence was available at all
    Abstain,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "True",
            Verdict::False => "False",
            Verdict::Neutral => "Neutral",
            Verdict::Abstain => "Abstain",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for a single extracted claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerdict {
    pub claim: String,
    pub verdict: Verdict,
    pub reasoning: String,
    pub evidence_alignments: Vec<Alignment>,
}

/// Terminal output of one completed check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub run_id: Uuid,
    pub checked_at: DateTime<Utc>,
    pub original_query: String,
    pub rewritten_query: String,
    pub claim_verdicts: Vec<ClaimVerdict>,
    pub overall: Verdict,
}

/// Structured outcome of a check; failures never escape as errors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    Completed(CheckResult),
    KnowledgeBaseUnavailable { query: String, message: String },
}

impl CheckOutcome {
    pub fn result(&self) -> Option<&CheckResult> {
        match self {
            CheckOutcome::Completed(result) => Some(result),
            CheckOutcome::KnowledgeBaseUnavailable { .. } => None,
        }
    }

    pub fn into_result(self) -> Option<CheckResult> {
        match self {
            CheckOutcome::Completed(result) => Some(result),
            CheckOutcome::KnowledgeBaseUnavailable { .. } => None,
        }
    }
}
