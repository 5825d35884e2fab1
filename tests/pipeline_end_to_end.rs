//! End-to-end checks through the orchestrator with fake services

mod common;

use common::{chunk, orchestrator, EmptyVectorIndex, FakeOracle, UnreachableVectorIndex};
use fact_checker::{
    knowledge::LexicalIndex,
    oracle::{OracleError, OracleTask},
    verdict::aggregation::NO_EVIDENCE_REASONING,
    CheckOutcome, Verdict,
};
use std::sync::Arc;

fn scripted_reply(request: &fact_checker::oracle::OracleRequest) -> Result<String, OracleError> {
    match request.task {
        OracleTask::RewriteQuery => Ok("Is the sky blue, and did a volcano erupt?".to_string()),
        OracleTask::ExtractClaims => {
            Ok(r#"{"claims": ["the sky is blue", "volcano erupted yesterday"]}"#.to_string())
        }
        OracleTask::AlignEvidence => {
            Ok(r#"{"label": "Support", "reasoning": "The article says so.", "confidence_score": 0.9}"#.to_string())
        }
    }
}

#[tokio::test]
async fn test_mixed_claims_yield_neutral_overall() {
    let oracle = FakeOracle::new(scripted_reply);
    let checker = orchestrator(
        oracle.clone(),
        Arc::new(EmptyVectorIndex),
        vec![chunk("c1", "the sky is blue on clear days")],
    );

    let outcome = checker.check("sky blue? volcano?").await;
    let result = outcome.into_result().expect("check should complete");

    assert_eq!(result.original_query, "sky blue? volcano?");
    assert_eq!(result.rewritten_query, "Is the sky blue, and did a volcano erupt?");

    let verdicts: Vec<Verdict> = result.claim_verdicts.iter().map(|c| c.verdict).collect();
    assert_eq!(verdicts, vec![Verdict::True, Verdict::Abstain]);
    assert_eq!(result.overall, Verdict::Neutral);

    assert_eq!(result.claim_verdicts[0].reasoning, "The article says so.");
    assert_eq!(result.claim_verdicts[0].evidence_alignments.len(), 1);
    assert_eq!(result.claim_verdicts[1].reasoning, NO_EVIDENCE_REASONING);

    // only the claim with evidence is aligned
    assert_eq!(oracle.calls(OracleTask::AlignEvidence), 1);
}

#[tokio::test]
async fn test_contradiction_outweighs_support() {
    let oracle = FakeOracle::new(|request| match request.task {
        OracleTask::RewriteQuery => Ok("grass colour".to_string()),
        OracleTask::ExtractClaims => Ok(r#"{"claims": ["grass is green"]}"#.to_string()),
        OracleTask::AlignEvidence if request.prompt.contains("always purple") => {
            Ok(r#"{"label": "Contradiction", "reasoning": "Says purple."}"#.to_string())
        }
        OracleTask::AlignEvidence => Ok(r#"{"label": "Support", "reasoning": "Says green."}"#.to_string()),
    });
    let checker = orchestrator(
        oracle,
        Arc::new(EmptyVectorIndex),
        vec![
            chunk("green", "grass is green in spring"),
            chunk("purple", "grass is always purple"),
        ],
    );

    let result = checker.check("grass").await.into_result().unwrap();
    assert_eq!(result.claim_verdicts[0].verdict, Verdict::False);
    assert_eq!(result.claim_verdicts[0].reasoning, "Says purple.");
    assert_eq!(result.overall, Verdict::False);
}

#[tokio::test]
async fn test_malformed_extraction_checks_query_as_single_claim() {
    let oracle = FakeOracle::new(|request| match request.task {
        OracleTask::RewriteQuery => Err(OracleError::RequestFailed("connection refused".into())),
        OracleTask::ExtractClaims => Ok("Sure! Here are the claims: sky, blue".to_string()),
        OracleTask::AlignEvidence => Ok(r#"{"label": "Neutral", "reasoning": "unclear"}"#.to_string()),
    });
    let checker = orchestrator(
        oracle,
        Arc::new(UnreachableVectorIndex),
        vec![chunk("c1", "the sky is blue")],
    );

    let result = checker.check("the sky is blue").await.into_result().unwrap();
    assert_eq!(result.rewritten_query, "the sky is blue");
    assert_eq!(result.claim_verdicts.len(), 1);
    assert_eq!(result.claim_verdicts[0].claim, "the sky is blue");
    assert_eq!(result.claim_verdicts[0].verdict, Verdict::Neutral);
    assert_eq!(result.overall, Verdict::Neutral);
}

#[tokio::test]
async fn test_every_alignment_failing_is_neutral() {
    let oracle = FakeOracle::new(|request| match request.task {
        OracleTask::RewriteQuery => Ok("sky".to_string()),
        OracleTask::ExtractClaims => Ok(r#"{"claims": ["sky is blue"]}"#.to_string()),
        OracleTask::AlignEvidence => Err(OracleError::Timeout("slow".into())),
    });
    let checker = orchestrator(oracle, Arc::new(EmptyVectorIndex), vec![chunk("c1", "sky is blue")]);

    let result = checker.check("sky").await.into_result().unwrap();
    assert_eq!(result.claim_verdicts[0].verdict, Verdict::Neutral);
    assert!(result.claim_verdicts[0].evidence_alignments.is_empty());
}

#[tokio::test]
async fn test_empty_knowledge_base_is_reported() {
    let oracle = FakeOracle::new(scripted_reply);
    let checker = orchestrator(oracle.clone(), Arc::new(EmptyVectorIndex), Vec::new());

    match checker.check("anything").await {
        CheckOutcome::KnowledgeBaseUnavailable { query, message } => {
            assert_eq!(query, "anything");
            assert!(!message.is_empty());
        }
        other => panic!("expected unavailable outcome, got {:?}", other),
    }
    assert_eq!(oracle.total_calls(), 0);
}

#[tokio::test]
async fn test_published_corpus_becomes_available() {
    let oracle = FakeOracle::new(scripted_reply);
    let checker = orchestrator(oracle, Arc::new(EmptyVectorIndex), Vec::new());
    assert!(checker.check("sky").await.result().is_none());

    checker
        .lexical_index()
        .publish(LexicalIndex::build(vec![chunk("c1", "the sky is blue")]));

    let result = checker.check("sky").await.into_result().unwrap();
    assert_eq!(result.claim_verdicts[0].verdict, Verdict::True);
}

#[tokio::test]
async fn test_outcome_serializes_with_status_tag() {
    let oracle = FakeOracle::new(scripted_reply);
    let checker = orchestrator(oracle, Arc::new(EmptyVectorIndex), vec![chunk("c1", "the sky is blue")]);

    let json = serde_json::to_value(checker.check("sky").await).unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["overall"], "Neutral");
    assert_eq!(json["claim_verdicts"][0]["verdict"], "True");
}
