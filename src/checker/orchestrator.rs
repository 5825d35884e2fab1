//! Fact-check pipeline: rewrite, decompose, retrieve, align, aggregate

use crate::config::Config;
use crate::error::{FactCheckError, Result};
use crate::knowledge::{Chunk, SharedLexicalIndex};
use crate::metrics::METRICS;
use crate::oracle::{
    decode_json, prompts, AlignmentPayload, ClaimsPayload, LanguageOracle, OllamaOracle,
    OracleError, OracleRequest, OracleTask,
};
use crate::retrieval::{Embedder, HttpEmbedder, RankFusion, VectorIndex};
use crate::verdict::{
    abstain, aggregate_claim, aggregate_overall, Alignment, AlignmentLabel, CheckOutcome,
    CheckResult, ClaimVerdict, Verdict,
};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Message attached to checks that cannot run without a corpus
pub const KNOWLEDGE_BASE_UNAVAILABLE: &str = "Knowledge base not available.";

/// Pipeline tuning taken from [`Config`]
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub top_k: usize,
    pub rrf_constant: f64,
    pub service_timeout: Duration,
    pub max_concurrent_claims: usize,
    pub max_concurrent_alignments: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            rrf_constant: config.retrieval.rrf_constant,
            service_timeout: config.pipeline.service_timeout(),
            max_concurrent_claims: config.pipeline.max_concurrent_claims.max(1),
            max_concurrent_alignments: config.pipeline.max_concurrent_alignments.max(1),
        }
    }
}

/// Top-level fact-checking pipeline.
///
/// Holds shared handles to the services it consumes; nothing here is
/// mutated by a check, so one orchestrator serves concurrent requests.
pub struct FactCheckOrchestrator {
    oracle: Arc<dyn LanguageOracle>,
    embedder: Arc<dyn Embedder>,
    vector_index: Arc<dyn VectorIndex>,
    lexical: Arc<SharedLexicalIndex>,
    fusion: RankFusion,
    settings: OrchestratorSettings,
}

impl FactCheckOrchestrator {
    pub fn new(
        oracle: Arc<dyn LanguageOracle>,
        embedder: Arc<dyn Embedder>,
        vector_index: Arc<dyn VectorIndex>,
        lexical: Arc<SharedLexicalIndex>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            oracle,
            embedder,
            vector_index,
            lexical,
            fusion: RankFusion::new(settings.rrf_constant),
            settings,
        }
    }

    /// Wire the Ollama oracle and embedder described by `config`
    pub fn from_config(
        config: &Config,
        vector_index: Arc<dyn VectorIndex>,
        lexical: Arc<SharedLexicalIndex>,
    ) -> Result<Self> {
        let oracle = OllamaOracle::new(config.oracle.clone())?;
        let embedder = HttpEmbedder::new(config.embedding.clone())?;

        Ok(Self::new(
            Arc::new(oracle),
            Arc::new(embedder),
            vector_index,
            lexical,
            OrchestratorSettings::from_config(config),
        ))
    }

    pub fn lexical_index(&self) -> &Arc<SharedLexicalIndex> {
        &self.lexical
    }

    /// Run the whole pipeline for one user query.
    ///
    /// Never fails: service errors degrade individual steps, and a missing
    /// knowledge base is reported as a structured outcome.
    pub async fn check(&self, query: &str) -> CheckOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("check", %run_id);
        self.run_check(run_id, query).instrument(span).await
    }

    async fn run_check(&self, run_id: Uuid, query: &str) -> CheckOutcome {
        let start = Instant::now();

        if !self.lexical.is_available() {
            warn!("Check rejected: knowledge base is empty or not loaded");
            METRICS.record_check("kb_unavailable", start.elapsed().as_secs_f64());
            return CheckOutcome::KnowledgeBaseUnavailable {
                query: query.to_string(),
                message: KNOWLEDGE_BASE_UNAVAILABLE.to_string(),
            };
        }

        info!("Checking query: {}", query);
        let rewritten_query = self.rewrite(query).await;
        let claims = self.extract_claims(&rewritten_query).await;

        // Futures are built up front so the stream holds no borrowing closure
        let pending: Vec<_> = claims.into_iter().map(|claim| self.verify_claim(claim)).collect();
        let claim_verdicts: Vec<ClaimVerdict> = stream::iter(pending)
            .buffered(self.settings.max_concurrent_claims)
            .collect()
            .await;

        let verdicts: Vec<Verdict> = claim_verdicts.iter().map(|c| c.verdict).collect();
        let overall = aggregate_overall(&verdicts);

        info!(
            "Check finished: overall={} claims={} in {:?}",
            overall,
            claim_verdicts.len(),
            start.elapsed()
        );
        METRICS.record_check("completed", start.elapsed().as_secs_f64());

        CheckOutcome::Completed(CheckResult {
            run_id,
            checked_at: chrono::Utc::now(),
            original_query: query.to_string(),
            rewritten_query,
            claim_verdicts,
            overall,
        })
    }

    /// Rewrite the query for retrieval; falls back to the original query
    pub async fn rewrite(&self, query: &str) -> String {
        let request = OracleRequest::text(OracleTask::RewriteQuery, prompts::query_rewriting(query));

        match self.ask(request).await {
            Ok(reply) if !reply.trim().is_empty() => {
                let rewritten = reply.trim().to_string();
                info!("Rewritten query: {}", rewritten);
                rewritten
            }
            Ok(_) => {
                warn!("Query rewriting returned nothing, using original query");
                METRICS.record_fallback(OracleTask::RewriteQuery.as_str());
                query.to_string()
            }
            Err(e) => {
                warn!("Query rewriting failed ({}), using original query", e);
                METRICS.record_fallback(OracleTask::RewriteQuery.as_str());
                query.to_string()
            }
        }
    }

    /// Decompose a query into claims; never returns an empty list
    pub async fn extract_claims(&self, query: &str) -> Vec<String> {
        let request = OracleRequest::json(OracleTask::ExtractClaims, prompts::claim_extraction(query));

        let payload = self
            .ask(request)
            .await
            .and_then(|raw| decode_json::<ClaimsPayload>(&raw));

        let claims: Vec<String> = match payload {
            Ok(payload) => payload
                .claims
                .into_iter()
                .map(|claim| claim.trim().to_string())
                .filter(|claim| !claim.is_empty())
                .collect(),
            Err(e) => {
                warn!("Claim extraction failed ({}), using the query as a single claim", e);
                Vec::new()
            }
        };

        if claims.is_empty() {
            METRICS.record_fallback(OracleTask::ExtractClaims.as_str());
            return vec![query.to_string()];
        }

        info!("Extracted {} claims", claims.len());
        claims
    }

    /// Hybrid retrieval: dense and lexical results fused, at most `k` chunks
    pub async fn retrieve(&self, claim: &str, k: usize) -> Vec<Chunk> {
        let dense = match self.dense_search(claim, k).await {
            Ok(chunks) => {
                METRICS.record_retrieval("vector", true);
                chunks
            }
            Err(e) => {
                warn!("Vector search failed ({}), continuing with lexical results", e);
                METRICS.record_retrieval("vector", false);
                Vec::new()
            }
        };

        let sparse: Vec<Chunk> = self
            .lexical
            .snapshot()
            .top_k(claim, k)
            .into_iter()
            .map(|scored| scored.chunk)
            .collect();
        METRICS.record_retrieval("lexical", true);

        debug!("Retrieved {} dense and {} lexical candidates", dense.len(), sparse.len());
        if dense.is_empty() && sparse.is_empty() {
            info!("No evidence found for claim: {}", claim);
            return Vec::new();
        }

        let ranked_ids = vec![
            dense.iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
            sparse.iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
        ];

        let mut by_id: HashMap<String, Chunk> = HashMap::new();
        for chunk in dense.into_iter().chain(sparse) {
            by_id.entry(chunk.id.clone()).or_insert(chunk);
        }

        self.fusion
            .fuse(&ranked_ids)
            .into_iter()
            .take(k)
            .filter_map(|fused| by_id.remove(&fused.id))
            .collect()
    }

    /// Ask the oracle how one evidence item relates to a claim.
    ///
    /// Returns `None` when the oracle fails or its reply is unusable.
    pub async fn align(&self, claim: &str, evidence: &Chunk) -> Option<Alignment> {
        let prompt = prompts::fact_alignment(
            claim,
            &evidence.content,
            evidence.metadata.publication_date_or_na(),
        );
        let request = OracleRequest::json(OracleTask::AlignEvidence, prompt);

        let payload = match self
            .ask(request)
            .await
            .and_then(|raw| decode_json::<AlignmentPayload>(&raw))
        {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Alignment failed for evidence {} ({}), skipping", evidence.id, e);
                METRICS.record_fallback(OracleTask::AlignEvidence.as_str());
                return None;
            }
        };

        let Some(label) = AlignmentLabel::parse(&payload.label) else {
            warn!(
                "Unrecognized alignment label {:?} for evidence {}, skipping",
                payload.label, evidence.id
            );
            METRICS.record_fallback(OracleTask::AlignEvidence.as_str());
            return None;
        };

        debug!("Evidence {} aligned as {}", evidence.id, label.as_str());
        Some(Alignment::new(
            claim.to_string(),
            evidence.clone(),
            label,
            payload.reasoning,
            payload.confidence_score.unwrap_or(0.0),
        ))
    }

    /// Retrieve, align, and aggregate a single claim
    pub async fn verify_claim(&self, claim: String) -> ClaimVerdict {
        let evidence = self.retrieve(&claim, self.settings.top_k).await;

        if evidence.is_empty() {
            METRICS.record_claim_verdict(Verdict::Abstain.as_str(), 0);
            return abstain(claim);
        }

        let pending: Vec<_> = evidence.iter().map(|item| self.align(&claim, item)).collect();
        let alignments: Vec<Alignment> = stream::iter(pending)
            .buffered(self.settings.max_concurrent_alignments)
            .collect::<Vec<Option<Alignment>>>()
            .await
            .into_iter()
            .flatten()
            .collect();

        debug!(
            "Claim has {} alignments from {} evidence items",
            alignments.len(),
            evidence.len()
        );

        let verdict = aggregate_claim(claim, alignments);
        METRICS.record_claim_verdict(verdict.verdict.as_str(), evidence.len());
        verdict
    }

    async fn dense_search(&self, claim: &str, k: usize) -> Result<Vec<Chunk>> {
        let embedding = self.bounded(self.embedder.embed(claim)).await?;
        self.bounded(self.vector_index.query(&embedding, k)).await
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let limit = self.settings.service_timeout;
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| FactCheckError::Timeout(limit))?
    }

    async fn ask(&self, request: OracleRequest) -> std::result::Result<String, OracleError> {
        let limit = self.settings.service_timeout;
        match tokio::time::timeout(limit, self.oracle.complete(request)).await {
            Ok(reply) => reply,
            Err(_) => Err(OracleError::Timeout(format!("no reply within {:?}", limit))),
        }
    }
}
