//! Ollama chat client with retry, concurrency limit, and circuit breaker

use super::circuit_breaker::{BreakerStats, CircuitBreaker, CircuitBreakerConfig};
use super::models::{OracleRequest, ResponseFormat};
use super::{LanguageOracle, OracleError};
use crate::config::OracleConfig;
use crate::metrics::METRICS;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// Language oracle backed by Ollama's `/api/chat`
pub struct OllamaOracle {
    http: Client,
    config: OracleConfig,
    semaphore: Arc<Semaphore>,
    breaker: Arc<CircuitBreaker>,
}

impl OllamaOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| OracleError::RequestFailed(e.to_string()))?;

        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_requests));

        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: config.circuit_breaker_failures,
            reset_timeout: config.breaker_reset_timeout(),
        }));

        Ok(Self {
            http,
            config,
            semaphore,
            breaker,
        })
    }

    async fn call_chat_api(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let url = format!("{}/api/chat", self.config.url.trim_end_matches('/'));

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            stream: false,
            format: match request.format {
                ResponseFormat::Json => Some("json"),
                ResponseFormat::Text => None,
            },
            options: self.config.temperature.map(|temperature| ChatOptions { temperature }),
        };

        let mut req = self.http.post(&url).json(&body);
        if let Some(api_key) = &self.config.api_key {
            req = req.bearer_auth(api_key.expose_secret());
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout(e.to_string())
            } else {
                OracleError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OracleError::Upstream(format!("Status {}: {}", status, error_text)));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        Ok(chat.message.content)
    }

    fn calculate_backoff(&self, attempt: usize) -> Duration {
        let base = self.config.retry_backoff();
        let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1) as u32);
        base.saturating_mul(multiplier)
    }

    pub fn breaker_stats(&self) -> BreakerStats {
        self.breaker.stats()
    }
}

#[async_trait]
impl LanguageOracle for OllamaOracle {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        let task = request.task.as_str();
        let start = Instant::now();

        if self.breaker.is_open() {
            METRICS.oracle_circuit_open.inc();
            METRICS.record_oracle(task, "circuit_open");
            return Err(OracleError::CircuitOpen(self.config.url.clone()));
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| OracleError::RequestFailed(e.to_string()))?;

        let mut attempt = 0;
        let content = loop {
            attempt += 1;

            match self.call_chat_api(&request).await {
                Ok(content) => {
                    self.breaker.mark_success();
                    METRICS.record_oracle(task, "success");
                    break content;
                }
                Err(e) => {
                    self.breaker.mark_failure();
                    METRICS.record_oracle(task, "error");

                    if attempt > self.config.retry_attempts || self.breaker.is_open() {
                        let stats = self.breaker.stats();
                        error!(
                            "Oracle {} call failed after {} attempts: {} (breaker {:?}, {} consecutive failures)",
                            task, attempt, e, stats.state, stats.failure_count
                        );
                        return Err(e);
                    }

                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        "Oracle {} attempt {} failed: {}, retrying in {:?}",
                        task, attempt, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        };

        METRICS
            .oracle_request_duration
            .with_label_values(&[task])
            .observe(start.elapsed().as_secs_f64());
        debug!("Oracle {} replied with {} chars", task, content.len());

        Ok(content)
    }
}

// Ollama chat API types
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}
