//! Oracle request types and structured reply decoding

use super::OracleError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Which pipeline step issued the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleTask {
    RewriteQuery,
    ExtractClaims,
    AlignEvidence,
}

impl OracleTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleTask::RewriteQuery => "rewrite",
            OracleTask::ExtractClaims => "extract_claims",
            OracleTask::AlignEvidence => "align",
        }
    }
}

/// Expected shape of the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
}

/// One rendered instruction for the oracle
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub task: OracleTask,
    pub prompt: String,
    pub format: ResponseFormat,
}

impl OracleRequest {
    pub fn text(task: OracleTask, prompt: String) -> Self {
        Self {
            task,
            prompt,
            format: ResponseFormat::Text,
        }
    }

    pub fn json(task: OracleTask, prompt: String) -> Self {
        Self {
            task,
            prompt,
            format: ResponseFormat::Json,
        }
    }
}

/// Reply of the claim extraction task
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimsPayload {
    pub claims: Vec<String>,
}

/// Reply of the evidence alignment task
#[derive(Debug, Clone, Deserialize)]
pub struct AlignmentPayload {
    pub label: String,
    #[serde(default)]
    pub reasoning: String,
    /// Numbers and numeric strings are accepted; anything else reads as absent
    #[serde(default, alias = "confidence", deserialize_with = "lenient_confidence")]
    pub confidence_score: Option<f32>,
}

fn lenient_confidence<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawConfidence {
        Number(f32),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Option::<RawConfidence>::deserialize(deserializer)? {
        Some(RawConfidence::Number(value)) => Some(value),
        Some(RawConfidence::Text(text)) => text.trim().parse().ok(),
        Some(RawConfidence::Other(_)) | None => None,
    })
}

/// Decode a JSON reply, tolerating a surrounding markdown code fence
pub fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, OracleError> {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return Err(OracleError::Empty);
    }
    serde_json::from_str(body).map_err(|e| OracleError::Malformed(e.to_string()))
}

fn strip_code_fence(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix("```") else {
        return raw;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_claims() {
        let payload: ClaimsPayload = decode_json(r#"{"claims": ["a", "b"]}"#).unwrap();
        assert_eq!(payload.claims, vec!["a", "b"]);
    }

    #[test]
    fn test_decode_fenced_json() {
        let payload: ClaimsPayload = decode_json("```json\n{\"claims\": [\"a\"]}\n```").unwrap();
        assert_eq!(payload.claims, vec!["a"]);
    }

    #[test]
    fn test_decode_alignment_aliases() {
        let payload: AlignmentPayload =
            decode_json(r#"{"label": "支持", "reasoning": "r", "confidence": 0.7}"#).unwrap();
        assert_eq!(payload.label, "支持");
        assert_eq!(payload.confidence_score, Some(0.7));

        let payload: AlignmentPayload = decode_json(r#"{"label": "Neutral"}"#).unwrap();
        assert_eq!(payload.reasoning, "");
        assert_eq!(payload.confidence_score, None);
    }

    #[test]
    fn test_decode_alignment_with_string_confidence() {
        let payload: AlignmentPayload =
            decode_json(r#"{"label":"支持","reasoning":"ok","confidence_score":"0.9"}"#).unwrap();
        assert_eq!(payload.label, "支持");
        assert_eq!(payload.reasoning, "ok");
        assert_eq!(payload.confidence_score, Some(0.9));

        let payload: AlignmentPayload =
            decode_json(r#"{"label":"Support","reasoning":"ok","confidence_score":"high"}"#).unwrap();
        assert_eq!(payload.label, "Support");
        assert_eq!(payload.confidence_score, None);

        let payload: AlignmentPayload =
            decode_json(r#"{"label":"Neutral","confidence_score":null}"#).unwrap();
        assert_eq!(payload.confidence_score, None);
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(decode_json::<ClaimsPayload>("not json"), Err(OracleError::Malformed(_))));
        assert!(matches!(decode_json::<ClaimsPayload>(r#"{"other": 1}"#), Err(OracleError::Malformed(_))));
        assert!(matches!(decode_json::<ClaimsPayload>(r#"{"claims": "one"}"#), Err(OracleError::Malformed(_))));
        assert!(matches!(decode_json::<ClaimsPayload>("  "), Err(OracleError::Empty)));
    }
}
