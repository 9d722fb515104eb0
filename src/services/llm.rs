use crate::utils::ServiceError;
use log::info;
use serde_json::{json, Value};
use std::time::Duration;

/// Structured-extraction collaborator: given a system prompt and a
/// filled user prompt, returns the model's best-effort text output.
/// Implementations must be safe to share across worker threads.
pub trait LlmClient: Sync {
    fn complete(&self, system: &str, user: &str) -> Result<String, ServiceError>;
}

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
/// Endpoint, key, and model are re-read from the environment per call.
pub struct HttpLlmClient {
    http: reqwest::blocking::Client,
}

impl HttpLlmClient {
    pub fn new() -> Result<Self, ServiceError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .map_err(|e| ServiceError::Permanent(e.to_string()))?;
        Ok(HttpLlmClient { http })
    }
}

impl LlmClient for HttpLlmClient {
    fn complete(&self, system: &str, user: &str) -> Result<String, ServiceError> {
        let _ = dotenvy::dotenv_override();
        let endpoint = std::env::var("LLM_ENDPOINT")
            .map_err(|_| ServiceError::Permanent("LLM_ENDPOINT not set".to_string()))?;
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| ServiceError::Permanent("LLM_API_KEY not set".to_string()))?;
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        info!("LLM call ({}, {} prompt chars)", model, user.len());

        let body = json!({
            "model": model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", endpoint.trim_end_matches('/')))
            .bearer_auth(&api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ServiceError::Transient(e.to_string())
                } else {
                    ServiceError::Permanent(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(ServiceError::Transient(format!("LLM returned {}", status)));
        }
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(ServiceError::Permanent(format!(
                "LLM failed ({}): {}",
                status, text
            )));
        }

        let parsed: Value = response
            .json()
            .map_err(|e| ServiceError::Permanent(format!("invalid LLM response JSON: {}", e)))?;
        parsed
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(String::from)
            .ok_or_else(|| ServiceError::Permanent("LLM response missing content".to_string()))
    }
}

/// Pulls the first `{...}` object out of a model reply that may be
/// wrapped in prose or markdown fences.
pub fn extract_json_block(text: &str) -> Result<String, ServiceError> {
    let start = text
        .find('{')
        .ok_or_else(|| ServiceError::Permanent("no JSON object in LLM output".to_string()))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(text[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    // Truncated output: return the tail and let repair close it.
    Ok(text[start..].to_string())
}

/// Parses LLM JSON, repairing the common truncation defects first:
/// a dangling open string and missing closing braces.
pub fn parse_json_lenient(text: &str) -> Result<Value, ServiceError> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    let mut repaired = text.trim().to_string();
    if repaired.matches('"').count() % 2 != 0 {
        repaired.push('"');
    }
    let open = repaired.matches('{').count();
    let close = repaired.matches('}').count();
    for _ in close..open {
        repaired.push('}');
    }

    serde_json::from_str(&repaired)
        .map_err(|e| ServiceError::Permanent(format!("unrepairable LLM JSON: {}", e)))
}

/// One complete extraction round-trip: prompt in, recovered JSON out.
pub fn run_llm(
    llm: &dyn LlmClient,
    system: &str,
    user: &str,
) -> Result<Value, ServiceError> {
    let raw = llm.complete(system, user)?;
    let block = extract_json_block(&raw)?;
    parse_json_lenient(&block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_block_strips_prose() {
        let raw = "Sure! Here is the data:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_json_block(raw).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_block_keeps_nested_objects() {
        let raw = "{\"outer\": {\"inner\": 2}} trailing";
        assert_eq!(
            extract_json_block(raw).unwrap(),
            "{\"outer\": {\"inner\": 2}}"
        );
    }

    #[test]
    fn test_extract_json_block_ignores_braces_in_strings() {
        let raw = "{\"note\": \"unmatched } inside\"}";
        assert_eq!(extract_json_block(raw).unwrap(), raw);
    }

    #[test]
    fn test_parse_json_lenient_repairs_truncation() {
        let value = parse_json_lenient("{\"balance\": 100, \"note\": \"cut off").unwrap();
        assert_eq!(value["balance"], 100);
    }

    #[test]
    fn test_parse_json_lenient_repairs_missing_braces() {
        let value = parse_json_lenient("{\"a\": {\"b\": 1}").unwrap();
        assert_eq!(value["a"]["b"], 1);
    }

    #[test]
    fn test_parse_json_lenient_rejects_garbage() {
        assert!(parse_json_lenient("not json at all").is_err());
    }
}
