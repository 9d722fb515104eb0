use crate::models::{BlockType, BoundingBox, IdentityFields, OcrBlock, OcrPage};
use crate::utils::ServiceError;
use base64::Engine;
use log::info;
use serde_json::{json, Value};
use std::time::Duration;

/// Document-AI collaborator: consumes page image bytes, returns either
/// plain line text, typed identity fields, or a positioned block graph.
/// Implementations must be safe to share across worker threads.
pub trait OcrClient: Sync {
    /// Cheap single-page text detection, used for classification previews.
    fn detect_text(&self, image: &[u8]) -> Result<Vec<String>, ServiceError>;

    /// Identity-document extraction. Returns None when the service does
    /// not recognize an identity document on the page.
    fn analyze_identity(&self, image: &[u8]) -> Result<Option<IdentityFields>, ServiceError>;

    /// Full layout analysis with tables and forms.
    fn analyze_layout(&self, image: &[u8]) -> Result<OcrPage, ServiceError>;
}

/// Blocking HTTP client for a Textract-compatible document-analysis
/// endpoint. Credentials and region are re-read from the environment on
/// every call so rotated keys are picked up without a restart.
pub struct HttpOcrClient {
    http: reqwest::blocking::Client,
}

struct OcrConfig {
    endpoint: String,
    api_key: String,
    region: String,
}

impl HttpOcrClient {
    pub fn new() -> Result<Self, ServiceError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ServiceError::Permanent(e.to_string()))?;
        Ok(HttpOcrClient { http })
    }

    fn config() -> Result<OcrConfig, ServiceError> {
        // Re-read .env so manual credential changes apply without a restart.
        let _ = dotenvy::dotenv_override();
        let endpoint = std::env::var("DOCAI_ENDPOINT")
            .map_err(|_| ServiceError::Permanent("DOCAI_ENDPOINT not set".to_string()))?;
        let api_key = std::env::var("DOCAI_API_KEY")
            .map_err(|_| ServiceError::Permanent("DOCAI_API_KEY not set".to_string()))?;
        let region = std::env::var("DOCAI_REGION").unwrap_or_else(|_| "eu-west-1".to_string());
        Ok(OcrConfig {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            region,
        })
    }

    fn post(&self, action: &str, image: &[u8]) -> Result<Value, ServiceError> {
        let config = Self::config()?;
        info!(
            "calling {} in {} (key {})",
            action,
            config.region,
            mask_key(&config.api_key)
        );

        let body = json!({
            "Document": {
                "Bytes": base64::engine::general_purpose::STANDARD.encode(image),
            },
        });

        let response = self
            .http
            .post(format!("{}/{}", config.endpoint, action))
            .header("x-api-key", &config.api_key)
            .header("x-region", &config.region)
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
            return Err(ServiceError::Transient(format!("{} returned {}", action, status)));
        }
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(ServiceError::Permanent(format!(
                "{} failed ({}): {}",
                action, status, text
            )));
        }

        response
            .json()
            .map_err(|e| ServiceError::Permanent(format!("invalid JSON from {}: {}", action, e)))
    }
}

impl OcrClient for HttpOcrClient {
    fn detect_text(&self, image: &[u8]) -> Result<Vec<String>, ServiceError> {
        let response = self.post("detect-document-text", image)?;
        Ok(parse_block_graph(&response).line_texts())
    }

    fn analyze_identity(&self, image: &[u8]) -> Result<Option<IdentityFields>, ServiceError> {
        let response = self.post("analyze-id", image)?;
        Ok(parse_identity_response(&response))
    }

    fn analyze_layout(&self, image: &[u8]) -> Result<OcrPage, ServiceError> {
        let response = self.post("analyze-document", image)?;
        Ok(parse_block_graph(&response))
    }
}

/// Decodes the service's flat Blocks array into the crate's block graph.
/// Unknown block types are dropped.
pub fn parse_block_graph(response: &Value) -> OcrPage {
    let mut blocks = Vec::new();
    let Some(raw_blocks) = response.get("Blocks").and_then(|b| b.as_array()) else {
        return OcrPage::default();
    };

    for raw in raw_blocks {
        let block_type = match raw.get("BlockType").and_then(|t| t.as_str()) {
            Some("PAGE") => BlockType::Page,
            Some("LINE") => BlockType::Line,
            Some("WORD") => BlockType::Word,
            Some("TABLE") => BlockType::Table,
            Some("CELL") => BlockType::Cell,
            _ => continue,
        };

        let bb = raw
            .get("Geometry")
            .and_then(|g| g.get("BoundingBox"))
            .map(|b| BoundingBox {
                left: b.get("Left").and_then(Value::as_f64).unwrap_or(0.0),
                top: b.get("Top").and_then(Value::as_f64).unwrap_or(0.0),
                width: b.get("Width").and_then(Value::as_f64).unwrap_or(0.0),
                height: b.get("Height").and_then(Value::as_f64).unwrap_or(0.0),
            })
            .unwrap_or_default();

        let mut child_ids = Vec::new();
        if let Some(rels) = raw.get("Relationships").and_then(|r| r.as_array()) {
            for rel in rels {
                if rel.get("Type").and_then(|t| t.as_str()) == Some("CHILD") {
                    if let Some(ids) = rel.get("Ids").and_then(|i| i.as_array()) {
                        child_ids
                            .extend(ids.iter().filter_map(|i| i.as_str().map(String::from)));
                    }
                }
            }
        }

        blocks.push(OcrBlock {
            id: raw
                .get("Id")
                .and_then(|i| i.as_str())
                .unwrap_or_default()
                .to_string(),
            block_type,
            text: raw.get("Text").and_then(|t| t.as_str()).map(String::from),
            bounding_box: bb,
            child_ids,
            row_index: raw.get("RowIndex").and_then(Value::as_u64).map(|v| v as usize),
            column_index: raw
                .get("ColumnIndex")
                .and_then(Value::as_u64)
                .map(|v| v as usize),
        });
    }

    OcrPage { blocks }
}

/// Flattens the identity-document response into field/value pairs.
/// None when no identity document was detected on the page.
pub fn parse_identity_response(response: &Value) -> Option<IdentityFields> {
    let docs = response.get("IdentityDocuments")?.as_array()?;
    if docs.is_empty() {
        return None;
    }

    let mut fields = IdentityFields::default();
    for doc in docs {
        let Some(doc_fields) = doc.get("IdentityDocumentFields").and_then(|f| f.as_array())
        else {
            continue;
        };
        for field in doc_fields {
            let key = field
                .get("Type")
                .and_then(|t| t.get("Text"))
                .and_then(|t| t.as_str());
            let value = field
                .get("ValueDetection")
                .and_then(|v| v.get("Text"))
                .and_then(|t| t.as_str());
            if let (Some(key), Some(value)) = (key, value) {
                fields.set(key, value);
            }
        }
    }
    Some(fields)
}

fn mask_key(key: &str) -> String {
    if key.len() > 8 {
        format!("{}...{}", &key[..4], &key[key.len() - 4..])
    } else {
        "****".to_string()
    }
}
