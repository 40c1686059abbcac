use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::retry::{execute_with_retry_async, RetryConfig};
use crate::{Embedding, EmbeddingProvider, SemanticConfig, SemanticError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiProviderKind {
    HuggingFace,
    OpenAI,
    Custom,
}

/// Remote embedding endpoint reached over HTTP.
///
/// Request and response shapes follow `api_provider`: Hugging Face feature
/// extraction, OpenAI embeddings, or a plain `{"text": ...}` endpoint.
pub struct ApiProvider {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    kind: ApiProviderKind,
    model_name: String,
    timeout_secs: u64,
    retry: Option<RetryConfig>,
}

impl std::fmt::Debug for ApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiProvider")
            .field("url", &self.url)
            .field("kind", &self.kind)
            .field("model_name", &self.model_name)
            .finish_non_exhaustive()
    }
}

impl ApiProvider {
    pub fn new(cfg: SemanticConfig) -> Result<Self, SemanticError> {
        let url = cfg
            .api_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                SemanticError::InvalidConfig("api_url is required for api mode".into())
            })?;
        let timeout_secs = cfg.api_timeout_secs.unwrap_or(30);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self {
            client,
            url,
            auth_header: cfg.api_auth_header.clone(),
            kind: api_provider_kind(&cfg),
            model_name: cfg.model_name.clone(),
            timeout_secs,
            retry: cfg.retry_config,
        })
    }

    async fn send(&self, payload: &Value) -> Result<Value, SemanticError> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header("Authorization", header);
        }

        let response = request.json(payload).send().await.map_err(|e| {
            if e.is_timeout() {
                SemanticError::Timeout(self.timeout_secs * 1000)
            } else {
                SemanticError::Unavailable(format!("HTTP request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("HTTP {status}: {body}");
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                SemanticError::Unavailable(message)
            } else {
                SemanticError::Malformed(message)
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SemanticError::Malformed(format!("invalid JSON response: {e}")))
    }
}

#[async_trait]
impl EmbeddingProvider for ApiProvider {
    async fn encode(&self, text: &str) -> Result<Embedding, SemanticError> {
        let payload = build_api_payload(self.kind, text, &self.model_name);

        let response = match &self.retry {
            Some(retry) => {
                let outcome = execute_with_retry_async(retry, |_| self.send(&payload)).await;
                if outcome.attempts > 1 {
                    tracing::debug!(
                        url = %self.url,
                        attempts = outcome.attempts,
                        elapsed_ms = outcome.total_duration.as_millis() as u64,
                        "provider_request_retried"
                    );
                }
                outcome.into_result()?
            }
            None => self.send(&payload).await?,
        };

        let mut vectors = parse_embeddings_from_value(response)?;
        if vectors.len() > 1 {
            return Err(SemanticError::Malformed(format!(
                "API returned {} embeddings for one input",
                vectors.len()
            )));
        }
        vectors
            .pop()
            .ok_or_else(|| SemanticError::Malformed("API response did not contain embeddings".into()))
    }

    fn dimension(&self) -> Option<usize> {
        None
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn api_provider_kind(cfg: &SemanticConfig) -> ApiProviderKind {
    let provider = cfg
        .api_provider
        .as_deref()
        .unwrap_or("custom")
        .to_ascii_lowercase();
    match provider.as_str() {
        "hf" | "huggingface" => ApiProviderKind::HuggingFace,
        "openai" | "gpt" => ApiProviderKind::OpenAI,
        _ => ApiProviderKind::Custom,
    }
}

fn build_api_payload(provider: ApiProviderKind, text: &str, model_name: &str) -> Value {
    match provider {
        ApiProviderKind::HuggingFace => json!({ "inputs": text }),
        ApiProviderKind::OpenAI => json!({ "input": text, "model": model_name }),
        ApiProviderKind::Custom => json!({ "text": text }),
    }
}

fn parse_embeddings_from_value(value: Value) -> Result<Vec<Embedding>, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embedding) = map.remove("embedding") {
                return parse_embedding_vector(embedding).map(|v| vec![v]);
            }
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                let mut vectors = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(mut obj) => match obj.remove("embedding") {
                            Some(embedding) => vectors.push(parse_embedding_vector(embedding)?),
                            None => {
                                return Err(SemanticError::Malformed(
                                    "missing `embedding` field in data item".into(),
                                ))
                            }
                        },
                        _ => {
                            return Err(SemanticError::Malformed(
                                "unexpected entry inside `data` array".into(),
                            ))
                        }
                    }
                }
                return Ok(vectors);
            }

            Err(SemanticError::Malformed(
                "unsupported API response shape".into(),
            ))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Embedding>, SemanticError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Embedding, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SemanticError::Malformed("non-finite embedding value".into())),
                other => Err(SemanticError::Malformed(format!(
                    "embedding entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::Malformed(format!(
            "embedding vector must be an array, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_config(provider: &str) -> SemanticConfig {
        SemanticConfig {
            mode: "api".into(),
            model_name: "text-embedding-3-small".into(),
            api_url: Some("https://api.example.com/embed".into()),
            api_provider: Some(provider.into()),
            ..SemanticConfig::default()
        }
    }

    #[test]
    fn provider_kind_from_config() {
        assert_eq!(api_provider_kind(&api_config("HF")), ApiProviderKind::HuggingFace);
        assert_eq!(api_provider_kind(&api_config("openai")), ApiProviderKind::OpenAI);
        assert_eq!(api_provider_kind(&api_config("whatever")), ApiProviderKind::Custom);
    }

    #[test]
    fn payload_shapes() {
        assert_eq!(
            build_api_payload(ApiProviderKind::HuggingFace, "a coke", "m"),
            json!({ "inputs": "a coke" })
        );
        assert_eq!(
            build_api_payload(ApiProviderKind::OpenAI, "a coke", "m"),
            json!({ "input": "a coke", "model": "m" })
        );
        assert_eq!(
            build_api_payload(ApiProviderKind::Custom, "a coke", "m"),
            json!({ "text": "a coke" })
        );
    }

    #[test]
    fn new_requires_url() {
        let cfg = SemanticConfig {
            mode: "api".into(),
            ..SemanticConfig::default()
        };
        assert!(matches!(
            ApiProvider::new(cfg),
            Err(SemanticError::InvalidConfig(_))
        ));
        let provider = ApiProvider::new(api_config("openai")).unwrap();
        assert_eq!(provider.model_name(), "text-embedding-3-small");
        assert_eq!(provider.dimension(), None);
    }

    #[test]
    fn parse_openai_shape() {
        let value = json!({ "data": [ { "embedding": [0.1, 0.2] } ], "model": "m" });
        let vectors = parse_embeddings_from_value(value).unwrap();
        assert_eq!(vectors, vec![vec![0.1f32, 0.2f32]]);
    }

    #[test]
    fn parse_custom_shapes() {
        let single = parse_embeddings_from_value(json!({ "embedding": [1.0, 2.0] })).unwrap();
        assert_eq!(single, vec![vec![1.0, 2.0]]);

        let many = parse_embeddings_from_value(json!({ "embeddings": [[1.0], [2.0]] })).unwrap();
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn parse_embedding_collection_various_formats() {
        let nested = parse_embedding_collection(json!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])).unwrap();
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0], vec![1.0, 2.0, 3.0]);

        let flat = parse_embedding_collection(json!([1.0, 2.0, 3.0])).unwrap();
        assert_eq!(flat, vec![vec![1.0, 2.0, 3.0]]);

        assert!(parse_embedding_collection(json!([])).unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse_embeddings_from_value(json!({ "unexpected": true })),
            Err(SemanticError::Malformed(_))
        ));
        assert!(matches!(
            parse_embeddings_from_value(json!(["a", "b"])),
            Err(SemanticError::Malformed(_))
        ));
    }
}
