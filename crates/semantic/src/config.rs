use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

/// Environment variable that overrides [`SemanticConfig::api_url`].
pub const ENV_API_URL: &str = "MENUMATCH_API_URL";
/// Environment variable holding a bearer token for the HTTP provider.
pub const ENV_API_TOKEN: &str = "MENUMATCH_API_TOKEN";

/// Runtime configuration describing which provider to use and how to post-process vectors.
///
/// # Example
/// ```
/// use semantic::SemanticConfig;
///
/// let cfg = SemanticConfig {
///     mode: "api".into(),
///     api_url: Some("https://api-inference.huggingface.co/models/BAAI/bge-small-en-v1.5".into()),
///     api_auth_header: Some("Bearer hf_xxx".into()),
///     api_provider: Some("hf".into()),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// Provider selector: `"fast"` (deterministic stub) or `"api"` (remote HTTP).
    pub mode: String,
    /// Friendly label recorded in the catalog index so query-time and build-time
    /// providers can be compared.
    pub model_name: String,
    /// Output dimension of the stub provider. Remote providers report their own.
    pub dimension: usize,
    /// API inference endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header (e.g., `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Remote provider hint: `"hf"`, `"openai"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Normalize the resulting vector to unit-length. Scoring assumes this is on.
    pub normalize: bool,
    /// Retry policy for API calls. `None` means a single attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryConfig>,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: "fast".into(),
            model_name: "stub-384".into(),
            dimension: 384,
            api_url: None,
            api_auth_header: None,
            api_provider: None,
            api_timeout_secs: Some(30),
            normalize: true,
            retry_config: None,
        }
    }
}

impl SemanticConfig {
    /// Check mode-specific requirements.
    pub fn validate(&self) -> Result<(), crate::SemanticError> {
        match self.mode.as_str() {
            "fast" => {
                if self.dimension == 0 {
                    return Err(crate::SemanticError::InvalidConfig(
                        "dimension must be greater than zero".into(),
                    ));
                }
                Ok(())
            }
            "api" => {
                if self.api_url.as_deref().map_or(true, |url| url.trim().is_empty()) {
                    return Err(crate::SemanticError::InvalidConfig(
                        "api_url is required for api mode".into(),
                    ));
                }
                Ok(())
            }
            other => Err(crate::SemanticError::InvalidConfig(format!(
                "unknown mode `{other}` (expected \"fast\" or \"api\")"
            ))),
        }
    }

    /// Apply `MENUMATCH_API_URL` / `MENUMATCH_API_TOKEN` when they are set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api_url = Some(url);
            }
        }
        if let Ok(token) = std::env::var(ENV_API_TOKEN) {
            if !token.trim().is_empty() {
                self.api_auth_header = Some(format!("Bearer {}", token.trim()));
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let cfg = SemanticConfig::default();
        assert_eq!(cfg.mode, "fast");
        assert_eq!(cfg.dimension, 384);
        assert!(cfg.api_url.is_none());
        assert_eq!(cfg.api_timeout_secs, Some(30));
        assert!(cfg.normalize);
        assert!(cfg.retry_config.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn api_mode_requires_url() {
        let cfg = SemanticConfig {
            mode: "api".into(),
            ..Default::default()
        };
        let err = cfg.validate().expect_err("api mode without url");
        assert!(err.to_string().contains("api_url"));
    }

    #[test]
    fn unknown_mode_rejected() {
        let cfg = SemanticConfig {
            mode: "onnx".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_dimension_rejected() {
        let cfg = SemanticConfig {
            dimension: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = SemanticConfig {
            mode: "api".into(),
            model_name: "test-model".into(),
            dimension: 512,
            api_url: Some("https://api.example.com/embed".into()),
            api_auth_header: Some("Bearer token123".into()),
            api_provider: Some("openai".into()),
            api_timeout_secs: Some(60),
            normalize: false,
            retry_config: Some(RetryConfig::default()),
        };

        let serialized = serde_json::to_string(&cfg).unwrap();
        let deserialized: SemanticConfig = serde_json::from_str(&serialized).unwrap();

        assert_eq!(cfg, deserialized);
    }
}
