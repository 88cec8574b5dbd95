//! Machine translation.
//!
//! One short HTTP request per segment against a LibreTranslate-compatible
//! endpoint. Failures here are always segment-local: the orchestrator
//! substitutes the original text instead of failing the job.

use crate::config::TranslateConfig;
use crate::error::{DubError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Translates one piece of text into a target language.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String>;
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// HTTP adapter for a LibreTranslate-style service.
pub struct HttpTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTranslator {
    pub fn new(config: &TranslateConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            // Falls back to default client settings when the builder is
            // rejected (never happens with a plain timeout).
            .unwrap_or_default();
        Self {
            client,
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String> {
        let request = TranslateRequest {
            q: text,
            source: "auto",
            target: target_code,
            format: "text",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| DubError::Translation {
                message: format!("request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(DubError::Translation {
                message: format!("server returned {}", response.status()),
            });
        }

        let body: TranslateResponse =
            response.json().await.map_err(|e| DubError::Translation {
                message: format!("invalid response: {}", e),
            })?;

        Ok(body.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_like_libretranslate() {
        let request = TranslateRequest {
            q: "hello",
            source: "auto",
            target: "es",
            format: "text",
        };
        let json = serde_json::to_string(&request).expect("serialize");
        assert!(json.contains("\"q\":\"hello\""));
        assert!(json.contains("\"target\":\"es\""));
    }

    #[test]
    fn test_response_parses_camel_case_field() {
        let body: TranslateResponse =
            serde_json::from_str(r#"{"translatedText": "hola"}"#).expect("parse");
        assert_eq!(body.translated_text, "hola");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_translation_error() {
        let translator = HttpTranslator::new(&TranslateConfig {
            endpoint: "http://192.0.2.1:9/translate".to_string(),
            timeout_secs: 1,
        });

        let err = translator
            .translate("hello", "es")
            .await
            .expect_err("unreachable");
        assert!(matches!(err, DubError::Translation { .. }));
    }
}
