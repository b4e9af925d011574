//! OpenAI-compatible HTTP embedding provider.
//!
//! Blocking client with a request timeout; a timeout or transport failure
//! surfaces as [`EmbeddingError::Unavailable`]. Retry policy belongs to
//! the caller, not this client.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{EmbeddingError, EmbeddingProvider};

pub struct HttpProvider {
    client: Client,
    endpoint: String,
}

impl HttpProvider {
    /// Build a client for an OpenAI-compatible `/embeddings` endpoint.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let auth = format!("Bearer {}", key.trim());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth)
                    .map_err(|err| EmbeddingError::Unavailable(format!("invalid api key: {err}")))?,
            );
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| {
                EmbeddingError::Unavailable(format!("failed to build http client: {err}"))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
        })
    }

    fn request(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = EmbeddingRequest {
            model,
            input: texts,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|err| EmbeddingError::Unavailable(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingError::Unavailable(format!("{status}: {text}")));
        }

        let mut parsed: EmbeddingResponse = resp
            .json()
            .map_err(|err| EmbeddingError::Unavailable(format!("bad response body: {err}")))?;

        // Entries may come back reordered for batching efficiency; restore
        // input order before returning.
        parsed.data.sort_by_key(|entry| entry.index);
        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::Unavailable(format!(
                "{} embeddings returned for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        Ok(parsed
            .data
            .into_iter()
            .map(|entry| entry.embedding)
            .collect())
    }
}

impl EmbeddingProvider for HttpProvider {
    fn embed_one(&self, text: &str, model: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.request(&[text.to_string()], model)?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Unavailable("no embedding returned".to_string()))
    }

    fn embed_many(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts, model)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
