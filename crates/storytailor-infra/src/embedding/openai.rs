//! OpenAI-compatible HTTP embedder.
//!
//! Calls `POST {base_url}/embeddings` with a batch of inputs. Works with
//! OpenAI and any server that speaks the same protocol.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and only exposed when
//! building the authorization header.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use storytailor_core::embedding::Embedder;
use storytailor_types::error::GroundingError;

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        model: &str,
        dimension: usize,
    ) -> Result<Self, GroundingError> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            GroundingError::EmbeddingUnavailable(format!("failed to create HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dimension,
        })
    }
}

// No Debug: keeps the key out of logs.

impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GroundingError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimension,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| GroundingError::EmbeddingUnavailable(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(GroundingError::EmbeddingUnavailable(format!(
                "HTTP {status}: {error_body}"
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            GroundingError::EmbeddingUnavailable(format!("failed to parse response: {e}"))
        })?;

        order_embeddings(parsed, texts.len())
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Put vectors back in input order; the API reports each item's index.
fn order_embeddings(
    response: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, GroundingError> {
    if response.data.len() != expected {
        return Err(GroundingError::EmbeddingUnavailable(format!(
            "expected {expected} embeddings, got {}",
            response.data.len()
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in response.data {
        match slots.get_mut(item.index) {
            Some(slot) if slot.is_none() => *slot = Some(item.embedding),
            _ => {
                return Err(GroundingError::EmbeddingUnavailable(format!(
                    "unexpected embedding index {}",
                    item.index
                )));
            }
        }
    }
    slots
        .into_iter()
        .map(|slot| {
            slot.ok_or_else(|| GroundingError::EmbeddingUnavailable("missing embedding".to_string()))
        })
        .collect()
}
