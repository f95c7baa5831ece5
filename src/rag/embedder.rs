//! Text embedding via an OpenAI-compatible `/v1/embeddings` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::EmbeddingSettings;
use crate::core::errors::EngineError;

/// Maps text to fixed-length unit vectors.
///
/// `embed_one` delegates to `embed_batch` by default, so batch and
/// single-item embedding are numerically consistent by construction.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Fixed output dimensionality.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, one unit-normalized vector per input, in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError>;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        let input = [text.to_string()];
        let mut vectors = self.embed_batch(&input).await?;
        vectors
            .pop()
            .ok_or_else(|| EngineError::Embedding("backend returned no vector".to_string()))
    }
}

/// Embedder backed by an OpenAI-compatible HTTP server (LM Studio, llama.cpp
/// server, or a hosted API).
pub struct HttpEmbedder {
    base_url: String,
    model: String,
    dimension: usize,
    client: Client,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    /// Connect to the backend and verify it produces vectors of the expected
    /// dimensionality. This is the one failure allowed to abort startup.
    pub async fn connect(settings: &EmbeddingSettings) -> Result<Self, EngineError> {
        let embedder = Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            dimension: settings.dimension,
            client: Client::new(),
        };

        let probe_input = ["embedding model probe".to_string()];
        let probe = embedder.fetch(&probe_input).await?;
        let got = probe.first().map(|v| v.len()).unwrap_or(0);
        if got != embedder.dimension {
            return Err(EngineError::Embedding(format!(
                "backend dimension mismatch: expected {}, got {}",
                embedder.dimension, got
            )));
        }

        tracing::info!(
            "Embedding backend ready: model={} dim={}",
            embedder.model,
            embedder.dimension
        );
        Ok(embedder)
    }

    async fn fetch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(EngineError::embedding)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(EngineError::Embedding(format!(
                "embedding request failed ({status}): {text}"
            )));
        }

        let payload: EmbeddingsResponse = res.json().await.map_err(EngineError::embedding)?;
        if payload.data.len() != texts.len() {
            return Err(EngineError::Embedding(format!(
                "backend returned {} vectors for {} inputs",
                payload.data.len(),
                texts.len()
            )));
        }

        // The HTTP contract does not promise unit vectors, so normalize here.
        // Downstream code assumes unit length and never re-normalizes.
        Ok(payload
            .data
            .into_iter()
            .map(|row| l2_normalize(row.embedding))
            .collect())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch(texts).await
    }
}

/// Scale a vector to unit L2 norm. A zero vector is returned unchanged.
pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}
