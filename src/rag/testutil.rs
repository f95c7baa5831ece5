//! Deterministic in-process stand-ins for the external collaborators,
//! shared by the unit tests in this module tree.

use async_trait::async_trait;

use crate::core::errors::EngineError;
use crate::llm::client::GenerationBackend;
use crate::translate::Translator;

use super::embedder::{l2_normalize, Embedder};

/// Deterministic bag-of-words embedder: each lowercase word hashes into a
/// bucket, counts are L2-normalized. Shared words mean higher similarity.
pub struct StubEmbedder {
    pub dim: usize,
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self { dim: 16 }
    }
}

fn bucket(word: &str, dim: usize) -> usize {
    word.bytes()
        .fold(0usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize))
        % dim
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; self.dim];
                for word in text.to_lowercase().split_whitespace() {
                    let word: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
                    if !word.is_empty() {
                        vector[bucket(&word, self.dim)] += 1.0;
                    }
                }
                if vector.iter().all(|x| *x == 0.0) {
                    vector[0] = 1.0;
                }
                l2_normalize(vector)
            })
            .collect())
    }
}

/// Returns the same unit vector for every input; every similarity ties.
pub struct ConstEmbedder {
    pub dim: usize,
}

impl Default for ConstEmbedder {
    fn default() -> Self {
        Self { dim: 4 }
    }
}

#[async_trait]
impl Embedder for ConstEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        let mut vector = vec![0.0f32; self.dim];
        vector[0] = 1.0;
        Ok(vec![vector; texts.len()])
    }
}

/// Generation stub that echoes its inputs back.
pub struct EchoGenerator;

#[async_trait]
impl GenerationBackend for EchoGenerator {
    async fn generate(&self, context: &str, question: &str) -> Result<String, EngineError> {
        Ok(format!("context: {context} | question: {question}"))
    }
}

/// Generation stub that always fails.
pub struct FailingGenerator;

#[async_trait]
impl GenerationBackend for FailingGenerator {
    async fn generate(&self, _context: &str, _question: &str) -> Result<String, EngineError> {
        Err(EngineError::Generation("backend unavailable".to_string()))
    }
}

/// Translator stub that fails every call, to exercise the fallback path.
pub struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(&self, _text: &str, _source_lang: &str) -> Result<String, EngineError> {
        Err(EngineError::Translation("translator offline".to_string()))
    }
}
