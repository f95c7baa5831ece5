//! Retrieval-augmented responder.
//!
//! Orchestrates the query lifecycle: best-effort translation, the rule fast
//! path, then top-k retrieval feeding the generation backend. Every failure
//! past startup degrades to a canned answer; `respond` always returns a
//! string, never an error.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::RetrievalSettings;
use crate::core::errors::EngineError;
use crate::docstore::DocStore;
use crate::llm::client::GenerationBackend;
use crate::translate::Translator;

use super::chunker::{self, ChunkerConfig};
use super::index::VectorIndex;
use super::rules::RuleSet;

/// Returned when retrieval finds nothing to ground an answer in.
pub const NO_MATCH_ANSWER: &str = "No relevant information found.";
/// Returned when the generation backend fails; the user still gets a reply.
pub const DEGRADED_ANSWER: &str = "An error occurred while generating the answer.";

pub struct RagEngine {
    /// Searches take the read lock; `add`/`clear` take the write lock.
    index: RwLock<VectorIndex>,
    rules: RuleSet,
    translator: Arc<dyn Translator>,
    generator: Arc<dyn GenerationBackend>,
    docs: DocStore,
    chunker: ChunkerConfig,
    retrieval: RetrievalSettings,
}

impl RagEngine {
    pub fn new(
        index: VectorIndex,
        rules: RuleSet,
        translator: Arc<dyn Translator>,
        generator: Arc<dyn GenerationBackend>,
        docs: DocStore,
        chunker: ChunkerConfig,
        retrieval: RetrievalSettings,
    ) -> Self {
        Self {
            index: RwLock::new(index),
            rules,
            translator,
            generator,
            docs,
            chunker,
            retrieval,
        }
    }

    /// Answer a user query. Rules are checked against the raw input first;
    /// only on a miss does the (translated) query go through retrieval and
    /// generation.
    pub async fn respond(&self, text: &str, source_lang: &str) -> String {
        if let Some(reply) = self.rules.respond(text) {
            return reply;
        }

        let query = match self.translator.translate(text, source_lang).await {
            Ok(translated) => translated,
            Err(err) => {
                tracing::warn!("Translation failed, using original text: {}", err);
                text.to_string()
            }
        };

        let results = {
            let index = self.index.read().await;
            index.search(&query, self.retrieval.default_k).await
        };

        let passages = match results {
            Ok(passages) => passages,
            Err(err) => {
                tracing::error!("Retrieval failed: {}", err);
                return DEGRADED_ANSWER.to_string();
            }
        };

        if passages.is_empty() {
            return NO_MATCH_ANSWER.to_string();
        }

        let context: String = passages
            .iter()
            .map(|p| p.content.trim())
            .collect::<Vec<_>>()
            .join("\n\n");

        match self.generator.generate(&context, &query).await {
            Ok(answer) => answer,
            Err(err) => {
                tracing::error!("Generation failed: {}", err);
                DEGRADED_ANSWER.to_string()
            }
        }
    }

    /// Extractive fallback: the single top-ranked passage trimmed to the
    /// configured token budget, no generation involved.
    pub async fn answer(&self, query: &str, k: usize) -> Result<String, EngineError> {
        let results = {
            let index = self.index.read().await;
            index.search(query, k).await?
        };

        let top = match results.first() {
            Some(passage) => passage.content.trim(),
            None => return Ok(NO_MATCH_ANSWER.to_string()),
        };

        let tokens: Vec<&str> = top.split_whitespace().collect();
        if tokens.len() > self.retrieval.max_answer_tokens {
            Ok(tokens[..self.retrieval.max_answer_tokens].join(" "))
        } else {
            Ok(top.to_string())
        }
    }

    /// Chunk one stored document and add its passages to the index.
    /// The caller must have finished mutating the document store.
    pub async fn ingest(&self, filename: &str) -> Result<usize, EngineError> {
        let passages = chunker::chunk_file(self.docs.dir(), filename, &self.chunker);
        let count = passages.len();
        if count == 0 {
            tracing::warn!("No content extracted from {}", filename);
            return Ok(0);
        }

        let mut index = self.index.write().await;
        index.add(passages).await?;
        tracing::info!("Indexed {} chunks from {}", count, filename);
        Ok(count)
    }

    /// Index every available document, skipping work when a loaded snapshot
    /// already populates the index. Per-file extraction trouble degrades to
    /// zero passages for that file and never aborts the batch.
    pub async fn ingest_all(&self) -> Result<usize, EngineError> {
        {
            let index = self.index.read().await;
            if !index.is_empty() {
                tracing::info!("Index already holds {} passages, skipping reingest", index.len());
                return Ok(index.len());
            }
        }

        let filenames = self.docs.available_files();
        if filenames.is_empty() {
            tracing::warn!("No valid documents found in docs directory");
            return Ok(0);
        }

        let mut passages = Vec::new();
        for filename in &filenames {
            passages.extend(chunker::chunk_file(self.docs.dir(), filename, &self.chunker));
        }

        if passages.is_empty() {
            tracing::warn!("No content extracted from available documents");
            return Ok(0);
        }

        let count = passages.len();
        let mut index = self.index.write().await;
        index.add(passages).await?;
        tracing::info!("Indexed {} chunks from {} documents", count, filenames.len());
        Ok(count)
    }

    /// Drop all indexed passages and the snapshot. Call before reloading a
    /// new document set so no stale passage leaks into later answers.
    pub async fn reset(&self) {
        let mut index = self.index.write().await;
        index.clear();
    }

    pub async fn passage_count(&self) -> usize {
        self.index.read().await.len()
    }

    pub fn docs(&self) -> &DocStore {
        &self.docs
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use crate::rag::testutil::{
        EchoGenerator, FailingGenerator, FailingTranslator, StubEmbedder,
    };
    use crate::translate::NoopTranslator;

    use super::*;

    struct Harness {
        engine: RagEngine,
        _dir: TempDir,
    }

    fn harness_with(
        generator: Arc<dyn GenerationBackend>,
        translator: Arc<dyn Translator>,
        retrieval: RetrievalSettings,
    ) -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let docs = DocStore::new(dir.path().join("docs"));
        let index = VectorIndex::new(
            Arc::new(StubEmbedder::default()),
            dir.path().join("vector_store.json"),
        );
        let engine = RagEngine::new(
            index,
            RuleSet::builtin(),
            translator,
            generator,
            docs,
            ChunkerConfig::default(),
            retrieval,
        );
        Harness { engine, _dir: dir }
    }

    fn harness() -> Harness {
        harness_with(
            Arc::new(EchoGenerator),
            Arc::new(NoopTranslator),
            RetrievalSettings::default(),
        )
    }

    fn write_doc(engine: &RagEngine, name: &str, content: &str) {
        fs::write(engine.docs().dir().join(name), content).expect("write doc");
    }

    #[tokio::test]
    async fn end_to_end_grounded_answer() {
        let h = harness();
        write_doc(&h.engine, "facts.txt", "The capital of France is Paris.");

        let indexed = h.engine.ingest_all().await.expect("ingest");
        assert_eq!(indexed, 1);

        let reply = h.engine.respond("What is the capital of France?", "en").await;
        assert!(reply.contains("Paris"));
    }

    #[tokio::test]
    async fn empty_store_yields_no_match_sentinel() {
        let h = harness();
        let reply = h.engine.respond("What is the capital of France?", "en").await;
        assert_eq!(reply, NO_MATCH_ANSWER);
    }

    #[tokio::test]
    async fn generation_failure_yields_degraded_sentinel() {
        let h = harness_with(
            Arc::new(FailingGenerator),
            Arc::new(NoopTranslator),
            RetrievalSettings::default(),
        );
        write_doc(&h.engine, "facts.txt", "The capital of France is Paris.");
        h.engine.ingest_all().await.expect("ingest");

        let reply = h.engine.respond("What is the capital of France?", "en").await;
        assert_eq!(reply, DEGRADED_ANSWER);
    }

    #[tokio::test]
    async fn rule_match_short_circuits_retrieval() {
        let h = harness();
        // Index is empty; a retrieval path would answer with the no-match
        // sentinel, so a greeting proves the fast path won.
        let reply = h.engine.respond("hello there", "en").await;
        assert!(reply.contains("assist"));
    }

    #[tokio::test]
    async fn translation_failure_falls_back_to_original_text() {
        let h = harness_with(
            Arc::new(EchoGenerator),
            Arc::new(FailingTranslator),
            RetrievalSettings::default(),
        );
        write_doc(&h.engine, "facts.txt", "The capital of France is Paris.");
        h.engine.ingest_all().await.expect("ingest");

        let reply = h.engine.respond("What is the capital of France?", "ta").await;
        assert!(reply.contains("question: What is the capital of France?"));
    }

    #[tokio::test]
    async fn extractive_answer_returns_top_passage() {
        let h = harness();
        write_doc(&h.engine, "facts.txt", "The capital of France is Paris.");
        h.engine.ingest_all().await.expect("ingest");

        let answer = h.engine.answer("capital of France", 1).await.expect("answer");
        assert_eq!(answer, "The capital of France is Paris.");
    }

    #[tokio::test]
    async fn extractive_answer_respects_token_budget() {
        let h = harness_with(
            Arc::new(EchoGenerator),
            Arc::new(NoopTranslator),
            RetrievalSettings {
                default_k: 5,
                max_answer_tokens: 3,
            },
        );
        write_doc(&h.engine, "facts.txt", "The capital of France is Paris.");
        h.engine.ingest_all().await.expect("ingest");

        let answer = h.engine.answer("capital of France", 1).await.expect("answer");
        assert_eq!(answer.split_whitespace().count(), 3);
        assert!(answer.starts_with("The capital"));
    }

    #[tokio::test]
    async fn reset_purges_stale_passages() {
        let h = harness();
        write_doc(&h.engine, "facts.txt", "The capital of France is Paris.");
        h.engine.ingest_all().await.expect("ingest");
        assert_eq!(h.engine.passage_count().await, 1);

        h.engine.reset().await;
        assert_eq!(h.engine.passage_count().await, 0);

        let reply = h.engine.respond("What is the capital of France?", "en").await;
        assert_eq!(reply, NO_MATCH_ANSWER);
    }

    #[tokio::test]
    async fn ingest_all_skips_populated_index() {
        let h = harness();
        write_doc(&h.engine, "facts.txt", "The capital of France is Paris.");
        h.engine.ingest_all().await.expect("ingest");

        // A second pass must not duplicate passages.
        let count = h.engine.ingest_all().await.expect("ingest");
        assert_eq!(count, 1);
        assert_eq!(h.engine.passage_count().await, 1);
    }

    #[tokio::test]
    async fn ingest_single_file_reports_chunk_count() {
        let h = harness();
        write_doc(
            &h.engine,
            "facts.txt",
            "The capital of France is Paris. The capital of Japan is Tokyo. \
             The capital of Italy is Rome. The capital of Spain is Madrid.",
        );

        let count = h.engine.ingest("facts.txt").await.expect("ingest");
        assert_eq!(count, 2);
        assert_eq!(h.engine.passage_count().await, 2);
    }
}
