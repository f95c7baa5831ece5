//! In-memory vector index with snapshot persistence.
//!
//! Brute-force O(n·d) scoring over unit vectors, intentionally the simplest
//! correct baseline for a single-user document set. The index exclusively
//! owns the passage/vector sequence and its on-disk snapshot.

use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::core::errors::EngineError;

use super::chunker::Passage;
use super::embedder::Embedder;

/// A passage paired with its unit-normalized embedding. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedPassage {
    pub passage: Passage,
    pub vector: Vec<f32>,
}

#[derive(Serialize, Deserialize, Default)]
struct Snapshot {
    entries: Vec<EmbeddedPassage>,
}

pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<EmbeddedPassage>,
    index_path: PathBuf,
}

impl VectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>, index_path: PathBuf) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
            index_path,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embed and append passages in input order, then persist the snapshot.
    ///
    /// Embedding failure propagates; persistence failure is logged and
    /// swallowed, the in-memory sequence stays authoritative for this
    /// process lifetime.
    pub async fn add(&mut self, passages: Vec<Passage>) -> Result<(), EngineError> {
        if passages.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        for (passage, vector) in passages.into_iter().zip(vectors) {
            self.entries.push(EmbeddedPassage { passage, vector });
        }

        if let Err(err) = self.save() {
            tracing::warn!("Snapshot not persisted: {}", err);
        }
        tracing::info!("Index now holds {} passages", self.entries.len());
        Ok(())
    }

    /// Top-k passages by dot product against the query embedding, descending.
    /// Ties break by insertion order. An empty index is not an error.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, EngineError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed_one(query).await?;
        let query_view = ArrayView1::from(query_vec.as_slice());

        // Stored and query vectors are unit length, so the dot product is
        // the cosine similarity.
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let score = ArrayView1::from(entry.vector.as_slice()).dot(&query_view);
                (idx, score)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(idx, _)| self.entries[idx].passage.clone())
            .collect())
    }

    /// Populate from the persisted snapshot if one exists. A missing file
    /// leaves the index empty; a corrupt one is logged and treated as absent.
    pub fn load(&mut self) {
        if !self.index_path.exists() {
            tracing::info!("No existing index snapshot found");
            return;
        }

        let raw = match fs::read(&self.index_path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!("Could not read index snapshot: {}", err);
                return;
            }
        };

        match serde_json::from_slice::<Snapshot>(&raw) {
            Ok(snapshot) => {
                self.entries = snapshot.entries;
                tracing::info!("Loaded {} passages from snapshot", self.entries.len());
            }
            Err(err) => {
                tracing::warn!("Ignoring corrupt index snapshot: {}", err);
            }
        }
    }

    /// Empty the index and remove the snapshot file if present.
    pub fn clear(&mut self) {
        self.entries.clear();
        if self.index_path.exists() {
            if let Err(err) = fs::remove_file(&self.index_path) {
                tracing::warn!("Could not remove index snapshot: {}", err);
            }
        }
        tracing::info!("Vector index cleared");
    }

    /// Serialize the full entry sequence as one blob, written via a temp
    /// file and rename so readers never observe a partial snapshot.
    fn save(&self) -> Result<(), EngineError> {
        let snapshot = Snapshot {
            entries: self.entries.clone(),
        };
        let blob = serde_json::to_vec(&snapshot).map_err(EngineError::persistence)?;

        let tmp_path = self.index_path.with_extension("json.tmp");
        fs::write(&tmp_path, &blob).map_err(EngineError::persistence)?;
        fs::rename(&tmp_path, &self.index_path).map_err(EngineError::persistence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{ConstEmbedder, StubEmbedder};
    use super::*;

    fn passage(content: &str) -> Passage {
        Passage {
            content: content.to_string(),
            source: "test.txt".to_string(),
        }
    }

    fn index_at(dir: &std::path::Path) -> VectorIndex {
        VectorIndex::new(Arc::new(StubEmbedder::default()), dir.join("index.json"))
    }

    #[tokio::test]
    async fn empty_index_search_returns_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let index = index_at(dir.path());

        let results = index.search("anything at all", 5).await.expect("search");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_ranks_exact_content_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut index = index_at(dir.path());

        index
            .add(vec![
                passage("rust ownership borrowing lifetimes"),
                passage("french cuisine wine cheese"),
                passage("tokio async runtime tasks"),
            ])
            .await
            .expect("add");

        let results = index
            .search("french cuisine wine cheese", 2)
            .await
            .expect("search");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "french cuisine wine cheese");
    }

    #[tokio::test]
    async fn ties_break_by_insertion_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut index =
            VectorIndex::new(Arc::new(ConstEmbedder::default()), dir.path().join("index.json"));

        index
            .add(vec![passage("first"), passage("second"), passage("third")])
            .await
            .expect("add");

        // Every score is identical under the constant embedder.
        let results = index.search("query", 2).await.expect("search");
        assert_eq!(results[0].content, "first");
        assert_eq!(results[1].content, "second");
    }

    #[tokio::test]
    async fn k_larger_than_index_returns_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut index = index_at(dir.path());

        index
            .add(vec![passage("one passage of text"), passage("another passage")])
            .await
            .expect("add");

        let results = index.search("passage", 10).await.expect("search");
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn snapshot_round_trip_preserves_search_results() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.json");
        let embedder: Arc<dyn crate::rag::embedder::Embedder> =
            Arc::new(StubEmbedder::default());

        let mut original = VectorIndex::new(embedder.clone(), path.clone());
        original
            .add(vec![
                passage("the capital of france is paris"),
                passage("the capital of japan is tokyo"),
                passage("rust has a borrow checker"),
            ])
            .await
            .expect("add");
        let before = original.search("capital of france", 3).await.expect("search");

        let mut reloaded = VectorIndex::new(embedder, path);
        reloaded.load();
        assert_eq!(reloaded.len(), 3);

        let after = reloaded.search("capital of france", 3).await.expect("search");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn clear_removes_snapshot_and_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.json");
        let mut index = VectorIndex::new(Arc::new(StubEmbedder::default()), path.clone());

        index.add(vec![passage("some indexed content")]).await.expect("add");
        assert!(path.exists());

        index.clear();
        assert!(index.is_empty());
        assert!(!path.exists());

        // Clearing again with no snapshot on disk is fine.
        index.clear();

        let results = index.search("some indexed content", 5).await.expect("search");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn load_ignores_corrupt_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.json");
        fs::write(&path, b"{ not json").expect("write");

        let mut index = VectorIndex::new(Arc::new(StubEmbedder::default()), path);
        index.load();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn persistence_failure_keeps_in_memory_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Parent directory does not exist, so the snapshot write fails.
        let path = dir.path().join("missing").join("index.json");
        let mut index = VectorIndex::new(Arc::new(StubEmbedder::default()), path);

        index
            .add(vec![passage("content that should stay queryable")])
            .await
            .expect("add must not fail on persistence trouble");

        assert_eq!(index.len(), 1);
        let results = index.search("queryable content", 1).await.expect("search");
        assert_eq!(results.len(), 1);
    }
}
