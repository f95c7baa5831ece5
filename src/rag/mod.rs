//! Retrieval engine: chunking, embedding, the vector index and the
//! two-stage response pipeline (rule fast path, then retrieval-augmented
//! generation).

pub mod chunker;
pub mod embedder;
pub mod engine;
pub mod index;
pub mod rules;

#[cfg(test)]
pub(crate) mod testutil;

pub use chunker::{ChunkerConfig, Passage};
pub use embedder::{Embedder, HttpEmbedder};
pub use engine::{RagEngine, DEGRADED_ANSWER, NO_MATCH_ANSWER};
pub use index::VectorIndex;
pub use rules::RuleSet;
