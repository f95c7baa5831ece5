//! Document-grounded question answering backend.
//!
//! Uploaded documents are chunked into passages, embedded and held in a
//! brute-force vector index with snapshot persistence. Queries run through a
//! rule fast path first, then retrieval-augmented generation against an
//! OpenAI-compatible backend.

pub mod config;
pub mod core;
pub mod docstore;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod server;
pub mod state;
pub mod translate;
