//! Generation backend integration.

pub mod client;

pub use client::{GenerationBackend, OpenAiCompatClient};
