//! Document text extraction and sentence-level chunking.
//!
//! Turns an uploaded file (pdf/txt/doc/docx) into a sequence of bounded
//! passages with source provenance. Extraction trouble never aborts an
//! ingestion batch: a file that cannot be parsed degrades to zero passages.

use std::io::{Cursor, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::core::errors::EngineError;
use crate::docstore::has_supported_extension;

/// A bounded excerpt of a source document, the atomic unit of retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// The text content.
    pub content: String,
    /// Originating filename.
    pub source: String,
}

/// Chunk-assembly limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Close a chunk once its running character count exceeds this.
    pub max_chunk_chars: usize,
    /// Close a chunk once it holds this many sentences.
    pub max_sentences: usize,
    /// Sentences shorter than this (trimmed) are discarded as noise.
    pub min_sentence_chars: usize,
    /// Assembled chunks shorter than this are dropped.
    pub min_chunk_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 500,
            max_sentences: 3,
            min_sentence_chars: 20,
            min_chunk_chars: 20,
        }
    }
}

/// Chunk a document stored on disk. A missing or unreadable file yields an
/// empty result, not an error.
pub fn chunk_file(dir: &Path, filename: &str, config: &ChunkerConfig) -> Vec<Passage> {
    let path = dir.join(filename);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!("Could not read document {}: {}", filename, err);
            return Vec::new();
        }
    };
    chunk_bytes(filename, &bytes, config)
}

/// Chunk raw file bytes (e.g. straight from an upload).
pub fn chunk_bytes(filename: &str, bytes: &[u8], config: &ChunkerConfig) -> Vec<Passage> {
    if !has_supported_extension(filename) {
        return Vec::new();
    }

    let text = match extract_text(filename, bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!("Extraction failed, skipping file: {}", err);
            return Vec::new();
        }
    };

    assemble_passages(&text, filename, config)
}

/// Extract raw text from file bytes, dispatching on extension.
fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, EngineError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes).map_err(|err| EngineError::Parse {
            file: filename.to_string(),
            reason: err.to_string(),
        }),
        "txt" => Ok(String::from_utf8_lossy(bytes).into_owned()),
        // Legacy .doc goes through the same path and degrades per-file when
        // the container is not actually a zip archive.
        "doc" | "docx" => extract_docx(filename, bytes),
        _ => Ok(String::new()),
    }
}

/// Pull the text out of the docx container (`word/document.xml`).
fn extract_docx(filename: &str, bytes: &[u8]) -> Result<String, EngineError> {
    let parse_err = |reason: String| EngineError::Parse {
        file: filename.to_string(),
        reason,
    };

    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|err| parse_err(err.to_string()))?;
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|err| parse_err(err.to_string()))?;
    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .map_err(|err| parse_err(err.to_string()))?;

    Ok(strip_xml_tags(&xml))
}

/// Drop markup, keeping character data. Paragraph closes become newlines so
/// paragraphs do not fuse into one token.
fn strip_xml_tags(xml: &str) -> String {
    let xml = xml.replace("</w:p>", "\n");
    let mut result = String::with_capacity(xml.len() / 2);
    let mut in_tag = false;

    for c in xml.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Normalize, split into sentences and greedily group them into passages.
fn assemble_passages(text: &str, source: &str, config: &ChunkerConfig) -> Vec<Passage> {
    let normalized = text.replace(['\n', '\r'], " ");

    let sentences: Vec<&str> = normalized
        .unicode_sentences()
        .map(str::trim)
        .filter(|s| s.chars().count() >= config.min_sentence_chars)
        .collect();

    let mut chunks: Vec<String> = Vec::new();
    let mut group: Vec<&str> = Vec::new();
    let mut group_chars = 0usize;

    for sentence in sentences {
        group.push(sentence);
        group_chars += sentence.chars().count();

        if group_chars > config.max_chunk_chars || group.len() >= config.max_sentences {
            chunks.push(group.join(" ").trim().to_string());
            group.clear();
            group_chars = 0;
        }
    }

    if !group.is_empty() {
        chunks.push(group.join(" ").trim().to_string());
    }

    chunks
        .into_iter()
        .filter(|chunk| chunk.chars().count() >= config.min_chunk_chars)
        .map(|content| Passage {
            content,
            source: source.to_string(),
        })
        .collect()
}
