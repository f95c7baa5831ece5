//! Document storage collaborator.
//!
//! A directory-backed store of uploaded source documents. The store only
//! manages files; chunking and indexing read through it and assume the caller
//! has finished mutating it before they run.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::errors::ApiError;

/// Extensions the chunker can extract text from.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["pdf", "txt", "doc", "docx"];

#[derive(Debug, Clone)]
pub struct DocStore {
    docs_dir: PathBuf,
}

impl DocStore {
    pub fn new(docs_dir: PathBuf) -> Self {
        let _ = fs::create_dir_all(&docs_dir);
        Self { docs_dir }
    }

    pub fn dir(&self) -> &Path {
        &self.docs_dir
    }

    /// Filenames with a supported extension, in directory order.
    pub fn available_files(&self) -> Vec<String> {
        self.list(|name| has_supported_extension(name))
    }

    /// Every regular file in the store, supported or not.
    pub fn all_files(&self) -> Vec<String> {
        self.list(|_| true)
    }

    fn list(&self, keep: impl Fn(&str) -> bool) -> Vec<String> {
        let entries = match fs::read_dir(&self.docs_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(|s| s.to_string()))
            .filter(|name| keep(name))
            .collect();
        names.sort();
        names
    }

    pub fn read(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
        let safe = sanitize_filename(filename)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid filename: {filename}")))?;
        let path = self.docs_dir.join(safe);
        if !path.exists() {
            return Err(ApiError::NotFound(format!("Document not found: {safe}")));
        }
        fs::read(&path).map_err(ApiError::internal)
    }

    pub fn path_of(&self, filename: &str) -> Option<PathBuf> {
        sanitize_filename(filename).map(|safe| self.docs_dir.join(safe))
    }

    /// Remove every stored document, then save `filename` with `bytes`.
    ///
    /// The single-document-set model of the original product: an upload
    /// replaces the whole store. The caller is responsible for resetting the
    /// index before reingesting.
    pub fn replace_with(&self, filename: &str, bytes: &[u8]) -> Result<(), ApiError> {
        let safe = sanitize_filename(filename)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid filename: {filename}")))?;

        for existing in self.all_files() {
            let _ = fs::remove_file(self.docs_dir.join(existing));
        }

        let path = self.docs_dir.join(safe);
        let mut file = fs::File::create(&path).map_err(ApiError::internal)?;
        file.write_all(bytes).map_err(ApiError::internal)?;
        Ok(())
    }
}

pub fn has_supported_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Allow base names only; reject separators and parent traversal.
fn sanitize_filename(filename: &str) -> Option<&str> {
    let base = Path::new(filename).file_name().and_then(|n| n.to_str())?;
    if base == filename && !filename.contains("..") {
        Some(base)
    } else {
        None
    }
}
