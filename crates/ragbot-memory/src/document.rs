use ragbot_core::{RagbotError, RagbotResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Raw text loaded from the document source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Where the text came from (file path).
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// A contiguous slice of a [`Document`], the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// Source of the owning document.
    pub source: String,
    /// Position of this chunk within its document.
    pub index: usize,
    /// Character offset of the chunk start within the document text.
    pub start: usize,
}

impl Chunk {
    /// Metadata stored alongside the chunk in the vector index.
    pub fn metadata(&self) -> HashMap<String, serde_json::Value> {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), serde_json::json!(self.source));
        metadata.insert("chunk_index".to_string(), serde_json::json!(self.index));
        metadata.insert("start".to_string(), serde_json::json!(self.start));
        metadata
    }
}

/// Load every readable regular file directly under `source_dir` as one [`Document`].
///
/// Subdirectories are not descended into; files are returned in sorted path
/// order. Files that cannot be read as UTF-8 text are logged and skipped. A
/// missing source, or one that is not a directory, is reported as
/// [`RagbotError::DataNotFound`].
pub async fn load_documents(source_dir: &Path) -> RagbotResult<Vec<Document>> {
    if let Ok(meta) = tokio::fs::metadata(source_dir).await {
        if !meta.is_dir() {
            return Err(RagbotError::DataNotFound(format!(
                "document source '{}' is not a directory",
                source_dir.display()
            )));
        }
    }

    let mut entries = match tokio::fs::read_dir(source_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RagbotError::DataNotFound(format!(
                "document source '{}' does not exist",
                source_dir.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        match entry.file_type().await {
            Ok(ft) if ft.is_file() => files.push(path),
            Ok(_) => debug!(path = %path.display(), "Skipping non-regular entry"),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable entry"),
        }
    }

    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => documents.push(Document::new(path.display().to_string(), text)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error loading file, skipping");
            }
        }
    }

    debug!(count = documents.len(), source = %source_dir.display(), "Loaded documents");
    Ok(documents)
}
