use chrono::{DateTime, Utc};
use ragbot_core::{RagbotError, RagbotResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Version of the on-disk JSONL layout.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Similarity metric the index was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity, higher is closer.
    #[default]
    Cosine,
    /// Euclidean distance; scores are the negated distance.
    L2,
}

impl DistanceMetric {
    /// Score where a larger value always means "more similar".
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => cosine_similarity(a, b),
            DistanceMetric::L2 => -l2_distance(a, b),
        }
    }
}

/// Header line of a persisted index.
///
/// Pins the embedding model and dimension so that queries are embedded in
/// the same space the index was built in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub dimension: usize,
    pub embedding_model: String,
    #[serde(default)]
    pub metric: DistanceMetric,
    pub entry_count: usize,
    pub created_at: DateTime<Utc>,
}

/// A single stored chunk with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub text: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Result of a similarity search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub entry: IndexEntry,
    pub score: f32,
    /// Insertion position of the entry within the index.
    pub position: usize,
}

/// Exact nearest-neighbor index over chunk embeddings.
///
/// Entries are added in bulk at build time and the index is read-only
/// afterwards, so it can be shared behind an `Arc` and searched from many
/// tasks at once. Search is a flat scan: every entry is scored and the
/// top-k kept, ties resolved by insertion order.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn new(dimension: usize, embedding_model: impl Into<String>, metric: DistanceMetric) -> Self {
        Self {
            manifest: IndexManifest {
                format_version: INDEX_FORMAT_VERSION,
                dimension,
                embedding_model: embedding_model.into(),
                metric,
                entry_count: 0,
                created_at: Utc::now(),
            },
            entries: Vec::new(),
        }
    }

    /// Add an entry; its embedding must match the index dimension.
    pub fn insert(&mut self, entry: IndexEntry) -> RagbotResult<()> {
        if entry.embedding.len() != self.manifest.dimension {
            return Err(RagbotError::EmbeddingProvider(format!(
                "entry has dimension {}, index expects {}",
                entry.embedding.len(),
                self.manifest.dimension
            )));
        }
        self.entries.push(entry);
        self.manifest.entry_count = self.entries.len();
        Ok(())
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn dimension(&self) -> usize {
        self.manifest.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `top_k` entries most similar to `query`, best first.
    pub fn search(&self, query: &[f32], top_k: usize) -> RagbotResult<Vec<SearchResult>> {
        if self.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.manifest.dimension {
            return Err(RagbotError::EmbeddingProvider(format!(
                "query has dimension {}, index expects {}",
                query.len(),
                self.manifest.dimension
            )));
        }

        let metric = self.manifest.metric;
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, e)| (pos, metric.score(query, &e.embedding)))
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchResult {
                entry: self.entries[position].clone(),
                score,
                position,
            })
            .collect())
    }

    /// Persist the whole index to `path`, replacing any previous index
    /// atomically: the data goes to a sibling temp file which is fsynced and
    /// then renamed over `path`, and the directory is fsynced so the rename
    /// itself is durable.
    pub async fn save(&self, path: &Path) -> RagbotResult<()> {
        let mut data = serde_json::to_string(&self.manifest)?;
        data.push('\n');
        for entry in &self.entries {
            data.push_str(&serde_json::to_string(entry)?);
            data.push('\n');
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = temp_path_for(path);
        if let Err(e) = write_and_sync(&temp_path, data.as_bytes()).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        sync_dir(path.parent()).await?;

        info!(
            path = %path.display(),
            entries = self.entries.len(),
            dimension = self.manifest.dimension,
            "Vector index saved"
        );
        Ok(())
    }

    /// Load an index previously written by [`save`](Self::save).
    ///
    /// Any problem (missing file, unreadable or truncated data, dimension
    /// mismatch) is reported as [`RagbotError::IndexUnavailable`].
    pub async fn load(path: &Path) -> RagbotResult<Self> {
        let data = tokio::fs::read_to_string(path).await.map_err(|e| {
            RagbotError::IndexUnavailable(format!(
                "Failed to read index '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut lines = data.lines().filter(|l| !l.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| RagbotError::IndexUnavailable("index file is empty".to_string()))?;
        let manifest: IndexManifest = serde_json::from_str(header)
            .map_err(|e| RagbotError::IndexUnavailable(format!("Invalid index header: {e}")))?;

        if manifest.format_version != INDEX_FORMAT_VERSION {
            return Err(RagbotError::IndexUnavailable(format!(
                "unsupported index format version {}",
                manifest.format_version
            )));
        }

        let mut entries = Vec::new();
        for (line_no, line) in lines.enumerate() {
            let entry: IndexEntry = serde_json::from_str(line).map_err(|e| {
                RagbotError::IndexUnavailable(format!("Invalid index entry {line_no}: {e}"))
            })?;
            if entry.embedding.len() != manifest.dimension {
                return Err(RagbotError::IndexUnavailable(format!(
                    "entry {line_no} has dimension {}, index expects {}",
                    entry.embedding.len(),
                    manifest.dimension
                )));
            }
            entries.push(entry);
        }

        if entries.len() != manifest.entry_count {
            warn!(
                expected = manifest.entry_count,
                found = entries.len(),
                "Index entry count mismatch"
            );
            return Err(RagbotError::IndexUnavailable(format!(
                "index is truncated: expected {} entries, found {}",
                manifest.entry_count,
                entries.len()
            )));
        }

        debug!(path = %path.display(), entries = entries.len(), "Vector index loaded");
        Ok(Self { manifest, entries })
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "index".into());
    name.push(".tmp");
    path.with_file_name(name)
}

async fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(unix)]
async fn sync_dir(dir: Option<&Path>) -> std::io::Result<()> {
    let dir = match dir.filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => dir,
        None => Path::new("."),
    };
    tokio::fs::File::open(dir).await?.sync_all().await
}

// Directories cannot be opened for syncing on Windows.
#[cfg(not(unix))]
async fn sync_dir(_dir: Option<&Path>) -> std::io::Result<()> {
    Ok(())
}

/// Cosine similarity between two vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
