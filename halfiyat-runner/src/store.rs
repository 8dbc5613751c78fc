//! Document store collaborator.
//!
//! Records land in a hierarchical document store addressed by
//! collection/document paths. [`DocumentStore`] is the narrow seam the
//! pipeline writes through; [`JsonFileStore`] keeps one `.json` file per
//! document on disk and [`MemoryStore`] backs the tests.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::config::Credentials;

/// Top-level collection every record lives under.
pub const ROOT_COLLECTION: &str = "halPrices";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid document path segment {0:?}")]
    InvalidPath(String),

    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode document {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store rejected the write: {0}")]
    Rejected(String),
}

/// Alternating collection/document segments, e.g. `halPrices/izmir/2024-06-14/domates`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath(Vec<String>);

impl DocPath {
    pub fn root() -> Self {
        Self(vec![ROOT_COLLECTION.to_string()])
    }

    /// Append one segment. Empty segments, `.`/`..` and segments containing
    /// a path separator are rejected.
    pub fn child(&self, segment: &str) -> Result<Self, StoreError> {
        if segment.is_empty()
            || segment == "."
            || segment == ".."
            || segment.contains(['/', '\\'])
        {
            return Err(StoreError::InvalidPath(segment.to_string()));
        }
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Writes applied together by [`DocumentStore::commit`].
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    writes: Vec<(DocPath, Value)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a full-document write. A later write to the same path wins.
    pub fn set(&mut self, path: DocPath, document: Value) {
        self.writes.push((path, document));
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[(DocPath, Value)] {
        &self.writes
    }

    /// The document each path ends up with once the batch is applied.
    pub fn latest(&self) -> BTreeMap<&DocPath, &Value> {
        self.writes.iter().map(|(path, doc)| (path, doc)).collect()
    }
}

pub trait DocumentStore {
    /// Replace one document.
    fn set(&self, path: &DocPath, document: &Value) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.set(path.clone(), document.clone());
        self.commit(batch).map(|_| ())
    }

    /// Apply every write or none of them. Returns the number of documents
    /// written; repeated paths count once.
    fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError>;
}

// ─── File-backed store ──────────────────────────────────────────────

/// One JSON file per document under `<store_dir>/<project_id>/`.
///
/// `halPrices/izmir/2024-06-14/domates` is stored at
/// `<root>/halPrices/izmir/2024-06-14/domates.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

const STAGED_SUFFIX: &str = "staged";

impl JsonFileStore {
    pub fn open(store_dir: &Path, credentials: &Credentials) -> Result<Self, StoreError> {
        let root = store_dir.join(&credentials.project_id);
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        debug!(root = %root.display(), client = %credentials.client_email, "opened document store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_path(&self, path: &DocPath) -> PathBuf {
        let mut file = self.root.clone();
        if let Some((last, parents)) = path.segments().split_last() {
            file.extend(parents);
            file.push(format!("{last}.json"));
        }
        file
    }

    pub fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        let file = self.file_path(path);
        let text = match fs::read_to_string(&file) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path: file, source }),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Encode {
                path: path.to_string(),
                source,
            })
    }

    fn stage(&self, path: &DocPath, document: &Value) -> Result<(PathBuf, PathBuf), StoreError> {
        let target = self.file_path(path);
        let staged = target.with_extension(format!("json.{STAGED_SUFFIX}"));
        let io = |p: &Path| {
            let p = p.to_path_buf();
            move |source: std::io::Error| StoreError::Io { path: p, source }
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io(parent))?;
        }
        let json = serde_json::to_vec_pretty(document).map_err(|source| StoreError::Encode {
            path: path.to_string(),
            source,
        })?;
        fs::write(&staged, json).map_err(io(&staged))?;
        Ok((staged, target))
    }
}

impl DocumentStore for JsonFileStore {
    /// Stage every document next to its target, then rename them all into
    /// place. Each path is staged once, with its last write. If staging fails
    /// nothing is renamed; if a rename fails the files not yet renamed are
    /// discarded.
    fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        let latest = batch.latest();
        let mut staged = Vec::with_capacity(latest.len());
        for (path, document) in latest {
            match self.stage(path, document) {
                Ok(pair) => staged.push(pair),
                Err(e) => {
                    discard(&staged);
                    return Err(e);
                }
            }
        }

        for (i, (tmp, target)) in staged.iter().enumerate() {
            if let Err(source) = fs::rename(tmp, target) {
                discard(&staged[i..]);
                return Err(StoreError::Io {
                    path: target.clone(),
                    source,
                });
            }
        }
        Ok(staged.len())
    }
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}

// ─── In-memory store ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<DocPath, Value>>,
    reject_commits: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every commit fails.
    pub fn rejecting() -> Self {
        Self {
            reject_commits: true,
            ..Self::default()
        }
    }

    pub fn get(&self, path: &DocPath) -> Option<Value> {
        self.lock().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<DocPath> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<DocPath, Value>> {
        self.docs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DocumentStore for MemoryStore {
    fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        if self.reject_commits {
            return Err(StoreError::Rejected("commits disabled".into()));
        }
        let mut docs = self.lock();
        let latest = batch.latest();
        let count = latest.len();
        for (path, document) in latest {
            docs.insert(path.clone(), document.clone());
        }
        Ok(count)
    }
}
