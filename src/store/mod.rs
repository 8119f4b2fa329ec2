use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Metadata for one uploaded image. All fields are immutable once written.
/// Serde renames pin the on-disk `images.json` keys to `Id`/`Title`/`Path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Lookup key, generated at upload time. Also the stored file's stem.
    #[serde(rename = "Id")]
    pub id: String,
    /// User-supplied title, non-blank after trimming.
    #[serde(rename = "Title")]
    pub title: String,
    /// Public relative URL of the stored file, e.g. "/uploads/<id>.png".
    #[serde(rename = "Path")]
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read image store: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write image store: {0}")]
    Write(#[source] std::io::Error),
    #[error("image store is unparsable: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// JSON-backed ordered list of ImageRecord. The whole document is read on
/// every lookup and rewritten on every append — there is no index and no
/// in-memory cache, so the file on disk is always the source of truth.
///
/// Appends serialize through a single-writer mutex: concurrent uploads within
/// this process cannot lose each other's records to a read-modify-write race.
/// Cross-process writers are not coordinated, and the rewrite is not atomic —
/// a crash mid-write can leave a truncated document (see `strict` below for
/// how that surfaces on the next read).
#[derive(Debug, Clone)]
pub struct ImageStore {
    path: PathBuf,
    /// Parse-failure policy: false = unparsable document reads as empty
    /// (warn only; the next append overwrites it), true = unparsable
    /// document is an error.
    strict: bool,
    write_lock: Arc<Mutex<()>>,
}

impl ImageStore {
    pub fn new(path: PathBuf, strict: bool) -> Self {
        ImageStore {
            path,
            strict,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Read the full record list. An absent file is an empty list, not an error.
    pub async fn load(&self) -> Result<Vec<ImageRecord>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Read(e)),
        };
        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) if self.strict => Err(StoreError::Corrupt(e)),
            Err(e) => {
                tracing::warn!(
                    "Image store {} is unparsable ({}) — treating as empty",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    /// Linear scan for the first record with a matching id. Read-only.
    pub async fn find(&self, id: &str) -> Result<Option<ImageRecord>, StoreError> {
        let records = self.load().await?;
        Ok(records.into_iter().find(|r| r.id == id))
    }

    /// Append one record: load the full list, push, rewrite the whole file.
    /// Holds the write lock across the read-modify-write so in-process
    /// appends cannot interleave. In non-strict mode this overwrites an
    /// unparsable store with a fresh list — corruption heals on the next
    /// upload at the cost of the unreadable records.
    pub async fn append(&self, record: ImageRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        records.push(record);
        let json = serde_json::to_string(&records)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(StoreError::Write)
    }
}
