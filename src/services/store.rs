//! Durable single-value storage for the remaining timer duration

use std::{
    collections::BTreeMap,
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex as StdMutex,
};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Key the remaining milliseconds are stored under
pub const TIMER_VALUE_KEY: &str = "TIMER_VALUE";

/// Value reported when nothing has been stored yet
pub const DEFAULT_TIMER_VALUE: i64 = 0;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("store rejected write: {0}")]
    Rejected(String),
}

/// A persisted 64-bit value with push-based reads.
///
/// `subscribe` yields the current value (or the default) immediately and every
/// value written afterwards. Writes complete asynchronously.
pub trait ValueStore: Send + Sync + 'static {
    fn subscribe(&self) -> watch::Receiver<i64>;

    fn put(&self, value: i64) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// JSON file backed store
#[derive(Debug)]
pub struct FileValueStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, i64>>,
    value_tx: watch::Sender<i64>,
}

impl FileValueStore {
    /// Open the store at `path`, starting from the default when the file is
    /// missing or unreadable
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match load_entries(&path).await {
            Ok(entries) => entries,
            Err(StoreError::Corrupt { path, source }) => {
                warn!("Ignoring corrupt store file {}: {}", path.display(), source);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };

        let value = entries
            .get(TIMER_VALUE_KEY)
            .copied()
            .unwrap_or(DEFAULT_TIMER_VALUE);
        info!("Opened value store at {} ({}={})", path.display(), TIMER_VALUE_KEY, value);

        let (value_tx, _) = watch::channel(value);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            value_tx,
        })
    }
}

impl ValueStore for FileValueStore {
    fn subscribe(&self) -> watch::Receiver<i64> {
        self.value_tx.subscribe()
    }

    fn put(&self, value: i64) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            // Holding the lock across the write keeps file contents in call order
            let mut entries = self.entries.lock().await;
            let mut updated = entries.clone();
            updated.insert(TIMER_VALUE_KEY.to_string(), value);

            write_entries(&self.path, &updated).await?;
            *entries = updated;
            drop(entries);

            debug!("Persisted {}={}", TIMER_VALUE_KEY, value);
            self.value_tx.send_replace(value);
            Ok(())
        }
    }
}

async fn load_entries(path: &Path) -> Result<BTreeMap<String, i64>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No store file at {}, starting fresh", path.display());
            Ok(BTreeMap::new())
        }
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn write_entries(path: &Path, entries: &BTreeMap<String, i64>) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let contents = serde_json::to_vec_pretty(entries).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, contents).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

/// In-memory store; nothing survives the process. Keeps every write so the
/// order they arrived in can be inspected.
#[derive(Debug)]
pub struct MemoryValueStore {
    value_tx: watch::Sender<i64>,
    writes: StdMutex<Vec<i64>>,
}

impl MemoryValueStore {
    pub fn new() -> Self {
        Self::with_value(DEFAULT_TIMER_VALUE)
    }

    /// Create a store that already holds `value`
    pub fn with_value(value: i64) -> Self {
        let (value_tx, _) = watch::channel(value);
        Self {
            value_tx,
            writes: StdMutex::new(Vec::new()),
        }
    }

    /// Every value written so far, oldest first
    pub fn writes(&self) -> Vec<i64> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }

    pub fn current(&self) -> i64 {
        *self.value_tx.borrow()
    }
}

impl Default for MemoryValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueStore for MemoryValueStore {
    fn subscribe(&self) -> watch::Receiver<i64> {
        self.value_tx.subscribe()
    }

    fn put(&self, value: i64) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            self.writes
                .lock()
                .map_err(|e| StoreError::Rejected(format!("write log poisoned: {}", e)))?
                .push(value);
            self.value_tx.send_replace(value);
            Ok(())
        }
    }
}
