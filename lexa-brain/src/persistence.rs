//! State Store - named snapshots on disk
//!
//! Every persisted table goes through one pair of calls:
//! `save_named(name, &value)` and `load_named(name)`. A name maps to
//! `<data_dir>/<name>.bin` (bincode) or `<data_dir>/<name>.json`.
//!
//! Saves write a uniquely named temp file next to the target and rename it
//! over the target, so a reader never sees a half-written file. Saves through
//! one store (and its clones) are serialized. A missing or empty file loads
//! as `None`.

use lexa_core::{LexaError, LexaResult, PersistenceConfig, PersistenceFormat};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Distinguishes temp files of concurrent saves
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Non-fatal outcome of a load or save, for callers that keep running
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PersistenceStatus {
    Saved,
    Loaded,
    /// Nothing on disk yet; zero state kept
    Missing,
    Failed(String),
}

impl PersistenceStatus {
    pub fn is_ok(&self) -> bool {
        !matches!(self, PersistenceStatus::Failed(_))
    }
}

/// Directory of named snapshots
#[derive(Debug, Clone)]
pub struct StateStore {
    config: PersistenceConfig,
    /// Held for the duration of a save
    pub(crate) write_lock: Arc<Mutex<()>>,
}

impl StateStore {
    pub fn new(config: PersistenceConfig) -> Self {
        Self {
            config,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Where `name` lives on disk
    pub fn path_for(&self, name: &str) -> PathBuf {
        let ext = match self.config.format {
            PersistenceFormat::Bincode => "bin",
            PersistenceFormat::Json => "json",
        };
        self.config.data_dir.join(format!("{}.{}", name, ext))
    }

    /// Serialize and atomically replace `<name>`
    ///
    /// Waiting for an earlier save counts against the timeout.
    pub async fn save_named<T: Serialize>(&self, name: &str, value: &T) -> LexaResult<()> {
        let bytes = self.encode(value)?;
        let path = self.path_for(name);
        let lock = self.write_lock.clone();
        let target = path.clone();
        self.with_timeout(async move {
            let _guard = lock.lock().await;
            write_atomic(target, bytes).await
        })
        .await?;
        tracing::debug!("💾 Saved {} to {}", name, path.display());
        Ok(())
    }

    /// Read `<name>`; `Ok(None)` when nothing has been saved yet
    pub async fn load_named<T: DeserializeOwned>(&self, name: &str) -> LexaResult<Option<T>> {
        let path = self.path_for(name);
        let bytes = match self.with_timeout(read_if_present(path.clone())).await? {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Ok(None),
        };

        match self.decode(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("⚠️ State file {} is corrupted: {}", path.display(), e);
                Err(LexaError::persistence(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    fn encode<T: Serialize>(&self, value: &T) -> LexaResult<Vec<u8>> {
        match self.config.format {
            PersistenceFormat::Bincode => {
                bincode::serialize(value).map_err(|e| LexaError::serialization(e.to_string()))
            }
            PersistenceFormat::Json => Ok(serde_json::to_vec_pretty(value)?),
        }
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> LexaResult<T> {
        match self.config.format {
            PersistenceFormat::Bincode => {
                bincode::deserialize(bytes).map_err(|e| LexaError::serialization(e.to_string()))
            }
            PersistenceFormat::Json => Ok(serde_json::from_slice(bytes)?),
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> LexaResult<T>
    where
        F: Future<Output = std::io::Result<T>>,
    {
        let limit = Duration::from_millis(self.config.timeout_ms);
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(LexaError::from),
            Err(_) => {
                tracing::warn!("⏱️ Persistence timed out after {} ms", self.config.timeout_ms);
                Err(LexaError::Timeout(self.config.timeout_ms))
            }
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(PersistenceConfig::default())
    }
}

async fn write_atomic(path: PathBuf, bytes: Vec<u8>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.clone().into_os_string();
    tmp.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        TMP_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    let tmp = PathBuf::from(tmp);

    let written = match tokio::fs::write(&tmp, &bytes).await {
        Ok(()) => tokio::fs::rename(&tmp, &path).await,
        Err(e) => Err(e),
    };
    if written.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    written
}

async fn read_if_present(path: PathBuf) -> std::io::Result<Option<Vec<u8>>> {
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Table {
        version: u32,
        rows: Vec<(String, f64)>,
    }

    fn store(dir: &Path, format: PersistenceFormat) -> StateStore {
        StateStore::new(PersistenceConfig {
            data_dir: dir.to_path_buf(),
            format,
            timeout_ms: 5_000,
        })
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn table() -> Table {
        Table {
            version: 1,
            rows: vec![("猫".into(), 0.5), ("犬".into(), 0.25)],
        }
    }

    #[tokio::test]
    async fn test_save_and_load_bincode() {
        let dir = tempdir().unwrap();
        let store = store(dir.path(), PersistenceFormat::Bincode);

        store.save_named("table", &table()).await.unwrap();
        assert!(dir.path().join("table.bin").exists());
        assert_eq!(file_names(dir.path()), vec!["table.bin".to_string()]);

        let loaded: Option<Table> = store.load_named("table").await.unwrap();
        assert_eq!(loaded, Some(table()));
    }

    #[tokio::test]
    async fn test_save_and_load_json() {
        let dir = tempdir().unwrap();
        let store = store(dir.path(), PersistenceFormat::Json);

        store.save_named("table", &table()).await.unwrap();
        let text = std::fs::read_to_string(dir.path().join("table.json")).unwrap();
        assert!(text.contains("猫"));

        let loaded: Option<Table> = store.load_named("table").await.unwrap();
        assert_eq!(loaded, Some(table()));
    }

    #[tokio::test]
    async fn test_missing_and_empty_files_load_as_none() {
        let dir = tempdir().unwrap();
        let store = store(dir.path(), PersistenceFormat::Bincode);

        let missing: Option<Table> = store.load_named("nothing").await.unwrap();
        assert!(missing.is_none());

        std::fs::write(dir.path().join("empty.bin"), b"").unwrap();
        let empty: Option<Table> = store.load_named("empty").await.unwrap();
        assert!(empty.is_none());
    }

    #[tokio::test]
    async fn test_corrupted_file_is_an_error() {
        let dir = tempdir().unwrap();
        let store = store(dir.path(), PersistenceFormat::Json);
        std::fs::write(dir.path().join("table.json"), b"{ not json").unwrap();

        let result: LexaResult<Option<Table>> = store.load_named("table").await;
        assert!(matches!(result, Err(LexaError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_creates_nested_data_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = store(&nested, PersistenceFormat::Bincode);

        store.save_named("table", &table()).await.unwrap();
        assert!(nested.join("table.bin").exists());
    }

    #[tokio::test]
    async fn test_stalled_io_times_out() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(PersistenceConfig {
            data_dir: dir.path().to_path_buf(),
            format: PersistenceFormat::Bincode,
            timeout_ms: 20,
        });

        let result = store
            .with_timeout(std::future::pending::<std::io::Result<()>>())
            .await;
        assert!(matches!(result, Err(LexaError::Timeout(20))));
    }

    #[tokio::test]
    async fn test_save_times_out_while_another_save_holds_the_lock() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(PersistenceConfig {
            data_dir: dir.path().to_path_buf(),
            format: PersistenceFormat::Json,
            timeout_ms: 20,
        });

        let guard = store.write_lock.lock().await;
        let result = store.save_named("table", &table()).await;
        assert!(matches!(result, Err(LexaError::Timeout(20))));
        assert!(file_names(dir.path()).is_empty());

        drop(guard);
        store.save_named("table", &table()).await.unwrap();
        let loaded: Option<Table> = store.load_named("table").await.unwrap();
        assert_eq!(loaded, Some(table()));
    }

    #[tokio::test]
    async fn test_concurrent_saves_of_one_name() {
        let dir = tempdir().unwrap();
        let store = store(dir.path(), PersistenceFormat::Json);
        let other = store.clone();

        let first = table();
        let second = Table {
            version: 2,
            rows: vec![("鳥".into(), 1.0)],
        };
        let (a, b) = tokio::join!(
            store.save_named("table", &first),
            other.save_named("table", &second)
        );
        a.unwrap();
        b.unwrap();

        let loaded: Table = store.load_named("table").await.unwrap().unwrap();
        assert!(loaded == first || loaded == second);
        assert_eq!(file_names(dir.path()), vec!["table.json".to_string()]);
    }

    #[test]
    fn test_status_is_ok() {
        assert!(PersistenceStatus::Missing.is_ok());
        assert!(!PersistenceStatus::Failed("disk".into()).is_ok());
    }
}
