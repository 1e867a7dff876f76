use std::{path::{Path, PathBuf}, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, sync::Mutex};
use tracing::{debug, warn};

use crate::errors::ServiceError;

/// What an update closure wants done with the mutated document.
#[derive(Debug)]
pub enum Persist<R> {
    /// Write the mutated document back and return `R`.
    Write(R),
    /// Discard the working copy; disk stays untouched.
    Skip(R),
}

/// Generic JSON file-backed document store.
///
/// Holds a single document `D` behind one mutex. Every lock acquisition re-reads the
/// file, so the in-memory snapshot is only a view of the last successful read or write.
/// Updates run against a working copy which replaces the snapshot only after the write
/// succeeded.
pub struct JsonDocumentStore<D> {
    snapshot: Mutex<D>,
    file_path: PathBuf,
}

impl<D> JsonDocumentStore<D>
where
    D: Serialize + DeserializeOwned + Default + Clone + Send,
{
    /// Initialize the store from a path. Creates the file with an empty document if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
            }
        }

        let doc = match fs::try_exists(&file_path).await {
            Ok(true) => load(&file_path).await,
            _ => {
                let empty = D::default();
                save(&file_path, &empty).await?;
                empty
            }
        };

        Ok(Arc::new(Self { snapshot: Mutex::new(doc), file_path }))
    }

    /// Run a read-only closure against a fresh read of the document.
    pub async fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&D) -> R,
    {
        let mut snapshot = self.snapshot.lock().await;
        *snapshot = load(&self.file_path).await;
        f(&*snapshot)
    }

    /// Apply a mutation to a fresh read of the document and persist it atomically.
    ///
    /// Nothing is written when the closure fails or returns [`Persist::Skip`].
    pub async fn update<R, F>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut D) -> Result<Persist<R>, ServiceError>,
    {
        let mut snapshot = self.snapshot.lock().await;
        *snapshot = load(&self.file_path).await;
        let mut working = snapshot.clone();
        match f(&mut working)? {
            Persist::Write(out) => {
                save(&self.file_path, &working).await?;
                *snapshot = working;
                Ok(out)
            }
            Persist::Skip(out) => Ok(out),
        }
    }
}

/// Read failures degrade to an empty document; they are logged, never fatal.
async fn load<D: DeserializeOwned + Default>(path: &Path) -> D {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed document; falling back to empty");
                D::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "document missing; treating as empty");
            D::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read document; falling back to empty");
            D::default()
        }
    }
}

async fn save<D: Serialize>(path: &Path, doc: &D) -> Result<(), ServiceError> {
    let data = serde_json::to_vec_pretty(doc).map_err(ServiceError::storage)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, data).await.map_err(ServiceError::storage)?;
    fs::rename(&tmp, path).await.map_err(ServiceError::storage)?;
    debug!(path = %path.display(), "document saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        items: Vec<String>,
    }

    fn tmp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("json_document_store_{tag}_{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn update_persists_and_reloads() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("crud");
        let store = JsonDocumentStore::<Doc>::new(&tmp).await?;

        // initially empty
        assert!(store.read(|d| d.items.is_empty()).await);

        store
            .update(|d| {
                d.items.push("a".into());
                d.items.push("b".into());
                Ok(Persist::Write(()))
            })
            .await?;
        assert_eq!(store.read(|d| d.items.len()).await, 2);

        // reload persistence
        let reloaded = JsonDocumentStore::<Doc>::new(&tmp).await?;
        assert_eq!(reloaded.read(|d| d.clone()).await.items, vec!["a", "b"]);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_update_leaves_document_untouched() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("fail");
        let store = JsonDocumentStore::<Doc>::new(&tmp).await?;
        store.update(|d| { d.items.push("kept".into()); Ok(Persist::Write(())) }).await?;

        let res: Result<(), _> = store
            .update(|d| {
                d.items.clear();
                Err(ServiceError::Validation("nope".into()))
            })
            .await;
        assert!(matches!(res, Err(ServiceError::Validation(_))));
        assert_eq!(store.read(|d| d.items.clone()).await, vec!["kept"]);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_document() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("writefail");
        let store = JsonDocumentStore::<Doc>::new(&tmp).await?;
        store.update(|d| { d.items.push("keep".into()); Ok(Persist::Write(())) }).await?;

        // a directory where the temp file goes makes the write fail
        let mut blocker = tmp.as_os_str().to_owned();
        blocker.push(".tmp");
        let blocker = PathBuf::from(blocker);
        fs::create_dir(&blocker).await?;

        let res = store.update(|d| { d.items.push("lost".into()); Ok(Persist::Write(())) }).await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));
        assert_eq!(store.read(|d| d.items.clone()).await, vec!["keep"]);
        let on_disk: Doc = serde_json::from_slice(&fs::read(&tmp).await?)?;
        assert_eq!(on_disk.items, vec!["keep"]);

        let _ = fs::remove_dir(&blocker).await;
        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn skip_does_not_write() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("skip");
        let store = JsonDocumentStore::<Doc>::new(&tmp).await?;
        fs::remove_file(&tmp).await?;

        let n = store.update(|d| { d.items.push("x".into()); Ok(Persist::Skip(7)) }).await?;
        assert_eq!(n, 7);
        assert!(!fs::try_exists(&tmp).await?);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_file_reads_as_empty() -> Result<(), anyhow::Error> {
        let tmp = tmp_path("corrupt");
        fs::write(&tmp, b"{ not json").await?;
        let store = JsonDocumentStore::<Doc>::new(&tmp).await?;
        assert_eq!(store.read(|d| d.clone()).await, Doc::default());

        // the next write replaces the corrupt file
        store.update(|d| { d.items.push("fresh".into()); Ok(Persist::Write(())) }).await?;
        let raw = fs::read(&tmp).await?;
        let parsed: Doc = serde_json::from_slice(&raw)?;
        assert_eq!(parsed.items, vec!["fresh"]);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }
}
