use crate::error::SyncError;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Note persistence addressed by forward-slash paths relative to the vault root.
pub trait NoteStorage: Send + Sync {
    fn exists(&self, path: &str) -> bool;
    fn read(&self, path: &str) -> Result<String, SyncError>;
    /// Creates the note or overwrites it in place.
    fn write(&self, path: &str, content: &str) -> Result<(), SyncError>;
    fn create_folder(&self, path: &str) -> Result<(), SyncError>;
}

/// Creates `folder` unless it is already there.
pub fn ensure_folder(storage: &dyn NoteStorage, folder: &str) -> Result<bool, SyncError> {
    if folder.trim_matches('/').is_empty() || storage.exists(folder) {
        return Ok(false);
    }
    storage.create_folder(folder)?;
    tracing::info!(folder, "created notes folder");
    Ok(true)
}

#[derive(Clone, Debug)]
pub struct VaultStorage {
    root: PathBuf,
}

impl VaultStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            full.push(segment);
        }
        full
    }
}

impl NoteStorage for VaultStorage {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn read(&self, path: &str) -> Result<String, SyncError> {
        fs::read_to_string(self.resolve(path)).map_err(|e| SyncError::io(path, e))
    }

    fn write(&self, path: &str, content: &str) -> Result<(), SyncError> {
        fs::write(self.resolve(path), content).map_err(|e| SyncError::io(path, e))
    }

    fn create_folder(&self, path: &str) -> Result<(), SyncError> {
        fs::create_dir_all(self.resolve(path)).map_err(|e| SyncError::io(path, e))
    }
}

/// Keeps writes and folder creation in memory on top of another storage.
/// Reads see staged content first. Nothing reaches the inner storage.
pub struct StagedStorage<'a> {
    inner: &'a dyn NoteStorage,
    notes: Mutex<HashMap<String, String>>,
    folders: Mutex<HashSet<String>>,
}

impl<'a> StagedStorage<'a> {
    pub fn new(inner: &'a dyn NoteStorage) -> Self {
        Self {
            inner,
            notes: Mutex::new(HashMap::new()),
            folders: Mutex::new(HashSet::new()),
        }
    }

    pub fn staged(&self, path: &str) -> Option<String> {
        lock(&self.notes).get(path).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NoteStorage for StagedStorage<'_> {
    fn exists(&self, path: &str) -> bool {
        lock(&self.notes).contains_key(path)
            || lock(&self.folders).contains(path)
            || self.inner.exists(path)
    }

    fn read(&self, path: &str) -> Result<String, SyncError> {
        match self.staged(path) {
            Some(content) => Ok(content),
            None => self.inner.read(path),
        }
    }

    fn write(&self, path: &str, content: &str) -> Result<(), SyncError> {
        lock(&self.notes).insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn create_folder(&self, path: &str) -> Result<(), SyncError> {
        lock(&self.folders).insert(path.to_string());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn temp_vault_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        let stamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        dir.push(format!("readeck-sync-test-{}-{}", std::process::id(), stamp));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn resolve_joins_forward_slash_segments() {
        let storage = VaultStorage::new("/vault");
        assert_eq!(
            storage.resolve("Readeck/Test.md"),
            PathBuf::from("/vault").join("Readeck").join("Test.md")
        );
        assert_eq!(
            storage.resolve("/Readeck//./Test.md"),
            PathBuf::from("/vault").join("Readeck").join("Test.md")
        );
    }

    #[test]
    fn vault_storage_round_trips_notes() {
        let dir = temp_vault_dir();
        let storage = VaultStorage::new(&dir);

        assert!(ensure_folder(&storage, "Readeck").expect("create folder"));
        assert!(!ensure_folder(&storage, "Readeck").expect("folder exists"));
        assert!(dir.join("Readeck").is_dir());

        assert!(!storage.exists("Readeck/Note.md"));
        storage.write("Readeck/Note.md", "> a").expect("write note");
        assert!(storage.exists("Readeck/Note.md"));
        assert_eq!(storage.read("Readeck/Note.md").expect("read note"), "> a");

        storage.write("Readeck/Note.md", "> b").expect("overwrite note");
        assert_eq!(storage.read("Readeck/Note.md").expect("read note"), "> b");
    }

    #[test]
    fn staged_storage_reads_its_own_writes_only() {
        use memory::MemoryStorage;

        let inner = MemoryStorage::default().with_note("Readeck/Old.md", "> old");
        let staged = StagedStorage::new(&inner);

        assert!(ensure_folder(&staged, "Readeck").expect("stage folder"));
        assert!(staged.exists("Readeck"));
        assert_eq!(staged.read("Readeck/Old.md").expect("read through"), "> old");

        staged.write("Readeck/Old.md", "> old\n> new").expect("stage write");
        staged.write("Readeck/New.md", "> fresh").expect("stage write");
        assert_eq!(staged.read("Readeck/Old.md").expect("read staged"), "> old\n> new");
        assert!(staged.exists("Readeck/New.md"));

        assert_eq!(inner.write_count(), 0);
        assert!(!inner.exists("Readeck"));
        assert_eq!(inner.note("Readeck/Old.md").as_deref(), Some("> old"));
        assert!(inner.note("Readeck/New.md").is_none());
    }

    #[test]
    fn write_into_missing_folder_is_storage_error() {
        let dir = temp_vault_dir();
        let storage = VaultStorage::new(&dir);
        let err = storage
            .write("Missing/Note.md", "text")
            .expect_err("folder does not exist");
        assert!(matches!(err, SyncError::Io { ref path, .. } if path == "Missing/Note.md"));
    }
}
