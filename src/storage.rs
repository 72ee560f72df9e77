use std::{path::PathBuf, str::FromStr};

use rusty_ulid::Ulid;

/// Storage port for the small files `sb` persists (config.yaml, state.yaml).
/// Pipelines never touch the filesystem directly for persisted state; they
/// go through an injected implementation of this trait.
pub trait StorageManager: Send + Sync {
    fn write(&self, ident: &str, data: &[u8]) -> std::io::Result<()>;
    fn read(&self, ident: &str) -> std::io::Result<Vec<u8>>;
    fn exists(&self, ident: &str) -> bool;
}

#[derive(Clone)]
pub struct BackendLocal {
    pub base_dir: PathBuf,
}

impl BackendLocal {
    pub fn new(storage_dir: &str) -> std::io::Result<Self> {
        let path = PathBuf::from_str(storage_dir)
            .expect("infallible PathBuf::from_str for &str");
        std::fs::create_dir_all(&path)?;
        Ok(BackendLocal { base_dir: path })
    }
}

impl StorageManager for BackendLocal {
    fn exists(&self, ident: &str) -> bool {
        std::fs::metadata(self.base_dir.join(ident)).is_ok()
    }

    fn read(&self, ident: &str) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.base_dir.join(ident))
    }

    fn write(&self, ident: &str, data: &[u8]) -> std::io::Result<()> {
        // Write to a unique temp name, then rename over the target so a
        // crash mid-write never leaves a truncated file behind.
        let temp_path = self
            .base_dir
            .join(format!("{}-{ident}", Ulid::generate()));

        std::fs::write(&temp_path, data)?;

        std::fs::rename(&temp_path, self.base_dir.join(ident))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackendLocal::new(dir.path().to_str().unwrap()).unwrap();

        assert!(!store.exists("state.yaml"));
        store.write("state.yaml", b"api_key: ''\n").unwrap();
        assert!(store.exists("state.yaml"));
        assert_eq!(store.read("state.yaml").unwrap(), b"api_key: ''\n");
    }

    #[test]
    fn write_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackendLocal::new(dir.path().to_str().unwrap()).unwrap();

        store.write("config.yaml", b"a").unwrap();
        store.write("config.yaml", b"b").unwrap();
        assert_eq!(store.read("config.yaml").unwrap(), b"b");
    }
}
