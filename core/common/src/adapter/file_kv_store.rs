//! ディレクトリ配下に 1 キー 1 ファイルで保存する KeyValueStore 実装
//!
//! ネイティブシェルのローカルストレージ相当。書き込みは一時ファイル + rename で置き換える。

use crate::error::Error;
use crate::ports::outbound::{FileSystem, KeyValueStore};
use std::path::PathBuf;
use std::sync::Arc;

pub struct FileKeyValueStore {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(fs: Arc<dyn FileSystem>, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

/// キーをファイル名に使える形へ符号化する（英数字と `-` `_` `.` 以外は %XX）
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let path = self.path_for(key);
        if !self.fs.exists(&path) {
            return Ok(None);
        }
        self.fs.read_to_string(&path).map(Some)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.fs.create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        self.fs.write(&tmp, value)?;
        self.fs.rename(&tmp, &path)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let path = self.path_for(key);
        if self.fs.exists(&path) {
            self.fs.remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StdFileSystem;
    use tempfile::tempdir;

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("memox:received-memos"), "memox%3Areceived-memos");
        assert_eq!(encode_key("a/b"), "a%2Fb");
        assert_ne!(encode_key("memox:a"), encode_key("memox_a"));
    }

    #[test]
    fn test_roundtrip_through_files() {
        let dir = tempdir().unwrap();
        let store = FileKeyValueStore::new(Arc::new(StdFileSystem), dir.path().join("storage"));
        assert_eq!(store.get("memox:favorites").unwrap(), None);

        store.set("memox:favorites", "[\"m1\"]").unwrap();
        store.set("memox:favorites", "[\"m1\",\"m2\"]").unwrap();
        assert_eq!(
            store.get("memox:favorites").unwrap().as_deref(),
            Some("[\"m1\",\"m2\"]")
        );
        assert!(dir.path().join("storage/memox%3Afavorites.json").exists());
        assert!(!dir.path().join("storage/memox%3Afavorites.json.tmp").exists());

        store.remove("memox:favorites").unwrap();
        assert_eq!(store.get("memox:favorites").unwrap(), None);
        store.remove("memox:favorites").unwrap();
    }
}
