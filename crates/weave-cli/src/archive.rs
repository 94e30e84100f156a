//! Filesystem-backed `ScriptArchive`: resolves every logical script path
//! against a single archetype root directory.
//!
//! The core (`weave-loader`) leaves `source`/`exec` resolution entirely
//! to the archive; here every logical path is treated as root-relative
//! rather than relative to the including script's own directory. This
//! matches how real archetype trees are laid out in practice — one
//! scripts directory, referenced by path from anywhere in it — and
//! keeps this archive free of any dependency on the invoker's cwd stack
//! (which exists for template/file path resolution, not for locating
//! further scripts).

use std::path::{Path, PathBuf};
use weave_loader::{CanonicalPath, LoadError, ScriptArchive};

pub struct FilesystemArchive {
    root: PathBuf,
}

impl FilesystemArchive {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl ScriptArchive for FilesystemArchive {
    fn resolve(&self, logical_path: &str) -> Result<CanonicalPath, LoadError> {
        let joined = self.root.join(logical_path);
        let canonical = joined.canonicalize().map_err(|e| LoadError::Resolve {
            logical_path: logical_path.to_string(),
            source: e,
        })?;
        Ok(CanonicalPath::new(canonical))
    }

    fn read(&self, path: &CanonicalPath) -> Result<String, LoadError> {
        std::fs::read_to_string(path.as_path()).map_err(|e| LoadError::Read {
            path: path.clone(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_logical_path_under_the_root() {
        let dir = std::env::temp_dir().join("weave-cli-archive-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("main.json"), "{}").unwrap();

        let archive = FilesystemArchive::new(&dir);
        let canonical = archive.resolve("main.json").unwrap();
        assert_eq!(archive.read(&canonical).unwrap(), "{}");

        std::fs::remove_dir_all(&dir).ok();
    }
}
