//! On-disk layout of the client data directory.
//!
//! ```text
//! ~/.studio/            (or $STUDIO_HOME)
//! ├── config.json
//! ├── storage.json      persisted auth session
//! └── logs/dev.jsonl
//! ```

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

const HOME_ENV: &str = "STUDIO_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// `$STUDIO_HOME` when set, else `~/.studio`.
    pub fn new() -> CoreResult<Self> {
        Self::resolve(std::env::var_os(HOME_ENV).map(PathBuf::from), dirs::home_dir())
    }

    fn resolve(explicit: Option<PathBuf>, home: Option<PathBuf>) -> CoreResult<Self> {
        if let Some(base_dir) = explicit.filter(|dir| !dir.as_os_str().is_empty()) {
            return Ok(Self { base_dir });
        }
        let home = home.ok_or_else(|| {
            CoreError::Path(format!("no home directory and {} is not set", HOME_ENV))
        })?;
        Ok(Self {
            base_dir: home.join(".studio"),
        })
    }

    /// Root the layout somewhere else (tests, sandboxes).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn storage_file(&self) -> PathBuf {
        self.base_dir.join("storage.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("dev.jsonl")
    }

    /// Create the base and logs directories. Idempotent.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_under_base_dir() {
        let base = PathBuf::from("/srv/studio");
        let paths = Paths::with_base_dir(base.clone());

        assert_eq!(paths.base_dir(), base.as_path());
        assert_eq!(paths.config_file(), base.join("config.json"));
        assert_eq!(paths.storage_file(), base.join("storage.json"));
        assert_eq!(paths.log_file(), base.join("logs").join("dev.jsonl"));
    }

    #[test]
    fn test_resolve_prefers_explicit_dir() {
        let paths = Paths::resolve(Some(PathBuf::from("/opt/studio")), Some(PathBuf::from("/home/ana"))).unwrap();
        assert_eq!(paths.base_dir(), Path::new("/opt/studio"));
    }

    #[test]
    fn test_resolve_falls_back_to_home() {
        let paths = Paths::resolve(Some(PathBuf::new()), Some(PathBuf::from("/home/ana"))).unwrap();
        assert_eq!(paths.base_dir(), Path::new("/home/ana/.studio"));

        assert!(matches!(Paths::resolve(None, None), Err(CoreError::Path(_))));
    }

    #[test]
    fn test_ensure_dirs_is_idempotent() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("studio"));

        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();

        assert!(paths.base_dir().is_dir());
        assert!(paths.logs_dir().is_dir());
    }
}
