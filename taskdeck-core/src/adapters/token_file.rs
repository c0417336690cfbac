//! File-backed token store
//!
//! Tokens live in `session.json` inside the taskdeck directory:
//! ```json
//! { "accessToken": "...", "refreshToken": "..." }
//! ```
//! Writes go through a temp file and an atomic rename while holding an
//! exclusive lock on `session.lock`, so there is a single writer at a time.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::domain::result::{Error, Result};
use crate::domain::StoredTokens;
use crate::ports::TokenStore;

const SESSION_FILE: &str = "session.json";
const LOCK_FILE: &str = "session.lock";

/// Token store persisted as JSON on disk
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(taskdeck_dir: &Path) -> Self {
        Self {
            dir: taskdeck_dir.to_path_buf(),
            path: taskdeck_dir.join(SESSION_FILE),
        }
    }

    /// Path of the session file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<File> {
        std::fs::create_dir_all(&self.dir)?;
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))?;
        FileExt::lock_exclusive(&lock)
            .map_err(|e| Error::storage(format!("Failed to lock session file: {}", e)))?;
        Ok(lock)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<StoredTokens> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoredTokens::default()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content)
            .map_err(|e| Error::storage(format!("Corrupted session file {:?}: {}", self.path, e)))
    }

    fn save(&self, tokens: &StoredTokens) -> Result<()> {
        let lock = self.lock()?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(serde_json::to_string_pretty(tokens)?.as_bytes())?;
        tmp.flush()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))?;
        }

        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        FileExt::unlock(&lock)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let lock = self.lock()?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        FileExt::unlock(&lock)?;
        Ok(())
    }
}
