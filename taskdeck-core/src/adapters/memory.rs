//! In-memory token store
//!
//! Used for ephemeral sessions (nothing survives the process) and in tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::result::{Error, Result};
use crate::domain::StoredTokens;
use crate::ports::TokenStore;

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<StoredTokens>,
    fail_writes: AtomicBool,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with tokens, as if persisted by an earlier run
    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self {
            tokens: Mutex::new(tokens),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make subsequent `save`/`clear` calls fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::storage("token store is read-only"));
        }
        Ok(())
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<StoredTokens> {
        let tokens = self
            .tokens
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        Ok(tokens.clone())
    }

    fn save(&self, tokens: &StoredTokens) -> Result<()> {
        self.check_writable()?;
        let mut guard = self
            .tokens
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        *guard = tokens.clone();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.check_writable()?;
        let mut guard = self
            .tokens
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        *guard = StoredTokens::default();
        Ok(())
    }
}
