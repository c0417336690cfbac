//! Session store - the single owner of the current session
//!
//! Every change is persisted first and then published as one `watch` update,
//! so subscribers never observe a half-applied session (a user without an
//! access token, or tokens from two different pairs).

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::result::{Error, Result};
use crate::domain::{Session, StoredTokens, User};
use crate::ports::{Credentials, TokenStore};

/// Observable session backed by a token store
pub struct SessionStore {
    tokens: Arc<dyn TokenStore>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(Session::anonymous());
        Self { tokens, state }
    }

    /// Receive every future session change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Current session
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Mirror persisted tokens into memory and mark the session as loading
    pub fn hydrate(&self) -> Result<StoredTokens> {
        let tokens = self.tokens.load()?;
        self.state.send_replace(Session {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            current_user: None,
            is_loading: true,
        });
        Ok(tokens)
    }

    /// Install a fresh token pair together with its user
    pub fn establish(&self, tokens: StoredTokens, user: User) -> Result<()> {
        self.tokens.save(&tokens)?;
        self.state.send_replace(Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            current_user: Some(user),
            is_loading: false,
        });
        Ok(())
    }

    /// Attach the profile fetched for the tokens already in place
    pub fn adopt_user(&self, user: User) -> Result<()> {
        if self.state.borrow().access_token.is_none() {
            return Err(Error::SessionExpired("no access token to attach the user to".to_string()));
        }
        self.state.send_modify(|session| {
            session.current_user = Some(user);
            session.is_loading = false;
        });
        Ok(())
    }

    /// End restoration without changing anything else
    pub fn finish_loading(&self) {
        self.state.send_if_modified(|session| {
            let was_loading = session.is_loading;
            session.is_loading = false;
            was_loading
        });
    }

    /// Forget every token and the user
    ///
    /// The in-memory session is always reset; a failure to remove the
    /// persisted tokens is still reported.
    pub fn clear(&self) -> Result<()> {
        let removed = self.tokens.clear();
        self.state.send_replace(Session::anonymous());
        removed
    }
}

impl Credentials for SessionStore {
    fn access_token(&self) -> Option<String> {
        self.state.borrow().access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.state.borrow().refresh_token.clone()
    }

    fn store_refreshed(&self, tokens: StoredTokens) -> Result<()> {
        self.tokens.save(&tokens)?;
        self.state.send_modify(|session| {
            session.access_token = tokens.access_token;
            session.refresh_token = tokens.refresh_token;
        });
        Ok(())
    }

    fn expire(&self) {
        let _ = self.clear();
    }
}
