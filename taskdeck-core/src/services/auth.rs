//! Auth service - login, registration, restoration and logout

use std::sync::Arc;

use tokio::sync::watch;

use crate::adapters::api_client::{ApiClient, LoginRequest, RegisterRequest};
use crate::domain::result::{Error, Result};
use crate::domain::{Session, User};
use crate::services::SessionStore;

/// Auth session manager
pub struct AuthService {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> Session {
        self.session.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// Log in with an e-mail or username
    ///
    /// On failure the previous session is left as it was.
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<User> {
        let identifier = identifier.trim();
        require("usernameOrEmail", identifier, "Email or username is required")?;
        require("password", secret, "Password is required")?;

        let response = self
            .api
            .login(&LoginRequest {
                username_or_email: identifier.to_string(),
                password: secret.to_string(),
            })
            .await?;

        self.session.establish(response.tokens(), response.user.clone())?;
        Ok(response.user)
    }

    /// Create an account and log straight into it
    pub async fn register(&self, name: &str, email: &str, secret: &str) -> Result<User> {
        let (name, email) = (name.trim(), email.trim());
        require("name", name, "Name is required")?;
        require("email", email, "Email is required")?;
        if !email.contains('@') {
            return Err(Error::field("email", "Email address is not valid"));
        }
        require("password", secret, "Password is required")?;

        let response = self
            .api
            .register(&RegisterRequest::from_display_name(name, email, secret))
            .await?;

        self.session.establish(response.tokens(), response.user.clone())?;
        Ok(response.user)
    }

    /// Bring back the session persisted by an earlier run
    ///
    /// Never fails: anything that goes wrong leaves an anonymous session and
    /// no persisted tokens.
    pub async fn restore_session(&self) -> Session {
        let tokens = match self.session.hydrate() {
            Ok(tokens) => tokens,
            Err(_) => {
                let _ = self.session.clear();
                return self.session.snapshot();
            }
        };

        if tokens.is_empty() {
            self.session.finish_loading();
            return self.session.snapshot();
        }

        let restored = match self.api.current_user().await {
            Ok(user) => self.session.adopt_user(user),
            Err(e) => Err(e),
        };
        if restored.is_err() {
            let _ = self.session.clear();
        }

        self.session.snapshot()
    }

    /// Re-fetch the profile of the logged-in user
    pub async fn profile(&self) -> Result<User> {
        if self.session.snapshot().access_token.is_none() {
            return Err(Error::SessionExpired("not logged in".to_string()));
        }

        let user = self.api.current_user().await?;
        self.session.adopt_user(user.clone())?;
        Ok(user)
    }

    /// Log out locally, telling the server when possible
    pub async fn logout(&self) -> Result<()> {
        if let Some(access_token) = self.session.snapshot().access_token {
            // Server-side invalidation is best-effort
            let _ = self.api.logout(&access_token).await;
        }
        self.session.clear()
    }
}

fn require(field: &str, value: &str, message: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::field(field, message));
    }
    Ok(())
}
