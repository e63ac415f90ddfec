//! Login, signup, logout and profile flows on top of the session.

use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::catalog::CatalogApi;
use crate::error::{ApiError, ApiResult};
use crate::models::UserProfile;
use crate::session::Session;
use crate::validation::{LoginForm, ProfileForm, SignupForm};

#[derive(Clone)]
pub struct Auth {
    api: Arc<dyn CatalogApi>,
    session: Session,
}

impl Auth {
    pub fn new(api: Arc<dyn CatalogApi>, session: Session) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn login(&self, form: &LoginForm) -> ApiResult<UserProfile> {
        form.validate()?;
        let payload = self.api.login(form).await.inspect_err(|err| {
            warn!("Login failed for {}: {}", form.username, err);
        })?;
        let token = payload.token.ok_or_else(|| ApiError::Decode {
            path: "/users/login".to_string(),
            reason: "login response carried no token".to_string(),
        })?;
        self.session.sign_in(token);
        info!("Logged in as {}", payload.user.username);
        Ok(payload.user)
    }

    /// Creates the account. Signs in when the backend hands back a token.
    pub async fn register(&self, form: &SignupForm) -> ApiResult<UserProfile> {
        form.validate()?;
        let payload = self.api.register(form).await.inspect_err(|err| {
            warn!("Registration failed for {}: {}", form.username, err);
        })?;
        match payload.token {
            Some(token) => {
                self.session.sign_in(token);
                info!("Registered and logged in as {}", payload.user.username);
            }
            None => info!("Registered {}", payload.user.username),
        }
        Ok(payload.user)
    }

    pub fn logout(&self) {
        self.session.sign_out();
        info!("Logged out");
    }

    pub async fn profile(&self) -> ApiResult<UserProfile> {
        self.require_session()?;
        self.api.profile().await
    }

    pub async fn update_profile(&self, form: &ProfileForm) -> ApiResult<UserProfile> {
        self.require_session()?;
        form.validate()?;
        let profile = self.api.update_profile(form).await?;
        info!("Updated profile of {}", profile.username);
        Ok(profile)
    }

    fn require_session(&self) -> ApiResult<()> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::NotAuthenticated)
        }
    }
}
