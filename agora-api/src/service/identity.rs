use crate::service::{Error, Result};
use agora_common::{
    model::{
        Id,
        auth::{Identity, PasswordHashString, SessionToken},
        user::{CreateUser, UserMarker, UserProfile, Username},
    },
    util::PositiveDuration,
};
use agora_db::{cache::Cache, store::Store};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::{debug, info, instrument};

/// Resolves a bearer token to the identity it was issued for.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Identity>;
}

#[derive(Clone, Eq, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Login {
    /// Username or email.
    pub username: String,
    pub password: String,
}

/// Registration, login and cache-backed sessions.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn Store>,
    cache: Arc<dyn Cache>,
    session_ttl: PositiveDuration,
}

impl IdentityService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, cache: Arc<dyn Cache>, session_ttl: PositiveDuration) -> Self {
        Self {
            store,
            cache,
            session_ttl,
        }
    }

    #[instrument(skip_all, fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<Id<UserMarker>> {
        const EMPTY_FIELDS: Error =
            Error::Validation("username, password and email must not be empty");

        let Registration {
            username,
            password,
            confirm_password,
            email,
            phone,
        } = registration;

        let username = Username::new(username).map_err(|_| EMPTY_FIELDS)?;
        if password.is_empty() || email.is_empty() {
            return Err(EMPTY_FIELDS);
        }
        if password != confirm_password {
            return Err(Error::Validation("passwords do not match"));
        }
        let phone = phone.filter(|phone| !phone.is_empty());

        if self
            .store
            .fetch_user_by_username(username.get())
            .await?
            .is_some()
        {
            return Err(Error::Conflict("username already exists"));
        }
        if self.store.fetch_user_by_email(&email).await?.is_some() {
            return Err(Error::Conflict("email already registered"));
        }
        if let Some(phone) = &phone
            && self.store.fetch_user_by_phone(phone).await?.is_some()
        {
            return Err(Error::Conflict("phone already registered"));
        }

        let password_hash = spawn_blocking(move || PasswordHashString::generate(&password)).await??;

        let user = CreateUser {
            username,
            email,
            phone,
            password_hash,
        };
        let user_id = self.store.create_user(&user).await.map_err(|err| {
            if err.is_unique_violation() {
                Error::Conflict("username, email or phone already registered")
            } else {
                err.into()
            }
        })?;

        info!(%user_id, "User registered");
        Ok(user_id)
    }

    #[instrument(skip_all, fields(login = %login.username))]
    pub async fn login(&self, login: Login) -> Result<SessionToken> {
        let Login { username, password } = login;

        if username.is_empty() || password.is_empty() {
            return Err(Error::Validation("username and password must not be empty"));
        }

        let Some(credentials) = self.store.fetch_credentials(&username).await? else {
            debug!("No user matches login");
            return Err(Error::Auth);
        };

        let password_hash = credentials.password_hash;
        let verified = spawn_blocking(move || password_hash.verify(&password)).await?;
        if !verified {
            debug!(user_id = %credentials.id, "Password verification failed");
            return Err(Error::Auth);
        }

        let token = SessionToken::generate_random();
        let identity = Identity {
            user_id: credentials.id,
            username: credentials.username,
        };
        let session = serde_json::to_string(&identity)?;
        self.cache
            .set_with_ttl(&token.cache_key(), &session, self.session_ttl)
            .await?;

        info!(user_id = %identity.user_id, "User logged in");
        Ok(token)
    }

    #[instrument(skip(self))]
    pub async fn user_profile(&self, username: &str) -> Result<UserProfile> {
        let user = self
            .store
            .fetch_user_by_username(username)
            .await?
            .ok_or(Error::NotFound("user"))?;

        Ok(user.into())
    }
}

#[async_trait]
impl Authenticator for IdentityService {
    #[instrument(skip_all)]
    async fn authenticate(&self, token: &str) -> Result<Identity> {
        let token: SessionToken = token.parse().map_err(|err| {
            debug!(error = %err, "Bearer token is not a session token");
            Error::InvalidSession
        })?;

        let session = self
            .cache
            .get(&token.cache_key())
            .await?
            .ok_or(Error::InvalidSession)?;

        let identity = serde_json::from_str(&session)?;
        Ok(identity)
    }
}
