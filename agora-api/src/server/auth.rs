use crate::{
    server::ServerError,
    service::{self, identity::Authenticator},
};
use agora_common::model::auth::Identity;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use std::sync::Arc;
use tracing::debug;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// The caller behind a valid `Authorization: Bearer <session token>` header.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthenticatedUser {
    identity: Identity,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn into_identity(self) -> Identity {
        self.identity
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<dyn Authenticator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = AuthorizationHeader::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                debug!(%rejection, "Authorization header rejected");
                service::Error::MalformedAuth
            })?;

        let identity = <Arc<dyn Authenticator>>::from_ref(state)
            .authenticate(header.token())
            .await?;

        Ok(Self { identity })
    }
}
