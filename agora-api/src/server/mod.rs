use crate::service::{
    self, content::ContentService, identity::Authenticator, identity::IdentityService,
    reaction::ReactionService,
};
use agora_common::util::PositiveDuration;
use agora_db::{cache::Cache, store::Store};
use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{FormRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use json::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

mod auth;
mod extract;
mod json;
mod routes;
#[cfg(test)]
mod tests;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub identity: Arc<IdentityService>,
    pub authenticator: Arc<dyn Authenticator>,
    pub content: Arc<ContentService>,
    pub reactions: Arc<ReactionService>,
}

impl ServerState {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        cache: Arc<dyn Cache>,
        session_ttl: PositiveDuration,
        post_cache_ttl: PositiveDuration,
    ) -> Self {
        let identity = Arc::new(IdentityService::new(
            store.clone(),
            cache.clone(),
            session_ttl,
        ));

        Self {
            authenticator: identity.clone(),
            identity,
            content: Arc::new(ContentService::new(store, cache.clone(), post_cache_ttl)),
            reactions: Arc::new(ReactionService::new(cache)),
        }
    }
}

pub fn app(state: ServerState) -> Router {
    routes::routes().fallback(fallback).with_state(state)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Form rejected: {0}")]
    FormRejection(#[from] FormRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error(transparent)]
    Service(#[from] service::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_) => StatusCode::NOT_FOUND,
            ServerError::PathRejection(_)
            | ServerError::QueryRejection(_)
            | ServerError::FormRejection(_) => StatusCode::BAD_REQUEST,
            ServerError::JsonResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Service(err) => err.status(),
        }
    }

    fn public_message(&self) -> String {
        match self {
            ServerError::UnknownRoute(_) => "not found".to_owned(),
            ServerError::PathRejection(_) => "invalid path parameter".to_owned(),
            ServerError::QueryRejection(_) => "invalid query".to_owned(),
            ServerError::FormRejection(_) => "invalid form body".to_owned(),
            ServerError::JsonResponse(_) => "internal server error".to_owned(),
            ServerError::Service(err) => err.public_message(),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, %status, "Replying with error");
        } else {
            debug!(error = %self, %status, "Replying with error");
        }

        let error_response = ErrorResponse {
            status: status.as_u16(),
            error: self.public_message(),
        };
        (status, Json(error_response)).into_response()
    }
}
