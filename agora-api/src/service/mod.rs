//! Forum operations, independent of HTTP.

pub mod content;
pub mod identity;
pub mod reaction;

use agora_common::model::auth::PasswordHashError;
use agora_db::{cache::CacheError, store::DbError};
use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("invalid username or password")]
    Auth,
    #[error("invalid or expired session")]
    InvalidSession,
    #[error("missing or malformed authorization header")]
    MalformedAuth,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("comment could not be created, the post may not exist: {0}")]
    CreateComment(#[source] DbError),
    #[error("Store failure: {0}")]
    Store(#[from] DbError),
    #[error("Cache failure: {0}")]
    Cache(#[from] CacheError),
    #[error("Encoding or decoding a cache entry failed: {0}")]
    CacheEncoding(#[from] serde_json::Error),
    #[error(transparent)]
    PasswordHash(#[from] PasswordHashError),
    #[error("Blocking task failed: {0}")]
    BlockingTask(#[from] tokio::task::JoinError),
}

impl Error {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::CreateComment(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Auth | Error::InvalidSession | Error::MalformedAuth => {
                StatusCode::UNAUTHORIZED
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Store(_)
            | Error::Cache(_)
            | Error::CacheEncoding(_)
            | Error::PasswordHash(_)
            | Error::BlockingTask(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the caller. Internal causes stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Error::CreateComment(_) => {
                "comment could not be created, the post may not exist".to_owned()
            }
            error if error.status().is_server_error() => "internal server error".to_owned(),
            error => error.to_string(),
        }
    }
}
