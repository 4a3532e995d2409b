use agora_common::{
    model::{
        Id, ModelValidationError,
        comment::{CommentDetail, CommentMarker, CreateComment},
        post::{CreatePost, Post, PostDetail, PostMarker},
        user::{CreateUser, User, UserCredentials, UserMarker},
    },
    util::Page,
};
use async_trait::async_trait;
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("Referenced row does not exist: {0}")]
    ForeignKeyViolation(String),
    #[error("Running migrations failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl DbError {
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }

    #[must_use]
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, DbError::ForeignKeyViolation(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(value: sqlx::Error) -> Self {
        let Some(database_error) = value.as_database_error() else {
            return DbError::Sqlx(value);
        };
        let constraint = database_error.constraint().unwrap_or_default().to_owned();

        if database_error.is_unique_violation() {
            DbError::UniqueViolation(constraint)
        } else if database_error.is_foreign_key_violation() {
            DbError::ForeignKeyViolation(constraint)
        } else {
            DbError::Sqlx(value)
        }
    }
}

/// Durable storage for users, posts and comments.
///
/// Every method is a single statement; nothing here spans a transaction.
#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn fetch_user_by_phone(&self, phone: &str) -> Result<Option<User>>;

    /// Finds the user whose username or email equals `login`.
    async fn fetch_credentials(&self, login: &str) -> Result<Option<UserCredentials>>;

    async fn create_user(&self, user: &CreateUser) -> Result<Id<UserMarker>>;

    async fn create_post(&self, post: &CreatePost) -> Result<Id<PostMarker>>;

    /// Newest posts first.
    async fn fetch_posts(&self, page: Page) -> Result<Vec<Post>>;

    async fn fetch_post_detail(&self, post_id: Id<PostMarker>) -> Result<Option<PostDetail>>;

    /// Fails with [`DbError::ForeignKeyViolation`] if the post or author is missing.
    async fn create_comment(&self, comment: &CreateComment) -> Result<Id<CommentMarker>>;

    /// Oldest comments first.
    async fn fetch_post_comments(
        &self,
        post_id: Id<PostMarker>,
        page: Page,
    ) -> Result<Vec<CommentDetail>>;
}
