use agora_common::model::{
    ModelValidationError,
    auth::PasswordHashString,
    comment::CommentDetail,
    post::{Post, PostDetail},
    user::{User, UserCredentials, Username},
};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CredentialsRecord {
    pub user_id: i64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub post_id: i64,
    pub author_id: i64,
    pub community_id: i64,
    pub status: i16,
    pub title: String,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostDetailRecord {
    pub post_id: i64,
    pub author_id: i64,
    pub community_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CommentDetailRecord {
    pub comment_id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub username: String,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.cast_unsigned().into(),
            username: Username::new(value.username)?,
            email: value.email,
            phone: value.phone,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl TryFrom<CredentialsRecord> for UserCredentials {
    type Error = ModelValidationError;

    fn try_from(value: CredentialsRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.cast_unsigned().into(),
            username: Username::new(value.username)?,
            password_hash: PasswordHashString::from_phc(value.password_hash)?,
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.cast_unsigned().into(),
            author_id: value.author_id.cast_unsigned().into(),
            community_id: value.community_id.cast_unsigned().into(),
            title: value.title,
            content: value.content,
            status: value.status.try_into()?,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl TryFrom<PostDetailRecord> for PostDetail {
    type Error = ModelValidationError;

    fn try_from(value: PostDetailRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.cast_unsigned().into(),
            author_id: value.author_id.cast_unsigned().into(),
            community_id: value.community_id.cast_unsigned().into(),
            title: value.title,
            content: value.content,
            created_at: value.created_at,
            author_name: Username::new(value.username)?,
        })
    }
}

impl TryFrom<CommentDetailRecord> for CommentDetail {
    type Error = ModelValidationError;

    fn try_from(value: CommentDetailRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_id.cast_unsigned().into(),
            post_id: value.post_id.cast_unsigned().into(),
            content: value.content,
            created_at: value.created_at,
            author_name: Username::new(value.username)?,
        })
    }
}
