use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json};
use crate::service::reaction::ReactionService;
use agora_common::model::{
    Id,
    comment::CommentMarker,
    like::{EntityRef, LikeStatus},
    post::PostMarker,
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(like_post)
        .typed_post(like_comment)
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize)]
struct LikeResponse {
    message: &'static str,
    #[serde(flatten)]
    status: LikeStatus,
}

impl From<LikeStatus> for LikeResponse {
    fn from(status: LikeStatus) -> Self {
        let message = if status.liked { "liked" } else { "unliked" };
        Self { message, status }
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/like", rejection(ServerError))]
struct LikePostPath {
    post_id: Id<PostMarker>,
}

async fn like_post(
    LikePostPath { post_id }: LikePostPath,
    State(reactions): State<Arc<ReactionService>>,
    user: AuthenticatedUser,
) -> Result<Json<LikeResponse>> {
    let status = reactions
        .toggle_like(user.identity(), EntityRef::Post(post_id))
        .await?;

    Ok(Json(status.into()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/comments/{comment_id}/like", rejection(ServerError))]
struct LikeCommentPath {
    comment_id: Id<CommentMarker>,
}

async fn like_comment(
    LikeCommentPath { comment_id }: LikeCommentPath,
    State(reactions): State<Arc<ReactionService>>,
    user: AuthenticatedUser,
) -> Result<Json<LikeResponse>> {
    let status = reactions
        .toggle_like(user.identity(), EntityRef::Comment(comment_id))
        .await?;

    Ok(Json(status.into()))
}
