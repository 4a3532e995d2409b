use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Form, Query},
    json::Json,
    routes::PageQuery,
};
use crate::service::content::{ContentService, NewComment};
use agora_common::model::{
    Id,
    comment::{CommentDetail, CommentMarker},
    post::PostMarker,
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_comments)
        .typed_post(create_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/comments", rejection(ServerError))]
struct PostCommentsPath {
    post_id: Id<PostMarker>,
}

async fn list_comments(
    PostCommentsPath { post_id }: PostCommentsPath,
    State(content): State<Arc<ContentService>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<CommentDetail>>> {
    let comments = content.list_comments(post_id, query.into()).await?;

    Ok(Json(comments))
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize)]
struct CreateCommentResponse {
    message: &'static str,
    comment_id: Id<CommentMarker>,
}

async fn create_comment(
    PostCommentsPath { post_id }: PostCommentsPath,
    State(content): State<Arc<ContentService>>,
    user: AuthenticatedUser,
    Form(comment): Form<NewComment>,
) -> Result<Json<CreateCommentResponse>> {
    let comment_id = content
        .create_comment(user.identity(), post_id, comment)
        .await?;

    Ok(Json(CreateCommentResponse {
        message: "comment posted",
        comment_id,
    }))
}
