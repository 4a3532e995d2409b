use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Form, Query},
    json::Json,
    routes::PageQuery,
};
use crate::service::content::{ContentService, NewPost};
use agora_common::model::{
    Id,
    post::{Post, PostDetail, PostMarker},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_post(create_post)
        .typed_get(get_post)
}

#[derive(TypedPath)]
#[typed_path("/posts")]
struct PostsPath;

async fn list_posts(
    PostsPath: PostsPath,
    State(content): State<Arc<ContentService>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Post>>> {
    let posts = content.list_posts(query.into()).await?;

    Ok(Json(posts))
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize)]
struct CreatePostResponse {
    message: &'static str,
    post_id: Id<PostMarker>,
}

async fn create_post(
    PostsPath: PostsPath,
    State(content): State<Arc<ContentService>>,
    user: AuthenticatedUser,
    Form(post): Form<NewPost>,
) -> Result<Json<CreatePostResponse>> {
    let post_id = content.create_post(user.identity(), post).await?;

    Ok(Json(CreatePostResponse {
        message: "post created",
        post_id,
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}", rejection(ServerError))]
struct GetPostPath {
    post_id: Id<PostMarker>,
}

async fn get_post(
    GetPostPath { post_id }: GetPostPath,
    State(content): State<Arc<ContentService>>,
) -> Result<Json<PostDetail>> {
    let post = content.post_detail(post_id).await?;

    Ok(Json(post))
}
