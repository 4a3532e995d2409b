use crate::server::{
    Result, ServerError, ServerRouter, auth::AuthenticatedUser, extract::Form, json::Json,
};
use crate::service::identity::{IdentityService, Login, Registration};
use agora_common::model::{auth::Identity, user::UserProfile};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(register)
        .typed_post(login)
        .typed_get(profile)
        .typed_get(get_user)
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct LoginResponse {
    message: &'static str,
    session_id: String,
}

#[derive(TypedPath)]
#[typed_path("/register")]
struct RegisterPath;

async fn register(
    RegisterPath: RegisterPath,
    State(identity): State<Arc<IdentityService>>,
    Form(registration): Form<Registration>,
) -> Result<Json<MessageResponse>> {
    identity.register(registration).await?;

    Ok(Json(MessageResponse {
        message: "registration successful",
    }))
}

#[derive(TypedPath)]
#[typed_path("/login")]
struct LoginPath;

async fn login(
    LoginPath: LoginPath,
    State(identity): State<Arc<IdentityService>>,
    Form(credentials): Form<Login>,
) -> Result<Json<LoginResponse>> {
    let token = identity.login(credentials).await?;

    Ok(Json(LoginResponse {
        message: "login successful",
        session_id: token.as_token_str(),
    }))
}

#[derive(TypedPath)]
#[typed_path("/profile")]
struct ProfilePath;

async fn profile(ProfilePath: ProfilePath, user: AuthenticatedUser) -> Json<Identity> {
    Json(user.into_identity())
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{username}", rejection(ServerError))]
struct GetUserPath {
    username: String,
}

async fn get_user(
    GetUserPath { username }: GetUserPath,
    State(identity): State<Arc<IdentityService>>,
) -> Result<Json<UserProfile>> {
    let profile = identity.user_profile(&username).await?;

    Ok(Json(profile))
}
