use crate::server::ServerRouter;
use agora_common::util::Page;
use axum::Router;
use serde::Deserialize;

mod comments;
mod likes;
mod posts;
mod users;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(users::routes())
        .merge(posts::routes())
        .merge(comments::routes())
        .merge(likes::routes())
}

/// `?page=&size=`. Anything missing or unusable falls back to the default.
#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
struct PageQuery {
    page: Option<String>,
    size: Option<String>,
}

impl From<PageQuery> for Page {
    fn from(query: PageQuery) -> Self {
        Page::from_query(query.page.as_deref(), query.size.as_deref())
    }
}
