use crate::service::{Error, Result};
use agora_common::{
    model::{
        Id,
        auth::Identity,
        comment::{CommentDetail, CommentMarker, CreateComment},
        post::{CreatePost, Post, PostDetail, PostMarker},
    },
    util::{Page, PositiveDuration},
};
use agora_db::{cache::Cache, store::Store};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub community_id: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewComment {
    pub content: String,
}

/// Posts and comments, with a read-through cache in front of post details.
#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn Store>,
    cache: Arc<dyn Cache>,
    detail_ttl: PositiveDuration,
}

impl ContentService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, cache: Arc<dyn Cache>, detail_ttl: PositiveDuration) -> Self {
        Self {
            store,
            cache,
            detail_ttl,
        }
    }

    #[instrument(skip_all, fields(user_id = %identity.user_id))]
    pub async fn create_post(&self, identity: &Identity, post: NewPost) -> Result<Id<PostMarker>> {
        let NewPost {
            title,
            content,
            community_id,
        } = post;

        if title.is_empty() || content.is_empty() || community_id.is_empty() {
            return Err(Error::Validation(
                "title, content and community_id must not be empty",
            ));
        }
        let community_id = community_id
            .parse()
            .map_err(|_| Error::Validation("community_id must be a non-negative integer"))?;

        let post = CreatePost {
            author_id: identity.user_id,
            community_id,
            title,
            content,
        };
        let post_id = self.store.create_post(&post).await?;

        info!(%post_id, "Post created");
        Ok(post_id)
    }

    #[instrument(skip(self))]
    pub async fn list_posts(&self, page: Page) -> Result<Vec<Post>> {
        Ok(self.store.fetch_posts(page).await?)
    }

    /// Serves from the cache when possible. Cache trouble never fails the
    /// request; it only costs a store round trip.
    #[instrument(skip(self))]
    pub async fn post_detail(&self, post_id: Id<PostMarker>) -> Result<PostDetail> {
        let key = PostDetail::cache_key(post_id);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => match serde_json::from_str(&cached) {
                Ok(detail) => {
                    debug!("Post detail cache hit");
                    return Ok(detail);
                }
                Err(err) => warn!(error = %err, "Discarding undecodable cached post detail"),
            },
            Ok(None) => debug!("Post detail cache miss"),
            Err(err) => warn!(error = %err, "Post detail cache lookup failed"),
        }

        let detail = self
            .store
            .fetch_post_detail(post_id)
            .await?
            .ok_or(Error::NotFound("post"))?;

        self.cache_post_detail(&key, &detail).await;
        Ok(detail)
    }

    async fn cache_post_detail(&self, key: &str, detail: &PostDetail) {
        let serialized = match serde_json::to_string(detail) {
            Ok(serialized) => serialized,
            Err(err) => {
                error!(error = %err, "Serializing post detail for the cache failed");
                return;
            }
        };

        if let Err(err) = self
            .cache
            .set_with_ttl(key, &serialized, self.detail_ttl)
            .await
        {
            error!(error = %err, "Caching post detail failed");
        }
    }

    #[instrument(skip_all, fields(user_id = %identity.user_id, %post_id))]
    pub async fn create_comment(
        &self,
        identity: &Identity,
        post_id: Id<PostMarker>,
        comment: NewComment,
    ) -> Result<Id<CommentMarker>> {
        if comment.content.is_empty() {
            return Err(Error::Validation("content must not be empty"));
        }

        let comment = CreateComment {
            post_id,
            author_id: identity.user_id,
            content: comment.content,
        };
        let comment_id = self
            .store
            .create_comment(&comment)
            .await
            .map_err(|err| {
                if err.is_foreign_key_violation() {
                    Error::CreateComment(err)
                } else {
                    err.into()
                }
            })?;

        info!(%comment_id, "Comment created");
        Ok(comment_id)
    }

    #[instrument(skip(self))]
    pub async fn list_comments(
        &self,
        post_id: Id<PostMarker>,
        page: Page,
    ) -> Result<Vec<CommentDetail>> {
        Ok(self.store.fetch_post_comments(post_id, page).await?)
    }
}
