use crate::service::Result;
use agora_common::model::{
    auth::Identity,
    like::{EntityRef, LikeStatus},
};
use agora_db::cache::Cache;
use std::sync::Arc;
use tracing::{info, instrument};

/// Likes on posts and comments. Like sets live only in the cache.
#[derive(Clone)]
pub struct ReactionService {
    cache: Arc<dyn Cache>,
}

impl ReactionService {
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Likes `entity` if the user has not liked it yet, otherwise takes the
    /// like back.
    ///
    /// The membership check and the update are separate cache calls, so two
    /// concurrent toggles by the same user can both observe the same state.
    #[instrument(skip_all, fields(user_id = %identity.user_id, %entity))]
    pub async fn toggle_like(&self, identity: &Identity, entity: EntityRef) -> Result<LikeStatus> {
        let key = entity.likes_key();
        let member = identity.user_id.to_string();

        let liked = if self.cache.is_member(&key, &member).await? {
            self.cache.remove_member(&key, &member).await?;
            false
        } else {
            self.cache.add_member(&key, &member).await?;
            true
        };
        let likes = self.cache.cardinality(&key).await?;

        info!(liked, likes, "Like toggled");
        Ok(LikeStatus { liked, likes })
    }
}
