//! Likes on posts and comments.
//!
//! A like set lives only in the cache and is keyed by the liked entity.

use crate::model::{Id, comment::CommentMarker, post::PostMarker};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Something a user can like.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum EntityRef {
    Post(Id<PostMarker>),
    Comment(Id<CommentMarker>),
}

impl EntityRef {
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            EntityRef::Post(_) => "post",
            EntityRef::Comment(_) => "comment",
        }
    }

    #[must_use]
    pub fn id(self) -> u64 {
        match self {
            EntityRef::Post(id) => id.get(),
            EntityRef::Comment(id) => id.get(),
        }
    }

    #[must_use]
    pub fn likes_key(self) -> String {
        format!("{}:likes:{}", self.kind(), self.id())
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// State of a like set after a toggle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
    pub likes: u64,
}
