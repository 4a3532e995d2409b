use crate::model::{
    ContentStatus, Id,
    user::{UserMarker, Username},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// Communities are referenced by id only; nothing checks that they exist.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommunityMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author_id: Id<UserMarker>,
    pub community_id: Id<CommunityMarker>,
    pub title: String,
    pub content: String,
    pub status: ContentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CreatePost {
    pub author_id: Id<UserMarker>,
    pub community_id: Id<CommunityMarker>,
    pub title: String,
    pub content: String,
}

/// A post together with its author's name, as served by the detail endpoint
/// and kept in the detail cache.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct PostDetail {
    pub id: Id<PostMarker>,
    pub author_id: Id<UserMarker>,
    pub community_id: Id<CommunityMarker>,
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub author_name: Username,
}

impl PostDetail {
    #[must_use]
    pub fn cache_key(id: Id<PostMarker>) -> String {
        format!("post:{id}")
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, post::PostDetail, user::Username};
    use time::macros::datetime;

    #[test]
    fn detail_survives_the_cache_encoding() {
        let detail = PostDetail {
            id: Id::new(3),
            author_id: Id::new(1),
            community_id: Id::new(1),
            title: "Hello".to_owned(),
            content: "World".to_owned(),
            created_at: datetime!(2025-10-24 10:30:15.123456 UTC),
            author_name: Username::new("alice".to_owned()).unwrap(),
        };

        let encoded = serde_json::to_string(&detail).unwrap();
        assert!(encoded.contains("\"author_name\":\"alice\""));

        let decoded: PostDetail = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, detail);
    }

    #[test]
    fn detail_cache_key() {
        assert_eq!(PostDetail::cache_key(Id::new(12)), "post:12");
    }
}
