//! In-process [`Store`] and [`Cache`] used by tests.
//!
//! They follow the same contracts as the Postgres and Redis implementations,
//! including uniqueness and foreign-key failures and key expiry.

use crate::{
    cache::{self, Cache, CacheError},
    store::{DbError, Result, Store},
};
use agora_common::{
    model::{
        ContentStatus, Id,
        comment::{CommentDetail, CommentMarker, CreateComment},
        post::{CreatePost, Post, PostDetail, PostMarker},
        user::{CreateUser, User, UserCredentials, UserMarker},
    },
    util::{Page, PositiveDuration},
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use time::OffsetDateTime;
use tokio::{sync::Mutex, time::Instant};

#[derive(Clone, Debug)]
struct UserRow {
    user: User,
    credentials: UserCredentials,
}

#[derive(Clone, Debug)]
struct CommentRow {
    id: Id<CommentMarker>,
    post_id: Id<PostMarker>,
    author_id: Id<UserMarker>,
    content: String,
    created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<UserRow>,
    posts: Vec<Post>,
    comments: Vec<CommentRow>,
    next_id: u64,
}

impl Tables {
    fn next_id<Marker>(&mut self) -> Id<Marker> {
        self.next_id += 1;
        Id::new(self.next_id)
    }

    fn user(&self, id: Id<UserMarker>) -> Option<&UserRow> {
        self.users.iter().find(|row| row.user.id == id)
    }

    fn find_user(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users
            .iter()
            .find(|row| predicate(&row.user))
            .map(|row| row.user.clone())
    }
}

fn page_slice<T>(rows: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    rows.skip(offset).take(limit).collect()
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.find_user(|user| user.username.get() == username))
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.find_user(|user| user.email == email))
    }

    async fn fetch_user_by_phone(&self, phone: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.find_user(|user| user.phone.as_deref() == Some(phone)))
    }

    async fn fetch_credentials(&self, login: &str) -> Result<Option<UserCredentials>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|row| row.user.username.get() == login || row.user.email == login)
            .map(|row| row.credentials.clone()))
    }

    async fn create_user(&self, user: &CreateUser) -> Result<Id<UserMarker>> {
        let mut tables = self.tables.lock().await;

        for row in &tables.users {
            if row.user.username == user.username {
                return Err(DbError::UniqueViolation("users_username_key".to_owned()));
            }
            if row.user.email == user.email {
                return Err(DbError::UniqueViolation("users_email_key".to_owned()));
            }
            if user.phone.is_some() && row.user.phone == user.phone {
                return Err(DbError::UniqueViolation("users_phone_key".to_owned()));
            }
        }

        let id = tables.next_id();
        let now = OffsetDateTime::now_utc();
        tables.users.push(UserRow {
            user: User {
                id,
                username: user.username.clone(),
                email: user.email.clone(),
                phone: user.phone.clone(),
                created_at: now,
                updated_at: now,
            },
            credentials: UserCredentials {
                id,
                username: user.username.clone(),
                password_hash: user.password_hash.clone(),
            },
        });

        Ok(id)
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Id<PostMarker>> {
        let mut tables = self.tables.lock().await;

        if tables.user(post.author_id).is_none() {
            return Err(DbError::ForeignKeyViolation(
                "posts_author_id_fkey".to_owned(),
            ));
        }

        let id = tables.next_id();
        let now = OffsetDateTime::now_utc();
        tables.posts.push(Post {
            id,
            author_id: post.author_id,
            community_id: post.community_id,
            title: post.title.clone(),
            content: post.content.clone(),
            status: ContentStatus::Active,
            created_at: now,
            updated_at: now,
        });

        Ok(id)
    }

    async fn fetch_posts(&self, page: Page) -> Result<Vec<Post>> {
        let tables = self.tables.lock().await;

        let mut posts: Vec<&Post> = tables.posts.iter().collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(page_slice(posts.into_iter().cloned(), page))
    }

    async fn fetch_post_detail(&self, post_id: Id<PostMarker>) -> Result<Option<PostDetail>> {
        let tables = self.tables.lock().await;

        let Some(post) = tables.posts.iter().find(|post| post.id == post_id) else {
            return Ok(None);
        };
        let author = tables.user(post.author_id).ok_or_else(|| {
            DbError::ForeignKeyViolation("posts_author_id_fkey".to_owned())
        })?;

        Ok(Some(PostDetail {
            id: post.id,
            author_id: post.author_id,
            community_id: post.community_id,
            title: post.title.clone(),
            content: post.content.clone(),
            created_at: post.created_at,
            author_name: author.user.username.clone(),
        }))
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Id<CommentMarker>> {
        let mut tables = self.tables.lock().await;

        if !tables.posts.iter().any(|post| post.id == comment.post_id) {
            return Err(DbError::ForeignKeyViolation(
                "comments_post_id_fkey".to_owned(),
            ));
        }
        if tables.user(comment.author_id).is_none() {
            return Err(DbError::ForeignKeyViolation(
                "comments_author_id_fkey".to_owned(),
            ));
        }

        let id = tables.next_id();
        tables.comments.push(CommentRow {
            id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            content: comment.content.clone(),
            created_at: OffsetDateTime::now_utc(),
        });

        Ok(id)
    }

    async fn fetch_post_comments(
        &self,
        post_id: Id<PostMarker>,
        page: Page,
    ) -> Result<Vec<CommentDetail>> {
        let tables = self.tables.lock().await;

        let mut comments: Vec<&CommentRow> = tables
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .collect();
        comments.sort_by_key(|comment| (comment.created_at, comment.id));

        let details = comments.into_iter().filter_map(|comment| {
            let author = tables.user(comment.author_id)?;
            Some(CommentDetail {
                id: comment.id,
                post_id: comment.post_id,
                content: comment.content.clone(),
                created_at: comment.created_at,
                author_name: author.user.username.clone(),
            })
        });

        Ok(page_slice(details, page))
    }
}

#[derive(Clone, Debug)]
enum Value {
    String(String),
    Set(HashSet<String>),
}

#[derive(Clone, Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

/// Expiring map standing in for redis. Expiry follows `tokio::time`, so
/// paused-clock tests can advance past a TTL.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries);
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every key, like a cache restart.
    pub async fn flush(&self) {
        self.entries.lock().await.clear();
    }
}

fn evict_expired(entries: &mut HashMap<String, Entry>) {
    let now = Instant::now();
    entries.retain(|_, entry| entry.expires_at.is_none_or(|expires_at| expires_at > now));
}

fn live_entry<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    let now = Instant::now();
    if entries
        .get(key)
        .and_then(|entry| entry.expires_at)
        .is_some_and(|expires_at| expires_at <= now)
    {
        entries.remove(key);
    }
    entries.get_mut(key)
}

fn set_of<'a>(entry: &'a mut Entry, key: &str) -> cache::Result<&'a mut HashSet<String>> {
    match &mut entry.value {
        Value::Set(set) => Ok(set),
        Value::String(_) => Err(CacheError::WrongType(key.to_owned())),
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> cache::Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        match live_entry(&mut entries, key).map(|entry| &entry.value) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(Value::Set(_)) => Err(CacheError::WrongType(key.to_owned())),
        }
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: PositiveDuration,
    ) -> cache::Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_owned(),
            Entry {
                value: Value::String(value.to_owned()),
                expires_at: Some(Instant::now() + ttl.to_std()),
            },
        );
        Ok(())
    }

    async fn is_member(&self, key: &str, member: &str) -> cache::Result<bool> {
        let mut entries = self.entries.lock().await;
        match live_entry(&mut entries, key) {
            None => Ok(false),
            Some(entry) => Ok(set_of(entry, key)?.contains(member)),
        }
    }

    async fn add_member(&self, key: &str, member: &str) -> cache::Result<()> {
        let mut entries = self.entries.lock().await;
        if live_entry(&mut entries, key).is_none() {
            entries.insert(
                key.to_owned(),
                Entry {
                    value: Value::Set(HashSet::new()),
                    expires_at: None,
                },
            );
        }

        let entry = live_entry(&mut entries, key)
            .ok_or_else(|| CacheError::WrongType(key.to_owned()))?;
        set_of(entry, key)?.insert(member.to_owned());
        Ok(())
    }

    async fn remove_member(&self, key: &str, member: &str) -> cache::Result<()> {
        let mut entries = self.entries.lock().await;
        let Some(entry) = live_entry(&mut entries, key) else {
            return Ok(());
        };

        let set = set_of(entry, key)?;
        set.remove(member);
        if set.is_empty() {
            entries.remove(key);
        }
        Ok(())
    }

    async fn cardinality(&self, key: &str) -> cache::Result<u64> {
        let mut entries = self.entries.lock().await;
        match live_entry(&mut entries, key) {
            None => Ok(0),
            Some(entry) => Ok(u64::try_from(set_of(entry, key)?.len()).unwrap_or(u64::MAX)),
        }
    }
}
