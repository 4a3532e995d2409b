use crate::{
    record::{CommentDetailRecord, CredentialsRecord, PostDetailRecord, PostRecord, UserRecord},
    store::{Result, Store},
};
use agora_common::{
    model::{
        Id,
        comment::{CommentDetail, CommentMarker, CreateComment},
        post::{CreatePost, Post, PostDetail, PostMarker},
        user::{CreateUser, User, UserCredentials, UserMarker},
    },
    util::Page,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_as, query_scalar};
use tracing::info;

/// Postgres-backed [`Store`].
#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
}

fn page_bounds(page: Page) -> (i64, i64) {
    let limit = i64::try_from(page.limit()).unwrap_or(i64::MAX);
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    async fn fetch_user_where(&self, column: &str, value: &str) -> Result<Option<User>> {
        let sql = format!(
            "
            SELECT
                users.user_id,
                users.username,
                users.email,
                users.phone,
                users.created_at,
                users.updated_at
            FROM
                users
            WHERE
                users.{column} = $1
            "
        );

        let record = query_as::<_, UserRecord>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }
}

#[async_trait]
impl Store for DbClient {
    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_user_where("username", username).await
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_user_where("email", email).await
    }

    async fn fetch_user_by_phone(&self, phone: &str) -> Result<Option<User>> {
        self.fetch_user_where("phone", phone).await
    }

    async fn fetch_credentials(&self, login: &str) -> Result<Option<UserCredentials>> {
        let record = query_as::<_, CredentialsRecord>(
            "
            SELECT
                users.user_id,
                users.username,
                users.password_hash
            FROM
                users
            WHERE
                users.username = $1 OR users.email = $1
            ORDER BY
                users.user_id
            LIMIT 1
            ",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        let credentials = record.map(UserCredentials::try_from).transpose()?;
        Ok(credentials)
    }

    async fn create_user(&self, user: &CreateUser) -> Result<Id<UserMarker>> {
        let user_id: i64 = query_scalar(
            "
            INSERT INTO users (username, password_hash, email, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING users.user_id
            ",
        )
        .bind(user.username.get())
        .bind(user.password_hash.as_str())
        .bind(&user.email)
        .bind(user.phone.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(user_id.cast_unsigned().into())
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Id<PostMarker>> {
        let post_id: i64 = query_scalar(
            "
            INSERT INTO posts (author_id, community_id, title, content)
            VALUES ($1, $2, $3, $4)
            RETURNING posts.post_id
            ",
        )
        .bind(post.author_id.get().cast_signed())
        .bind(post.community_id.get().cast_signed())
        .bind(&post.title)
        .bind(&post.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(post_id.cast_unsigned().into())
    }

    async fn fetch_posts(&self, page: Page) -> Result<Vec<Post>> {
        let (limit, offset) = page_bounds(page);

        let records = query_as::<_, PostRecord>(
            "
            SELECT
                posts.post_id,
                posts.author_id,
                posts.community_id,
                posts.status,
                posts.title,
                posts.content,
                posts.created_at,
                posts.updated_at
            FROM
                posts
            ORDER BY
                posts.created_at DESC, posts.post_id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn fetch_post_detail(&self, post_id: Id<PostMarker>) -> Result<Option<PostDetail>> {
        let record = query_as::<_, PostDetailRecord>(
            "
            SELECT
                posts.post_id,
                posts.author_id,
                posts.community_id,
                posts.title,
                posts.content,
                posts.created_at,
                users.username
            FROM
                posts JOIN users ON users.user_id = posts.author_id
            WHERE
                posts.post_id = $1
            ",
        )
        .bind(post_id.get().cast_signed())
        .fetch_optional(&self.pool)
        .await?;

        let detail = record.map(PostDetail::try_from).transpose()?;
        Ok(detail)
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Id<CommentMarker>> {
        let comment_id: i64 = query_scalar(
            "
            INSERT INTO comments (post_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING comments.comment_id
            ",
        )
        .bind(comment.post_id.get().cast_signed())
        .bind(comment.author_id.get().cast_signed())
        .bind(&comment.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment_id.cast_unsigned().into())
    }

    async fn fetch_post_comments(
        &self,
        post_id: Id<PostMarker>,
        page: Page,
    ) -> Result<Vec<CommentDetail>> {
        let (limit, offset) = page_bounds(page);

        let records = query_as::<_, CommentDetailRecord>(
            "
            SELECT
                comments.comment_id,
                comments.post_id,
                comments.content,
                comments.created_at,
                users.username
            FROM
                comments JOIN users ON users.user_id = comments.author_id
            WHERE
                comments.post_id = $1
            ORDER BY
                comments.created_at ASC, comments.comment_id ASC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(post_id.get().cast_signed())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(CommentDetail::try_from)
            .collect::<Result<_, _>>()?;
        Ok(comments)
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use crate::{client::DbClient, store::Store};
    use agora_common::{
        model::{
            Id,
            auth::PasswordHashString,
            comment::CreateComment,
            post::{CreatePost, PostMarker},
            user::{CreateUser, UserMarker, Username},
        },
        util::Page,
    };
    use sqlx::PgPool;

    async fn create_user(db: &DbClient, name: &str) -> Id<UserMarker> {
        db.create_user(&CreateUser {
            username: Username::new(name.to_owned()).unwrap(),
            email: format!("{name}@x.io"),
            phone: None,
            password_hash: PasswordHashString::generate("pw1").unwrap(),
        })
        .await
        .unwrap()
    }

    async fn create_post(db: &DbClient, author_id: Id<UserMarker>, title: &str) -> Id<PostMarker> {
        db.create_post(&CreatePost {
            author_id,
            community_id: Id::new(1),
            title: title.to_owned(),
            content: "body".to_owned(),
        })
        .await
        .unwrap()
    }

    async fn flatten_timestamps(pool: &PgPool, table: &str) {
        sqlx::query(&format!(
            "UPDATE {table} SET created_at = '2025-01-01T00:00:00Z'"
        ))
        .execute(pool)
        .await
        .unwrap();
    }

    #[sqlx::test]
    async fn posts_are_newest_first_and_paged(pool: PgPool) {
        let db = DbClient::new(pool.clone());
        let alice = create_user(&db, "alice").await;

        let mut ids = Vec::new();
        for title in ["a", "b", "c"] {
            ids.push(create_post(&db, alice, title).await);
        }
        flatten_timestamps(&pool, "posts").await;
        ids.reverse();

        let posts = db.fetch_posts(Page::default()).await.unwrap();
        assert_eq!(posts.iter().map(|post| post.id).collect::<Vec<_>>(), ids);

        let second = db.fetch_posts(Page::new(2, 2).unwrap()).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, ids[2]);

        let beyond = db.fetch_posts(Page::new(u64::MAX, 10).unwrap()).await.unwrap();
        assert!(beyond.is_empty());
    }

    #[sqlx::test]
    async fn post_detail_carries_the_author_name(pool: PgPool) {
        let db = DbClient::new(pool);
        let alice = create_user(&db, "alice").await;
        let post_id = create_post(&db, alice, "hello").await;

        let detail = db.fetch_post_detail(post_id).await.unwrap().unwrap();
        assert_eq!(detail.author_id, alice);
        assert_eq!(detail.author_name.get(), "alice");
        assert_eq!(detail.title, "hello");

        assert!(db.fetch_post_detail(Id::new(404)).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn comments_are_oldest_first_and_paged(pool: PgPool) {
        let db = DbClient::new(pool.clone());
        let alice = create_user(&db, "alice").await;
        let bob = create_user(&db, "bob").await;
        let post_id = create_post(&db, alice, "hello").await;

        let mut ids = Vec::new();
        for (author_id, content) in [(bob, "first"), (alice, "second"), (bob, "third")] {
            let comment = CreateComment {
                post_id,
                author_id,
                content: content.to_owned(),
            };
            ids.push(db.create_comment(&comment).await.unwrap());
        }
        flatten_timestamps(&pool, "comments").await;

        let comments = db.fetch_post_comments(post_id, Page::default()).await.unwrap();
        assert_eq!(
            comments.iter().map(|comment| comment.id).collect::<Vec<_>>(),
            ids
        );
        assert_eq!(comments[0].author_name.get(), "bob");
        assert_eq!(comments[1].author_name.get(), "alice");

        let page = db
            .fetch_post_comments(post_id, Page::new(2, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].content, "third");
    }

    #[sqlx::test]
    async fn constraint_violations_are_classified(pool: PgPool) {
        let db = DbClient::new(pool);
        let alice = create_user(&db, "alice").await;

        let duplicate = db
            .create_user(&CreateUser {
                username: Username::new("alice2".to_owned()).unwrap(),
                email: "alice@x.io".to_owned(),
                phone: None,
                password_hash: PasswordHashString::generate("pw1").unwrap(),
            })
            .await
            .unwrap_err();
        assert!(duplicate.is_unique_violation());

        let orphan = db
            .create_comment(&CreateComment {
                post_id: Id::new(404),
                author_id: alice,
                content: "hi".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(orphan.is_foreign_key_violation());
    }

    #[sqlx::test]
    async fn credentials_match_username_or_email(pool: PgPool) {
        let db = DbClient::new(pool);
        let alice = create_user(&db, "alice").await;

        for login in ["alice", "alice@x.io"] {
            let credentials = db.fetch_credentials(login).await.unwrap().unwrap();
            assert_eq!(credentials.id, alice);
            assert!(credentials.password_hash.verify("pw1"));
        }
        assert!(db.fetch_credentials("bob").await.unwrap().is_none());

        let user = db.fetch_user_by_email("alice@x.io").await.unwrap().unwrap();
        assert_eq!(user.username.get(), "alice");
        assert_eq!(user.phone, None);
    }
}
