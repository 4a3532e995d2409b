use crate::server::{ServerState, app};
use agora_common::{model::post::PostDetail, util::PositiveDuration};
use agora_db::{
    cache::Cache,
    memory::{MemoryCache, MemoryStore},
};
use axum::{
    Router,
    body::Body,
    http::{
        Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;

const SESSION_TTL: u64 = 24 * 60 * 60;
const POST_CACHE_TTL: u64 = 300;

struct TestApp {
    router: Router,
    cache: Arc<MemoryCache>,
}

impl TestApp {
    fn new() -> Self {
        let cache = Arc::new(MemoryCache::new());
        let state = ServerState::new(
            Arc::new(MemoryStore::new()),
            cache.clone(),
            PositiveDuration::from_seconds(SESSION_TTL).unwrap(),
            PositiveDuration::from_seconds(POST_CACHE_TTL).unwrap(),
        );

        Self {
            router: app(state),
            cache,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::get(uri);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, form: &str) -> (StatusCode, Value) {
        let mut request =
            Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::from(form.to_owned())).unwrap())
            .await
    }

    async fn register(&self, username: &str) -> (StatusCode, Value) {
        self.post(
            "/register",
            None,
            &format!(
                "username={username}&password=pw1&confirm_password=pw1&email={username}@x.io"
            ),
        )
        .await
    }

    /// Registers `username` and returns a fresh session token.
    async fn session(&self, username: &str) -> String {
        let (status, _) = self.register(username).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self
            .post(
                "/login",
                None,
                &format!("username={username}&password=pw1"),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["session_id"].as_str().unwrap().to_owned()
    }

    async fn create_post(&self, token: &str, title: &str) -> u64 {
        let (status, body) = self
            .post(
                "/posts",
                Some(token),
                &format!("title={title}&content=world&community_id=1"),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "post created");
        body["post_id"].as_u64().unwrap()
    }
}

#[tokio::test]
async fn register_login_post_and_like() {
    let app = TestApp::new();

    let (status, body) = app.register("alice").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.to_string().contains("pw1"));

    let (status, body) = app
        .post("/login", None, "username=alice&password=pw1")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "login successful");
    let token = body["session_id"].as_str().unwrap().to_owned();
    assert_eq!(token.len(), 43);

    let post_id = app.create_post(&token, "hello").await;

    let (status, detail) = app.get(&format!("/posts/{post_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["title"], "hello");
    assert_eq!(detail["content"], "world");
    assert_eq!(detail["author_name"], "alice");

    let like = format!("/posts/{post_id}/like");
    let (status, body) = app.post(&like, Some(&token), "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "liked", "liked": true, "likes": 1}));

    let (status, body) = app.post(&like, Some(&token), "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "unliked", "liked": false, "likes": 0}));
}

#[tokio::test]
async fn registration_rejections() {
    let app = TestApp::new();
    app.register("alice").await;

    let (status, body) = app.register("alice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({"status": 409, "error": "username already exists"})
    );

    let (status, _) = app
        .post(
            "/register",
            None,
            "username=bob&password=pw1&confirm_password=pw2&email=bob@x.io",
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/register", None, "username=bob&password=pw1")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_rejections() {
    let app = TestApp::new();
    app.register("alice").await;

    let (status, wrong_password) = app
        .post("/login", None, "username=alice&password=nope")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_user) = app
        .post("/login", None, "username=mallory&password=pw1")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_user);

    let (status, _) = app.post("/login", None, "username=alice").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_need_a_live_session() {
    let app = TestApp::new();
    let token = app.session("alice").await;

    let (status, body) = app.get("/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let (status, body) = app.get("/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);

    let basic = Request::get("/profile")
        .header(AUTHORIZATION, "Basic YWxpY2U6cHcx")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(basic).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/profile", Some("not-a-session")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/posts", None, "title=a&content=b&community_id=1")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test(start_paused = true)]
async fn sessions_expire() {
    let app = TestApp::new();
    let token = app.session("alice").await;

    tokio::time::advance(Duration::from_secs(SESSION_TTL + 1)).await;

    let (status, body) = app.get("/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid or expired session");
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let app = TestApp::new();
    let token = app.session("alice").await;

    let (status, _) = app.get("/posts/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/posts/-1/comments", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/comments/abc/like", Some(&token), "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/posts", Some(&token), "title=a&content=b&community_id=general")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_things() {
    let app = TestApp::new();
    let token = app.session("alice").await;

    let (status, body) = app.get("/posts/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": 404, "error": "post not found"}));

    let (status, body) = app
        .post("/posts/999/comments", Some(&token), "content=hi")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "comment could not be created, the post may not exist"
    );

    let (status, body) = app.get("/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": 404, "error": "not found"}));

    let (status, _) = app.get("/users/bob", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_profile_is_username_and_email() {
    let app = TestApp::new();
    app.register("alice").await;

    let (status, body) = app.get("/users/alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"username": "alice", "email": "alice@x.io"}));
}

#[tokio::test]
async fn posts_are_paged_newest_first() {
    let app = TestApp::new();
    let token = app.session("alice").await;

    for n in 0..15 {
        app.create_post(&token, &format!("post{n}")).await;
    }

    let (status, first) = app.get("/posts", None).await;
    assert_eq!(status, StatusCode::OK);
    let first = first.as_array().unwrap();
    assert_eq!(first.len(), 10);
    assert_eq!(first[0]["title"], "post14");
    assert_eq!(first[0]["status"], "active");

    let (_, second) = app.get("/posts?page=2&size=10", None).await;
    let second = second.as_array().unwrap();
    assert_eq!(second.len(), 5);
    assert_eq!(second[4]["title"], "post0");

    let (status, fallback) = app.get("/posts?page=0&size=abc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fallback.as_array().unwrap(), first);

    let (status, far_out) = app.get("/posts?page=5000000000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(far_out.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn post_detail_is_served_from_cache() {
    let app = TestApp::new();
    let token = app.session("alice").await;
    let post_id = app.create_post(&token, "hello").await;

    let (_, from_store) = app.get(&format!("/posts/{post_id}"), None).await;

    let cached = app
        .cache
        .get(&PostDetail::cache_key(post_id.into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(serde_json::from_str::<Value>(&cached).unwrap(), from_store);

    let (_, from_cache) = app.get(&format!("/posts/{post_id}"), None).await;
    assert_eq!(from_cache, from_store);
}

#[tokio::test]
async fn comments_are_listed_oldest_first() {
    let app = TestApp::new();
    let alice = app.session("alice").await;
    let bob = app.session("bob").await;
    let post_id = app.create_post(&alice, "hello").await;
    let comments = format!("/posts/{post_id}/comments");

    let (status, first) = app.post(&comments, Some(&bob), "content=first").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["message"], "comment posted");
    app.post(&comments, Some(&alice), "content=second").await;

    let (status, body) = app.get(&comments, None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], first["comment_id"]);
    assert_eq!(listed[0]["author_name"], "bob");
    assert_eq!(listed[1]["content"], "second");

    let (status, _) = app.post(&comments, Some(&alice), "content=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comment_likes_are_per_user() {
    let app = TestApp::new();
    let alice = app.session("alice").await;
    let bob = app.session("bob").await;
    let post_id = app.create_post(&alice, "hello").await;
    let (_, comment) = app
        .post(&format!("/posts/{post_id}/comments"), Some(&bob), "content=hi")
        .await;
    let like = format!("/comments/{}/like", comment["comment_id"]);

    let (_, body) = app.post(&like, Some(&alice), "").await;
    assert_eq!(body, json!({"message": "liked", "liked": true, "likes": 1}));
    let (_, body) = app.post(&like, Some(&bob), "").await;
    assert_eq!(body, json!({"message": "liked", "liked": true, "likes": 2}));
    let (_, body) = app.post(&like, Some(&alice), "").await;
    assert_eq!(body, json!({"message": "unliked", "liked": false, "likes": 1}));
}
