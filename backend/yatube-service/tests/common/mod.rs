#![allow(dead_code)]

use actix_web::http::{header, Method, StatusCode};
use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use yatube_service::db::{ContentStore, CredentialStore, MemoryStore};
use yatube_service::middleware::MetricsMiddleware;
use yatube_service::models::{Actor, Group, NewGroup};
use yatube_service::security::{generate_token, token_digest};
use yatube_service::{routes, AppState};

pub struct TestUser {
    pub actor: Actor,
    pub token: String,
}

impl TestUser {
    pub fn username(&self) -> &str {
        &self.actor.username
    }
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub author: TestUser,
    pub other: TestUser,
    pub group: Group,
}

async fn seed_user(store: &MemoryStore, username: &str) -> TestUser {
    let actor = store
        .create_user(username, "not-a-real-hash")
        .await
        .expect("create user");
    let token = generate_token();
    store
        .store_token(actor.id, &token_digest(&token))
        .await
        .expect("store token");
    TestUser { actor, token }
}

pub async fn setup() -> TestContext {
    let store = Arc::new(MemoryStore::new());
    let author = seed_user(&store, "regular_user").await;
    let other = seed_user(&store, "other_user").await;
    let group = store
        .create_group(NewGroup {
            title: "Test group".to_string(),
            slug: "test-group".to_string(),
            description: "Group for tests".to_string(),
        })
        .await
        .expect("create group");

    TestContext {
        state: AppState::new(store.clone(), store.clone()),
        store,
        author,
        other,
        group,
    }
}

/// Build a request, optionally carrying a bearer token.
pub fn request(method: Method, uri: &str, token: Option<&str>) -> test::TestRequest {
    let req = test::TestRequest::default().method(method).uri(uri);
    match token {
        Some(token) => req.insert_header((header::AUTHORIZATION, format!("Bearer {}", token))),
        None => req,
    }
}

impl TestContext {
    /// Run one request through the full app and decode the body as JSON
    /// (`Value::Null` for an empty body).
    pub async fn send(&self, req: test::TestRequest) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(self.state.clone()))
                .wrap(MetricsMiddleware)
                .wrap(NormalizePath::new(TrailingSlash::Trim))
                .configure(routes::configure),
        )
        .await;

        let resp = test::call_service(&app, req.to_request()).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
        };
        (status, value)
    }

    pub async fn create_post(&self, user: &TestUser, text: &str) -> i64 {
        let (status, body) = self
            .send(
                request(Method::POST, "/api/v1/posts/", Some(&user.token))
                    .set_json(json!({ "text": text })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("post id")
    }

    pub async fn create_comment(&self, user: &TestUser, post_id: i64, text: &str) -> i64 {
        let (status, body) = self
            .send(
                request(
                    Method::POST,
                    &format!("/api/v1/posts/{}/comments/", post_id),
                    Some(&user.token),
                )
                .set_json(json!({ "text": text })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().expect("comment id")
    }
}
