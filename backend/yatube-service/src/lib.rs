/// Yatube service library
///
/// A small blog API: posts, read-only groups and comments nested under posts,
/// behind token authentication with ownership-based write permissions.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and response records
/// - `routes`: the route table
/// - `services`: per-resource pipelines (authorize, scope, validate, store)
/// - `middleware`: bearer credentials, request metrics, authorization policy
/// - `models`: domain structures for actors, groups, posts, comments
/// - `db`: store traits with in-memory and PostgreSQL implementations
/// - `security`: password hashing and API tokens
/// - `fixtures`: out-of-band seeding of users and groups
/// - `error`: error types and handling
/// - `config`: configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod fixtures;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};

use db::{ContentStore, CredentialStore, MemoryStore};
use services::{AuthService, CommentService, GroupService, PostService};
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<dyn ContentStore>,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    pub fn new(content: Arc<dyn ContentStore>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            content,
            credentials,
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store)
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.credentials.clone())
    }

    pub fn posts(&self) -> PostService {
        PostService::new(self.content.clone())
    }

    pub fn comments(&self) -> CommentService {
        CommentService::new(self.content.clone())
    }

    pub fn groups(&self) -> GroupService {
        GroupService::new(self.content.clone())
    }
}
