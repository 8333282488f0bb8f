//! Common test utilities for HTTP integration tests
//!
//! Every test gets its own router over a fresh [`MemoryStore`] with three
//! users: the project manager, a team member and an outsider.

#![allow(dead_code)]

pub mod failing_store;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::Service as _;
use uptask_api::{
    app::{build_router, AppState},
    config::Config,
};
use uptask_shared::{
    auth::jwt::{create_token, Claims},
    models::user::{CreateUser, User},
    store::{MemoryStore, Store},
};
use uuid::Uuid;

use failing_store::FailingCascadeStore;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing the router and seeded users
pub struct TestContext {
    pub store: MemoryStore,
    pub app: Router,
    pub manager: User,
    pub member: User,
    pub outsider: User,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        Self::build(|store| Arc::new(store) as Arc<dyn Store>).await
    }

    /// Same seed data, but every cascade transaction fails at the project
    /// delete step; `self.store` still sees the shared state
    pub async fn with_failing_cascade() -> anyhow::Result<Self> {
        Self::build(|store| Arc::new(FailingCascadeStore::new(store)) as Arc<dyn Store>).await
    }

    async fn build(wrap: impl FnOnce(MemoryStore) -> Arc<dyn Store>) -> anyhow::Result<Self> {
        let config = Config::from_lookup(|key| match key {
            "STORE_BACKEND" => Some("memory".to_string()),
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            _ => None,
        })?;

        let store = MemoryStore::new();
        let manager = create_user(&store, "manager@example.com", "Manager").await?;
        let member = create_user(&store, "member@example.com", "Member").await?;
        let outsider = create_user(&store, "outsider@example.com", "Outsider").await?;

        let app = build_router(AppState::new(wrap(store.clone()), config));

        Ok(Self {
            store,
            app,
            manager,
            member,
            outsider,
        })
    }

    /// Sends a request as `user` (or anonymously) and returns status and JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&User>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(user.id)));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Creates a project managed by `self.manager` and returns its id
    pub async fn create_project(&self, name: &str) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/projects",
                Some(&self.manager),
                Some(serde_json::json!({
                    "projectName": name,
                    "clientName": "Acme",
                    "description": "Sitio web corporativo",
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }

    /// Creates a task in `project_id` as the manager and returns its id
    pub async fn create_task(&self, project_id: Uuid, name: &str) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                &format!("/api/projects/{project_id}/tasks"),
                Some(&self.manager),
                Some(serde_json::json!({ "name": name, "description": "Detalle" })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }

    /// Adds `self.member` to the project's team
    pub async fn add_member(&self, project_id: Uuid) {
        let (status, body) = self
            .send(
                Method::POST,
                &format!("/api/projects/{project_id}/team"),
                Some(&self.manager),
                Some(serde_json::json!({ "id": self.member.id })),
            )
            .await;

        assert_eq!(status, StatusCode::OK, "{body}");
    }

    /// Creates a note on a task as `author` and returns its id
    pub async fn create_note(&self, project_id: Uuid, task_id: Uuid, author: &User) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                &format!("/api/projects/{project_id}/tasks/{task_id}/notes"),
                Some(author),
                Some(serde_json::json!({ "content": "Revisar con el cliente" })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }
}

pub fn token_for(user_id: Uuid) -> String {
    create_token(&Claims::new(user_id), JWT_SECRET).unwrap()
}

pub fn id_of(body: &Value) -> Uuid {
    body["id"].as_str().unwrap().parse().unwrap()
}

async fn create_user(store: &MemoryStore, email: &str, name: &str) -> anyhow::Result<User> {
    Ok(store
        .create_user(CreateUser {
            email: email.to_string(),
            name: name.to_string(),
            password_hash: "not-used".to_string(),
        })
        .await?)
}
