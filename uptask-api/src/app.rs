/// Application state and router builder
///
/// The store is built by the caller (see `main.rs`) and injected here, so
/// the same router runs over PostgreSQL in production and over
/// [`uptask_shared::store::MemoryStore`] in tests.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use uptask_api::{app::{build_router, AppState}, config::Config};
/// use uptask_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:4000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uptask_shared::{auth::middleware::authenticate, store::Store};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Data-access layer
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token verification
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health
/// └── /api/projects                                   (bearer token)
///     ├── POST   /                                    create project
///     ├── GET    /                                    list my projects
///     ├── GET    /:projectId                          project + tasks
///     ├── PUT    /:projectId                          update (manager)
///     ├── DELETE /:projectId                          cascade delete (manager)
///     ├── POST   /:projectId/tasks                    create task (manager)
///     ├── GET    /:projectId/tasks                    list tasks
///     ├── GET    /:projectId/tasks/:taskId            task + history + notes
///     ├── PUT    /:projectId/tasks/:taskId            update task (manager)
///     ├── DELETE /:projectId/tasks/:taskId            delete task + notes (manager)
///     ├── POST   /:projectId/tasks/:taskId/status     change status
///     ├── POST   /:projectId/team/find                find user by email (manager)
///     ├── GET    /:projectId/team                     list team
///     ├── POST   /:projectId/team                     add member (manager)
///     ├── DELETE /:projectId/team/:userId             remove member (manager)
///     ├── POST   /:projectId/tasks/:taskId/notes      create note
///     ├── GET    /:projectId/tasks/:taskId/notes      list notes
///     └── DELETE /:projectId/tasks/:taskId/notes/:noteId  delete note (author)
/// ```
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, request tracing, then JWT
/// authentication on the `/api` subtree. Per-resource checks run as
/// extractors inside each handler.
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{health, notes, projects, tasks, team};

    let health_routes = Router::new().route("/health", get(health::health_check));

    let project_routes = Router::new()
        .route("/", post(projects::create_project).get(projects::list_projects))
        .route(
            "/:projectId",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/:projectId/tasks",
            post(tasks::create_task).get(tasks::list_tasks),
        )
        .route(
            "/:projectId/tasks/:taskId",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/:projectId/tasks/:taskId/status", post(tasks::update_status))
        .route("/:projectId/team/find", post(team::find_member_by_email))
        .route("/:projectId/team", get(team::list_team).post(team::add_member))
        .route("/:projectId/team/:userId", delete(team::remove_member))
        .route(
            "/:projectId/tasks/:taskId/notes",
            post(notes::create_note).get(notes::list_notes),
        )
        .route(
            "/:projectId/tasks/:taskId/notes/:noteId",
            delete(notes::delete_note),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.cors_allows_any() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api/projects", project_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Resolves the bearer token to its user and stores an
/// [`uptask_shared::auth::middleware::AuthUser`] in the request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let user = authenticate(state.store.as_ref(), state.jwt_secret(), header).await?;
    tracing::debug!(user_id = %user.id, "Authenticated request");

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
