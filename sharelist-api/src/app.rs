/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use sharelist_api::{app::AppState, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::from_config(config).await?;
/// let app = sharelist_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, StorageBackend},
    middleware::{identity::identity_layer, security::SecurityHeadersLayer},
};
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use sharelist_shared::auth::access::ReadPolicy;
use sharelist_shared::auth::identity::IDENTITY_HEADER;
use sharelist_shared::store::{
    file::FileStore, memory::MemoryStore, ListRepository, UserRepository,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Todo list documents
    pub lists: Arc<dyn ListRepository>,

    /// User registry
    pub users: Arc<dyn UserRepository>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(
        lists: Arc<dyn ListRepository>,
        users: Arc<dyn UserRepository>,
        config: Config,
    ) -> Self {
        Self {
            lists,
            users,
            config: Arc::new(config),
        }
    }

    /// Opens the storage backend named in the configuration
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        match config.storage.backend {
            StorageBackend::File => {
                let store = Arc::new(FileStore::open(&config.storage.data_dir).await?);
                Ok(Self::new(store.clone(), store, config))
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage, data is lost on restart");
                Ok(Self::in_memory(config))
            }
        }
    }

    /// State backed by a fresh [`MemoryStore`]
    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store, config)
    }

    pub fn read_policy(&self) -> ReadPolicy {
        self.config.access.read_policy
    }

    pub fn max_write_attempts(&self) -> u32 {
        self.config.storage.max_write_attempts
    }

    /// Name of the configured backend, reported by the health check
    pub fn storage_name(&self) -> &'static str {
        match self.config.storage.backend {
            StorageBackend::File => "file",
            StorageBackend::Memory => "memory",
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/                            # Identity layer applies
///     ├── /auth/
///     │   ├── POST /register
///     │   └── POST /login
///     └── /todos/
///         ├── GET    /                 # Lists created by / shared with caller
///         ├── POST   /                 # Create list
///         ├── GET    /:id              # Read list
///         ├── PUT    /:id              # Rename (creator)
///         ├── DELETE /:id              # Delete (creator)
///         ├── POST   /:id/users        # Join
///         ├── GET    /:id/users        # Member roster
///         ├── POST   /:id/tasks        # Add tasks
///         ├── PUT    /:id/tasks/:taskId
///         └── DELETE /:id/tasks/:taskId
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Identity resolution (`/api` only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let todo_routes = Router::new()
        .route(
            "/",
            get(routes::todos::list_overview).post(routes::todos::create_list),
        )
        .route(
            "/:id",
            get(routes::todos::get_list)
                .put(routes::todos::rename_list)
                .delete(routes::todos::delete_list),
        )
        .route(
            "/:id/users",
            post(routes::members::join_list).get(routes::members::list_members),
        )
        .route("/:id/tasks", post(routes::tasks::add_tasks))
        .route(
            "/:id/tasks/:task_id",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        );

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/todos", todo_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            identity_layer,
        ));

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Permissive CORS when the origin list contains `*`, otherwise an
/// allow-list that still admits the identity header
fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
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
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(IDENTITY_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}
