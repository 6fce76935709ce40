//! QR Menu Backend
//!
//! REST backend for a multilingual restaurant menu: catalog management with
//! SQLite or JSON-file persistence, Tantivy dish search, table orders,
//! usage analytics and table QR codes.

mod analytics;
mod api;
mod auth;
mod config;
mod db;
mod errors;
mod menu;
mod models;
mod qr;
mod search;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::JwtKeys;
use config::Config;
use db::Repository;
use menu::SeedData;
use models::Role;
use qr::QrGenerator;
use search::{SearchContext, SearchIndex};
use store::Catalog;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
    /// Absent when `JWT_SECRET` is unset
    pub keys: Option<Arc<JwtKeys>>,
    /// Checked on logins for unknown emails
    pub decoy_hash: Option<Arc<str>>,
    pub qr: QrGenerator,
}

impl AppState {
    pub fn new(
        catalog: Arc<Catalog>,
        repo: Arc<Repository>,
        search: Arc<SearchIndex>,
        config: Config,
    ) -> Self {
        let keys = config
            .jwt_secret
            .as_deref()
            .map(|secret| Arc::new(JwtKeys::new(secret, config.jwt_ttl_hours)));
        let decoy_hash = keys
            .as_ref()
            .and_then(|_| auth::decoy_hash(config.bcrypt_cost))
            .map(Arc::from);
        let qr = QrGenerator::new(&config.public_url);

        Self {
            catalog,
            repo,
            search,
            config: Arc::new(config),
            keys,
            decoy_hash,
            qr,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting QR Menu Backend");
    tracing::info!("Catalog storage: {}", config.storage.as_str());
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.jwt_secret.is_none() {
        tracing::warn!("No JWT_SECRET configured. Authentication is disabled!");
    }

    // Initialize database and catalog
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool.clone()));
    let catalog = Arc::new(Catalog::open(&config, &pool).await?);
    tracing::info!("Catalog backend: {}", catalog.backend_name());

    if config.seed && catalog.seed_if_empty(SeedData::bundled()?).await? {
        tracing::info!("Seeded empty catalog with the bundled menu");
    }

    ensure_admin(&repo, &config).await?;

    // Initialize search index
    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    tracing::info!("Building search index...");
    let dishes = catalog.list_dishes().await?;
    let categories = catalog.list_categories().await?;
    let ingredients = catalog.list_ingredients().await?;
    search
        .rebuild(
            &dishes,
            &SearchContext {
                categories: &categories,
                ingredients: &ingredients,
            },
        )
        .await?;

    // Background analytics retention
    let shutdown = CancellationToken::new();
    let retention = analytics::spawn_retention_task(
        repo.clone(),
        config.analytics.clone(),
        shutdown.child_token(),
    );

    let bind_addr = config.bind_addr;
    let state = AppState::new(catalog, repo, search, config);
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    retention.await.ok();
    tracing::info!("Server stopped");

    Ok(())
}

/// Resolve on Ctrl-C, then cancel background tasks.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}

/// Create the configured administrator when it does not exist yet.
async fn ensure_admin(repo: &Repository, config: &Config) -> Result<(), errors::AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        if config.jwt_secret.is_some() && repo.count_users().await? == 0 {
            tracing::warn!(
                "No back-office users exist. Set MENU_ADMIN_EMAIL and MENU_ADMIN_PASSWORD to create one"
            );
        }
        return Ok(());
    };

    if repo.find_user_by_email(email).await?.is_some() {
        return Ok(());
    }

    let hash = auth::hash_password(password.clone(), config.bcrypt_cost).await?;
    let admin = repo.create_user(email, &hash, "Administrator", Role::Admin).await?;
    tracing::info!("Created administrator {}", admin.email);
    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Each role group gets its own copy of the signing keys
    let staff_keys = state.keys.clone();
    let manager_keys = state.keys.clone();
    let admin_keys = state.keys.clone();

    // Public: customer menu, tracking, ordering and login
    let public_routes = Router::new()
        .route("/datastore", get(api::get_datastore))
        .route("/datastore/revision", get(api::get_revision))
        .route("/menu", get(api::get_menu))
        .route("/menu/screen", get(api::get_menu_screen))
        .route("/dishes", get(api::list_dishes))
        .route("/dishes/{id}", get(api::get_dish))
        .route("/categories", get(api::list_categories))
        .route("/categories/{id}", get(api::get_category))
        .route("/ingredients", get(api::list_ingredients))
        .route("/ingredients/{id}", get(api::get_ingredient))
        .route("/search", get(api::search_dishes))
        .route("/orders", post(api::create_order))
        .route("/analytics/track", post(api::track_event))
        .route("/auth/login", post(api::login));

    // Staff: order handling
    let staff_routes = Router::new()
        .route("/orders", get(api::list_orders))
        .route("/orders/{id}", get(api::get_order))
        .route("/orders/{id}/status", put(api::update_order_status))
        .route("/auth/me", get(api::me))
        .layer(middleware::from_fn(move |req, next| {
            auth::require_role(staff_keys.clone(), Role::Staff, req, next)
        }));

    // Manager: catalog writes, analytics and QR codes
    let manager_routes = Router::new()
        .route("/dishes", post(api::create_dish))
        .route("/dishes/{id}", put(api::update_dish))
        .route("/dishes/{id}", delete(api::delete_dish))
        .route("/dishes/{id}/toggle-active", patch(api::toggle_dish_active))
        .route("/categories", post(api::create_category))
        .route("/categories/{id}", put(api::update_category))
        .route("/categories/{id}", delete(api::delete_category))
        .route("/categories/{id}/toggle-active", patch(api::toggle_category_active))
        .route("/ingredients", post(api::create_ingredient))
        .route("/ingredients/{id}", put(api::update_ingredient))
        .route("/ingredients/{id}", delete(api::delete_ingredient))
        .route("/ingredients/{id}/toggle-active", patch(api::toggle_ingredient_active))
        .route("/analytics", get(api::get_insights))
        .route("/analytics/overview", get(api::get_overview))
        .route("/analytics/top-dishes", get(api::get_top_dishes))
        .route("/analytics/daily-stats", get(api::get_daily_stats))
        .route("/analytics/hourly-stats", get(api::get_hourly_stats))
        .route("/qr/generate", post(api::generate_qr))
        .route("/qr/generate-batch", post(api::generate_qr_batch))
        .layer(middleware::from_fn(move |req, next| {
            auth::require_role(manager_keys.clone(), Role::Manager, req, next)
        }));

    // Admin: user management
    let admin_routes = Router::new()
        .route("/auth/register", post(api::register))
        .layer(middleware::from_fn(move |req, next| {
            auth::require_role(admin_keys.clone(), Role::Admin, req, next)
        }));

    let api_routes = public_routes
        .merge(staff_routes)
        .merge(manager_routes)
        .merge(admin_routes);

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
