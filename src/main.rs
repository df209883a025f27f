use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edu_auth_api::auth::{AttemptLedger, IdentityDirectory, InMemoryDirectory, LoginFlow, RateLimiter, TokenService};
use edu_auth_api::config;
use edu_auth_api::handlers::{self, AppState};
use edu_auth_api::middleware::{authenticate, authorize, AuthGate, PolicyTable, RouteAccess};
use edu_auth_api::models::UserRole;
use edu_auth_api::store::{CounterStore, MemoryCounterStore, RedisCounterStore};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edu_auth_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = match config::load_config_with_fallback() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn CounterStore> = match &config.store.redis_url {
        Some(url) => match RedisCounterStore::connect(url).await {
            Ok(store) => {
                tracing::info!("Connected to Redis counter store");
                Arc::new(store)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to connect to Redis ({}); falling back to in-memory counters",
                    e
                );
                Arc::new(MemoryCounterStore::new())
            }
        },
        None => {
            tracing::info!("No Redis configured; using in-memory counters");
            Arc::new(MemoryCounterStore::new())
        }
    };

    let tokens = Arc::new(TokenService::new(
        &config.jwt.secret,
        config.jwt.expiration_secs,
    ));
    let directory: Arc<dyn IdentityDirectory> = Arc::new(InMemoryDirectory::with_users(
        config.directory.users.clone(),
    ));
    if config.directory.users.is_empty() {
        tracing::warn!("Identity directory is empty; no account can log in");
    }

    let ledger = AttemptLedger::new(
        store.clone(),
        config.lockout.max_attempts,
        Duration::from_secs(config.lockout.window_secs),
    );
    let rate_limiter = RateLimiter::new(
        store.clone(),
        config.rate_limit.max_requests,
        Duration::from_secs(config.rate_limit.window_secs),
    );
    let login_flow = LoginFlow::new(
        directory.clone(),
        ledger,
        tokens.clone(),
        config.store.on_unavailable,
    );

    let state = AppState {
        login: Arc::new(login_flow),
        rate_limiter: Arc::new(rate_limiter),
        on_store_error: config.store.on_unavailable,
    };

    let gate = AuthGate {
        tokens,
        directory,
        header_name: config.jwt.header.clone(),
        scheme_prefix: config.jwt.prefix.clone(),
        lookup_timeout: Duration::from_secs(2),
    };

    let policies = Arc::new(
        PolicyTable::new()
            .route("/", RouteAccess::Public)
            .route("/health", RouteAccess::Public)
            .route("/api/v1/auth/login", RouteAccess::Public)
            .route(
                "/api/v1/users/hello",
                RouteAccess::RequiresAnyRole(vec![
                    UserRole::Admin,
                    UserRole::Teacher,
                    UserRole::Student,
                ]),
            )
            .route(
                "/api/v1/users/:id/profile",
                RouteAccess::RequiresSelfOrRole(UserRole::Admin),
            )
            .route("/api/v1/admin/test", RouteAccess::RequiresRole(UserRole::Admin)),
    );

    // Stage order is fixed here: authentication attaches the principal,
    // authorization consumes it, handlers run last.
    let app = Router::new()
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/users/hello", get(handlers::user::hello))
        .route("/api/v1/users/:id/profile", get(handlers::user::profile))
        .route("/api/v1/admin/test", get(handlers::user::admin_test))
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(policies, authorize))
        .layer(axum::middleware::from_fn_with_state(gate, authenticate))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting edu-auth-api server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
