use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use auth_cell::AuthService;
use notification_cell::{dispatcher_from_config, spawn_notification_worker, NotificationQueue, NotificationSink};
use shared_config::AppConfig;
use shared_database::{DocumentStore, InMemoryDocumentStore, SupabaseDocumentStore};
use shared_utils::session::SessionManager;

use crate::router::AppServices;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting law office appointment API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    let missing = config.missing_required();
    if !missing.is_empty() {
        anyhow::bail!("missing required settings: {}", missing.join(", "));
    }

    let store: Arc<dyn DocumentStore> = if config.is_store_remote() {
        info!("Using PostgREST document store at {}", config.supabase_url);
        Arc::new(SupabaseDocumentStore::new(&config))
    } else {
        warn!("SUPABASE_URL not set, records are kept in memory only");
        Arc::new(InMemoryDocumentStore::new())
    };

    let sessions = Arc::new(SessionManager::new(
        store.clone(),
        config.session_secret.clone(),
        config.session_ttl_hours,
    ));

    // Notifications leave the request path through the queue
    let (queue, receiver) = NotificationQueue::new();
    let _worker = spawn_notification_worker(dispatcher_from_config(&config), receiver);
    let notifier: Arc<dyn NotificationSink> = Arc::new(queue);

    if config.is_admin_seed_configured() {
        let admin = AuthService::new(&config, store.clone(), sessions.clone(), notifier.clone())
            .ensure_admin(&config.admin_name, &config.admin_email, &config.admin_password)
            .await
            .context("failed to provision the administrator account")?;
        info!("Administrator account ready: {}", admin.email);
    } else {
        warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set, no administrator is provisioned");
    }

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let services = AppServices {
        config: config.clone(),
        store,
        sessions,
        notifier,
    };

    // Build the application router
    let app = router::create_router(services)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .await
        .context("server error")?;

    Ok(())
}
