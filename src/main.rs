use profile_gateway::{
    AppState, ClaimsPermissionEvaluator, HttpProfileHandler, InMemoryProfileHandler,
    JwtAuthContextBuilder,
    config::{AppConfig, Env},
    create_router,
    service::{ProfileHandlerState, load_catalog},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "profile_gateway=debug,tower_http=info".into());

    // Pretty output locally, JSON for log aggregation in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    let handler: ProfileHandlerState = match &config.handler_url {
        Some(url) => {
            tracing::info!(url = %url, "Forwarding profile operations to remote handler");
            Arc::new(HttpProfileHandler::new(url).expect("FATAL: invalid PROFILE_HANDLER_URL"))
        }
        None => {
            let catalog = match &config.catalog_path {
                Some(path) => load_catalog(path).expect("FATAL: cannot load PROFILE_CATALOG_PATH"),
                None => Vec::new(),
            };
            tracing::info!(catalog = catalog.len(), "Using in-memory profile handler");
            Arc::new(InMemoryProfileHandler::with_catalog(catalog))
        }
    };

    if config.scope_search_deletes {
        tracing::info!("Search deletions are scoped to the caller's identity");
    }

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        handler,
        auth: Arc::new(JwtAuthContextBuilder::new(&config.jwt_secret)),
        permissions: Arc::new(ClaimsPermissionEvaluator),
        config,
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: cannot bind BIND_ADDR");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await.expect("server error");
}
