use realty_assist_ai::{GeminiBackend, HttpImageFetcher};
use realty_assist_conversation::InMemorySessionStore;
use realty_assist_routing::ChatService;
use realty_assist_server::{AppState, ServerConfig, router};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(
        model = %config.gemini.model,
        strategy = %config.routing.strategy,
        "Loaded configuration"
    );

    let backend = Arc::new(
        GeminiBackend::new(config.gemini.clone()).expect("failed to create model backend"),
    );
    let fetcher = Arc::new(
        HttpImageFetcher::new(Duration::from_secs(config.image_fetch_timeout_secs))
            .expect("failed to create image fetcher"),
    );
    let chat = ChatService::new(
        config.routing.build_router(backend, fetcher),
        Arc::new(InMemorySessionStore::new()),
    );

    let app = router(AppState::new(chat), config.max_body_bytes);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
