use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warbler_server::{
    build_router,
    config::Settings,
    db::{seed::seed_demo_data, Database},
    session::SessionManager,
    state::AppState,
    templates::load_templates,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warbler_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings = Settings::new().expect("Failed to load settings");

    // Initialize database
    let db = Database::new(&settings.database.url).expect("Failed to create database");

    db.initialize()
        .expect("Failed to initialize database schema");

    if settings.database.seed_demo_data {
        let summary = seed_demo_data(&db).expect("Failed to seed demo data");
        tracing::info!("Demo data: {:?}", summary);
    }

    tracing::info!("Database initialized successfully");

    let templates = load_templates().expect("Failed to load templates");

    // Create application state
    let session_manager = SessionManager::with_ttl(db.clone(), settings.session_ttl());
    let state = AppState::with_session_manager(db, session_manager, templates);

    // Run initial session cleanup on startup
    match state.session_manager.cleanup_expired_sessions() {
        Ok(count) if count > 0 => {
            tracing::info!("Cleaned up {} expired sessions on startup", count);
        }
        Ok(_) => tracing::info!("No expired sessions to clean up"),
        Err(e) => tracing::error!("Failed to cleanup expired sessions on startup: {}", e),
    }

    // Start background task for periodic session cleanup
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        // Run every hour
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            tracing::debug!("Running periodic session cleanup...");
            match cleanup_state.session_manager.cleanup_expired_sessions() {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!("Periodic cleanup: removed {} expired sessions", count);
                    }
                }
                Err(e) => {
                    tracing::error!("Periodic session cleanup failed: {}", e);
                }
            }
        }
    });

    let app = build_router(state);

    // Start server
    let addr: SocketAddr = settings
        .address()
        .parse()
        .expect("Failed to parse server address");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
