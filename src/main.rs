use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use meal_max_backend::api::{self, AppState};
use meal_max_backend::config::Config;
use meal_max_backend::db::Database;
use meal_max_backend::dice::Dice;
use meal_max_backend::metrics;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::load();

    let db = Database::new(&config.database_url)
        .await
        .expect("Failed to initialize database");
    let db = Arc::new(db);

    metrics::register_metrics().expect("Failed to register metrics");

    if config.seed.is_some() {
        tracing::info!("Using fixed RNG seed {:?}", config.seed);
    }
    let state = AppState::new(db, Dice::new(config.seed));

    let app = api::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("Meal Max backend listening on {addr}");
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
