use myflix::services::token::TokenKeys;
use myflix::{db, routes, state};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()
        .expect("invalid PORT");

    let keys = TokenKeys::from_env().expect("JWT_SECRET required");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    let state = state::AppState::new(pool, keys);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "myflix listening");
    axum::serve(listener, app).await.expect("server failed");
}
