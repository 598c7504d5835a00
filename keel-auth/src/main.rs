use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use keel_shared::token::TokenService;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub tokens: TokenService,
    pub http: reqwest::Client,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    keel_shared::middleware::init_tracing("keel-auth");

    let config = AppConfig::load()?;
    let port = config.port;

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    // Signing secrets are read once here and immutable for the process life.
    let tokens = TokenService::new(
        &config.access_secret,
        &config.refresh_secret,
        config.access_ttl,
        config.refresh_ttl,
    );

    let state = AppState {
        db,
        config,
        tokens,
        http: reqwest::Client::new(),
    };

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/signup", post(routes::register::signup))
        .route("/auth/login", post(routes::login::login))
        .route("/auth/logout", post(routes::logout::logout))
        .route("/auth/refresh", post(routes::refresh::refresh_token))
        .route("/auth/me", get(routes::me::me))
        .route("/auth/:provider", get(routes::oauth::oauth_redirect))
        .route("/auth/:provider/callback", get(routes::oauth::oauth_callback))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "keel-auth starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
