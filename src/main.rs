use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::http::Method;
use livefeed::{
    router,
    utils::{
        config::Config,
        real_time_event_management::EventTracker,
        store::{PostStore, Seed},
    },
    AppState,
};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("Invalid configuration");

    let seed = match &config.seed {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("Cannot read seed file {}: {e}", path.display()));
            serde_json::from_str::<Seed>(&text)
                .unwrap_or_else(|e| panic!("Invalid seed file {}: {e}", path.display()))
        }
        None => {
            warn!("No seed file configured, starting with demo posts");
            Seed::demo()
        }
    };
    info!(
        "Loaded {} user(s) and {} post(s)",
        seed.users.len(),
        seed.posts.len()
    );

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .allow_origin(
            config
                .front_url
                .parse::<HeaderValue>()
                .expect("LIVEFEED_FRONT_URL must be a valid header value"),
        );

    let app_state = AppState {
        store: PostStore::from_seed(seed),
    };
    let app = router(app_state, EventTracker::default()).layer(cors);

    info!("Listening on {}", config.addr);
    axum::Server::bind(&config.addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for shutdown signal : {e}");
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await
        .expect("Server error");
}
