use std::sync::Arc;

use stockledger::api::router::create_router;
use stockledger::cache::{MemoryCache, PriceCache, RedisCache};
use stockledger::config::AppConfig;
use stockledger::db;
use stockledger::metrics::init_metrics;
use stockledger::provider::AlphaVantageClient;
use stockledger::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database connected");

    let cache: Arc<dyn PriceCache> = match config.redis_url.as_deref() {
        Some(url) => {
            let redis = RedisCache::connect(url).await?;
            tracing::info!("Price cache backed by Redis");
            Arc::new(redis)
        }
        None => {
            tracing::warn!("REDIS_URL not set: using in-process price cache");
            Arc::new(MemoryCache::new())
        }
    };

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()?;
    let provider = Arc::new(AlphaVantageClient::new(
        http,
        config.alpha_vantage_base_url.clone(),
        config.alpha_vantage_api_key.clone(),
    ));

    if config.api_token.is_none() {
        tracing::warn!("API_TOKEN not set: authentication disabled");
    }

    let state = AppState::build(pool, config, cache, provider, init_metrics())?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

/// `RUST_LOG` picks the filter; `LOG_FORMAT=json` switches to structured output.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
