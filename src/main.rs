//! NewsDrop binary entrypoint.
//! Boots the scheduler (news poll + feed alert jobs) and the Axum HTTP
//! serving layer on one tokio runtime.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use newsdrop::api::{create_router, AppState};
use newsdrop::config::AppConfig;
use newsdrop::ingest::job::{FeedAlertJob, NewsPollJob};
use newsdrop::ingest::providers::feed_rss::FeedRssProvider;
use newsdrop::ingest::providers::news_api::NewsApiProvider;
use newsdrop::metrics::Metrics;
use newsdrop::notify::email::EmailNotifier;
use newsdrop::notify::Notifier;
use newsdrop::scheduler::Scheduler;
use newsdrop::store::memory::MemoryStore;
use newsdrop::store::{ArticleStore, SubscriberStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsdrop=info,warn")),
        )
        .init();

    // Fatal on any missing required setting: the process must not come up
    // half-configured.
    let config = AppConfig::from_env().context("loading configuration")?;

    let metrics = Metrics::init()?;

    let store = Arc::new(MemoryStore::new());
    let articles: Arc<dyn ArticleStore> = store.clone();
    let subscribers: Arc<dyn SubscriberStore> = store.clone();
    let notifier: Arc<dyn Notifier> =
        Arc::new(EmailNotifier::new(&config.smtp).context("building smtp transport")?);

    let news_job = Arc::new(NewsPollJob::new(
        vec![Box::new(NewsApiProvider::new(
            config.news_api_url.clone(),
            config.news_api_key.clone(),
        ))],
        config.keywords.clone(),
        Arc::clone(&articles),
        Arc::clone(&subscribers),
        Arc::clone(&notifier),
    ));
    let feed_job = Arc::new(FeedAlertJob::new(
        Box::new(FeedRssProvider::from_url(config.feed_url.clone())),
        Arc::clone(&notifier),
        config.alert_recipient.clone(),
    ));

    let scheduler = Scheduler::new();
    scheduler.register(news_job, config.news_poll);
    scheduler.register(feed_job, config.feed_poll);
    scheduler.start();

    let state = AppState {
        articles,
        subscribers,
        default_keywords: config.keywords.clone(),
    };
    let app = create_router(state).merge(metrics.router());

    tracing::info!(addr = %config.bind_addr, "NewsDrop listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    scheduler.stop();
    Ok(())
}
