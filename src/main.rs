use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use log::{info, warn};

use videoservice::{
    config, CacheSweeper, FixtureSource, HttpVideoSource, MemoryRecordStore, RedisCache,
    Reconciler, TokioExecutor, VideoService, VideoSource,
};

fn setup_logging() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    info!("Logging initialized.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging().context("Failed to initialize logging")?;

    let app_config = config::load_config()?;
    let service_config = app_config.service_config();

    let cache = Arc::new(
        RedisCache::new(&app_config.redis_url, &app_config.cache_key_prefix)
            .await
            .context("Failed to connect to Redis")?,
    );

    // Demo/reference store; swap for a relational RecordStore in production.
    let store = Arc::new(MemoryRecordStore::new());

    let source: Arc<dyn VideoSource> = if let Some(path) = &app_config.source_fixture_path {
        info!("Using fixture source at {path}");
        Arc::new(FixtureSource::new(path))
    } else if let Some(url) = &app_config.source_api_url {
        info!("Using HTTP source at {url}");
        Arc::new(HttpVideoSource::new(url)?)
    } else {
        warn!("No external source configured; falling back to an empty fixture");
        Arc::new(FixtureSource::new("videos.json"))
    };

    let reconciler = Reconciler::new(store.clone(), Arc::new(TokioExecutor));
    let service = VideoService::new(
        cache.clone(),
        store.clone(),
        source,
        reconciler,
        service_config,
    );

    let sweeper = Arc::new(CacheSweeper::new(cache, store, service_config));
    let sweep_handle = sweeper
        .clone()
        .spawn(Duration::from_secs(app_config.sweep_interval_secs));
    info!(
        "Cache sweeper running every {}s for the top {} channels",
        app_config.sweep_interval_secs, app_config.sweep_channel_limit
    );

    // One-shot query mode: `videoservice <channel_id>` prints the result
    // and exits; otherwise stay up serving the sweeper until ctrl-c.
    if let Some(channel_id) = std::env::args().nth(1) {
        match service.get_recent_videos(&channel_id).await {
            Ok(videos) => println!("{}", serde_json::to_string_pretty(&videos)?),
            Err(e) => {
                println!("{}", serde_json::to_string_pretty(&e.to_body())?);
                sweeper.stop();
                sweep_handle.abort();
                std::process::exit(1);
            }
        }
        // Give fire-and-forget reconciliation a moment before exiting.
        tokio::time::sleep(Duration::from_millis(100)).await;
        sweeper.stop();
        sweep_handle.abort();
        return Ok(());
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received, stopping sweeper");
    sweeper.stop();
    sweep_handle.abort();
    Ok(())
}
