use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubeshift::config::AppConfig;
use tubeshift::database::repositories::{
    CandidateRepository, ChannelRepository, DecisionRepository, RuleRepository,
    SqlxCandidateRepository, SqlxChannelRepository, SqlxDecisionRepository, SqlxRuleRepository,
    SqlxUploadRepository, UploadRepository,
};
use tubeshift::fetcher::{Fetcher, YtDlpFetcher, YtDlpOptions};
use tubeshift::publisher::{BiliupOptions, BiliupPublisher, Publisher};
use tubeshift::rules::RuleEngine;
use tubeshift::scanner::Scanner;
use tubeshift::scheduler::{ScanScheduler, ScanSchedulerConfig};
use tubeshift::{controller::Controller, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tubeshift=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = database::init_pool(&config.database_url).await?;
    let write_pool = database::init_write_pool(&config.database_url).await?;
    database::run_migrations(&pool).await?;

    let channels: Arc<dyn ChannelRepository> =
        Arc::new(SqlxChannelRepository::new(pool.clone(), write_pool.clone()));
    let candidates: Arc<dyn CandidateRepository> = Arc::new(SqlxCandidateRepository::new(
        pool.clone(),
        write_pool.clone(),
    ));
    let rules: Arc<dyn RuleRepository> =
        Arc::new(SqlxRuleRepository::new(pool.clone(), write_pool.clone()));
    let decisions: Arc<dyn DecisionRepository> = Arc::new(SqlxDecisionRepository::new(
        pool.clone(),
        write_pool.clone(),
    ));
    let uploads: Arc<dyn UploadRepository> =
        Arc::new(SqlxUploadRepository::new(pool.clone(), write_pool.clone()));

    let engine = Arc::new(RuleEngine::new(
        rules.clone(),
        decisions.clone(),
        candidates.clone(),
    ));
    engine.seed_default_rules().await?;

    let fetcher: Arc<dyn Fetcher> = Arc::new(YtDlpFetcher::new(YtDlpOptions {
        binary: config.ytdlp_binary.clone(),
        sleep_secs: config.ytdlp_sleep_secs,
        format: config.ytdlp_format.clone(),
    }));
    let publisher: Arc<dyn Publisher> = Arc::new(BiliupPublisher::new(BiliupOptions {
        binary: config.biliup_binary.clone(),
        cookie_path: config.biliup_cookie.clone(),
        line: config.biliup_line.clone(),
        limit: config.biliup_limit,
        title_prefix: config.biliup_title_prefix.clone(),
        tags: config.biliup_tags.clone(),
        ..Default::default()
    }));

    let mut scanner = Scanner::new(channels.clone(), candidates.clone(), fetcher.clone());
    if config.auto_filter {
        scanner = scanner.with_auto_filter(engine.clone());
    }
    let scanner = Arc::new(scanner);

    let controller = Arc::new(Controller::new(
        uploads.clone(),
        fetcher.clone(),
        publisher.clone(),
        &config.output_dir,
    )?);

    let mut scheduler = ScanScheduler::new(
        scanner,
        channels,
        ScanSchedulerConfig {
            tick_interval: config.scan_tick,
            scan_limit: config.scan_limit,
        },
    );
    if config.auto_sync {
        scheduler = scheduler.with_auto_sync(controller, candidates.clone(), config.sync_limit);
    }

    let token = CancellationToken::new();
    let handle = Arc::new(scheduler).start(token.clone());

    tracing::info!("tubeshift initialized, scanning on a {:?} tick", config.scan_tick);

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    token.cancel();
    handle.await?;

    Ok(())
}
