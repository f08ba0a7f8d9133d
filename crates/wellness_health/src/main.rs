use std::sync::Arc;

use anyhow::{Context, bail};
use wellness_api_client::config::Config;
use wellness_api_client::http_client::ReqwestWellnessClient;
use wellness_health::config::PipelineConfig;
use wellness_health::platform::file_store::FileHealthStore;
use wellness_health::{
    FileThrottleStore, LoggingBackend, MetricKind, Period, Pipeline, SystemClock, TokioExecutor,
};

const USAGE: &str = "usage: wellness-health <metric> <period> [--summary]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configure logging from env var `WELLNESS_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("WELLNESS_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&log_env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::debug!("wellness-health: log filter: {}", log_env);

    let mut args = std::env::args().skip(1);
    let (Some(metric), Some(period)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    let want_summary = match args.next().as_deref() {
        None => false,
        Some("--summary") => true,
        Some(other) => bail!("unexpected argument {other}\n{USAGE}"),
    };
    let kind: MetricKind = metric.parse()?;
    let period: Period = period.parse()?;

    let api = Config::from_env().context("backend configuration")?;
    let cfg = PipelineConfig::from_env().context("pipeline configuration")?;

    let backend = LoggingBackend::new(ReqwestWellnessClient::with_token(&api.base_url, api.api_token));
    let executor = Arc::new(TokioExecutor::new());
    let pipeline = Pipeline::with_upload_interval(
        cfg.platform,
        Arc::new(FileHealthStore::new(&cfg.records_path)),
        Arc::new(backend),
        Arc::new(FileThrottleStore::new(&cfg.throttle_path)),
        Arc::new(SystemClock),
        executor.clone(),
        cfg.upload_interval,
    );
    tracing::info!(
        platform = ?cfg.platform,
        backend = %api.base_url,
        records = %cfg.records_path.display(),
        "wellness-health: pipeline ready"
    );

    if pipeline.adapter.request_all_permissions().await.is_none() {
        tracing::warn!("health permissions were not granted; only backend data is available");
    }

    let points = pipeline.resolver.get_metric_data(kind, period).await;
    let out = if want_summary {
        let summary = pipeline.resolver.get_metric_summary(kind, period).await;
        serde_json::json!({ "points": points, "summary": summary })
    } else {
        serde_json::to_value(&points)?
    };
    println!("{}", serde_json::to_string_pretty(&out)?);

    // let a scheduled sync upload finish before the process exits
    executor.drain().await;
    Ok(())
}
