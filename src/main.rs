mod config;
mod error;
mod fetcher;
mod rewrite;
mod util;
mod xml;

use anyhow::Context;
use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};
use tracing_appender::rolling;
use tracing_subscriber::{filter::filter_fn, fmt::layer as fmt_layer, prelude::*, EnvFilter};

use crate::{config::AppConfig, fetcher::FeedFetcher, rewrite::RewriteOptions};

const CRATE_TARGET: &str = "feed_rewriter";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    setup_tracing(&config)?;

    if let Err(err) = run(&config).await {
        tracing::error!(error = ?err, "feed rewrite failed");
        return Err(err);
    }

    Ok(())
}

async fn run(config: &AppConfig) -> anyhow::Result<()> {
    tracing::info!(source = %config.feed.source_url, "rewriting podcast feed");

    let fetcher = FeedFetcher::new(&config.http_client).context("failed to build http client")?;
    let body = fetcher
        .fetch(&config.feed.source_url)
        .await
        .context("failed to fetch source feed")?;

    let mut document = xml::parse_document(&body).context("failed to parse source feed")?;
    let options = RewriteOptions::from(config);
    rewrite::rewrite_feed(&mut document, &options)?;
    let output = xml::write_document(&document).context("failed to serialize feed")?;

    let output_path = Path::new(&config.feed.output_path);
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {:?}", parent))?;
    }
    tokio::fs::write(output_path, &output)
        .await
        .with_context(|| format!("failed to write {:?}", output_path))?;

    tracing::info!(
        path = %output_path.display(),
        size = output.len(),
        "feed written"
    );

    Ok(())
}

fn setup_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let level = config.logging.level.as_deref().unwrap_or("info");
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{CRATE_TARGET}={level}")));

    let (directory, file_name) = split_log_path(Path::new(&config.logging.file))?;
    std::fs::create_dir_all(&directory)
        .with_context(|| format!("failed to create log directory {:?}", directory))?;
    let (non_blocking, guard) =
        tracing_appender::non_blocking(rolling::never(&directory, file_name));

    static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
    let _ = FILE_GUARD.set(guard);

    let stdout_layer = fmt_layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt_layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter_fn(|meta| meta.target().starts_with(CRATE_TARGET)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("failed to init tracing subscriber")?;

    Ok(())
}

/// Split the configured log file into the directory and file name the
/// appender wants; a bare file name logs into the working directory.
fn split_log_path(path: &Path) -> anyhow::Result<(PathBuf, &str)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid log file path {:?}", path))?;
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((directory, file_name))
}
