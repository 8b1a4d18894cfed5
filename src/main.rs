use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use simp_http::access_log::TracingAccessLog;
use simp_http::config::{Config, LoggingConfig};
use simp_http::handler::{Dispatcher, JsonFileStore};
use simp_http::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let _guard = init_tracing(&cfg.logging)?;

    let dispatcher = Arc::new(Dispatcher::new(
        cfg.files.root.clone(),
        Arc::new(JsonFileStore::new(cfg.files.data_file.clone())),
        Arc::new(TracingAccessLog),
    ));

    tokio::select! {
        res = server::listener::run(&cfg, dispatcher) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// Console output plus, when configured, the same lines appended to a file.
fn init_tracing(cfg: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&cfg.level))?;

    let console = fmt::layer()
        .with_target(false)
        .with_level(true);

    let (file, guard) = match &cfg.access_log {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path.file_name().context("access_log must name a file")?;

            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();

    Ok(guard)
}
