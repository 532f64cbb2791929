use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cctrace::trace_command;
use cctrace::utils::file_io::open_file_for_append;
use cctrace::Settings;

/// Environment variable naming an optional TOML configuration file.
/// Everything else comes through the `CCTRACE_` configuration overlay;
/// the binary parses no command-line arguments.
const CONFIG_PATH_VAR: &str = "CCTRACE_CONFIG";

#[tokio::main]
async fn main() {
    let config_path = std::env::var(CONFIG_PATH_VAR).ok();
    let settings = match Settings::load(config_path.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };

    let _guard = match init_observability(&settings) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            std::process::exit(2);
        }
    };

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!("cannot listen for SIGTERM: {}", e);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("SIGINT received"),
            _ = sigterm.recv() => info!("SIGTERM received"),
        }
        signal_token.cancel();
    });

    match trace_command(&settings, &shutdown).await {
        Ok(path) => {
            println!("trace written to {}", path.display());
        }
        Err(e) => {
            error!("trace failed: {}", e);
            eprintln!("trace failed: {e}");
            std::process::exit(1);
        }
    }
}

/// File-based structured logging; the returned guard must outlive the
/// program so buffered lines are flushed on exit.
fn init_observability(
    settings: &Settings
) -> cctrace::Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_file = open_file_for_append(settings.trace.log_dir.join("cctrace.log"))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    Ok(guard)
}
