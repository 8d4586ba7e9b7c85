mod args;
mod output;

use std::sync::Arc;

use clap::Parser;
use ev_domain::config::Config;
use ev_subscriber::{CancellationToken, SubscriberBuilder, SubscriberError};
use ev_transport::HttpTransport;
use tracing_subscriber::EnvFilter;

use crate::args::Cli;
use crate::output::JsonLines;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_cli_tracing();

    let result = match load_config(&cli) {
        Ok(config) => {
            let debug = config.subscriber.debug;
            run(config).await.map_err(|e| (e, debug))
        }
        Err(e) => Err((e, false)),
    };

    let code = match result {
        Ok(()) => 0,
        Err((e, debug)) => {
            if should_report(&e, debug) {
                eprintln!("ev-subscribe: {e}");
            }
            e.exit_code()
        }
    };
    std::process::exit(code);
}

/// Usage problems are always reported.  Everything else only in debug mode,
/// where the progress lines already explain what happened.
fn should_report(e: &SubscriberError, debug: bool) -> bool {
    debug || matches!(e, SubscriberError::Config(_))
}

/// Stderr-only tracing, silent unless `RUST_LOG` asks for it.  Event lines
/// own stdout and `--debug` owns the human-readable stderr channel.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run(config: Config) -> Result<(), SubscriberError> {
    let transport = HttpTransport::new(&config.transport)
        .map_err(|e| SubscriberError::Config(format!("http client: {e}")))?;
    let subscriber = SubscriberBuilder::from_config(&config).build(Arc::new(transport))?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let mut sink = JsonLines::new(std::io::stdout());
    subscriber.run(&mut sink, shutdown).await
}

fn load_config(cli: &Cli) -> Result<Config, SubscriberError> {
    let (path, explicit) = cli.config_path();
    if explicit && !path.exists() {
        return Err(SubscriberError::Config(format!(
            "config file {} not found",
            path.display()
        )));
    }
    let mut config = Config::load(&path).map_err(|e| SubscriberError::Config(e.to_string()))?;
    cli.apply(&mut config);

    if config.subscriber.endpoint.is_none() {
        return Err(SubscriberError::Config(
            "no endpoint given\nusage: ev-subscribe <URL> [--last ID] [--retry]".into(),
        ));
    }
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                let _ = ctrl_c.await;
                tracing::info!("received SIGINT, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        tracing::info!("received SIGINT, shutting down");
    }

    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ev-subscribe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn missing_explicit_config_is_a_config_error() {
        let err = load_config(&cli(&["http://h", "--config", "/nonexistent/ev.toml"])).unwrap_err();
        assert!(matches!(err, SubscriberError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn file_values_merge_with_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[subscriber]\nendpoint = \"http://from-file\"\nburst_time = 100\n\n[reconnect]\nmax_attempts = 4"
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let config = load_config(&cli(&["--config", path, "--retry"])).unwrap();
        assert_eq!(config.subscriber.endpoint.as_deref(), Some("http://from-file"));
        assert_eq!(config.subscriber.burst_time, Some(100));
        assert!(config.subscriber.retry);
        assert_eq!(config.reconnect.max_attempts, 4);
    }

    #[test]
    fn only_usage_errors_print_without_debug() {
        let ended = SubscriberError::StreamEnded { last_event_id: None };
        assert!(!should_report(&ended, false));
        assert!(should_report(&ended, true));

        let usage = SubscriberError::Config("no endpoint given".into());
        assert!(should_report(&usage, false));
    }

    #[test]
    fn endpoint_is_required() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        let err = load_config(&cli(&["--config", path])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
