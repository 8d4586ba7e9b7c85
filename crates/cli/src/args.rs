use std::path::PathBuf;

use clap::Parser;
use ev_domain::config::Config;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "EV_CONFIG";
/// Configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ev-subscriber.toml";

/// ev-subscribe — follow an event server and print every event as a JSON line.
#[derive(Debug, Parser)]
#[command(name = "ev-subscribe", version, about)]
pub struct Cli {
    /// Event server base URL (e.g. http://localhost:3000).
    pub url: Option<String>,

    /// Resume after this event id.
    #[arg(long, value_name = "ID")]
    pub last: Option<String>,

    /// Forwarded to the server as the `burst-time` header (milliseconds).
    #[arg(long = "burst-time", alias = "burstTime", value_name = "MS")]
    pub burst_time: Option<u64>,

    /// Forwarded to the server as the `burst-count` header.
    #[arg(long = "burst-count", alias = "burstCount", value_name = "N")]
    pub burst_count: Option<u32>,

    /// Print progress and errors to stderr.
    #[arg(short = 'x', long)]
    pub debug: bool,

    /// Reconnect when the server ends the stream.
    #[arg(long, overrides_with = "no_retry")]
    pub retry: bool,

    /// Exit when the server ends the stream, even if the config file sets
    /// `retry = true`.
    #[arg(long = "no-retry", overrides_with = "retry")]
    pub no_retry: bool,

    /// Configuration file (defaults to $EV_CONFIG, then ./ev-subscriber.toml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The configuration file to read and whether it was asked for
    /// explicitly (flag or environment) rather than picked up by default.
    pub fn config_path(&self) -> (PathBuf, bool) {
        if let Some(ref path) = self.config {
            return (path.clone(), true);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => (PathBuf::from(path), true),
            _ => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        }
    }

    /// Override file values with the flags given on the command line.
    pub fn apply(&self, config: &mut Config) {
        let sub = &mut config.subscriber;
        if let Some(ref url) = self.url {
            sub.endpoint = Some(url.clone());
        }
        if let Some(ref last) = self.last {
            sub.last_event_id = Some(last.clone());
        }
        if self.burst_time.is_some() {
            sub.burst_time = self.burst_time;
        }
        if self.burst_count.is_some() {
            sub.burst_count = self.burst_count;
        }
        sub.debug |= self.debug;
        if self.retry {
            sub.retry = true;
        } else if self.no_retry {
            sub.retry = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ev-subscribe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&["http://localhost:3000"]);
        assert_eq!(cli.url.as_deref(), Some("http://localhost:3000"));
        assert!(cli.last.is_none());
        assert!(!cli.debug);
        assert!(!cli.retry);
    }

    #[test]
    fn every_flag() {
        let cli = parse(&[
            "http://h",
            "--last",
            "41",
            "--burst-time",
            "250",
            "--burst-count",
            "10",
            "-x",
            "--retry",
        ]);
        assert_eq!(cli.last.as_deref(), Some("41"));
        assert_eq!(cli.burst_time, Some(250));
        assert_eq!(cli.burst_count, Some(10));
        assert!(cli.debug);
        assert!(cli.retry);
    }

    #[test]
    fn camel_case_aliases() {
        let cli = parse(&["http://h", "--burstTime", "5", "--burstCount", "6", "--debug"]);
        assert_eq!(cli.burst_time, Some(5));
        assert_eq!(cli.burst_count, Some(6));
        assert!(cli.debug);
    }

    #[test]
    fn rejects_non_numeric_burst() {
        let r = Cli::try_parse_from(["ev-subscribe", "http://h", "--burst-count", "many"]);
        assert!(r.is_err());
    }

    #[test]
    fn flags_override_file() {
        let mut config = Config::from_toml(
            r#"
            [subscriber]
            endpoint = "http://from-file"
            last_event_id = "1"
            burst_count = 3
            retry = true
            "#,
        )
        .unwrap();
        parse(&["http://from-flag", "--last", "9"]).apply(&mut config);

        let sub = &config.subscriber;
        assert_eq!(sub.endpoint.as_deref(), Some("http://from-flag"));
        assert_eq!(sub.last_event_id.as_deref(), Some("9"));
        assert_eq!(sub.burst_count, Some(3));
        assert!(sub.retry);
        assert!(!sub.debug);
    }

    #[test]
    fn no_retry_turns_off_file_retry() {
        let mut config = Config::from_toml("[subscriber]\nretry = true").unwrap();
        parse(&["http://h", "--no-retry"]).apply(&mut config);
        assert!(!config.subscriber.retry);
    }

    #[test]
    fn last_of_retry_and_no_retry_wins() {
        let cli = parse(&["http://h", "--no-retry", "--retry"]);
        assert!(cli.retry);
        assert!(!cli.no_retry);

        let cli = parse(&["http://h", "--retry", "--no-retry"]);
        assert!(!cli.retry);
        assert!(cli.no_retry);
    }

    #[test]
    fn explicit_config_flag_wins() {
        let cli = parse(&["--config", "/etc/ev.toml"]);
        assert_eq!(cli.config_path(), (PathBuf::from("/etc/ev.toml"), true));
    }
}
