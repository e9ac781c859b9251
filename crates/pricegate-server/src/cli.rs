//! Command-line arguments.
//!
//! | Option | Env | Default |
//! |--------|-----|---------|
//! | `--listen` | `PRICEGATE_LISTEN` | `0.0.0.0:8000` |
//! | `--self-ping-url` | `PRICEGATE_SELF_PING_URL` | none |
//! | `--self-ping-interval-secs` | `PRICEGATE_SELF_PING_INTERVAL_SECS` | `60` |
//! | `--no-self-ping` | `PRICEGATE_NO_SELF_PING` | `false` |
//!
//! Engine tuning (cache, retry, relays, allow-list) is read from the
//! `PRICEGATE_*` variables documented in `pricegate_core::config`.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "pricegate",
    version,
    about = "Symbol-to-price gateway over public quote providers"
)]
pub struct ServerArgs {
    /// Address to bind.
    #[arg(long, env = "PRICEGATE_LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Public base URL of this service. When set, `{url}/health` is pinged
    /// periodically so the host does not suspend the process.
    #[arg(long, env = "PRICEGATE_SELF_PING_URL")]
    pub self_ping_url: Option<String>,

    #[arg(long, env = "PRICEGATE_SELF_PING_INTERVAL_SECS", default_value_t = 60)]
    pub self_ping_interval_secs: u64,

    /// Disable the self-ping task even if a URL is configured.
    #[arg(long, env = "PRICEGATE_NO_SELF_PING")]
    pub no_self_ping: bool,
}

impl ServerArgs {
    /// Base URL to ping, if self-ping is enabled.
    pub fn self_ping_target(&self) -> Option<&str> {
        if self.no_self_ping {
            return None;
        }
        self.self_ping_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn self_ping_interval(&self) -> Duration {
        Duration::from_secs(self.self_ping_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = ServerArgs::try_parse_from([
            "pricegate",
            "--listen",
            "127.0.0.1:9000",
            "--self-ping-url",
            "https://svc.test",
            "--self-ping-interval-secs",
            "30",
        ])
        .expect("valid args");

        assert_eq!(args.listen, "127.0.0.1:9000".parse().expect("addr"));
        assert_eq!(args.self_ping_target(), Some("https://svc.test"));
        assert_eq!(args.self_ping_interval(), Duration::from_secs(30));
    }

    #[test]
    fn no_self_ping_wins_over_url() {
        let args = ServerArgs::try_parse_from([
            "pricegate",
            "--self-ping-url",
            "https://svc.test",
            "--no-self-ping",
        ])
        .expect("valid args");

        assert_eq!(args.self_ping_target(), None);
    }
}
