//! Sink configuration read from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::SinkError;
use fulltext_sink_pipeline::ListenerConfig;
use fulltext_sink_repository::{Endpoint, TransportConfig};

/// Default search cluster member.
const DEFAULT_ENDPOINTS: &str = "http://127.0.0.1:9200";

/// Default directory for checkpoint files.
const DEFAULT_DATA_DIR: &str = "./data/fulltext";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(SinkError::config(format!("Unknown LOG_FORMAT {}", other))),
        }
    }
}

/// Everything needed to start the sink.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Search cluster members.
    pub endpoints: Vec<Endpoint>,
    /// Directory holding one checkpoint file per partition.
    pub data_dir: PathBuf,
    pub transport: TransportConfig,
    pub listener: ListenerConfig,
    pub log_format: LogFormat,
}

impl SinkConfig {
    /// Load configuration from the environment, after reading `.env` if present.
    ///
    /// # Environment Variables
    ///
    /// - `FULLTEXT_ENDPOINTS`: comma-separated member URLs, credentials in the
    ///   userinfo part (default: http://127.0.0.1:9200)
    /// - `FULLTEXT_DATA_DIR`: checkpoint directory (default: ./data/fulltext)
    /// - `FULLTEXT_REQUEST_TIMEOUT_MS`: per-request timeout (default: 3000)
    /// - `FULLTEXT_VERIFY_TLS`: verify server certificates (default: false)
    /// - `LISTENER_COMMIT_BATCH_SIZE`: mutations per window (default: 1000)
    /// - `LISTENER_TICK_MS`: delay between ticks (default: 1000)
    /// - `LISTENER_REFRESH_ON_BULK`: refresh after each bulk (default: false)
    /// - `LOG_FORMAT`: `text` or `json` (default: text)
    pub fn from_env() -> Result<Self, SinkError> {
        dotenv::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;

        info!(
            endpoints = config.endpoints.len(),
            data_dir = %config.data_dir.display(),
            commit_batch_size = config.listener.commit_batch_size,
            "Loaded sink configuration"
        );
        Ok(config)
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SinkError> {
        let raw_endpoints =
            lookup("FULLTEXT_ENDPOINTS").unwrap_or_else(|| DEFAULT_ENDPOINTS.to_string());
        let endpoints = raw_endpoints
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Endpoint::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if endpoints.is_empty() {
            return Err(SinkError::config("FULLTEXT_ENDPOINTS lists no endpoint"));
        }

        let data_dir = lookup("FULLTEXT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let mut transport = TransportConfig::default();
        if let Some(ms) = parse(&lookup, "FULLTEXT_REQUEST_TIMEOUT_MS")? {
            transport.request_timeout = Duration::from_millis(ms);
        }
        if let Some(verify) = parse_bool(&lookup, "FULLTEXT_VERIFY_TLS")? {
            transport.verify_tls = verify;
        }

        let mut listener = ListenerConfig::default();
        if let Some(size) = parse::<usize>(&lookup, "LISTENER_COMMIT_BATCH_SIZE")? {
            if size == 0 {
                return Err(SinkError::config("LISTENER_COMMIT_BATCH_SIZE must be positive"));
            }
            listener.commit_batch_size = size;
        }
        if let Some(ms) = parse(&lookup, "LISTENER_TICK_MS")? {
            listener.tick_interval = Duration::from_millis(ms);
        }
        if let Some(refresh) = parse_bool(&lookup, "LISTENER_REFRESH_ON_BULK")? {
            listener.refresh_on_bulk = refresh;
        }

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            endpoints,
            data_dir,
            transport,
            listener,
            log_format,
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, SinkError>
where
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| SinkError::config(format!("Invalid {}={}: {}", key, raw, e)))
        })
        .transpose()
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<bool>, SinkError> {
    lookup(key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(SinkError::config(format!("Invalid {}={}", key, raw))),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SinkConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.endpoints, vec![Endpoint::new("http", "127.0.0.1:9200")]);
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.transport.request_timeout, Duration::from_secs(3));
        assert_eq!(config.listener.commit_batch_size, 1000);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let config = SinkConfig::from_lookup(lookup(&[
            (
                "FULLTEXT_ENDPOINTS",
                "http://10.0.0.1:9200, https://elastic:pw@10.0.0.2:9200",
            ),
            ("FULLTEXT_DATA_DIR", "/var/lib/sink"),
            ("FULLTEXT_REQUEST_TIMEOUT_MS", "500"),
            ("FULLTEXT_VERIFY_TLS", "true"),
            ("LISTENER_COMMIT_BATCH_SIZE", "50"),
            ("LISTENER_TICK_MS", "200"),
            ("LISTENER_REFRESH_ON_BULK", "yes"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[1].user.as_deref(), Some("elastic"));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/sink"));
        assert_eq!(config.transport.request_timeout, Duration::from_millis(500));
        assert!(config.transport.verify_tls);
        assert_eq!(config.listener.commit_batch_size, 50);
        assert_eq!(config.listener.tick_interval, Duration::from_millis(200));
        assert!(config.listener.refresh_on_bulk);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values() {
        assert!(SinkConfig::from_lookup(lookup(&[("LISTENER_TICK_MS", "soon")])).is_err());
        assert!(SinkConfig::from_lookup(lookup(&[("LISTENER_COMMIT_BATCH_SIZE", "0")])).is_err());
        assert!(SinkConfig::from_lookup(lookup(&[("FULLTEXT_VERIFY_TLS", "maybe")])).is_err());
        assert!(SinkConfig::from_lookup(lookup(&[("FULLTEXT_ENDPOINTS", " , ")])).is_err());
        assert!(SinkConfig::from_lookup(lookup(&[("LOG_FORMAT", "xml")])).is_err());
    }
}
