//! Listener configuration.

use std::time::Duration;

/// Configuration for one partition listener.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Mutations collected before a window is cut and submitted.
    pub commit_batch_size: usize,
    /// Delay between two ticks of the worker.
    pub tick_interval: Duration,
    /// Ask the cluster to refresh after each bulk request.
    pub refresh_on_bulk: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            commit_batch_size: 1000,
            tick_interval: Duration::from_secs(1),
            refresh_on_bulk: false,
        }
    }
}

impl ListenerConfig {
    /// Create a config with a custom window size.
    pub fn with_commit_batch_size(commit_batch_size: usize) -> Self {
        Self {
            commit_batch_size: commit_batch_size.max(1),
            ..Self::default()
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ListenerConfig::default();
        assert_eq!(config.commit_batch_size, 1000);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert!(!config.refresh_on_bulk);
    }

    #[test]
    fn test_batch_size_at_least_one() {
        assert_eq!(ListenerConfig::with_commit_batch_size(0).commit_batch_size, 1);
    }

    #[test]
    fn test_with_tick_interval() {
        let config = ListenerConfig::with_commit_batch_size(10)
            .with_tick_interval(Duration::from_millis(20));
        assert_eq!(config.commit_batch_size, 10);
        assert_eq!(config.tick_interval, Duration::from_millis(20));
    }
}
