use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a tree is started and driven. Every field has a default so partial files load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Budget for the whole setup pass, in milliseconds. `None` waits indefinitely.
    pub setup_timeout: Option<u64>,

    /// Sleep between ticks in `tick_tock`, in milliseconds.
    #[serde(default = "default_tick_period")]
    pub tick_period: u64,

    /// Stop ticking after this many ticks. `None` runs until interrupted.
    pub max_ticks: Option<u64>,

    /// Stop ticking once the root resolves to SUCCESS or FAILURE.
    pub stop_on_terminal_status: bool,

    /// Enable the blackboard activity stream with this capacity.
    pub activity_stream_capacity: Option<usize>,
}

fn default_tick_period() -> u64 {
    500
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            setup_timeout: Some(15_000),
            tick_period: default_tick_period(),
            max_ticks: None,
            stop_on_terminal_status: false,
            activity_stream_capacity: None,
        }
    }
}

impl TreeConfig {
    pub fn setup_timeout(&self) -> Duration {
        self.setup_timeout
            .map(Duration::from_millis)
            .unwrap_or(Duration::MAX)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: TreeConfig = serde_json::from_str(r#"{"max_ticks": 10}"#).unwrap();
        assert_eq!(config.max_ticks, Some(10));
        assert_eq!(config.tick_period, 500);
        assert_eq!(config.setup_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn null_timeout_is_unbounded() {
        let config: TreeConfig = serde_json::from_str(r#"{"setup_timeout": null}"#).unwrap();
        assert_eq!(config.setup_timeout(), Duration::MAX);
    }
}
