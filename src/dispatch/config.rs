//! Dispatch configuration

use std::time::Duration;

/// How the matcher picks among assignable providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// First assignable provider found, in map order
    #[default]
    FirstAvailable,
    /// Closest assignable provider to the requester
    Nearest,
}

/// Dispatch behavior options
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Provider selection policy for new consultations
    pub selection: SelectionPolicy,

    /// Give up on a ringing session after this long (None = ring forever)
    pub ring_timeout: Option<Duration>,

    /// How often the ring-timeout sweep runs
    pub sweep_interval: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            selection: SelectionPolicy::FirstAvailable,
            ring_timeout: None,
            sweep_interval: Duration::from_secs(5),
        }
    }
}

impl DispatchConfig {
    /// Set the provider selection policy
    pub fn selection(mut self, policy: SelectionPolicy) -> Self {
        self.selection = policy;
        self
    }

    /// Expire ringing sessions after the given duration
    pub fn ring_timeout(mut self, timeout: Duration) -> Self {
        self.ring_timeout = Some(timeout);
        self
    }

    /// Set the sweep interval for ring-timeout checks
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DispatchConfig::default();

        assert_eq!(config.selection, SelectionPolicy::FirstAvailable);
        assert!(config.ring_timeout.is_none());
        assert_eq!(config.sweep_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_chaining() {
        let config = DispatchConfig::default()
            .selection(SelectionPolicy::Nearest)
            .ring_timeout(Duration::from_secs(30))
            .sweep_interval(Duration::from_secs(1));

        assert_eq!(config.selection, SelectionPolicy::Nearest);
        assert_eq!(config.ring_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
    }
}
