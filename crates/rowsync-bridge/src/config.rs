#![forbid(unsafe_code)]

//! Bridge construction parameters.

use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Default capacity of the notification queue.
///
/// A bounded queue provides backpressure: when the delivery thread falls
/// behind, the committing worker blocks in `send` rather than accumulating
/// unbounded memory.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default base interval between a worker's mutation attempts.
pub const DEFAULT_MUTATION_INTERVAL: Duration = Duration::from_millis(1000);

/// Parameters for [`SyncBridge::create`](crate::SyncBridge::create).
///
/// All fields are explicit constructor inputs; the bridge keeps no ambient
/// or global state.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Number of engine worker threads. Must be at least 1.
    pub worker_threads: usize,
    /// Capacity of the FIFO notification queue. Must be at least 1.
    pub queue_capacity: usize,
    /// Base interval between a worker's mutation attempts. Each worker
    /// sleeps this long plus a random jitter of up to three more intervals.
    pub mutation_interval: Duration,
}

impl BridgeConfig {
    /// A configuration with the given worker count and default queue and
    /// pacing parameters.
    #[must_use]
    pub fn new(worker_threads: usize) -> Self {
        Self {
            worker_threads,
            ..Self::default()
        }
    }

    /// Override the notification queue capacity.
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Override the worker pacing interval.
    #[must_use]
    pub fn mutation_interval(mut self, interval: Duration) -> Self {
        self.mutation_interval = interval;
        self
    }

    /// Reject configurations the bridge cannot honor.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(BridgeError::invalid("worker_threads must be >= 1"));
        }
        if self.queue_capacity == 0 {
            return Err(BridgeError::invalid("queue_capacity must be >= 1"));
        }
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            mutation_interval: DEFAULT_MUTATION_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(BridgeConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = BridgeConfig::new(0).validate().unwrap_err();
        assert!(err.to_string().contains("worker_threads"));
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        let err = BridgeConfig::new(2).queue_capacity(0).validate().unwrap_err();
        assert!(err.to_string().contains("queue_capacity"));
    }

    #[test]
    fn builders_override_fields() {
        let config = BridgeConfig::new(8)
            .queue_capacity(16)
            .mutation_interval(Duration::from_millis(5));
        assert_eq!(config.worker_threads, 8);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.mutation_interval, Duration::from_millis(5));
    }
}
