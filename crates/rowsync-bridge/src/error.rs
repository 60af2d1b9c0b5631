#![forbid(unsafe_code)]

//! Error taxonomy for bridge construction.
//!
//! Per-notification failures never surface here: a revoked or dead observer
//! at delivery time is an expected outcome and the pending notification is
//! silently dropped. Use-after-destroy is unrepresentable; `destroy`
//! consumes the bridge.

use thiserror::Error;

/// Result alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors surfaced synchronously to the caller of
/// [`SyncBridge::create`](crate::SyncBridge::create).
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Construction-time misuse, e.g. a zero worker-thread count.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        /// What was wrong with the supplied configuration.
        message: String,
    },
}

impl BridgeError {
    /// Shorthand for a [`BridgeError::InvalidConfiguration`].
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configuration_formats_message() {
        let err = BridgeError::invalid("worker_threads must be >= 1");
        assert_eq!(
            err.to_string(),
            "invalid configuration: worker_threads must be >= 1"
        );
    }
}
