//! Error types for wakeful
//!
//! Two failure families reach the arbiter: the stores (persistence) and the
//! platform collaborators (icon, title, menu, power, download queries).

use thiserror::Error;

/// Errors raised by a key-value store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded or decoded
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The stored value exists but has the wrong shape
    #[error("stored value for '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Errors raised by a platform collaborator
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The call reached the platform and failed there
    #[error("{call} failed: {message}")]
    Call { call: &'static str, message: String },

    /// The collaborator is no longer reachable (e.g. the tray thread exited)
    #[error("{0} is unavailable")]
    Unavailable(&'static str),
}

impl PlatformError {
    pub fn call(call: &'static str, message: impl std::fmt::Display) -> Self {
        PlatformError::Call {
            call,
            message: message.to_string(),
        }
    }
}

/// Any error an arbiter step can hit
#[derive(Debug, Error)]
pub enum Error {
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("platform call error: {0}")]
    Platform(#[from] PlatformError),
}

/// Result type alias for arbiter steps
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_error_display() {
        let err = PlatformError::call("set_icon", "no tray");
        assert_eq!(err.to_string(), "set_icon failed: no tray");
    }

    #[test]
    fn test_error_from_store() {
        let err: Error = StoreError::Corrupt {
            key: "preferences".to_string(),
            reason: "not an object".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Persistence(_)));
        assert!(err.to_string().contains("preferences"));
    }
}
