//! Error types for host-facing bridge operations.

use std::error::Error;

use thiserror::Error;

/// Primary error type surfaced by the bridge facade.
///
/// Benign conditions (absent listener, absent session, unrecognized
/// alert kind, private torrent) are deliberately not represented here:
/// those are no-ops by contract, not failures.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The engine rejected the supplied session settings.
    #[error("engine rejected session settings")]
    SettingsRejected {
        /// Underlying engine failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A fire-and-forget engine command failed to issue.
    #[error("engine command failed")]
    CommandFailed {
        /// Command that could not be issued.
        operation: &'static str,
        /// Underlying engine failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl BridgeError {
    /// Command associated with the failure, when one is recorded.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::SettingsRejected { .. } => None,
            Self::CommandFailed { operation, .. } => Some(operation),
        }
    }
}

/// Convenience alias for bridge operation results.
pub type BridgeResult<T> = Result<T, BridgeError>;
