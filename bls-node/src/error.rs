//! Error types for the responder and dealer state machines.

use bls_types::WireError;

/// Errors raised while a responder is acquiring its share. Always fatal: per §7, a malformed
/// or missing share during `AwaitShare` ends the process so the supervisor can restart it.
#[derive(Debug, thiserror::Error)]
pub enum ShareAcquisitionError {
    /// The dealer's response did not decode to a valid scalar.
    #[error("malformed share response: {0}")]
    Malformed(#[from] WireError),
    /// The share file on disk exists but could not be read or parsed.
    #[error("could not read persisted share at {path}: {source}")]
    PersistedShareUnreadable {
        /// Path of the share file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Writing the freshly acquired share to disk failed.
    #[error("could not persist share to {path}: {source}")]
    PersistFailed {
        /// Path of the share file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The socket used for key acquisition failed.
    #[error("key acquisition socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors the dealer treats as fatal: an aggregated signature that fails to verify, or key
/// distribution never completing within the run.
#[derive(Debug, thiserror::Error)]
pub enum DealerError {
    /// An aggregated signature failed to verify under the group public key; per §7 this
    /// signals a protocol bug, not a transient fault, and is fatal.
    #[error("aggregated signature for seq {seq} failed to verify")]
    VerificationFailed {
        /// The round's sequence number.
        seq: u8,
    },
    /// Not every responder requested its share before the run ended.
    #[error("key distribution incomplete: missing responders {missing:?}")]
    KeyDistributionIncomplete {
        /// 1-based indices that never requested a share.
        missing: Vec<usize>,
    },
    /// A socket operation failed.
    #[error("dealer socket error: {0}")]
    Io(#[from] std::io::Error),
}
