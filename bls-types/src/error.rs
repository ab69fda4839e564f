//! Shared error types for wire decoding.

use bls_core::CodecError;

/// Errors produced while parsing a datagram into a protocol message.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The datagram was shorter than the minimum length for any known message.
    #[error("datagram too short: {len} bytes")]
    TooShort {
        /// Observed length.
        len: usize,
    },
    /// The field/curve element embedded in the datagram did not decode.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
