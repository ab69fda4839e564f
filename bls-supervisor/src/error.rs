//! Errors the supervisor can surface.

/// Failures spawning or waiting on the responder subprocess.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// Arguments did not match either `disable` or the five scheduler parameters.
    #[error("usage: bls-supervisor <n> <t> <attackTime> <rebootTime> <totalRuntime> | disable")]
    BadUsage,
    /// A numeric argument did not parse.
    #[error("invalid numeric argument {value:?}: {source}")]
    InvalidArgument {
        /// The offending argument text.
        value: String,
        /// The parse failure.
        #[source]
        source: std::num::ParseFloatError,
    },
    /// Spawning or waiting on the child process failed.
    #[error("responder subprocess error: {0}")]
    Io(#[from] std::io::Error),
}
