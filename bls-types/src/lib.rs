//! Wire message types, codecs, and node addressing shared by the dealer and responder
//! binaries.

pub mod addr;
pub mod error;
pub mod wire;

pub use error::WireError;
