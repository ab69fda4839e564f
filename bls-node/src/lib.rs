//! Responder and dealer state machines for the threshold BLS signing protocol.
//!
//! Both [`dealer`] and [`responder`] are written against injected `tokio::net::UdpSocket`s so
//! the protocol logic is testable over loopback without a real `10.0.0.x` network namespace;
//! `src/bin/responder.rs` and `src/bin/dealer.rs` wire them to real sockets and CLI config.

pub mod dealer;
pub mod error;
pub mod responder;

pub use error::{DealerError, ShareAcquisitionError};
pub use responder::{ResponderNode, ResponderState};
