//! Threshold BLS cryptography over an asymmetric bilinear pairing.
//!
//! - [`pairing`] pins the concrete backend curve and exposes every group operation the rest of
//!   this crate needs through [`pairing::PairingContext`].
//! - [`shamir`] is the generic Shamir secret-sharing and Lagrange-in-the-exponent engine.
//! - [`bls`] builds threshold keygen/sign/aggregate/verify on top of the two modules above.

pub mod bls;
pub mod pairing;
pub mod shamir;

pub use bls::{aggregate, keygen, sign, verify, verify_partial, BlsError, PartialSignature, PublicKey, SecretShare, Signature};
pub use pairing::{CodecError, Curve, Fq, Fr, G1Affine, G2Affine, Gt, PairingContext};
pub use shamir::ShamirError;
