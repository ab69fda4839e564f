//! Pairing primitives over an asymmetric bilinear group.
//!
//! Rather than stashing curve parameters in a process-wide global, every operation is a
//! method on [`PairingContext`], an explicit (zero-sized) handle to the chosen backend curve.
//! The backend is pinned to BN254 (`ark_bn254::Bn254`): signatures live in `G1`, public keys
//! in `G2`, and the pairing target group is `GT`. Swapping to another `ark_ec::pairing::Pairing`
//! implementation only touches this module.

use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, PrimeField, UniformRand, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::{CryptoRng, RngCore};

/// The pairing-friendly curve backing this crate.
pub type Curve = ark_bn254::Bn254;
/// Scalar field shared by G1 and G2.
pub type Fr = ark_bn254::Fr;
/// Base field of G1, used during hash-to-curve.
pub type Fq = ark_bn254::Fq;
/// Signature group.
pub type G1Affine = ark_bn254::G1Affine;
/// Public-key group.
pub type G2Affine = ark_bn254::G2Affine;
/// Pairing target group element.
pub type Gt = PairingOutput<Curve>;

const HASH_TO_G1_DOMAIN: &[u8] = b"BLS-THRESHOLD-H2G1-BN254-01";

/// Errors produced while decoding wire-format curve/field elements.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The byte string did not decode to a valid field or curve element.
    #[error("malformed curve/field encoding: {0}")]
    Malformed(#[from] ark_serialize::SerializationError),
}

/// Explicit handle to the pairing backend. Holds no state; every cryptographic operation the
/// rest of the crate needs is a method here, so no code outside this module ever names
/// `ark_bn254` directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairingContext;

impl PairingContext {
    /// Draws a uniformly random scalar.
    pub fn random_fr<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Fr {
        Fr::rand(rng)
    }

    /// Converts a small positive integer (a share index `1..=n`) to a scalar.
    pub fn fr_from_int(&self, value: u64) -> Fr {
        Fr::from(value)
    }

    /// Multiplicative inverse in Fr. `None` iff `a` is zero.
    pub fn fr_inv(&self, a: Fr) -> Option<Fr> {
        a.inverse()
    }

    /// The identity element of G1.
    pub fn g1_identity(&self) -> G1Affine {
        G1Affine::zero()
    }

    /// Draws a uniformly random element of G2 (used as the per-keygen generator `g`).
    pub fn g2_random<R: RngCore + CryptoRng>(&self, rng: &mut R) -> G2Affine {
        (G2Affine::generator() * Fr::rand(rng)).into_affine()
    }

    /// Deterministic hash-to-curve into G1, fixed to this crate's domain separator.
    ///
    /// Implemented as try-and-increment over the short-Weierstrass equation `y^2 = x^3 + 3`:
    /// BN254's G1 has cofactor 1, so any point satisfying the curve equation already lies in
    /// the prime-order subgroup and needs no further clearing.
    pub fn hash_to_g1(&self, msg: &[u8]) -> G1Affine {
        let mut counter: u32 = 0;
        loop {
            let mut hasher = blake3::Hasher::new();
            hasher.update(HASH_TO_G1_DOMAIN);
            hasher.update(msg);
            hasher.update(&counter.to_be_bytes());
            let digest = hasher.finalize();
            let x = Fq::from_be_bytes_mod_order(digest.as_bytes());
            let rhs = x * x * x + Fq::from(3u64);
            if let Some(y) = rhs.sqrt() {
                let point = G1Affine::new_unchecked(x, y);
                if point.is_on_curve() {
                    return point;
                }
            }
            counter += 1;
        }
    }

    /// Group addition in G1 (written multiplicatively as `g1_mul` to match the spec's
    /// exponential notation for signature-group operations).
    pub fn g1_mul(&self, a: G1Affine, b: G1Affine) -> G1Affine {
        (a + b).into_affine()
    }

    /// Scalar exponentiation in G1: `a^e`.
    pub fn g1_pow(&self, a: G1Affine, e: Fr) -> G1Affine {
        (a * e).into_affine()
    }

    /// Scalar exponentiation in G2: `a^e`.
    pub fn g2_pow(&self, a: G2Affine, e: Fr) -> G2Affine {
        (a * e).into_affine()
    }

    /// The bilinear pairing `e: G1 x G2 -> GT`.
    pub fn pairing(&self, a: G1Affine, b: G2Affine) -> Gt {
        Curve::pairing(a, b)
    }

    /// Canonical (compressed) byte serialization of a scalar.
    pub fn serialize_fr(&self, fr: &Fr) -> Vec<u8> {
        let mut buf = Vec::with_capacity(fr.compressed_size());
        fr.serialize_compressed(&mut buf).expect("infallible");
        buf
    }

    /// Inverse of [`Self::serialize_fr`].
    pub fn deserialize_fr(&self, bytes: &[u8]) -> Result<Fr, CodecError> {
        Ok(Fr::deserialize_compressed(bytes)?)
    }

    /// Canonical (compressed) byte serialization of a G1 point.
    pub fn serialize_g1(&self, point: &G1Affine) -> Vec<u8> {
        let mut buf = Vec::with_capacity(point.compressed_size());
        point.serialize_compressed(&mut buf).expect("infallible");
        buf
    }

    /// Inverse of [`Self::serialize_g1`].
    pub fn deserialize_g1(&self, bytes: &[u8]) -> Result<G1Affine, CodecError> {
        Ok(G1Affine::deserialize_compressed(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_to_g1_is_deterministic_and_on_curve() {
        let ctx = PairingContext;
        let a = ctx.hash_to_g1(b"hello world!!!");
        let b = ctx.hash_to_g1(b"hello world!!!");
        assert_eq!(a, b);
        assert!(a.is_on_curve());
        assert_ne!(a, ctx.hash_to_g1(b"a different message"));
    }

    #[test]
    fn pairing_is_bilinear() {
        let ctx = PairingContext;
        let mut rng = rand::thread_rng();
        let g1 = ctx.hash_to_g1(b"bilinearity probe");
        let g2 = G2Affine::generator();
        let a = ctx.random_fr(&mut rng);
        let b = ctx.random_fr(&mut rng);

        let lhs = ctx.pairing(ctx.g1_pow(g1, a), ctx.g2_pow(g2, b));
        let rhs = ctx.pairing(ctx.g1_pow(g1, a * b), g2);
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn fr_roundtrips_through_wire_encoding() {
        let ctx = PairingContext;
        let mut rng = rand::thread_rng();
        let fr = ctx.random_fr(&mut rng);
        let bytes = ctx.serialize_fr(&fr);
        assert_eq!(ctx.deserialize_fr(&bytes).unwrap(), fr);
    }

    #[test]
    fn g1_roundtrips_through_wire_encoding() {
        let ctx = PairingContext;
        let point = ctx.hash_to_g1(b"roundtrip");
        let bytes = ctx.serialize_g1(&point);
        assert_eq!(ctx.deserialize_g1(&bytes).unwrap(), point);
    }
}
