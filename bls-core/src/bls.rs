//! Threshold BLS signatures: keygen, partial signing, Lagrange aggregation, verification.
//!
//! Public keys live in G2, signatures in G1. A signature on message `m` under secret `x` is
//! `H(m)^x`; verification checks `e(sigma, g) == e(H(m), g^x)`.

use ark_ec::CurveGroup;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::{CryptoRng, RngCore};
use zeroize::ZeroizeOnDrop;

use crate::pairing::{CodecError, Fr, G1Affine, G2Affine, PairingContext};
use crate::shamir::{self, ShamirError};

/// The group's shared public key: the generator `g` chosen at keygen time, and `g^x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct PublicKey {
    /// Per-group generator, drawn fresh at keygen.
    pub g: G2Affine,
    /// `g` raised to the shared secret `x`.
    pub g_x: G2Affine,
}

/// One node's share of the master secret. Zeroized on drop; never serialized by this crate
/// (distribution of shares to their owning node is the caller's concern).
#[derive(Debug, Clone, ZeroizeOnDrop)]
pub struct SecretShare {
    /// 1-based share index, matching the node's position in the group.
    #[zeroize(skip)]
    pub index: usize,
    /// The scalar `P(index)` for the dealer's secret polynomial `P`.
    pub scalar: Fr,
}

/// A single node's signature over a message, before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialSignature {
    /// 1-based share index that produced this partial.
    pub index: usize,
    /// `H(m)^{share}`.
    pub sigma: G1Affine,
}

/// A complete threshold signature, reconstructed from `t+1` partials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Signature(pub G1Affine);

impl Signature {
    /// Canonical compressed wire encoding.
    pub fn to_bytes(&self, ctx: &PairingContext) -> Vec<u8> {
        ctx.serialize_g1(&self.0)
    }

    /// Inverse of [`Self::to_bytes`].
    pub fn from_bytes(ctx: &PairingContext, bytes: &[u8]) -> Result<Self, CodecError> {
        ctx.deserialize_g1(bytes).map(Signature)
    }
}

/// Errors that can arise from threshold BLS operations.
#[derive(Debug, thiserror::Error)]
pub enum BlsError {
    /// Aggregation failed: see [`ShamirError`].
    #[error(transparent)]
    Shamir(#[from] ShamirError),
}

/// Runs a trusted dealer's keygen: draws a fresh generator `g`, a random master secret `x`,
/// Shamir-shares `x` across `n` nodes with threshold `t`, and returns the group public key
/// alongside each node's share.
///
/// The caller is responsible for transporting each `SecretShare` to its owning node over a
/// confidential channel; this function only computes the values.
pub fn keygen<R: RngCore + CryptoRng>(
    ctx: &PairingContext,
    n: usize,
    t: usize,
    rng: &mut R,
) -> (PublicKey, Vec<SecretShare>) {
    let g = ctx.g2_random(rng);
    let x = ctx.random_fr(rng);
    let g_x = ctx.g2_pow(g, x);

    let shares = shamir::gen_shares(ctx, n, t, x, rng)
        .into_iter()
        .map(|(index, scalar)| SecretShare { index, scalar })
        .collect();

    (PublicKey { g, g_x }, shares)
}

/// Produces this node's partial signature over `msg`.
pub fn sign(ctx: &PairingContext, share: &SecretShare, msg: &[u8]) -> PartialSignature {
    let h = ctx.hash_to_g1(msg);
    PartialSignature {
        index: share.index,
        sigma: ctx.g1_pow(h, share.scalar),
    }
}

/// Combines partial signatures into a full threshold signature via Lagrange interpolation in
/// the exponent. Fewer than `threshold_plus_one` (i.e. `t+1`) distinct partials is rejected.
pub fn aggregate(
    parts: &[PartialSignature],
    threshold_plus_one: usize,
) -> Result<Signature, BlsError> {
    let pairs: Vec<(usize, G1Affine)> = parts.iter().map(|p| (p.index, p.sigma)).collect();
    Ok(Signature(shamir::aggregate(&pairs, threshold_plus_one)?))
}

/// Checks `e(sigma, g) == e(H(m), g^x)`.
pub fn verify(ctx: &PairingContext, pk: &PublicKey, sig: &Signature, msg: &[u8]) -> bool {
    let h = ctx.hash_to_g1(msg);
    ctx.pairing(sig.0, pk.g) == ctx.pairing(h, pk.g_x)
}

/// Checks a single partial signature against the node's implied public key share
/// `g^{lambda}`-free form: `e(sigma_i, g) == e(H(m), g^{share_i})`. Used by a dealer that wants
/// to blame a misbehaving responder before aggregation, given the node's committed share
/// public key `g^{share_i}` (not modeled here; left to the caller to track per §4.3's
/// accountability note).
pub fn verify_partial(
    ctx: &PairingContext,
    g: G2Affine,
    share_public_key: G2Affine,
    part: &PartialSignature,
    msg: &[u8],
) -> bool {
    let h = ctx.hash_to_g1(msg);
    ctx.pairing(part.sigma, g) == ctx.pairing(h, share_public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::AffineRepr;
    use itertools::Itertools as _;
    use rand::SeedableRng;

    #[test]
    fn threshold_signature_verifies_from_any_quorum() {
        let ctx = PairingContext;
        let mut rng = rand_chacha::ChaCha12Rng::seed_from_u64(42);
        let (pk, shares) = keygen(&ctx, 7, 3, &mut rng);
        let msg = b"reboot in 3, 2, 1";

        for combo in (0..7usize).combinations(4) {
            let parts: Vec<PartialSignature> = combo
                .into_iter()
                .map(|i| sign(&ctx, &shares[i], msg))
                .collect();
            let sig = aggregate(&parts, 4).unwrap();
            assert!(verify(&ctx, &pk, &sig, msg));
        }
    }

    #[test]
    fn signature_does_not_verify_under_wrong_message() {
        let ctx = PairingContext;
        let mut rng = rand_chacha::ChaCha12Rng::seed_from_u64(7);
        let (pk, shares) = keygen(&ctx, 4, 1, &mut rng);
        let parts: Vec<PartialSignature> = shares[0..2]
            .iter()
            .map(|s| sign(&ctx, s, b"correct message"))
            .collect();
        let sig = aggregate(&parts, 2).unwrap();
        assert!(!verify(&ctx, &pk, &sig, b"tampered message"));
    }

    #[test]
    fn insufficient_partials_refuse_to_aggregate() {
        let ctx = PairingContext;
        let mut rng = rand_chacha::ChaCha12Rng::seed_from_u64(9);
        let (_, shares) = keygen(&ctx, 5, 3, &mut rng);
        let parts: Vec<PartialSignature> = shares[0..2]
            .iter()
            .map(|s| sign(&ctx, s, b"too few"))
            .collect();
        assert!(aggregate(&parts, 4).is_err());
    }

    #[test]
    fn share_scalars_reconstruct_the_master_secret() {
        let ctx = PairingContext;
        let mut rng = rand_chacha::ChaCha12Rng::seed_from_u64(11);
        let (pk, shares) = keygen(&ctx, 5, 2, &mut rng);
        let parts: Vec<(usize, Fr)> = shares[0..3].iter().map(|s| (s.index, s.scalar)).collect();
        let x = shamir::reconstruct_secret(&parts, 3).unwrap();
        assert_eq!(ctx.g2_pow(pk.g, x), pk.g_x);
    }

    #[test]
    fn public_key_roundtrips_through_wire_encoding() {
        let ctx = PairingContext;
        let mut rng = rand_chacha::ChaCha12Rng::seed_from_u64(13);
        let (pk, _) = keygen(&ctx, 3, 1, &mut rng);
        let mut buf = Vec::new();
        pk.serialize_compressed(&mut buf).unwrap();
        let decoded = PublicKey::deserialize_compressed(&buf[..]).unwrap();
        assert_eq!(decoded, pk);
        assert!(!pk.g.is_zero());
    }
}
