//! Shamir secret sharing over Fr and Lagrange interpolation in the exponent.
//!
//! A degree-`t` polynomial `P(z) = secret + a_1*z + ... + a_t*z^t` is evaluated at
//! `z = 1..n` to produce `n` shares; any `t+1` of them reconstruct `P(0)` (or, in the
//! exponent, reconstruct `g^{P(0)}` from `g^{P(i)}` values) via Lagrange interpolation at 0.

use std::collections::HashSet;

use ark_ff::{One, Zero};
use itertools::Itertools as _;

use crate::pairing::{Fr, G1Affine, PairingContext};

/// Errors that can occur while combining shares or partial signatures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShamirError {
    /// Fewer than `t+1` entries were supplied for aggregation.
    #[error("insufficient shares: need at least {need}, got {have}")]
    InsufficientShares {
        /// Shares required.
        need: usize,
        /// Shares supplied.
        have: usize,
    },
    /// The same share index appeared more than once in the input.
    #[error("duplicate share index {0}")]
    DuplicateIndex(usize),
}

/// Evaluates a polynomial given by its coefficients (constant term first) at `x`, via
/// Horner's method.
pub fn evaluate_poly(coeffs: &[Fr], x: Fr) -> Fr {
    coeffs.iter().rev().fold(Fr::zero(), |acc, c| acc * x + c)
}

/// Draws a random degree-`t` polynomial with the given constant term and evaluates it at
/// `1..=n`, returning `(index, share)` pairs.
pub fn gen_shares<R: rand::Rng + rand::CryptoRng>(
    ctx: &PairingContext,
    n: usize,
    t: usize,
    secret: Fr,
    rng: &mut R,
) -> Vec<(usize, Fr)> {
    let mut coeffs = Vec::with_capacity(t + 1);
    coeffs.push(secret);
    for _ in 0..t {
        coeffs.push(ctx.random_fr(rng));
    }
    (1..=n)
        .map(|i| (i, evaluate_poly(&coeffs, ctx.fr_from_int(i as u64))))
        .collect()
}

/// The Lagrange coefficient `lambda_i = prod_{j != i} j * (j - i)^-1` for interpolation at
/// `x = 0`, given the set of contributing indices.
pub fn single_lagrange_coefficient(index: usize, indices: &[usize]) -> Fr {
    let i = Fr::from(index as u64);
    let mut num = Fr::one();
    let mut den = Fr::one();
    for &j in indices {
        if j == index {
            continue;
        }
        let jf = Fr::from(j as u64);
        num *= jf;
        den *= jf - i;
    }
    num * den.inverse().expect("indices are pairwise distinct")
}

/// All Lagrange coefficients for the given set of indices, in the same order.
pub fn lagrange_coefficients(indices: &[usize]) -> Vec<Fr> {
    indices
        .iter()
        .map(|&i| single_lagrange_coefficient(i, indices))
        .collect()
}

fn check_distinct(indices: &[usize], threshold_plus_one: usize) -> Result<(), ShamirError> {
    if indices.len() < threshold_plus_one {
        return Err(ShamirError::InsufficientShares {
            need: threshold_plus_one,
            have: indices.len(),
        });
    }
    let mut seen = HashSet::with_capacity(indices.len());
    for &i in indices {
        if !seen.insert(i) {
            return Err(ShamirError::DuplicateIndex(i));
        }
    }
    Ok(())
}

/// Reconstructs the scalar secret from `t+1` (index, share) pairs via Lagrange interpolation
/// at zero. Used in tests to check the keygen invariant `sum(lambda_i * s_i) == x`.
///
/// `threshold_plus_one` is the caller's expected `t+1`, independent of how many `parts` happen
/// to be supplied, so that supplying too few actually surfaces
/// [`ShamirError::InsufficientShares`] instead of trivially satisfying a length check against
/// itself.
pub fn reconstruct_secret(
    parts: &[(usize, Fr)],
    threshold_plus_one: usize,
) -> Result<Fr, ShamirError> {
    let indices: Vec<usize> = parts.iter().map(|(i, _)| *i).collect();
    check_distinct(&indices, threshold_plus_one)?;
    let lagrange = lagrange_coefficients(&indices);
    Ok(parts
        .iter()
        .zip(lagrange.iter())
        .map(|((_, share), l)| *share * l)
        .fold(Fr::zero(), |acc, term| acc + term))
}

/// Combines partial signatures (or any G1 shares of a secret-shared exponent) via Lagrange
/// interpolation in the exponent: `sigma = prod sigma_i^{lambda_i}`.
///
/// `threshold_plus_one` is the caller's expected `t+1`; fewer distinct `parts` than that is
/// rejected with [`ShamirError::InsufficientShares`] rather than silently interpolating a
/// lower-degree (cryptographically meaningless) polynomial.
pub fn aggregate(
    parts: &[(usize, G1Affine)],
    threshold_plus_one: usize,
) -> Result<G1Affine, ShamirError> {
    let indices: Vec<usize> = parts.iter().map(|(i, _)| *i).collect();
    check_distinct(&indices, threshold_plus_one)?;

    if parts.len() == 1 {
        return Ok(parts[0].1);
    }

    let lagrange = lagrange_coefficients(&indices);
    let mut acc = ark_bn254::G1Projective::zero();
    for ((_, sigma_i), lambda_i) in parts.iter().zip(lagrange.iter()) {
        acc += *sigma_i * lambda_i;
    }
    Ok(ark_ec::CurveGroup::into_affine(acc))
}
