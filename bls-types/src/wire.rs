//! Datagram payloads exchanged between dealer and responders (§6 of the wire format).
//!
//! Every message is a thin byte-oriented encoding over [`bls_core`] field/curve
//! serialization; there is no framing beyond a fixed one-byte tag or prefix, since every
//! message travels as exactly one UDP datagram.

use bls_core::{PairingContext, PartialSignature};

use crate::error::WireError;

/// Sentinel byte for a share request (responder -> dealer) and for the shutdown-all broadcast
/// (dealer -> multicast group). The protocol reuses `0xFF` for both; they are distinguished by
/// which socket/direction receives them.
pub const SHARE_REQUEST: u8 = 0xFF;
/// Sentinel byte for the shutdown-all broadcast, same value as [`SHARE_REQUEST`].
pub const SHUTDOWN_ALL: u8 = SHARE_REQUEST;
/// Sentinel byte for a peer-initiated restart notice (responder -> dealer).
pub const RESTART_REQUEST: u8 = 0xFE;

/// `seq_byte || message_bytes`, dealer -> multicast group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// Current round sequence number.
    pub seq: u8,
    /// The message being signed this round.
    pub message: Vec<u8>,
}

impl SigningRequest {
    /// Encodes as `seq || message`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.message.len());
        buf.push(self.seq);
        buf.extend_from_slice(&self.message);
        buf
    }

    /// Decodes `seq || message`; any non-empty datagram is accepted (the message may be empty).
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let (&seq, message) = bytes
            .split_first()
            .ok_or(WireError::TooShort { len: bytes.len() })?;
        Ok(SigningRequest {
            seq,
            message: message.to_vec(),
        })
    }
}

/// `seq_byte || serialize(sigma)`, responder -> dealer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningResponse {
    /// Echoes the round's sequence number.
    pub seq: u8,
    /// This responder's partial signature.
    pub partial: PartialSignature,
}

impl SigningResponse {
    /// Encodes as `seq || serialize(sigma)`. The responder's own index is carried by the
    /// [`PartialSignature`] but is not re-derived from the datagram; callers derive it from the
    /// source address instead (see [`crate::addr::NodeIndex::from_addr`]), matching the source
    /// protocol's use of the UDP source address rather than an in-band index.
    pub fn encode(&self, ctx: &PairingContext) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + ctx.serialize_g1(&self.partial.sigma).len());
        buf.push(self.seq);
        buf.extend_from_slice(&ctx.serialize_g1(&self.partial.sigma));
        buf
    }

    /// Decodes `seq || serialize(sigma)`. The caller must supply the sender's index (recovered
    /// from the source address), since it is not encoded in the datagram itself.
    pub fn decode(
        ctx: &PairingContext,
        bytes: &[u8],
        index: usize,
    ) -> Result<Self, WireError> {
        let (&seq, sigma_bytes) = bytes
            .split_first()
            .ok_or(WireError::TooShort { len: bytes.len() })?;
        let sigma = ctx.deserialize_g1(sigma_bytes)?;
        Ok(SigningResponse {
            seq,
            partial: PartialSignature { index, sigma },
        })
    }
}

/// Encodes a share response: the raw canonical serialization of `s_i`.
pub fn encode_share_response(ctx: &PairingContext, scalar: &bls_core::Fr) -> Vec<u8> {
    ctx.serialize_fr(scalar)
}

/// Decodes a share response into the raw scalar.
pub fn decode_share_response(
    ctx: &PairingContext,
    bytes: &[u8],
) -> Result<bls_core::Fr, WireError> {
    Ok(ctx.deserialize_fr(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_request_roundtrips() {
        let req = SigningRequest {
            seq: 3,
            message: b"reboot drill".to_vec(),
        };
        assert_eq!(SigningRequest::decode(&req.encode()).unwrap(), req);
    }

    #[test]
    fn signing_request_rejects_empty_datagram() {
        assert!(matches!(
            SigningRequest::decode(&[]),
            Err(WireError::TooShort { len: 0 })
        ));
    }

    #[test]
    fn signing_response_roundtrips() {
        let ctx = PairingContext;
        let sigma = ctx.hash_to_g1(b"partial sig payload");
        let resp = SigningResponse {
            seq: 9,
            partial: PartialSignature { index: 4, sigma },
        };
        let bytes = resp.encode(&ctx);
        let decoded = SigningResponse::decode(&ctx, &bytes, 4).unwrap();
        assert_eq!(decoded, resp);
    }

    #[test]
    fn share_response_roundtrips() {
        let ctx = PairingContext;
        let mut rng = rand::thread_rng();
        let scalar = ctx.random_fr(&mut rng);
        let bytes = encode_share_response(&ctx, &scalar);
        assert_eq!(decode_share_response(&ctx, &bytes).unwrap(), scalar);
    }
}
