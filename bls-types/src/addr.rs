//! Port numbers, multicast group, and node addressing for the signing protocol.
//!
//! Responder `k` (0-based) lives at `10.0.0.{k+2}`; the dealer lives at `10.0.0.254`. A node's
//! 1-based share index is `k+1`, i.e. `last_octet - 1`.

use std::net::{Ipv4Addr, SocketAddrV4};

/// Port both dealer and responder bind for share request/response (dealer inbound, responder
/// outbound-then-inbound).
pub const PORT_KEY: u16 = 5005;
/// Multicast port responders listen on for signing requests.
pub const PORT_MULTICAST: u16 = 5006;
/// Port the dealer binds for partial-signature and restart-notice traffic.
pub const PORT_INITIATOR: u16 = 5007;
/// Multicast group joined by every responder and used by the dealer to broadcast requests.
pub const MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(224, 1, 1, 1);
/// Multicast TTL used by both the dealer's send socket and the responder's join.
pub const MULTICAST_TTL: u32 = 32;

/// A responder's 1-based share index within the group, `1..=n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(pub usize);

impl NodeIndex {
    /// The IPv4 address conventionally assigned to this node by the outer harness:
    /// `10.0.0.{index+1}`.
    pub fn ipv4(self) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, (self.0 + 1) as u8)
    }

    /// Recovers a node index from its last IPv4 octet (`last_octet - 1`).
    pub fn from_last_octet(last_octet: u8) -> Option<Self> {
        last_octet.checked_sub(1).map(|i| NodeIndex(i as usize))
    }

    /// Recovers a node index from a full address, if it matches the `10.0.0.x` convention.
    pub fn from_addr(addr: Ipv4Addr) -> Option<Self> {
        let octets = addr.octets();
        if octets[0..3] == [10, 0, 0] {
            Self::from_last_octet(octets[3])
        } else {
            None
        }
    }
}

/// The dealer's fixed address, `10.0.0.254`.
pub const DEALER_ADDR: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 254);

/// The dealer's key-distribution socket address.
pub fn dealer_key_addr() -> SocketAddrV4 {
    SocketAddrV4::new(DEALER_ADDR, PORT_KEY)
}

/// The dealer's signing-round socket address (partials and restart notices arrive here).
pub fn dealer_initiator_addr() -> SocketAddrV4 {
    SocketAddrV4::new(DEALER_ADDR, PORT_INITIATOR)
}

/// The multicast socket address used for signing requests and the shutdown broadcast.
pub fn multicast_addr() -> SocketAddrV4 {
    SocketAddrV4::new(MULTICAST_GROUP, PORT_MULTICAST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_index_roundtrips_through_address() {
        for k in 0..10 {
            let idx = NodeIndex(k);
            let addr = idx.ipv4();
            assert_eq!(NodeIndex::from_addr(addr), Some(idx));
        }
    }

    #[test]
    fn non_convention_addresses_do_not_resolve() {
        assert_eq!(NodeIndex::from_addr(Ipv4Addr::new(192, 168, 0, 5)), None);
    }

    #[test]
    fn dealer_address_is_the_fixed_convention() {
        assert_eq!(DEALER_ADDR, Ipv4Addr::new(10, 0, 0, 254));
    }
}
