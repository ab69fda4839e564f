//! End-to-end signing-round scenarios over real loopback multicast sockets: one in-process
//! `DealerNode` round driver racing several in-process responders, mirroring scenarios E1-E3.
//!
//! Key distribution is skipped here (it is covered by unit tests in `bls_node::dealer`); each
//! scenario constructs shares directly from a local `keygen` call, the same way the dealer
//! binary would after its distribution phase completes.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use bls_core::{keygen, PairingContext};
use bls_node::{responder::ResponderNode, dealer};
use bls_types::addr::MULTICAST_GROUP;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

/// Binds a UDP socket on `port` with `SO_REUSEADDR`/`SO_REUSEPORT` set, suitable for multiple
/// processes (here: multiple tasks in one test binary) to share a multicast port.
fn bind_shared(port: u16) -> UdpSocket {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).unwrap();
    socket.set_reuse_address(true).unwrap();
    #[cfg(unix)]
    socket.set_reuse_port(true).unwrap();
    socket.set_nonblocking(true).unwrap();
    socket
        .bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port).into())
        .unwrap();
    UdpSocket::from_std(socket.into()).unwrap()
}

fn join_multicast(socket: &UdpSocket) {
    socket
        .join_multicast_v4(MULTICAST_GROUP, Ipv4Addr::LOCALHOST)
        .unwrap();
    socket.set_multicast_loop_v4(true).unwrap();
}

struct Harness {
    multicast_port: u16,
    initiator_socket: UdpSocket,
    initiator_addr: SocketAddr,
}

impl Harness {
    async fn new(multicast_port: u16, initiator_port: u16) -> Self {
        let initiator_socket = bind_shared(initiator_port);
        Harness {
            multicast_port,
            initiator_socket,
            initiator_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, initiator_port)),
        }
    }

    fn multicast_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(MULTICAST_GROUP, self.multicast_port))
    }

    fn spawn_responder(&self, index: usize, scalar: bls_core::Fr) -> CancellationToken {
        let shutdown = CancellationToken::new();
        let responder_shutdown = shutdown.clone();
        let share = bls_core::SecretShare { index, scalar };
        let multicast_socket = bind_shared(self.multicast_port);
        join_multicast(&multicast_socket);
        let initiator_addr = self.initiator_addr;

        tokio::spawn(async move {
            let node = ResponderNode::new(index, format!("/tmp/never-used-share-{index}"));
            let _ = node
                .serve(&share, &multicast_socket, initiator_addr, responder_shutdown)
                .await;
        });
        shutdown
    }
}

#[tokio::test]
async fn e1_all_responders_up_signs_successfully() {
    let ctx = PairingContext;
    let mut rng = rand::thread_rng();
    let (pk, shares) = keygen(&ctx, 3, 1, &mut rng);

    let harness = Harness::new(16006, 26006).await;
    let send_socket = bind_shared(0);
    send_socket.set_multicast_ttl_v4(32).unwrap();

    let tokens: Vec<_> = shares
        .iter()
        .map(|s| harness.spawn_responder(s.index, s.scalar))
        .collect();

    let messages = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
    let summary = dealer::run_signing_rounds(
        1,
        &messages,
        &pk,
        &harness.initiator_socket,
        &send_socket,
        harness.multicast_addr(),
        Duration::from_secs(2),
    )
    .await
    .unwrap();

    assert!(summary.sig_count >= 1, "{summary:?}");
    assert_eq!(summary.abort_count, 0);

    for token in tokens {
        token.cancel();
    }
}

#[tokio::test]
async fn e2_two_offline_responders_never_reach_threshold() {
    // n=5, t=2 needs 3 partials per round; only 1 of 5 responders is started.
    let ctx = PairingContext;
    let mut rng = rand::thread_rng();
    let (pk, shares) = keygen(&ctx, 5, 2, &mut rng);

    let harness = Harness::new(16007, 26007).await;
    let send_socket = bind_shared(0);
    send_socket.set_multicast_ttl_v4(32).unwrap();

    let token = harness.spawn_responder(shares[0].index, shares[0].scalar);

    let messages = vec![b"only message".to_vec()];
    let summary = dealer::run_signing_rounds(
        2,
        &messages,
        &pk,
        &harness.initiator_socket,
        &send_socket,
        harness.multicast_addr(),
        Duration::from_millis(600),
    )
    .await
    .unwrap();

    assert_eq!(summary.sig_count, 0);
    assert!(summary.abort_count > 0);

    token.cancel();
}

#[tokio::test]
async fn e3_exactly_threshold_plus_one_responders_signs_every_round() {
    // n=5, t=2 needs exactly 3 partials; exactly 3 of 5 responders are started.
    let ctx = PairingContext;
    let mut rng = rand::thread_rng();
    let (pk, shares) = keygen(&ctx, 5, 2, &mut rng);

    let harness = Harness::new(16008, 26008).await;
    let send_socket = bind_shared(0);
    send_socket.set_multicast_ttl_v4(32).unwrap();

    let tokens: Vec<_> = shares[0..3]
        .iter()
        .map(|s| harness.spawn_responder(s.index, s.scalar))
        .collect();

    let messages = vec![b"round message".to_vec()];
    let summary = dealer::run_signing_rounds(
        2,
        &messages,
        &pk,
        &harness.initiator_socket,
        &send_socket,
        harness.multicast_addr(),
        Duration::from_secs(2),
    )
    .await
    .unwrap();

    assert!(summary.sig_count >= 1);

    for token in tokens {
        token.cancel();
    }
}
