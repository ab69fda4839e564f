//! Responder binary: acquires (or loads) its share, then serves signing requests until told to
//! shut down.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;

use bls_node::ResponderNode;
use bls_types::addr::{dealer_initiator_addr, dealer_key_addr, PORT_KEY, PORT_MULTICAST};
use clap::Parser;
use eyre::WrapErr as _;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

/// Binds a UDP socket on `port` with `SO_REUSEADDR` set, as required for the multicast socket
/// (multiple responders on the same host/interface must be able to join the same group/port).
fn bind_reusable(addr: SocketAddrV4) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    UdpSocket::from_std(socket.into())
}

/// Command-line and environment configuration for the responder process.
#[derive(Debug, Parser)]
struct ResponderConfig {
    /// This node's 1-based share index within the group. Normally derived by the outer harness
    /// from the container's assigned `10.0.0.{k+2}` address and passed through here, since a
    /// generic "find my own primary address" probe is brittle across container networks.
    #[clap(long, env = "NODE_INDEX")]
    node_index: usize,

    /// Where the persisted share is read from / written to.
    #[clap(long, env = "SHARE_PATH", default_value = "./share.key")]
    share_path: PathBuf,

    /// Local IPv4 address to bind the key-acquisition and multicast sockets on.
    #[clap(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    bind_addr: Ipv4Addr,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ResponderConfig::parse();
    tracing::info!(?config, "starting responder");

    let node = ResponderNode::new(config.node_index, config.share_path);
    let shutdown = CancellationToken::new();

    let share = {
        let key_socket = UdpSocket::bind(SocketAddrV4::new(config.bind_addr, PORT_KEY))
            .await
            .wrap_err("failed to bind key-acquisition socket")?;
        node.acquire_share(&key_socket, SocketAddr::V4(dealer_key_addr()))
            .await
            .wrap_err("failed to acquire share")?
    };
    tracing::info!(node_index = node.node_index, "share ready");

    let multicast_socket =
        bind_reusable(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, PORT_MULTICAST))
            .wrap_err("failed to bind multicast socket")?;
    multicast_socket
        .join_multicast_v4(bls_types::addr::MULTICAST_GROUP, config.bind_addr)
        .wrap_err("failed to join multicast group")?;
    multicast_socket.set_multicast_loop_v4(true)?;
    multicast_socket.set_multicast_ttl_v4(bls_types::addr::MULTICAST_TTL)?;

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received interrupt signal, shutting down");
            signal_shutdown.cancel();
        }
    });

    node.serve(
        &share,
        &multicast_socket,
        SocketAddr::V4(dealer_initiator_addr()),
        shutdown,
    )
    .await
    .wrap_err("signing-request serve loop failed")?;

    Ok(())
}
