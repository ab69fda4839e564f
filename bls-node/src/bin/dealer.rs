//! Dealer binary: generates the threshold key, distributes shares, drives signing rounds for a
//! fixed runtime, then prints the harness-facing summary and asks every responder to exit.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use bls_core::keygen;
use bls_node::dealer::{distribute_shares, run_signing_rounds, shutdown_all};
use bls_types::addr::{multicast_addr, PORT_INITIATOR, PORT_KEY};
use clap::Parser;
use eyre::WrapErr as _;
use tokio::net::UdpSocket;

/// Command-line and environment configuration for the dealer process.
#[derive(Debug, Parser)]
struct DealerConfig {
    /// Group size.
    #[clap(env = "SERVER_COUNT")]
    n: usize,

    /// Signing threshold; any `t+1` responders can produce a valid signature.
    #[clap(env = "THRESHOLD")]
    t: usize,

    /// How long to run signing rounds for, in seconds.
    #[clap(env = "RUNTIME")]
    runtime_seconds: u64,

    /// How long to wait for every responder to request its share before giving up.
    #[clap(long, env = "KEY_DISTRIBUTION_TIMEOUT", value_parser = humantime::parse_duration, default_value = "30s")]
    key_distribution_timeout: Duration,

    /// Messages to cycle through across signing rounds, comma-separated.
    #[clap(long, env = "MESSAGES", value_delimiter = ',', default_value = "signing-round")]
    messages: Vec<String>,

    /// Local IPv4 address to bind sockets on.
    #[clap(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    bind_addr: Ipv4Addr,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = DealerConfig::parse();
    tracing::info!(?config, "starting dealer");

    let ctx = bls_core::PairingContext;
    let mut rng = rand::thread_rng();
    let (pk, shares) = keygen(&ctx, config.n, config.t, &mut rng);
    tracing::info!(n = config.n, t = config.t, "generated threshold key");

    let key_socket = UdpSocket::bind(SocketAddrV4::new(config.bind_addr, PORT_KEY))
        .await
        .wrap_err("failed to bind key-distribution socket")?;
    distribute_shares(
        config.n,
        &ctx,
        &key_socket,
        &shares,
        config.key_distribution_timeout,
    )
    .await
    .wrap_err("key distribution did not complete")?;
    drop(key_socket);
    tracing::info!("all shares distributed");

    let initiator_socket = UdpSocket::bind(SocketAddrV4::new(config.bind_addr, PORT_INITIATOR))
        .await
        .wrap_err("failed to bind initiator socket")?;
    let multicast_socket = UdpSocket::bind(SocketAddrV4::new(config.bind_addr, 0))
        .await
        .wrap_err("failed to bind multicast send socket")?;
    multicast_socket.set_multicast_ttl_v4(bls_types::addr::MULTICAST_TTL)?;

    let messages: Vec<Vec<u8>> = config
        .messages
        .iter()
        .map(|m| m.as_bytes().to_vec())
        .collect();

    let summary = run_signing_rounds(
        config.t,
        &messages,
        &pk,
        &initiator_socket,
        &multicast_socket,
        SocketAddr::V4(multicast_addr()),
        Duration::from_secs(config.runtime_seconds),
    )
    .await
    .wrap_err("signing rounds failed")?;

    println!("{}", summary.render());

    shutdown_all(&multicast_socket, SocketAddr::V4(multicast_addr()))
        .await
        .wrap_err("failed to broadcast shutdown")?;

    Ok(())
}
