//! Initiator / dealer state machine (C5): key distribution, then sequenced signing rounds.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;

use bls_core::{aggregate, verify, G1Affine, PairingContext, PublicKey, SecretShare};
use bls_types::{addr::NodeIndex, wire};
use tokio::net::UdpSocket;
use tokio::time::{Instant, Sleep};

use crate::error::DealerError;

/// Single-shot watchdog duration: if no partial advances the current round within this window,
/// the round is aborted and a new one begins.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_millis(50);

/// Counters and timing collected over a dealer run, used to print the harness-facing summary.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Number of rounds that collected `t+1` partials and produced a verified signature.
    pub sig_count: u64,
    /// Number of rounds that hit the watchdog or were discarded for insufficient partials.
    pub abort_count: u64,
    /// Wall-clock time spent running rounds.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Renders the exact three-line summary the outer harness parses.
    pub fn render(&self) -> String {
        let secs = self.elapsed.as_secs_f64();
        let rate = if secs > 0.0 {
            self.sig_count as f64 / secs
        } else {
            0.0
        };
        let abort_pct = if self.sig_count > 0 {
            100.0 * self.abort_count as f64 / self.sig_count as f64
        } else {
            0.0
        };
        format!(
            "Completed {} in {:.2} seconds.\nAverage is {:.2} signatures per second\nThere were {} aborts ({:.5}%)",
            self.sig_count, secs, rate, self.abort_count, abort_pct
        )
    }
}

/// Distributes shares to each requesting responder over `key_socket`, until every node in
/// `1..=n` has been served exactly once or `deadline` elapses.
pub async fn distribute_shares(
    n: usize,
    ctx: &PairingContext,
    key_socket: &UdpSocket,
    shares: &[SecretShare],
    deadline: Duration,
) -> Result<(), DealerError> {
    let all: HashSet<usize> = (1..=n).collect();
    let mut served: HashSet<usize> = HashSet::new();
    let mut buf = [0u8; 4];
    let timeout = tokio::time::sleep(deadline);
    tokio::pin!(timeout);

    while served.len() < n {
        tokio::select! {
            _ = &mut timeout => {
                let mut missing: Vec<usize> = all.difference(&served).copied().collect();
                missing.sort_unstable();
                return Err(DealerError::KeyDistributionIncomplete { missing });
            }
            recv = key_socket.recv_from(&mut buf) => {
                let (len, src) = recv?;
                if &buf[..len] != [wire::SHARE_REQUEST] {
                    continue;
                }
                let Some(index) = source_node_index(src) else { continue };
                if !(1..=n).contains(&index) {
                    continue;
                }
                let share = &shares[index - 1];
                let payload = wire::encode_share_response(ctx, &share.scalar);
                key_socket.send_to(&payload, src).await?;
                served.insert(index);
                tracing::info!(index, "served share request");
            }
        }
    }
    Ok(())
}

fn source_node_index(src: SocketAddr) -> Option<usize> {
    match src {
        SocketAddr::V4(v4) => NodeIndex::from_addr(*v4.ip()).map(|idx| idx.0),
        SocketAddr::V6(_) => None,
    }
}

/// Drives sequenced signing rounds for `runtime`, then returns the collected counters. Never
/// returns an `Err` for timeouts or insufficient partials (never fatal, per §7); only a fatal
/// aggregation-verification mismatch surfaces as one.
pub async fn run_signing_rounds(
    t: usize,
    messages: &[Vec<u8>],
    pk: &PublicKey,
    initiator_socket: &UdpSocket,
    multicast_socket: &UdpSocket,
    multicast_addr: SocketAddr,
    runtime: Duration,
) -> Result<RunSummary, DealerError> {
    let ctx = PairingContext;
    let mut sig_count: u64 = 0;
    let mut abort_count: u64 = 0;

    let mut seq: u8 = 0;
    let mut message_index: usize = 0;
    let mut signs: Vec<(usize, G1Affine)> = Vec::new();
    let mut first_round = true;

    let start = Instant::now();
    let deadline = tokio::time::sleep(runtime);
    tokio::pin!(deadline);
    let mut watchdog: Pin<Box<Sleep>> = Box::pin(tokio::time::sleep(WATCHDOG_TIMEOUT));

    initiate_new(
        t,
        messages,
        multicast_socket,
        multicast_addr,
        &mut seq,
        &mut message_index,
        &mut signs,
        &mut first_round,
        &mut abort_count,
        watchdog.as_mut(),
    )
    .await?;

    let mut buf = [0u8; 2048];
    loop {
        tokio::select! {
            _ = &mut deadline => {
                return Ok(RunSummary { sig_count, abort_count, elapsed: start.elapsed() });
            }
            _ = watchdog.as_mut() => {
                tracing::warn!(seq, "round watchdog expired, aborting");
                initiate_new(
                    t, messages, multicast_socket, multicast_addr,
                    &mut seq, &mut message_index, &mut signs, &mut first_round,
                    &mut abort_count, watchdog.as_mut(),
                ).await?;
            }
            recv = initiator_socket.recv_from(&mut buf) => {
                let (len, src) = recv?;
                let datagram = &buf[..len];

                if datagram == [wire::RESTART_REQUEST] {
                    tracing::info!("peer-initiated restart received");
                    initiate_new(
                        t, messages, multicast_socket, multicast_addr,
                        &mut seq, &mut message_index, &mut signs, &mut first_round,
                        &mut abort_count, watchdog.as_mut(),
                    ).await?;
                    continue;
                }

                let Some(index) = source_node_index(src) else { continue };
                let Ok(response) = wire::SigningResponse::decode(&ctx, datagram, index) else {
                    tracing::warn!(index, "dropping malformed signing response");
                    continue;
                };

                if response.seq != seq || signs.iter().any(|(i, _)| *i == index) {
                    continue;
                }

                watchdog.as_mut().reset(Instant::now() + WATCHDOG_TIMEOUT);
                signs.push((index, response.partial.sigma));

                if signs.len() == t + 1 {
                    let parts: Vec<bls_core::PartialSignature> = signs
                        .iter()
                        .map(|&(i, s)| bls_core::PartialSignature { index: i, sigma: s })
                        .collect();
                    let sig = aggregate(&parts, t + 1)
                        .map_err(|_| DealerError::VerificationFailed { seq })?;
                    let message = &messages[message_index];
                    if !verify(&ctx, pk, &sig, message) {
                        return Err(DealerError::VerificationFailed { seq });
                    }
                    sig_count += 1;
                    tracing::info!(seq, sig_count, "round signed and verified");

                    initiate_new(
                        t, messages, multicast_socket, multicast_addr,
                        &mut seq, &mut message_index, &mut signs, &mut first_round,
                        &mut abort_count, watchdog.as_mut(),
                    ).await?;
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn initiate_new(
    t: usize,
    messages: &[Vec<u8>],
    multicast_socket: &UdpSocket,
    multicast_addr: SocketAddr,
    seq: &mut u8,
    message_index: &mut usize,
    signs: &mut Vec<(usize, G1Affine)>,
    first_round: &mut bool,
    abort_count: &mut u64,
    mut watchdog: Pin<&mut Sleep>,
) -> Result<(), DealerError> {
    if !*first_round && signs.len() < t + 1 {
        *abort_count += 1;
        tracing::info!(seq = *seq, "aborted round");
    }
    *first_round = false;

    *seq = seq.wrapping_add(1);
    *message_index = (*seq as usize) % messages.len();
    signs.clear();

    let request = wire::SigningRequest {
        seq: *seq,
        message: messages[*message_index].clone(),
    };
    multicast_socket
        .send_to(&request.encode(), multicast_addr)
        .await?;

    watchdog.as_mut().reset(Instant::now() + WATCHDOG_TIMEOUT);
    Ok(())
}

/// Broadcasts the shutdown-all (`0xFF`) datagram to the multicast group.
pub async fn shutdown_all(
    multicast_socket: &UdpSocket,
    multicast_addr: SocketAddr,
) -> std::io::Result<()> {
    multicast_socket
        .send_to(&[wire::SHUTDOWN_ALL], multicast_addr)
        .await
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_render_guards_division_by_zero_signature_count() {
        let summary = RunSummary {
            sig_count: 0,
            abort_count: 4,
            elapsed: Duration::from_secs(2),
        };
        let rendered = summary.render();
        assert!(rendered.contains("There were 4 aborts (0.00000%)"));
    }

    #[test]
    fn summary_render_matches_expected_format() {
        let summary = RunSummary {
            sig_count: 10,
            abort_count: 1,
            elapsed: Duration::from_secs(2),
        };
        let rendered = summary.render();
        assert!(rendered.starts_with("Completed 10 in 2.00 seconds."));
        assert!(rendered.contains("Average is 5.00 signatures per second"));
        assert!(rendered.contains("There were 1 aborts (10.00000%)"));
    }
}
