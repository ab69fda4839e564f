//! Responder state machine (C4): `Starting -> AwaitShare -> Serving -> Exiting`.
//!
//! The socket(s) are injected by the caller (a real `UdpSocket` bound to `10.0.0.k+2` in the
//! `responder` binary, or a loopback pair in tests), so this module never touches the network
//! directly and is fully exercisable without a real `10.0.0.x` namespace.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use bls_core::{sign, PairingContext, SecretShare};
use bls_types::wire;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::error::ShareAcquisitionError;

/// The four states a responder passes through over its lifetime. Surfaced only for logging;
/// control flow lives in [`ResponderNode::acquire_share`] and [`ResponderNode::serve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderState {
    /// Checking for a persisted share.
    Starting,
    /// Blocking on the dealer for a fresh share.
    AwaitShare,
    /// Joined the multicast group, answering signing requests.
    Serving,
    /// Received the shutdown broadcast; about to return.
    Exiting,
}

/// A single responder node's share index and where its share is (or will be) persisted.
pub struct ResponderNode {
    ctx: PairingContext,
    /// This node's 1-based share index.
    pub node_index: usize,
    share_path: PathBuf,
}

impl ResponderNode {
    /// Builds a responder for the given share index, persisting/loading its share at
    /// `share_path` (conventionally `./share.key`).
    pub fn new(node_index: usize, share_path: impl Into<PathBuf>) -> Self {
        ResponderNode {
            ctx: PairingContext,
            node_index,
            share_path: share_path.into(),
        }
    }

    /// True iff a share has already been persisted on disk (testable property E5: "never emits
    /// a share request" iff this is true).
    pub async fn has_persisted_share(&self) -> bool {
        tokio::fs::metadata(&self.share_path).await.is_ok()
    }

    /// *Starting* + *AwaitShare*: load `share.key` if present, otherwise request a fresh share
    /// from the dealer over `key_socket` and persist the response.
    pub async fn acquire_share(
        &self,
        key_socket: &UdpSocket,
        dealer_addr: SocketAddr,
    ) -> Result<SecretShare, ShareAcquisitionError> {
        if let Some(scalar) = self.load_persisted_share().await? {
            tracing::info!(node_index = self.node_index, state = ?ResponderState::Starting, "loaded persisted share, skipping request");
            return Ok(SecretShare {
                index: self.node_index,
                scalar,
            });
        }

        tracing::info!(node_index = self.node_index, state = ?ResponderState::AwaitShare, %dealer_addr, "requesting share from dealer");
        key_socket
            .send_to(&[wire::SHARE_REQUEST], dealer_addr)
            .await?;

        let mut buf = [0u8; 256];
        let n = key_socket.recv(&mut buf).await?;
        let scalar = wire::decode_share_response(&self.ctx, &buf[..n])?;

        self.persist_share(&scalar).await?;
        Ok(SecretShare {
            index: self.node_index,
            scalar,
        })
    }

    async fn load_persisted_share(
        &self,
    ) -> Result<Option<bls_core::Fr>, ShareAcquisitionError> {
        match tokio::fs::read(&self.share_path).await {
            Ok(bytes) => Ok(Some(wire::decode_share_response(&self.ctx, &bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ShareAcquisitionError::PersistedShareUnreadable {
                path: path_display(&self.share_path),
                source,
            }),
        }
    }

    async fn persist_share(&self, scalar: &bls_core::Fr) -> Result<(), ShareAcquisitionError> {
        let bytes = wire::encode_share_response(&self.ctx, scalar);
        tokio::fs::write(&self.share_path, bytes)
            .await
            .map_err(|source| ShareAcquisitionError::PersistFailed {
                path: path_display(&self.share_path),
                source,
            })
    }

    /// *Serving*: answer signing requests received on `multicast_socket` until either the
    /// shutdown broadcast (`0xFF`) arrives or `shutdown` is cancelled externally (e.g. by
    /// `SIGTERM`). Replies are unicast to `dealer_initiator_addr`.
    pub async fn serve(
        &self,
        share: &SecretShare,
        multicast_socket: &UdpSocket,
        dealer_initiator_addr: SocketAddr,
        shutdown: CancellationToken,
    ) -> std::io::Result<()> {
        tracing::info!(node_index = self.node_index, state = ?ResponderState::Serving, "joined multicast group, serving signing requests");
        let mut buf = [0u8; 2048];
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(node_index = self.node_index, state = ?ResponderState::Exiting, "shutdown requested externally");
                    return Ok(());
                }
                recv = multicast_socket.recv_from(&mut buf) => {
                    let (n, _src) = recv?;
                    let datagram = &buf[..n];

                    if datagram == [wire::SHUTDOWN_ALL] {
                        tracing::info!(node_index = self.node_index, state = ?ResponderState::Exiting, "received shutdown broadcast");
                        shutdown.cancel();
                        return Ok(());
                    }

                    match wire::SigningRequest::decode(datagram) {
                        Ok(req) => {
                            let partial = sign(&self.ctx, share, &req.message);
                            let response = wire::SigningResponse { seq: req.seq, partial };
                            if let Err(error) = multicast_socket
                                .send_to(&response.encode(&self.ctx), dealer_initiator_addr)
                                .await
                            {
                                tracing::warn!(node_index = self.node_index, %error, "failed to send partial signature");
                            }
                        }
                        Err(error) => {
                            tracing::warn!(node_index = self.node_index, %error, "dropping malformed signing request");
                        }
                    }
                }
            }
        }
    }
}

fn path_display(path: &Path) -> String {
    path.display().to_string()
}
