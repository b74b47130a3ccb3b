//! Master controller
//!
//! Tracks the connected slaves and fans operator commands out to them. The
//! controller owns only the write side of each connection; the dispatcher
//! reads and reports back through the [`LinkHandler`] implementation.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use tmsimap_common::{LinkAction, LinkHandler, LinkId};
use tmsimap_ctl::ControlCommand;

/// How long one slave may hold up a broadcast before it is dropped.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// A slave connection as seen by the master.
struct Connection<W> {
    writer: W,
    peer: SocketAddr,
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Links the command was written to
    pub delivered: Vec<LinkId>,
    /// Links that failed and were dropped
    pub failed: Vec<LinkId>,
}

/// The set of connected slaves.
pub struct MasterController<W> {
    connections: BTreeMap<LinkId, Connection<W>>,
    next_id: u64,
    max_connections: usize,
    send_timeout: Duration,
}

impl<W: AsyncWrite + Unpin> MasterController<W> {
    /// Creates an empty controller with a soft cap on connections.
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: BTreeMap::new(),
            next_id: 0,
            max_connections,
            send_timeout: SEND_TIMEOUT,
        }
    }

    /// Replaces the per-slave send deadline.
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Returns the number of connected slaves.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns true if no slave is connected.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Returns true if `link` is connected.
    pub fn contains(&self, link: LinkId) -> bool {
        self.connections.contains_key(&link)
    }

    /// Returns the connected links in accept order.
    pub fn links(&self) -> Vec<LinkId> {
        self.connections.keys().copied().collect()
    }

    /// Returns the peer address of `link`.
    pub fn peer(&self, link: LinkId) -> Option<SocketAddr> {
        self.connections.get(&link).map(|c| c.peer)
    }

    /// Admits a slave connection and returns its link id.
    ///
    /// Connections beyond the soft cap are admitted with a warning.
    pub fn accept(&mut self, writer: W, peer: SocketAddr) -> LinkId {
        let link = LinkId(self.next_id);
        self.next_id += 1;

        if self.connections.len() >= self.max_connections {
            warn!(
                target: "tmsimap::ctrl",
                %link,
                %peer,
                max = self.max_connections,
                "Connection limit exceeded, accepting anyway"
            );
        }

        self.connections.insert(link, Connection { writer, peer });
        info!(target: "tmsimap::ctrl", %link, %peer, slaves = self.connections.len(), "A slave node connected");
        link
    }

    /// Sends `command` to every connected slave.
    ///
    /// Each slave is written independently. A slave whose write fails, or
    /// does not complete within the send timeout, is dropped and closed; the
    /// others still receive the command.
    pub async fn broadcast(&mut self, command: &ControlCommand) -> BroadcastReport {
        let line = command.encode();
        let mut report = BroadcastReport::default();

        for (&link, conn) in self.connections.iter_mut() {
            let sent = async {
                conn.writer.write_all(line.as_bytes()).await?;
                conn.writer.flush().await
            };
            match timeout(self.send_timeout, sent).await {
                Ok(Ok(())) => report.delivered.push(link),
                Ok(Err(e)) => {
                    warn!(target: "tmsimap::ctrl", %link, peer = %conn.peer, "Send failed: {}", e);
                    report.failed.push(link);
                }
                Err(_) => {
                    warn!(
                        target: "tmsimap::ctrl",
                        %link,
                        peer = %conn.peer,
                        timeout_ms = self.send_timeout.as_millis() as u64,
                        "Send timed out, slave is not reading"
                    );
                    report.failed.push(link);
                }
            }
        }

        for &link in &report.failed {
            self.remove(link).await;
        }

        debug!(
            target: "tmsimap::ctrl",
            command = %command,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Broadcast complete"
        );
        report
    }

    /// Drops `link` and shuts down its write side.
    ///
    /// Returns false if the link was not connected.
    pub async fn remove(&mut self, link: LinkId) -> bool {
        let Some(mut conn) = self.connections.remove(&link) else {
            return false;
        };
        let _ = conn.writer.shutdown().await;
        info!(target: "tmsimap::ctrl", %link, peer = %conn.peer, "Closed slave connection");
        true
    }

    /// Drops every connection.
    pub async fn close_all(&mut self) {
        for link in self.links() {
            self.remove(link).await;
        }
    }
}

impl<W: AsyncWrite + Unpin> LinkHandler for MasterController<W> {
    fn on_receive(&mut self, link: LinkId, data: &[u8]) -> LinkAction {
        info!(target: "tmsimap::ctrl", %link, bytes = data.len(), "Some slave says:");
        LinkAction::Relay(Bytes::copy_from_slice(data))
    }

    fn on_close(&mut self, link: LinkId) {
        if let Some(conn) = self.connections.remove(&link) {
            info!(target: "tmsimap::ctrl", %link, peer = %conn.peer, "A slave node disconnected");
        }
    }
}
