//! Network transport utilities
//!
//! Provides the datagram channel used for front-end frames and the
//! [`LinkHandler`] seam between the dispatcher loops and the node logic.
//! The loops own the sockets; handlers only see bytes and link ids.

use std::fmt;
use std::net::SocketAddr;

use bytes::Bytes;
use tokio::net::UdpSocket;

use crate::Error;

/// Largest datagram the front-end channel accepts.
const MAX_DATAGRAM_SIZE: usize = 65535;

/// Identifier of one control connection.
///
/// The master assigns ids in accept order; the slave only ever has link 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link-{}", self.0)
    }
}

/// What the transport loop should do with the outcome of a receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Nothing to send.
    None,
    /// Write these bytes back on the link the data arrived on.
    Reply(Bytes),
    /// Pass these bytes to the operator-facing output.
    Relay(Bytes),
}

/// Receive-side behaviour of a node attached to control links.
///
/// Implemented by the slave agent and the master controller. The dispatcher
/// loops depend only on this trait: they read from sockets, hand the bytes to
/// `on_receive`, carry out the returned [`LinkAction`] and call `on_close`
/// when the peer goes away.
pub trait LinkHandler {
    /// Handles bytes received on `link`.
    fn on_receive(&mut self, link: LinkId, data: &[u8]) -> LinkAction;

    /// Handles the peer on `link` closing the connection.
    fn on_close(&mut self, link: LinkId);
}

/// Datagram socket carrying GSMTAP frames from the receiver front-end.
///
/// Owns a receive buffer sized for the largest UDP payload so a frame is
/// never truncated.
pub struct UdpTransport {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Binds the frame socket.
    ///
    /// # Errors
    ///
    /// Fails if `addr` is in use or not local.
    pub async fn bind(addr: SocketAddr) -> Result<Self, Error> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self {
            socket,
            buf: vec![0u8; MAX_DATAGRAM_SIZE],
        })
    }

    /// Sends one datagram to `addr`.
    pub async fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<(), Error> {
        self.socket.send_to(data, addr).await?;
        Ok(())
    }

    /// Waits for the next frame and returns it with its sender.
    ///
    /// Cancel safe: a `tokio::select!` losing this branch drops no frame.
    pub async fn recv_from(&mut self) -> Result<(Bytes, SocketAddr), Error> {
        let (len, from) = self.socket.recv_from(&mut self.buf).await?;
        Ok((Bytes::copy_from_slice(&self.buf[..len]), from))
    }

    /// Returns the bound address, with the real port when bound to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }
}
