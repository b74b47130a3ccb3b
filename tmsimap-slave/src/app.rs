//! Slave node lifecycle and dispatcher
//!
//! The dispatcher multiplexes the control connection to the master, the
//! front-end datagram channel and the shutdown signal on a single task. Each
//! event is handled to completion before the next wait.

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use tmsimap_common::{Error, LinkAction, LinkHandler, LinkId, SlaveConfig, UdpTransport};

use crate::agent::SlaveAgent;
use crate::radio::{Frontend, UdpFrontend};

/// The slave's only control link.
pub const MASTER_LINK: LinkId = LinkId(0);

/// Read size for the control connection.
const CONTROL_READ_SIZE: usize = 1024;

/// Why the dispatcher returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The master closed the control connection
    MasterDisconnected,
    /// Shutdown was requested locally
    Shutdown,
}

/// Runs the slave dispatcher until the master disconnects or `shutdown`
/// fires.
///
/// Control bytes go to the agent's [`LinkHandler`] implementation and its
/// replies are written back; every front-end datagram is handed to
/// [`SlaveAgent::handle_frame`]. Per-event failures are logged and never end
/// the loop, except a broken control connection.
pub async fn run_dispatcher<F, S>(
    agent: &mut SlaveAgent<F>,
    control: S,
    frames: &mut UdpTransport,
    mut shutdown: watch::Receiver<bool>,
) -> StopReason
where
    F: Frontend,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(control);
    let mut buf = vec![0u8; CONTROL_READ_SIZE];

    let reason = loop {
        tokio::select! {
            _ = shutdown.changed() => {
                break StopReason::Shutdown;
            }
            read = reader.read(&mut buf) => {
                let n = match read {
                    Ok(0) => {
                        agent.on_close(MASTER_LINK);
                        break StopReason::MasterDisconnected;
                    }
                    Ok(n) => n,
                    Err(e) => {
                        warn!(target: "tmsimap::ctrl", "Control read failed: {}", e);
                        agent.on_close(MASTER_LINK);
                        break StopReason::MasterDisconnected;
                    }
                };

                match agent.on_receive(MASTER_LINK, &buf[..n]) {
                    LinkAction::Reply(reply) => {
                        if let Err(e) = writer.write_all(&reply).await {
                            warn!(target: "tmsimap::ctrl", "Failed to reply to master: {}", e);
                            agent.on_close(MASTER_LINK);
                            break StopReason::MasterDisconnected;
                        }
                    }
                    LinkAction::Relay(data) => {
                        debug!(target: "tmsimap::ctrl", "Ignoring {} relay bytes", data.len());
                    }
                    LinkAction::None => {}
                }
            }
            frame = frames.recv_from() => {
                match frame {
                    Ok((data, _src)) => {
                        agent.handle_frame(&data);
                    }
                    Err(e) => {
                        warn!(target: "tmsimap::paging", "Front-end receive failed: {}", e);
                    }
                }
            }
        }
    };

    let _ = writer.shutdown().await;
    reason
}

/// A started slave node: connected to its master and listening for frames.
pub struct SlaveNode {
    agent: SlaveAgent<UdpFrontend>,
    control: TcpStream,
    frames: UdpTransport,
}

impl SlaveNode {
    /// Connects to the master, binds the front-end channel and opens the
    /// front-end.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three fails; nothing is left running.
    pub async fn start(config: &SlaveConfig) -> Result<Self, Error> {
        info!(target: "tmsimap::ctrl", "Init Control interface");
        let master = config.master_socket_addr();
        let control = TcpStream::connect(master)
            .await
            .map_err(|e| std::io::Error::new(e.kind(), format!("cannot connect to master at {master}: {e}")))?;
        control.set_nodelay(true)?;
        info!(target: "tmsimap::ctrl", "Connected to master at {}", master);

        info!(target: "tmsimap::radio", "Init Radio interface");
        let frontend = UdpFrontend::open(config.frontend.clone(), config.frontend_ctrl)?;

        info!(target: "tmsimap::paging", "Init TMSI Manager");
        let frames = UdpTransport::bind(config.frontend_bind_addr()).await?;
        info!(target: "tmsimap::paging", "Listening for frames on {}", frames.local_addr()?);

        Ok(Self {
            agent: SlaveAgent::new(frontend),
            control,
            frames,
        })
    }

    /// Returns the address the front-end channel is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be retrieved.
    pub fn frames_addr(&self) -> Result<SocketAddr, Error> {
        self.frames.local_addr()
    }

    /// Runs until the master disconnects or `shutdown` fires, then stops the
    /// front-end and closes the control connection.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> StopReason {
        let Self {
            mut agent,
            control,
            mut frames,
        } = self;

        info!(target: "tmsimap::app", "Init complete, entering main loop...");
        let reason = run_dispatcher(&mut agent, control, &mut frames, shutdown).await;

        info!(target: "tmsimap::app", ?reason, "Shutting down...");
        agent.shutdown();
        reason
    }
}
