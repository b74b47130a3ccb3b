//! Master dispatcher
//!
//! One task multiplexes the listener, the operator console, the slave
//! connections and the shutdown signal. Each slave connection gets a small
//! reader task that forwards [`LinkEvent`]s over a channel; every change to
//! the connection set happens here.

use std::collections::HashMap;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tmsimap_common::{Error, LinkAction, LinkHandler, LinkId, MasterConfig};
use tmsimap_ctl::{
    ConsoleCommand, ControlCommand, CLEAR_SCREEN, CONSOLE_HELP, CONSOLE_PROMPT, CONSOLE_UNKNOWN,
};

use crate::server::MasterController;

/// Capacity of the reader-to-dispatcher channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Read size for slave connections.
const LINK_READ_SIZE: usize = 4096;

/// Something that happened on a slave connection.
#[derive(Debug)]
pub enum LinkEvent {
    /// Bytes received from the slave
    Data(LinkId, Bytes),
    /// The slave closed the connection or the read failed
    Closed(LinkId),
}

/// Why the dispatcher returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The operator typed `exit`
    Exit,
    /// The console reached end of input
    ConsoleClosed,
    /// Shutdown was requested locally
    Shutdown,
    /// Writing to the operator output failed
    OutputClosed,
}

/// Binds the control listener.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn bind(config: &MasterConfig) -> Result<TcpListener, Error> {
    let addr = config.listen_socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| std::io::Error::new(e.kind(), format!("cannot listen on {addr}: {e}")))?;
    info!(target: "tmsimap::ctrl", "Listening for slaves on {}", listener.local_addr()?);
    Ok(listener)
}

/// The master node: controller, reader tasks and operator output.
pub struct MasterApp<O> {
    controller: MasterController<OwnedWriteHalf>,
    readers: HashMap<LinkId, JoinHandle<()>>,
    output: O,
}

impl<O: AsyncWrite + Unpin> MasterApp<O> {
    /// Creates a master writing operator output to `output`.
    pub fn new(max_connections: usize, output: O) -> Self {
        Self {
            controller: MasterController::new(max_connections),
            readers: HashMap::new(),
            output,
        }
    }

    /// Returns the controller.
    pub fn controller(&self) -> &MasterController<OwnedWriteHalf> {
        &self.controller
    }

    /// Runs the dispatcher until `exit`, console end of input, `shutdown` or
    /// a failed operator output, then closes every slave connection.
    ///
    /// `console` yields operator input one line at a time.
    pub async fn run(
        &mut self,
        listener: TcpListener,
        mut console: mpsc::Receiver<String>,
        mut shutdown: watch::Receiver<bool>,
    ) -> StopReason {
        let (events_tx, mut events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        info!(target: "tmsimap::app", "Init complete");
        let mut output_ok = self.write(CONSOLE_HELP).await;

        let reason = loop {
            if !output_ok || !self.write(CONSOLE_PROMPT).await {
                break StopReason::OutputClosed;
            }

            tokio::select! {
                _ = shutdown.changed() => {
                    break StopReason::Shutdown;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.admit(stream, peer, events_tx.clone()),
                        Err(e) => warn!(target: "tmsimap::ctrl", "Accept failed: {}", e),
                    }
                }
                Some(event) = events_rx.recv() => {
                    output_ok = self.handle_event(event).await;
                }
                line = console.recv() => {
                    let Some(line) = line else {
                        break StopReason::ConsoleClosed;
                    };
                    match self.handle_console(&line).await {
                        ConsoleOutcome::Continue => {}
                        ConsoleOutcome::Exit => break StopReason::Exit,
                        ConsoleOutcome::OutputFailed => output_ok = false,
                    }
                }
            }
        };

        info!(target: "tmsimap::app", ?reason, "Shutting down...");
        self.close_all().await;
        reason
    }

    fn admit(&mut self, stream: TcpStream, peer: std::net::SocketAddr, events: mpsc::Sender<LinkEvent>) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(target: "tmsimap::ctrl", %peer, "set_nodelay failed: {}", e);
        }
        let (reader, writer) = stream.into_split();
        let link = self.controller.accept(writer, peer);
        self.readers.insert(link, tokio::spawn(read_link(link, reader, events)));
    }

    /// Handles one link event. Returns false if relaying to the operator
    /// output failed.
    async fn handle_event(&mut self, event: LinkEvent) -> bool {
        match event {
            LinkEvent::Data(link, data) => {
                if !self.controller.contains(link) {
                    return true;
                }
                if let LinkAction::Relay(data) = self.controller.on_receive(link, &data) {
                    return self.write_bytes(&data).await;
                }
            }
            LinkEvent::Closed(link) => {
                self.controller.on_close(link);
                self.readers.remove(&link);
            }
        }
        true
    }

    async fn handle_console(&mut self, line: &str) -> ConsoleOutcome {
        let written = match ConsoleCommand::parse(line) {
            ConsoleCommand::Empty => true,
            ConsoleCommand::Help => self.write(CONSOLE_HELP).await,
            ConsoleCommand::Clear => self.write(CLEAR_SCREEN).await,
            ConsoleCommand::Exit => return ConsoleOutcome::Exit,
            ConsoleCommand::Broadcast(command) => {
                self.broadcast(&command).await;
                true
            }
            ConsoleCommand::Unknown(input) => {
                debug!(target: "tmsimap::app", input = %input, "Unknown console command");
                self.write(CONSOLE_UNKNOWN).await && self.write("\n").await
            }
        };
        if written {
            ConsoleOutcome::Continue
        } else {
            ConsoleOutcome::OutputFailed
        }
    }

    async fn broadcast(&mut self, command: &ControlCommand) {
        if self.controller.is_empty() {
            warn!(target: "tmsimap::ctrl", command = %command, "No slaves connected");
            return;
        }
        let report = self.controller.broadcast(command).await;
        for link in report.failed {
            if let Some(reader) = self.readers.remove(&link) {
                reader.abort();
            }
        }
    }

    async fn close_all(&mut self) {
        for (_, reader) in self.readers.drain() {
            reader.abort();
        }
        self.controller.close_all().await;
    }

    async fn write(&mut self, text: &str) -> bool {
        self.write_bytes(text.as_bytes()).await
    }

    /// Writes to the operator output. A failure is logged and reported as
    /// false; it never propagates out of the dispatcher.
    async fn write_bytes(&mut self, data: &[u8]) -> bool {
        let written = async {
            self.output.write_all(data).await?;
            self.output.flush().await
        };
        match written.await {
            Ok(()) => true,
            Err(e) => {
                warn!(target: "tmsimap::app", "Operator output failed: {}", e);
                false
            }
        }
    }
}

/// What the dispatcher does after a console line.
enum ConsoleOutcome {
    Continue,
    Exit,
    OutputFailed,
}

/// Forwards everything read from one slave to the dispatcher.
async fn read_link(link: LinkId, mut reader: OwnedReadHalf, events: mpsc::Sender<LinkEvent>) {
    let mut buf = vec![0u8; LINK_READ_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let data = Bytes::copy_from_slice(&buf[..n]);
                if events.send(LinkEvent::Data(link, data)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                debug!(target: "tmsimap::ctrl", %link, "Read failed: {}", e);
                break;
            }
        }
    }
    let _ = events.send(LinkEvent::Closed(link)).await;
}
