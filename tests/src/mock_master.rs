//! Scripted master for slave tests
//!
//! Listens like a real master but lets the test decide exactly which bytes
//! go to the slave and inspect the replies.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use tmsimap_ctl::{ControlCommand, CrossReport};

use crate::test_utils::{TestResult, DEFAULT_TEST_TIMEOUT};

/// Listener slaves connect to.
pub struct MockMaster {
    listener: TcpListener,
}

impl MockMaster {
    /// Binds to an ephemeral loopback port.
    pub async fn bind() -> TestResult<Self> {
        let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)).await?;
        Ok(Self { listener })
    }

    /// Returns the address slaves should connect to.
    pub fn addr(&self) -> TestResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Waits for the next slave.
    pub async fn accept(&self) -> TestResult<MockSlaveLink> {
        let (stream, _) = timeout(DEFAULT_TEST_TIMEOUT, self.listener.accept()).await??;
        Ok(MockSlaveLink { stream })
    }
}

/// The master's end of one slave connection.
pub struct MockSlaveLink {
    stream: TcpStream,
}

impl MockSlaveLink {
    /// Sends raw bytes.
    pub async fn send_raw(&mut self, data: &[u8]) -> TestResult {
        self.stream.write_all(data).await?;
        Ok(())
    }

    /// Sends one encoded command.
    pub async fn send(&mut self, command: ControlCommand) -> TestResult {
        self.send_raw(command.encode().as_bytes()).await
    }

    /// Reads until a complete `CROSS` listing has arrived.
    ///
    /// The listing has no terminator, so reading stops once nothing more
    /// arrives for a short while.
    pub async fn read_report(&mut self) -> TestResult<CrossReport> {
        let mut text = String::new();
        let mut buf = [0u8; 1024];

        let n = timeout(DEFAULT_TEST_TIMEOUT, self.stream.read(&mut buf)).await??;
        text.push_str(&String::from_utf8_lossy(&buf[..n]));
        while let Ok(read) = timeout(Duration::from_millis(50), self.stream.read(&mut buf)).await {
            let n = read?;
            if n == 0 {
                break;
            }
            text.push_str(&String::from_utf8_lossy(&buf[..n]));
        }

        CrossReport::parse(&text).ok_or_else(|| format!("not a CROSS listing: {text:?}").into())
    }

    /// Asks for the correlation and returns it.
    pub async fn cross(&mut self) -> TestResult<CrossReport> {
        self.send(ControlCommand::Cross).await?;
        self.read_report().await
    }

    /// Returns true if the slave closed the connection within the timeout.
    pub async fn wait_closed(&mut self) -> bool {
        let mut buf = [0u8; 64];
        matches!(timeout(DEFAULT_TEST_TIMEOUT, self.stream.read(&mut buf)).await, Ok(Ok(0)))
    }
}
