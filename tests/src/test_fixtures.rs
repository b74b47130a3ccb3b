//! Test fixtures and configuration helpers
//!
//! Builds GSMTAP-framed Paging Requests the way a receiver front-end emits
//! them, and node configurations bound to loopback with ephemeral ports.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tmsimap_common::{Error, MasterConfig, SlaveConfig, Tmsi, UdpTransport};
use tmsimap_paging::GSMTAP_HEADER_LEN;

/// Wraps a Layer-3 message in a GSMTAP header.
pub fn gsmtap_frame(l3: &[u8]) -> Vec<u8> {
    let mut frame = vec![0u8; GSMTAP_HEADER_LEN];
    // version 2, header length in words, type GSM Um
    frame[0] = 0x02;
    frame[1] = 0x04;
    frame[2] = 0x01;
    frame.extend_from_slice(l3);
    frame
}

/// Sets the L2 pseudo length so every element after it is in bounds.
fn finish(mut l3: Vec<u8>) -> Vec<u8> {
    l3[0] = (l3.len() - 1) as u8;
    gsmtap_frame(&l3)
}

/// Paging Request Type 1 for `first`, optionally followed by a tagged
/// second TMSI.
pub fn paging1_frame(first: Tmsi, second: Option<Tmsi>) -> Vec<u8> {
    let mut l3 = vec![0x00, 0x06, 0x21, 0x00, 0x05, 0xf4];
    l3.extend_from_slice(&first.octets());
    if let Some(second) = second {
        l3.extend_from_slice(&[0x17, 0x05, 0xf4]);
        l3.extend_from_slice(&second.octets());
    }
    finish(l3)
}

/// Paging Request Type 2 for two TMSIs and an optional third.
pub fn paging2_frame(first: Tmsi, second: Tmsi, third: Option<Tmsi>) -> Vec<u8> {
    let mut l3 = vec![0x00, 0x06, 0x22, 0x00];
    l3.extend_from_slice(&first.octets());
    l3.extend_from_slice(&second.octets());
    match third {
        Some(third) => {
            l3.extend_from_slice(&[0x17, 0x05, 0xf4]);
            l3.extend_from_slice(&third.octets());
        }
        None => l3.extend_from_slice(&[0x2b, 0x2b, 0x2b]),
    }
    finish(l3)
}

/// Paging Request Type 3 for four TMSIs.
pub fn paging3_frame(tmsis: [Tmsi; 4]) -> Vec<u8> {
    let mut l3 = vec![0x00, 0x06, 0x24, 0x00];
    for tmsi in tmsis {
        l3.extend_from_slice(&tmsi.octets());
    }
    finish(l3)
}

/// An RR System Information Type 3, which carries no identities.
pub fn non_paging_frame() -> Vec<u8> {
    finish(vec![0x00, 0x06, 0x1b, 0x00, 0x01, 0x02, 0x03, 0x04])
}

/// Master configuration listening on an ephemeral loopback port.
pub fn test_master_config() -> MasterConfig {
    MasterConfig {
        listen_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
        listen_port: 0,
        ..MasterConfig::default()
    }
}

/// Slave configuration for a master at `master`, receiving frames on an
/// ephemeral loopback port.
pub fn test_slave_config(master: SocketAddr) -> SlaveConfig {
    SlaveConfig {
        master_addr: master.ip(),
        master_port: master.port(),
        local_port: 0,
        ..SlaveConfig::default()
    }
}

/// Stands in for a receiver front-end pushing frames to one slave.
pub struct FrameFeeder {
    transport: UdpTransport,
    target: SocketAddr,
}

impl FrameFeeder {
    /// Binds a loopback socket sending to `target`.
    pub async fn new(target: SocketAddr) -> Result<Self, Error> {
        let transport = UdpTransport::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)).await?;
        Ok(Self { transport, target })
    }

    /// Sends one frame.
    pub async fn send(&self, frame: &[u8]) -> Result<(), Error> {
        self.transport.send_to(frame, self.target).await
    }
}

#[cfg(test)]
mod tests {
    use tmsimap_paging::extract_tmsis;

    use super::*;

    fn t(value: u32) -> Tmsi {
        Tmsi::from_u32(value)
    }

    #[test]
    fn test_fixtures_decode_as_built() {
        assert_eq!(extract_tmsis(&paging1_frame(t(1), None)).unwrap(), vec![t(1)]);
        assert_eq!(
            extract_tmsis(&paging1_frame(t(1), Some(t(2)))).unwrap(),
            vec![t(1), t(2)]
        );
        assert_eq!(
            extract_tmsis(&paging2_frame(t(1), t(2), None)).unwrap(),
            vec![t(1), t(2)]
        );
        assert_eq!(
            extract_tmsis(&paging2_frame(t(1), t(2), Some(t(3)))).unwrap(),
            vec![t(1), t(2), t(3)]
        );
        assert_eq!(
            extract_tmsis(&paging3_frame([t(1), t(2), t(3), t(4)])).unwrap(),
            vec![t(1), t(2), t(3), t(4)]
        );
        assert!(extract_tmsis(&non_paging_frame()).unwrap().is_empty());
    }
}
