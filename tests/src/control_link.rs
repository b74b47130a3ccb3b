//! Control link tests
//!
//! A real slave node connected to the scripted master, fed frames over its
//! front-end channel.

use std::time::Duration;

use integration_tests::{
    init_test_logging, non_paging_frame, paging1_frame, paging2_frame, paging3_frame, settle,
    test_slave_config, FrameFeeder, MockMaster, MockSlaveLink,
};
use tmsimap_common::Tmsi;
use tmsimap_ctl::ControlCommand;
use tmsimap_slave::{SlaveNode, StopReason};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

fn t(value: u32) -> Tmsi {
    Tmsi::from_u32(value)
}

struct Slave {
    link: MockSlaveLink,
    feeder: FrameFeeder,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<StopReason>,
}

async fn start_slave() -> Slave {
    let master = MockMaster::bind().await.expect("bind should succeed");
    let config = test_slave_config(master.addr().expect("addr"));

    let node = SlaveNode::start(&config).await.expect("slave should start");
    let frames = node.frames_addr().expect("frames addr");
    let link = master.accept().await.expect("slave should connect");

    let (shutdown, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(node.run(shutdown_rx));
    let feeder = FrameFeeder::new(frames).await.expect("feeder should bind");

    Slave {
        link,
        feeder,
        shutdown,
        handle,
    }
}

/// Records one window containing the given frames.
async fn record_window(slave: &mut Slave, frames: &[Vec<u8>]) {
    slave.link.send(ControlCommand::Start).await.expect("send START");
    settle().await;
    for frame in frames {
        slave.feeder.send(frame).await.expect("send frame");
    }
    settle().await;
    slave.link.send(ControlCommand::Stop).await.expect("send STOP");
    settle().await;
}

#[tokio::test]
async fn test_cross_with_fewer_than_two_windows_is_empty() {
    init_test_logging();
    let mut slave = start_slave().await;

    assert!(slave.link.cross().await.expect("cross").tmsis.is_empty());

    record_window(&mut slave, &[paging3_frame([t(1), t(2), t(3), t(4)])]).await;
    assert!(slave.link.cross().await.expect("cross").tmsis.is_empty());
}

#[tokio::test]
async fn test_all_paging_types_are_recorded() {
    init_test_logging();
    let mut slave = start_slave().await;

    let window = [
        paging1_frame(t(0x10), Some(t(0x11))),
        paging2_frame(t(0x20), t(0x21), Some(t(0x22))),
        paging3_frame([t(0x30), t(0x31), t(0x32), t(0x33)]),
        non_paging_frame(),
    ];
    record_window(&mut slave, &window).await;
    record_window(&mut slave, &window).await;

    let report = slave.link.cross().await.expect("cross");
    let expected: Vec<Tmsi> = [0x10, 0x11, 0x20, 0x21, 0x22, 0x30, 0x31, 0x32, 0x33]
        .into_iter()
        .map(t)
        .collect();
    assert_eq!(report.tmsis, expected);
}

#[tokio::test]
async fn test_idle_paging_filters_history() {
    init_test_logging();
    let mut slave = start_slave().await;

    record_window(&mut slave, &[paging2_frame(t(0xa), t(0xb), None)]).await;
    record_window(&mut slave, &[paging2_frame(t(0xa), t(0xc), None)]).await;
    record_window(&mut slave, &[paging2_frame(t(0xa), t(0xd), None)]).await;
    assert_eq!(slave.link.cross().await.expect("cross").tmsis, vec![t(0xa)]);

    // paged while idle: eliminated from every window
    slave.feeder.send(&paging1_frame(t(0xa), None)).await.expect("send frame");
    settle().await;
    assert!(slave.link.cross().await.expect("cross").tmsis.is_empty());
}

#[tokio::test]
async fn test_flush_clears_history() {
    init_test_logging();
    let mut slave = start_slave().await;

    let frame = paging3_frame([t(1), t(2), t(3), t(4)]);
    record_window(&mut slave, &[frame.clone()]).await;
    record_window(&mut slave, &[frame]).await;
    assert_eq!(slave.link.cross().await.expect("cross").tmsis.len(), 4);

    slave.link.send(ControlCommand::Flush).await.expect("send FLUSH");
    settle().await;
    assert!(slave.link.cross().await.expect("cross").tmsis.is_empty());
}

#[tokio::test]
async fn test_malformed_lines_do_not_break_the_link() {
    init_test_logging();
    let mut slave = start_slave().await;

    slave
        .link
        .send_raw(b"START\nCMD START 1\nCMD RXTUNE nine\nCMD NOPE\nCMD \n")
        .await
        .expect("send garbage");
    // a single command split over two writes
    slave.link.send_raw(b"CMD RXTU").await.expect("send partial");
    settle().await;
    slave.link.send_raw(b"NE 941600\n").await.expect("send rest");
    settle().await;

    let report = slave.link.cross().await.expect("link should still answer");
    assert!(report.tmsis.is_empty());
}

#[tokio::test]
async fn test_slave_stops_when_master_disconnects() {
    init_test_logging();
    let slave = start_slave().await;
    drop(slave.link);

    let reason = timeout(Duration::from_secs(5), slave.handle)
        .await
        .expect("slave should stop")
        .expect("no panic");
    assert_eq!(reason, StopReason::MasterDisconnected);
}

#[tokio::test]
async fn test_slave_shutdown_closes_link() {
    init_test_logging();
    let mut slave = start_slave().await;

    slave.shutdown.send(true).expect("slave alive");
    let reason = timeout(Duration::from_secs(5), slave.handle)
        .await
        .expect("slave should stop")
        .expect("no panic");
    assert_eq!(reason, StopReason::Shutdown);
    assert!(slave.link.wait_closed().await);
}
