//! End-to-End Scenario Tests for tmsimap
//!
//! A real master and real slaves over loopback. The operator console is a
//! channel, the operator output a duplex stream, and each slave's receiver
//! front-end is a [`FrameFeeder`].
//!
//! These tests validate:
//! - Slave connection and broadcast of operator commands
//! - Recording windows across several slaves
//! - Correlation listings relayed back to the operator
//! - Orderly shutdown of the whole topology

use std::time::Duration;

use integration_tests::{
    init_test_logging, paging3_frame, settle, test_master_config, test_slave_config, FrameFeeder,
    DEFAULT_TEST_TIMEOUT,
};
use tmsimap_common::Tmsi;
use tmsimap_ctl::{CrossReport, CROSS_RESULT_HEADER};
use tmsimap_master::{bind, MasterApp, StopReason as MasterStop};
use tmsimap_slave::{SlaveNode, StopReason as SlaveStop};
use tokio::io::{AsyncReadExt, DuplexStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;

const TARGET: Tmsi = Tmsi::from_u32(0x11223344);
const BYSTANDER: Tmsi = Tmsi::from_u32(0xaabbccdd);

fn t(value: u32) -> Tmsi {
    Tmsi::from_u32(value)
}

struct Topology {
    console: mpsc::Sender<String>,
    output: DuplexStream,
    master: JoinHandle<MasterStop>,
    feeders: Vec<FrameFeeder>,
    slaves: Vec<JoinHandle<SlaveStop>>,
    _slave_shutdown: watch::Sender<bool>,
    _master_shutdown: watch::Sender<bool>,
}

impl Topology {
    async fn start(slaves: usize) -> Self {
        let config = test_master_config();
        let listener = bind(&config).await.expect("master should bind");
        let master_addr = listener.local_addr().expect("local addr");

        let (output_near, output) = tokio::io::duplex(256 * 1024);
        let (console, console_rx) = mpsc::channel(16);
        let (master_shutdown, master_shutdown_rx) = watch::channel(false);
        let master = tokio::spawn(async move {
            let mut app = MasterApp::new(config.max_connections, output_near);
            app.run(listener, console_rx, master_shutdown_rx).await
        });

        let (slave_shutdown, slave_shutdown_rx) = watch::channel(false);
        let mut feeders = Vec::new();
        let mut handles = Vec::new();
        for _ in 0..slaves {
            let node = SlaveNode::start(&test_slave_config(master_addr))
                .await
                .expect("slave should start");
            feeders.push(
                FrameFeeder::new(node.frames_addr().expect("frames addr"))
                    .await
                    .expect("feeder should bind"),
            );
            handles.push(tokio::spawn(node.run(slave_shutdown_rx.clone())));
        }
        settle().await;

        Self {
            console,
            output,
            master,
            feeders,
            slaves: handles,
            _slave_shutdown: slave_shutdown,
            _master_shutdown: master_shutdown,
        }
    }

    async fn operator(&self, line: &str) {
        self.console.send(line.to_string()).await.expect("master console alive");
        settle().await;
    }

    /// Reads everything the master has printed so far.
    async fn drain_output(&mut self) -> String {
        let mut text = String::new();
        let mut buf = [0u8; 4096];
        while let Ok(Ok(n)) = timeout(Duration::from_millis(100), self.output.read(&mut buf)).await {
            if n == 0 {
                break;
            }
            text.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
        text
    }
}

/// Extracts every `CROSS` listing from operator output.
fn reports(output: &str) -> Vec<CrossReport> {
    output
        .split(CROSS_RESULT_HEADER)
        .skip(1)
        .filter_map(|chunk| {
            let body = chunk.split("CTRL# ").next().unwrap_or_default();
            CrossReport::parse(&format!("{CROSS_RESULT_HEADER}{body}"))
        })
        .collect()
}

/// E2E Test: Target identification across two windows
///
/// The target is paged in both windows, the bystander only in the first.
/// Every slave must report the target and nothing else.
#[tokio::test]
async fn test_e2e_target_identified_across_windows() {
    init_test_logging();
    let mut topo = Topology::start(2).await;
    topo.drain_output().await;

    let windows = [
        [TARGET, BYSTANDER, t(1), t(2)],
        [TARGET, t(3), t(4), t(5)],
    ];
    for window in windows {
        topo.operator("paging start").await;
        for feeder in &topo.feeders {
            feeder.send(&paging3_frame(window)).await.expect("send frame");
        }
        settle().await;
        topo.operator("paging stop").await;
    }

    topo.operator("paging cross").await;
    let output = topo.drain_output().await;
    let reports = reports(&output);
    assert_eq!(reports.len(), 2, "one listing per slave in {output:?}");
    for report in reports {
        assert_eq!(report.tmsis, vec![TARGET]);
    }

    topo.operator("exit").await;
    let reason = timeout(DEFAULT_TEST_TIMEOUT, topo.master)
        .await
        .expect("master should stop")
        .expect("no panic");
    assert_eq!(reason, MasterStop::Exit);

    for slave in topo.slaves {
        let reason = timeout(DEFAULT_TEST_TIMEOUT, slave)
            .await
            .expect("slave should stop")
            .expect("no panic");
        assert_eq!(reason, SlaveStop::MasterDisconnected);
    }
}

/// E2E Test: Flush and retune are broadcast to every slave
#[tokio::test]
async fn test_e2e_flush_and_retune() {
    init_test_logging();
    let mut topo = Topology::start(3).await;

    for _ in 0..2 {
        topo.operator("paging start").await;
        for feeder in &topo.feeders {
            feeder
                .send(&paging3_frame([TARGET, t(7), t(8), t(9)]))
                .await
                .expect("send frame");
        }
        settle().await;
        topo.operator("paging stop").await;
    }

    topo.operator("rxtune 941600").await;
    topo.operator("paging flush").await;
    topo.drain_output().await;

    topo.operator("paging cross").await;
    let output = topo.drain_output().await;
    let reports = reports(&output);
    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.tmsis.is_empty()));
}

/// E2E Test: A slave leaving does not disturb the others
#[tokio::test]
async fn test_e2e_slave_departure() {
    init_test_logging();
    let mut topo = Topology::start(2).await;

    let leaving = topo.slaves.remove(0);
    leaving.abort();
    let _ = leaving.await;

    settle().await;
    topo.drain_output().await;
    topo.operator("paging cross").await;
    let output = topo.drain_output().await;
    assert_eq!(reports(&output).len(), 1, "only the remaining slave answers");

    drop(topo.console);
    let reason = timeout(DEFAULT_TEST_TIMEOUT, topo.master)
        .await
        .expect("master should stop")
        .expect("no panic");
    assert_eq!(reason, MasterStop::ConsoleClosed);
}
