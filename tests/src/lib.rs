//! Integration test framework for tmsimap
//!
//! This crate provides frame fixtures, a scripted master and helpers for
//! socket-level tests of the master and slave nodes over loopback.
//!
//! # Components
//!
//! - [`mock_master`] - Scripted control endpoint a real slave connects to
//! - [`test_fixtures`] - Paging frame builders and node configurations
//! - [`test_utils`] - Logging and timing helpers
//!
//! # Test Categories
//!
//! 1. **Control link tests** - A real slave driven by the scripted master
//! 2. **End-to-end scenarios** - A real master, real slaves and frame feeders

pub mod mock_master;
pub mod test_fixtures;
pub mod test_utils;

pub use mock_master::{MockMaster, MockSlaveLink};
pub use test_fixtures::{
    gsmtap_frame, non_paging_frame, paging1_frame, paging2_frame, paging3_frame, test_master_config,
    test_slave_config, FrameFeeder,
};
pub use test_utils::{init_test_logging, settle, TestResult, DEFAULT_TEST_TIMEOUT, SETTLE_TIME};
