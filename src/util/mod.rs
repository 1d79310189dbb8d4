//! Small shared utilities: timing/formatting helpers and process resource
//! snapshots, used by progress reporting and the final report.

pub mod resource;
pub mod time;
