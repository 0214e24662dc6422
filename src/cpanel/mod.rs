//! cPanel UAPI `DNS` module: zone snapshots and serial-keyed TXT edits.
pub mod client;
pub mod encoding;
pub mod types;

pub use client::{CpanelClient, ZoneLock};
