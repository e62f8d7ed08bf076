//! Hostbeat Tracker - the polling/detection loop
//!
//! This crate drives presence detection for statically configured hosts:
//! - ICMP echo probing with ARP table fallback per host
//! - Failure escalation repeated up to a configured retry budget
//! - A self-rescheduling scan loop that adapts its period to the host count

pub mod host;
pub mod runner;
pub mod scheduler;

pub use host::HostProber;
pub use runner::{ProbeOutput, ProbeRunner, SystemRunner};
pub use scheduler::{HostEntry, ScanConfig, ScanScheduler};
