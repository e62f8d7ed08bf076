//! Hostbeat Core - shared types for the presence tracker
//!
//! This crate provides the foundational types for the Hostbeat system:
//! - Device identity and probe source classification
//! - Presence reports and the sink interface consumed by the host application

pub mod device;
pub mod presence;

pub use device::{DeviceId, SourceKind};
pub use presence::{PresenceReport, PresenceSink};
