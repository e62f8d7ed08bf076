//! Presence reports and the consumer-facing sink interface

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::{DeviceId, SourceKind};

/// A single detection of a device at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceReport {
    /// Device the detection is attributed to
    pub device_id: DeviceId,
    /// Detection method category
    pub source: SourceKind,
    /// When the detection happened
    pub seen_at: DateTime<Utc>,
}

impl PresenceReport {
    /// Create a report stamped with the current time
    pub fn new(device_id: DeviceId, source: SourceKind) -> Self {
        Self {
            device_id,
            source,
            seen_at: Utc::now(),
        }
    }
}

/// Consumer of presence reports
///
/// Implemented by the host application that tracks device state. The tracker
/// invokes this from its scheduling task on every successful detection; a
/// device that goes unreported is simply not seen that pass, and marking it
/// away is the consumer's own state model.
pub trait PresenceSink: Send + Sync {
    fn report(&self, report: PresenceReport);
}
