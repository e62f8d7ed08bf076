//! Self-rescheduling scan passes over the configured host set

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use hostbeat_core::{DeviceId, PresenceSink};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::host::HostProber;
use crate::runner::ProbeRunner;

/// Floor added to the computed scan period
pub const BASE_SCAN_INTERVAL: Duration = Duration::from_secs(12);

/// One configured host: the identity it is reported under and its address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEntry {
    pub device_id: DeviceId,
    pub ip_address: String,
}

/// Scan loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Hosts to probe, in pass order
    pub hosts: Vec<HostEntry>,
    /// Ping-then-ARP rounds per host per pass
    pub ping_count: u32,
    /// Network interface to bind probes to
    pub interface: Option<String>,
    /// Delay between the end of one pass and the start of the next;
    /// computed from the host count when not set
    pub scan_interval: Option<Duration>,
}

/// Owns the host set and drives one probe pass per tick
pub struct ScanScheduler {
    hosts: Vec<HostProber>,
    interval: Duration,
    runner: Arc<dyn ProbeRunner>,
    sink: Arc<dyn PresenceSink>,
}

impl ScanScheduler {
    /// Build probers for every configured host and fix the scan interval
    ///
    /// Without an explicit interval the period scales with the worst-case
    /// pass cost: one second per host per retry round, plus the base
    /// interval.
    pub fn new(
        config: ScanConfig,
        runner: Arc<dyn ProbeRunner>,
        sink: Arc<dyn PresenceSink>,
    ) -> Self {
        let ping_count = config.ping_count.max(1);

        let hosts: Vec<HostProber> = config
            .hosts
            .iter()
            .map(|entry| {
                HostProber::new(
                    entry.device_id.clone(),
                    entry.ip_address.clone(),
                    ping_count,
                    config.interface.as_deref(),
                )
            })
            .collect();

        let interval = config.scan_interval.unwrap_or_else(|| {
            Duration::from_secs(hosts.len() as u64 * u64::from(ping_count)) + BASE_SCAN_INTERVAL
        });

        Self {
            hosts,
            interval,
            runner,
            sink,
        }
    }

    /// Delay between passes
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Hosts probed per pass
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Run one sequential pass over every host, returning how many were seen
    ///
    /// Probe failures are absorbed inside each check, so a pass always
    /// attempts every host and always runs to completion.
    pub async fn tick(&self) -> usize {
        debug!(hosts = self.hosts.len(), "Probe pass started");

        let mut seen = 0;
        for host in &self.hosts {
            if host.check(self.runner.as_ref(), self.sink.as_ref()).await {
                seen += 1;
            }
        }

        info!(seen, total = self.hosts.len(), "Probe pass complete");
        seen
    }

    /// Run the scan loop for the lifetime of the process
    ///
    /// Probes every host once immediately, then re-arms after every pass:
    /// the next pass starts `interval` after the previous one finished.
    /// Nothing inside a pass is fallible at this boundary, so the loop
    /// cannot stop on a bad host. There is no stop state; termination is
    /// process exit.
    pub async fn run(&self) -> Result<()> {
        info!(
            hosts = self.hosts.len(),
            interval_secs = self.interval.as_secs(),
            "Presence tracker started"
        );

        loop {
            self.tick().await;
            sleep(self.interval).await;
        }
    }
}
