//! Per-host ping/ARP presence probing

use hostbeat_core::{DeviceId, PresenceReport, PresenceSink, SourceKind};
use tracing::{debug, info};

use crate::runner::ProbeRunner;

pub const PING_PROGRAM: &str = "ping";
pub const ARP_PROGRAM: &str = "arp";

/// Prober for a single configured host
///
/// Holds the host's identity and address, both fixed at construction, and
/// the probe argument lists derived from them.
pub struct HostProber {
    device_id: DeviceId,
    ip_address: String,
    retry_count: u32,
    ping_args: Vec<String>,
    arp_args: Vec<String>,
}

impl HostProber {
    /// Build a prober for one host
    ///
    /// `retry_count` is the number of ping-then-ARP escalation rounds per
    /// pass. When `interface` is set both commands are bound to it;
    /// otherwise probes go out the default route.
    pub fn new(
        device_id: DeviceId,
        ip_address: impl Into<String>,
        retry_count: u32,
        interface: Option<&str>,
    ) -> Self {
        let ip_address = ip_address.into();

        let mut ping_args = Vec::new();
        let mut arp_args = Vec::new();
        if let Some(iface) = interface {
            ping_args.extend(["-I".to_string(), iface.to_string()]);
            arp_args.extend(["-i".to_string(), iface.to_string()]);
        }
        ping_args.extend(["-n", "-q", "-c1", "-W1"].map(String::from));
        ping_args.push(ip_address.clone());
        arp_args.push("-n".to_string());
        arp_args.push(ip_address.clone());

        Self {
            device_id,
            ip_address,
            retry_count,
            ping_args,
            arp_args,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    /// Send one ICMP echo request, true iff the host replied
    ///
    /// A probe that cannot run at all counts as a miss, not an error.
    pub async fn ping(&self, runner: &dyn ProbeRunner) -> bool {
        match runner.run(PING_PROGRAM, &self.ping_args).await {
            Ok(output) => output.success,
            Err(e) => {
                debug!(ip = %self.ip_address, error = %e, "Ping did not run");
                false
            }
        }
    }

    /// Query the ARP table, true iff a MAC address shows up for the host
    pub async fn arp_lookup(&self, runner: &dyn ProbeRunner) -> bool {
        match runner.run(ARP_PROGRAM, &self.arp_args).await {
            Ok(output) => contains_mac(&output.combined()),
            Err(e) => {
                debug!(ip = %self.ip_address, error = %e, "ARP query did not run");
                false
            }
        }
    }

    /// Check presence with escalation: ping first, ARP table on a miss,
    /// repeated up to the retry budget
    ///
    /// Reports to `sink` on the first hit and stops immediately. Returns
    /// false once all rounds are exhausted without a hit; the host is then
    /// simply not reported this pass.
    pub async fn check(&self, runner: &dyn ProbeRunner, sink: &dyn PresenceSink) -> bool {
        for failed in 0..self.retry_count {
            if self.ping(runner).await {
                sink.report(PresenceReport::new(
                    self.device_id.clone(),
                    SourceKind::Router,
                ));
                info!(ip = %self.ip_address, "Ping OK");
                return true;
            }
            info!(ip = %self.ip_address, failed, "No ping reply");

            if self.arp_lookup(runner).await {
                sink.report(PresenceReport::new(
                    self.device_id.clone(),
                    SourceKind::Router,
                ));
                info!(ip = %self.ip_address, "ARP OK");
                return true;
            }
            info!(ip = %self.ip_address, "No MAC address found");
        }
        false
    }
}

/// True if `text` contains a MAC address token: six colon-separated groups
/// of one or two hex digits
fn contains_mac(text: &str) -> bool {
    text.split_whitespace().any(is_mac_token)
}

fn is_mac_token(token: &str) -> bool {
    let mut groups = 0;
    for group in token.split(':') {
        if group.is_empty() || group.len() > 2 || !group.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }
        groups += 1;
    }
    groups == 6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ProbeOutput;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const ARP_HIT: &str = "? (192.168.1.20) at aa:bb:cc:dd:ee:ff [ether] on eth0";
    const ARP_MISS: &str = "? (192.168.1.30) at <incomplete> on eth0";

    /// Runner with fixed ping/ARP behavior and per-program call counters
    struct FakeRunner {
        ping_success: bool,
        arp_output: &'static str,
        fail_spawn: bool,
        ping_calls: AtomicUsize,
        arp_calls: AtomicUsize,
    }

    impl FakeRunner {
        fn new(ping_success: bool, arp_output: &'static str) -> Self {
            Self {
                ping_success,
                arp_output,
                fail_spawn: false,
                ping_calls: AtomicUsize::new(0),
                arp_calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            let mut runner = Self::new(false, ARP_MISS);
            runner.fail_spawn = true;
            runner
        }
    }

    #[async_trait]
    impl ProbeRunner for FakeRunner {
        async fn run(&self, program: &str, _args: &[String]) -> Result<ProbeOutput> {
            match program {
                PING_PROGRAM => {
                    self.ping_calls.fetch_add(1, Ordering::SeqCst);
                    if self.fail_spawn {
                        return Err(anyhow!("spawn failed"));
                    }
                    Ok(ProbeOutput {
                        success: self.ping_success,
                        ..Default::default()
                    })
                }
                ARP_PROGRAM => {
                    self.arp_calls.fetch_add(1, Ordering::SeqCst);
                    if self.fail_spawn {
                        return Err(anyhow!("spawn failed"));
                    }
                    Ok(ProbeOutput {
                        success: true,
                        stdout: self.arp_output.to_string(),
                        stderr: String::new(),
                    })
                }
                other => panic!("unexpected program: {}", other),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        reports: Mutex<Vec<PresenceReport>>,
    }

    impl PresenceSink for RecordingSink {
        fn report(&self, report: PresenceReport) {
            self.reports.lock().unwrap().push(report);
        }
    }

    #[tokio::test]
    async fn test_ping_hit_reports_without_arp() {
        let runner = FakeRunner::new(true, ARP_MISS);
        let sink = RecordingSink::default();
        let host = HostProber::new(DeviceId::new("laptop"), "192.168.1.10", 3, None);

        assert!(host.check(&runner, &sink).await);

        let reports = sink.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].device_id.as_str(), "laptop");
        assert_eq!(reports[0].source, SourceKind::Router);
        assert_eq!(runner.ping_calls.load(Ordering::SeqCst), 1);
        assert_eq!(runner.arp_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_arp_fallback_reports_on_first_round() {
        let runner = FakeRunner::new(false, ARP_HIT);
        let sink = RecordingSink::default();
        let host = HostProber::new(DeviceId::new("phone"), "192.168.1.20", 3, None);

        assert!(host.check(&runner, &sink).await);

        let reports = sink.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].device_id.as_str(), "phone");
        assert_eq!(runner.ping_calls.load(Ordering::SeqCst), 1);
        assert_eq!(runner.arp_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_without_report() {
        let runner = FakeRunner::new(false, ARP_MISS);
        let sink = RecordingSink::default();
        let host = HostProber::new(DeviceId::new("tablet"), "192.168.1.30", 2, None);

        assert!(!host.check(&runner, &sink).await);

        assert!(sink.reports.lock().unwrap().is_empty());
        assert_eq!(runner.ping_calls.load(Ordering::SeqCst), 2);
        assert_eq!(runner.arp_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_retry_is_a_single_round() {
        let runner = FakeRunner::new(false, ARP_MISS);
        let sink = RecordingSink::default();
        let host = HostProber::new(DeviceId::new("tablet"), "192.168.1.30", 1, None);

        assert!(!host.check(&runner, &sink).await);

        assert_eq!(runner.ping_calls.load(Ordering::SeqCst), 1);
        assert_eq!(runner.arp_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_a_miss() {
        let runner = FakeRunner::failing();
        let sink = RecordingSink::default();
        let host = HostProber::new(DeviceId::new("laptop"), "192.168.1.10", 2, None);

        assert!(!host.check(&runner, &sink).await);

        assert!(sink.reports.lock().unwrap().is_empty());
        assert_eq!(runner.ping_calls.load(Ordering::SeqCst), 2);
        assert_eq!(runner.arp_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_command_args_without_interface() {
        let host = HostProber::new(DeviceId::new("a"), "10.0.0.2", 1, None);
        assert_eq!(host.ping_args, ["-n", "-q", "-c1", "-W1", "10.0.0.2"]);
        assert_eq!(host.arp_args, ["-n", "10.0.0.2"]);
    }

    #[test]
    fn test_command_args_with_interface() {
        let host = HostProber::new(DeviceId::new("a"), "10.0.0.2", 1, Some("eth0"));
        assert_eq!(
            host.ping_args,
            ["-I", "eth0", "-n", "-q", "-c1", "-W1", "10.0.0.2"]
        );
        assert_eq!(host.arp_args, ["-i", "eth0", "-n", "10.0.0.2"]);
    }

    #[test]
    fn test_mac_token_matching() {
        assert!(contains_mac(ARP_HIT));
        assert!(contains_mac("gateway 0:1:2:3:4:5 permanent"));
        assert!(!contains_mac(ARP_MISS));
        assert!(!contains_mac("aa:bb:cc:dd:ee"));
        assert!(!contains_mac("aa:bb:cc:dd:ee:ff:00"));
        assert!(!contains_mac("aa:bb:cc:dd:ee:fg"));
        assert!(!contains_mac("aaa:bb:cc:dd:ee:ff"));
        assert!(!contains_mac(""));
    }
}
