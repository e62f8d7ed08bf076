//! External process invocation for probe commands

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

/// Exit status and captured output of one probe command
#[derive(Debug, Clone, Default)]
pub struct ProbeOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProbeOutput {
    /// Both output streams joined, for textual scanning
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            text.push('\n');
            text.push_str(&self.stderr);
        }
        text
    }
}

/// Capability to run one external probe command to completion
///
/// Injected into the probers so tests can substitute a scripted runner
/// without spawning real binaries.
#[async_trait]
pub trait ProbeRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<ProbeOutput>;
}

/// Runner that spawns the platform binaries
pub struct SystemRunner;

#[async_trait]
impl ProbeRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ProbeOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("failed to run {}", program))?;

        Ok(ProbeOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
