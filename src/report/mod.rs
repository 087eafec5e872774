// backupper/src/report/mod.rs
pub(crate) mod mailer;

use chrono::Local;
use std::path::PathBuf;

/// What a successful backup left behind.
#[derive(Debug, Clone)]
pub struct BackupArtifact {
    /// Absolute path of the downloaded dump.
    pub path: PathBuf,
    /// Dump size in MiB, two decimals.
    pub size_mb: f64,
    /// Wall-clock seconds from connect through extra copy, two decimals.
    pub elapsed_secs: f64,
    /// Absolute path of the secondary copy, when one was configured.
    pub extra_copy: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum TargetOutcome {
    Success(BackupArtifact),
    Failed(String),
}

/// Per-target outcomes in processing order, one entry per enabled, selected
/// target. Built and returned by the backup flow, never shared.
#[derive(Debug, Default)]
pub struct Report {
    entries: Vec<(String, TargetOutcome)>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: &str, outcome: TargetOutcome) {
        self.entries.push((key.to_string(), outcome));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn success_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| matches!(outcome, TargetOutcome::Success(_)))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, TargetOutcome)> {
        self.entries.iter()
    }

    pub fn get(&self, key: &str) -> Option<&TargetOutcome> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, outcome)| outcome)
    }
}

pub fn subject(report: &Report) -> String {
    let total = report.len();
    let successes = report.success_count();
    let icon = if successes == total {
        "✅"
    } else if successes == 0 {
        "❌"
    } else {
        "⚠️"
    };
    format!(
        "[Backupper] {}/{} backups successfully completed {}",
        successes, total, icon
    )
}

pub fn body(report: &Report) -> String {
    let mut blocks = Vec::new();
    for (key, outcome) in report.iter() {
        let mut block = String::new();
        match outcome {
            TargetOutcome::Failed(error) => {
                block.push_str(&format!("❌ {}\n", key));
                block.push_str(&format!("{}\n", "=".repeat(80)));
                block.push_str("Backup FAILED!\n");
                block.push_str(&format!("  error: {}\n", error));
            }
            TargetOutcome::Success(artifact) => {
                block.push_str(&format!("✅ {}\n", key));
                block.push_str(&format!("{}\n", "=".repeat(80)));
                block.push_str("Backup SUCCESS!\n");
                block.push_str(&format!("  dump size: {} MB\n", artifact.size_mb));
                block.push_str(&format!("  time: {} seconds\n", artifact.elapsed_secs));
                block.push_str(&format!("  dump saved in: {}\n", artifact.path.display()));
                match &artifact.extra_copy {
                    Some(copy) => {
                        block.push_str(&format!("  extra copy in: {}\n", copy.display()))
                    }
                    None => block.push_str("  no extra copy has been made\n"),
                }
            }
        }
        blocks.push(block);
    }
    format!("Report for backups ({})\n\n{}", Local::now(), blocks.join("\n\n"))
}
