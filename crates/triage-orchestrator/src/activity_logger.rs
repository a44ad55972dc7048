//! Activity Logger - Human-readable run log at `.triage/activity.md`
//!
//! Each completed run appends one entry:
//! - Input headline
//! - Node timings in execution order
//! - Failed fix attempts
//! - Report preview

use crate::workflow::RunOutcome;
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use triage_core::fail_open::fail_open;

/// Maximum character length of the report preview
const ACTIVITY_LOG_PREVIEW_CHARS: usize = 500;

/// Appends run summaries to a markdown file
#[derive(Debug, Clone)]
pub struct ActivityLogger {
    output_path: PathBuf,
}

impl ActivityLogger {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.output_path
    }

    /// Log a finished run
    ///
    /// This operation is fail-open - logging failures won't fail the run
    pub async fn log_run(&self, input: &str, outcome: &RunOutcome) {
        fail_open("activity_logger::log_run", || async {
            let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
            let headline = input.trim().lines().next().unwrap_or_default();

            let mut content = format!(
                "## Run {}\n**Time**: {}\n**Input**: {}\n\n",
                outcome.state.run_id(),
                timestamp,
                headline
            );

            let timings: Vec<String> = outcome
                .trace
                .iter()
                .map(|t| format!("{} ({} ms)", t.node, t.elapsed.as_millis()))
                .collect();
            content.push_str(&format!("**Nodes**: {}\n", timings.join(" → ")));
            content.push_str(&format!("**Failed fixes**: {}\n\n", outcome.failed_fixes));

            let preview = if outcome.report.chars().count() > ACTIVITY_LOG_PREVIEW_CHARS {
                let truncated: String = outcome
                    .report
                    .chars()
                    .take(ACTIVITY_LOG_PREVIEW_CHARS)
                    .collect();
                format!("{truncated}...")
            } else {
                outcome.report.clone()
            };

            content.push_str("**Report** (truncated):\n> ");
            content.push_str(&preview.replace('\n', "\n> "));
            content.push_str("\n\n---\n\n");

            self.append_internal(&content).await
        })
        .await;
    }

    async fn append_internal(&self, content: &str) -> triage_core::Result<()> {
        if let Some(parent) = self.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_path)
            .await?;

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
