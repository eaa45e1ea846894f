//! Posts daily summaries to the gateway's `/ingest` in bounded-concurrency batches

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::config::DailyIngestConfig;
use crate::error::{Error, Result};
use crate::providers::retry_request;

use super::daily::DaySummary;

/// Characters of each summary shown in a dry run
const PREVIEW_CHARS: usize = 150;

#[derive(Deserialize)]
struct IngestReply {
    status: Option<String>,
}

/// Where summaries go
#[derive(Clone)]
enum Target {
    Http { client: Client, url: Arc<str> },
    Print,
}

/// Outcome of an upload run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub batches: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Batched uploader for [`DaySummary`] values
#[derive(Clone)]
pub struct SummaryUploader {
    target: Target,
    batch_size: usize,
    max_concurrent: usize,
    max_attempts: u32,
}

impl SummaryUploader {
    /// Build from config; `api_url = "PRINT_MODE"` prints instead of posting
    pub fn from_config(config: &DailyIngestConfig) -> Result<Self> {
        let target = if config.is_dry_run() {
            Target::Print
        } else {
            let client = Client::builder()
                .timeout(config.timeout())
                .build()
                .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
            Target::Http {
                client,
                url: Arc::from(config.api_url.as_str()),
            }
        };

        Ok(Self {
            target,
            batch_size: config.batch_size.max(1),
            max_concurrent: config.max_concurrent.max(1),
            max_attempts: config.max_attempts.max(1),
        })
    }

    /// Whether this uploader only prints
    pub fn is_dry_run(&self) -> bool {
        matches!(self.target, Target::Print)
    }

    /// Send every summary.
    ///
    /// Each batch is sent in windows of at most `max_concurrent` requests;
    /// a window finishes before the next starts. Failures are counted, not fatal.
    pub async fn upload(&self, summaries: &[DaySummary]) -> UploadReport {
        let mut report = UploadReport::default();

        for batch in summaries.chunks(self.batch_size) {
            tracing::info!("Processing batch of {} summaries", batch.len());
            report.batches += 1;

            for window in batch.chunks(self.max_concurrent) {
                let mut tasks = JoinSet::new();
                for summary in window {
                    let uploader = self.clone();
                    let summary = summary.clone();
                    tasks.spawn(async move { uploader.send(&summary).await });
                }

                let mut ok = 0;
                while let Some(joined) = tasks.join_next().await {
                    match joined {
                        Ok(Ok(())) => ok += 1,
                        Ok(Err(e)) => tracing::error!("Summary upload failed: {}", e),
                        Err(e) => tracing::error!("Upload task panicked: {}", e),
                    }
                }

                tracing::info!("Window completed: {}/{} successful", ok, window.len());
                report.sent += ok;
                report.failed += window.len() - ok;
            }
        }

        report
    }

    /// Send one summary with retries
    pub async fn send(&self, summary: &DaySummary) -> Result<()> {
        match &self.target {
            Target::Print => {
                let preview: String = summary.text.chars().take(PREVIEW_CHARS).collect();
                println!("[{} - {}] {}...", summary.user_id, summary.date, preview);
                Ok(())
            }
            Target::Http { client, url } => {
                let what = format!("ingest for {} on {}", summary.user_id, summary.date);
                retry_request(self.max_attempts - 1, &what, || {
                    post_summary(client, url, summary)
                })
                .await
            }
        }
    }
}

async fn post_summary(client: &Client, url: &str, summary: &DaySummary) -> Result<()> {
    let response = client.post(url).json(&summary.payload()).send().await?;
    let status = response.status();

    if status.is_client_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::invalid_input(format!("ingest rejected ({}): {}", status, body)));
    }
    if status != StatusCode::OK && status != StatusCode::CREATED {
        return Err(Error::vector_db(format!("ingest returned {}", status)));
    }

    let reply: IngestReply = response.json().await?;
    match reply.status.as_deref() {
        Some("ok") => Ok(()),
        other => Err(Error::vector_db(format!(
            "ingest replied with status {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PRINT_MODE;

    fn summary(user: &str) -> DaySummary {
        DaySummary {
            user_id: user.to_string(),
            date: "2024-03-01".to_string(),
            text: "x".repeat(400),
        }
    }

    #[tokio::test]
    async fn test_dry_run_counts_every_summary() {
        let config = DailyIngestConfig {
            api_url: PRINT_MODE.to_string(),
            batch_size: 2,
            ..Default::default()
        };
        let uploader = SummaryUploader::from_config(&config).unwrap();
        assert!(uploader.is_dry_run());

        let summaries: Vec<_> = ["u1", "u2", "u3"].iter().map(|u| summary(u)).collect();
        let report = uploader.upload(&summaries).await;

        assert_eq!(
            report,
            UploadReport {
                batches: 2,
                sent: 3,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_empty_input_sends_nothing() {
        let uploader = SummaryUploader::from_config(&DailyIngestConfig {
            api_url: PRINT_MODE.to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(uploader.upload(&[]).await, UploadReport::default());
    }
}
