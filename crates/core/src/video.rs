//! Video lookup for lessons.
//!
//! `VideoSearch` is the raw search backend; `VideoResolver` sits on top of it
//! and never fails: whatever goes wrong below degrades to "no videos".

use crate::course::VideoInfo;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use std::{path::PathBuf, sync::Arc};
use tokio::process::Command;
use tracing::{debug, warn};

/// Default number of candidate videos requested per lesson.
pub const DEFAULT_MAX_RESULTS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Thumbnail {
    pub url: Option<String>,
}

/// A search result as reported by the backend. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawVideoRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub duration_string: Option<String>,
}

impl RawVideoRecord {
    /// Converts the record, or returns `None` when it has no usable URL.
    pub fn into_video_info(self) -> Option<VideoInfo> {
        let url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .or(self.webpage_url.filter(|u| !u.trim().is_empty()))?;
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| url.clone());
        let thumbnail = self
            .thumbnail
            .or_else(|| self.thumbnails.into_iter().rev().find_map(|t| t.url));
        let duration = self
            .duration_string
            .or_else(|| self.duration.map(format_duration));

        Some(VideoInfo {
            title,
            url,
            thumbnail,
            duration,
        })
    }
}

/// Formats a length in seconds as `m:ss`, or `h:mm:ss` past the hour.
fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// The contract of a video search backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Returns up to `max_results` records for `keywords`, best match first.
    async fn search(&self, keywords: &str, max_results: usize) -> Result<Vec<RawVideoRecord>>;
}

/// Searches YouTube through the `yt-dlp` executable.
///
/// Runs in flat-playlist mode: only the search listing is fetched, so
/// duration and thumbnail data may be coarse or missing, but each search
/// completes in a fraction of the time a full extraction would take.
pub struct YtDlpSearch {
    program: PathBuf,
}

impl YtDlpSearch {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl VideoSearch for YtDlpSearch {
    async fn search(&self, keywords: &str, max_results: usize) -> Result<Vec<RawVideoRecord>> {
        debug!(%keywords, "Starting video search");
        let output = Command::new(&self.program)
            .args([
                "--flat-playlist",
                "--dump-json",
                "--quiet",
                "--no-warnings",
                "--ignore-errors",
            ])
            .arg(format!("ytsearch{max_results}:{keywords}"))
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.program.display()))?;

        if !output.status.success() && output.stdout.is_empty() {
            bail!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let records = parse_records(&String::from_utf8_lossy(&output.stdout));
        debug!(%keywords, count = records.len(), "Finished video search");
        Ok(records)
    }
}

/// Parses one JSON record per line, skipping lines that are not records.
fn parse_records(stdout: &str) -> Vec<RawVideoRecord> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<RawVideoRecord>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "Skipping malformed search record");
                None
            }
        })
        .collect()
}

/// Resolves lesson titles to candidate videos.
#[derive(Clone)]
pub struct VideoResolver {
    search: Arc<dyn VideoSearch>,
    max_results: usize,
}

impl VideoResolver {
    pub fn new(search: Arc<dyn VideoSearch>, max_results: usize) -> Self {
        Self {
            search,
            max_results,
        }
    }

    /// Looks up videos for one lesson. Never fails; errors yield an empty list.
    pub async fn resolve(&self, lesson_title: &str) -> Vec<VideoInfo> {
        match self.search.search(lesson_title, self.max_results).await {
            Ok(records) => records
                .into_iter()
                .filter_map(RawVideoRecord::into_video_info)
                .take(self.max_results)
                .collect(),
            Err(e) => {
                warn!(lesson = %lesson_title, error = %e, "Video search failed, continuing without videos");
                Vec::new()
            }
        }
    }
}
