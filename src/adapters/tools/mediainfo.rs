//! `mediainfo` CLI adapter. Implements MediaAnalyzer.
//!
//! Runs `mediainfo --Output=JSON <file>` and reduces the report to the track
//! fields the summary needs.

use crate::domain::{AnalysisError, AnalysisResult, Track, TrackKind};
use crate::ports::MediaAnalyzer;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error};

pub struct MediaInfoCli {
    bin: String,
    timeout: Duration,
}

impl MediaInfoCli {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaAnalyzer for MediaInfoCli {
    async fn analyze(&self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--Output=JSON")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                error!(bin = %self.bin, "analysis tool not found");
                return Err(AnalysisError::ToolNotFound(self.bin.clone()));
            }
            Ok(Err(e)) => return Err(AnalysisError::Unexpected(e.to_string())),
            Err(_) => {
                error!(path = %path.display(), secs = self.timeout.as_secs(), "analysis timed out");
                return Err(AnalysisError::Timeout(self.timeout.as_secs()));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(path = %path.display(), status = %output.status, %stderr, "analysis tool failed");
            return Err(AnalysisError::ToolExecution {
                status: output.status.to_string(),
                stderr,
            });
        }

        let result = parse_report(&output.stdout)?;
        debug!(
            path = %path.display(),
            tracks = result.tracks.as_ref().map_or(0, Vec::len),
            "analysis done"
        );
        Ok(result)
    }
}

#[derive(Deserialize)]
struct Report {
    media: Option<ReportMedia>,
}

#[derive(Deserialize)]
struct ReportMedia {
    track: Option<Vec<ReportTrack>>,
}

#[derive(Deserialize)]
struct ReportTrack {
    #[serde(rename = "@type", default)]
    kind: String,
    #[serde(rename = "Format")]
    format: Option<String>,
    #[serde(rename = "Language")]
    language: Option<String>,
    #[serde(rename = "Language_String")]
    language_string: Option<String>,
}

/// Decode a `--Output=JSON` report.
pub fn parse_report(raw: &[u8]) -> Result<AnalysisResult, AnalysisError> {
    let report: Report =
        serde_json::from_slice(raw).map_err(|e| AnalysisError::MalformedOutput(e.to_string()))?;
    let tracks = report.media.and_then(|m| m.track).map(|tracks| {
        tracks
            .into_iter()
            .map(|t| Track {
                kind: TrackKind::from_label(&t.kind),
                format: t.format,
                language: t.language,
                language_string: t.language_string,
            })
            .collect()
    });
    Ok(AnalysisResult { tracks })
}
