//! Reduce an [`AnalysisResult`] to the short summary shown in captions.

use crate::domain::analysis::{AnalysisResult, Track, TrackKind};
use std::fmt;

pub const EXTRACTION_FAILED: &str = "Could not extract MediaInfo (no media/track data).";
pub const NO_DETAILS: &str = "No specific MediaInfo details found.";

const VIDEO_NOT_FOUND: &str = "Video Track: Not found";
const AUDIO_LANGUAGES_HEADER: &str = "Audio Languages:";

/// Ordered summary lines. Rendered joined by `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    lines: Vec<String>,
}

impl Summary {
    fn single(line: &str) -> Self {
        Self {
            lines: vec![line.to_string()],
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Deterministic extraction: first video track's format, audio count, per-track languages.
    pub fn extract(result: &AnalysisResult) -> Self {
        let Some(tracks) = result.tracks.as_ref() else {
            return Self::single(EXTRACTION_FAILED);
        };

        let video = tracks.iter().find(|t| t.kind == TrackKind::Video);
        let audio: Vec<&Track> = tracks.iter().filter(|t| t.kind == TrackKind::Audio).collect();

        if video.is_none() && audio.is_empty() {
            return Self::single(NO_DETAILS);
        }

        let mut lines = Vec::with_capacity(3 + audio.len());
        lines.push(match video {
            Some(track) => format!(
                "- Video Format: {}",
                track.format.as_deref().unwrap_or("N/A")
            ),
            None => format!("- {}", VIDEO_NOT_FOUND),
        });
        lines.push(format!("- Audio Streams: {}", audio.len()));

        if !audio.is_empty() {
            lines.push(AUDIO_LANGUAGES_HEADER.to_string());
            for (i, track) in audio.iter().enumerate() {
                lines.push(format!("  Track {}: {}", i + 1, audio_language(track)));
            }
        }

        Self { lines }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

/// `Language_String` first, then `Language`; text before the first `/`, trimmed.
fn audio_language(track: &Track) -> String {
    let raw = track
        .language_string
        .as_deref()
        .filter(|s| !s.is_empty())
        .or(track.language.as_deref().filter(|s| !s.is_empty()));
    match raw {
        Some(lang) => {
            let simple = lang.split('/').next().unwrap_or_default().trim();
            if simple.is_empty() {
                "Unknown".to_string()
            } else {
                simple.to_string()
            }
        }
        None => "Unknown".to_string(),
    }
}
