//! Structured analyzer output, reduced to the fields the summary consumes.

use serde::{Deserialize, Serialize};

/// Result of one analyzer run. `tracks` is `None` when the tool reported no track list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub tracks: Option<Vec<Track>>,
}

impl AnalysisResult {
    pub fn with_tracks(tracks: Vec<Track>) -> Self {
        Self {
            tracks: Some(tracks),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    General,
    Video,
    Audio,
    Text,
    Other,
}

impl TrackKind {
    /// Map the analyzer's `@type` label.
    pub fn from_label(label: &str) -> Self {
        match label {
            "General" => TrackKind::General,
            "Video" => TrackKind::Video,
            "Audio" => TrackKind::Audio,
            "Text" => TrackKind::Text,
            _ => TrackKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub kind: TrackKind,
    /// Codec/format name (video tracks).
    pub format: Option<String>,
    /// Language code, e.g. `fre`.
    pub language: Option<String>,
    /// Human-readable language, e.g. `English / eng`.
    pub language_string: Option<String>,
}

impl Track {
    pub fn video(format: Option<&str>) -> Self {
        Self {
            kind: TrackKind::Video,
            format: format.map(String::from),
            language: None,
            language_string: None,
        }
    }

    pub fn audio(language_string: Option<&str>, language: Option<&str>) -> Self {
        Self {
            kind: TrackKind::Audio,
            format: None,
            language: language.map(String::from),
            language_string: language_string.map(String::from),
        }
    }
}
