//! Subtitle parsing, lookup, and export.
//!
//! A subtitle file becomes an ordered sequence of [`Cue`] values, owned by a
//! [`SubtitleTrack`] for playback-time lookup, and can be re-exported as SRT
//! or WebVTT text.

pub mod srt;
pub mod track;
pub mod vtt;

use serde::{Deserialize, Serialize};

/// A single timed subtitle entry.
///
/// Times are seconds from the start of the media. Cues are immutable once
/// parsed; their lifetime is tied to one loaded media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    /// 1-based sequential index, reassigned from parse order.
    pub index: u32,
    /// Start of the cue interval, seconds.
    pub start_time: f64,
    /// End of the cue interval, seconds. Always after `start_time` in
    /// well-formed input.
    pub end_time: f64,
    /// Display text, internal line breaks joined with single spaces.
    pub text: String,
}

impl Cue {
    pub fn new(index: u32, start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            index,
            start_time,
            end_time,
            text: text.into(),
        }
    }

    /// Whether playback time `t` falls inside this cue (inclusive bounds).
    pub fn contains(&self, t: f64) -> bool {
        self.start_time <= t && t <= self.end_time
    }
}

pub use srt::{format_srt, parse_srt};
pub use track::SubtitleTrack;
pub use vtt::format_vtt;
