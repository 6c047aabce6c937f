/// अनुवाद्य (anuvadya)
///
/// Subtitle generation, playback tooling, and natural-language scene search
/// for translated video. Talks to three external services over HTTP — a
/// subtitle-generation backend, an LLM completion API, and a fingerprint
/// service for piracy checks — and serves the scene-search API itself.

pub mod api;
pub mod config;
pub mod search;
pub mod services;
pub mod session;
pub mod subtitle;

// Re-export main types for easy access
pub use crate::config::Config;
pub use crate::search::{SceneMatch, SceneSearcher, SearchRequest, SearchStrategy};
pub use crate::services::{FingerprintClient, GenerationError, SubtitleGenerator};
pub use crate::session::{Role, Session, SessionManager};
pub use crate::subtitle::{format_srt, format_vtt, parse_srt, Cue, SubtitleTrack};
