//! Clients for the external HTTP services the application consumes:
//! the subtitle-generation backend and the fingerprint (piracy detection /
//! ingestion) service. Both are consumed strictly through their HTTP
//! interfaces; nothing is retried automatically.

pub mod fingerprint;
pub mod generation;

pub use fingerprint::{FingerprintClient, IngestReceipt, MatchReport};
pub use generation::{GenerationError, SubtitleGenerator};
