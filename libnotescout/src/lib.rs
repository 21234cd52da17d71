//! Notescout - find every post by a Xiaohongshu author
//!
//! Given a post link, a handle, a display name or a free-text query, this
//! library works out which account is meant and lists that account's posts
//! as canonical `explore/{id}?xsec_token=...` links. All platform access
//! goes through the [`platforms::NoteSource`] trait.

pub mod accumulator;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fields;
pub mod logging;
pub mod matcher;
pub mod note_url;
pub mod output;
pub mod platforms;
pub mod resolver;
pub mod shortlink;
pub mod types;

// Re-export commonly used types
pub use accumulator::NoteAccumulator;
pub use config::Config;
pub use error::{CollaboratorError, ConfigError, Result, ScoutError};
pub use matcher::{CandidateMatcher, SubstringMatcher};
pub use note_url::{normalize, PostUrl};
pub use output::OutputFormat;
pub use resolver::Resolver;
pub use types::{DiscoveryResult, Identity, PostSummary, RawPost, Strategy, UserCandidate};
