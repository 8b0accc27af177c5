//! Client code for siteintel.
//!
//! This crate provides the page fetch pipeline, prompt construction, and the
//! model service client used by the analysis server.

pub mod fetch;
pub mod model;
pub mod prompt;

pub use fetch::{
    FetchClient, FetchConfig, NormalizedUrl, PageContent, PageSource, check_resolved, clip_to_chars, is_allowed,
    normalize,
};
pub use model::{ModelClient, ModelConfig, ReportModel};
pub use prompt::{Message, Prompt, Role, build_prompt};
