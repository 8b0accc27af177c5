//! Core types and shared functionality for siteintel.
//!
//! This crate provides:
//! - In-memory TTL cache for analysis results
//! - The site-intelligence report document
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod report;

pub use cache::ResultCache;
pub use config::{AppConfig, ConfigError};
pub use error::{Error, ErrorKind};
pub use report::{AnalysisResult, SiteReport};
