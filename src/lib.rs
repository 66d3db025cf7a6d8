//! lexivox - game text to speech
//!
//! Rewrites game text into SSML using pronunciation lexicons and plays it
//! through a per-backend queue that can be cancelled by text source.

pub mod backend;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod markup;
pub mod queue;
pub mod speech;

pub use error::{LexivoxError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "lexivox";
