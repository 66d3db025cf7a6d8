//! Error types for lexivox

use std::io;
use thiserror::Error;

/// Main error type for lexivox
#[derive(Error, Debug)]
pub enum LexivoxError {
    #[error("Malformed dictionary: {0}")]
    MalformedDictionary(String),

    #[error("Speech synthesis error: {0}")]
    Speech(String),

    #[error("Voice selection failed: {0}")]
    VoiceSelection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("Lexicon package error: {0}")]
    Package(String),

    #[error("Speech queue is shut down")]
    QueueClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for lexivox operations
pub type Result<T> = std::result::Result<T, LexivoxError>;

impl From<String> for LexivoxError {
    fn from(s: String) -> Self {
        LexivoxError::Other(s)
    }
}

impl From<&str> for LexivoxError {
    fn from(s: &str) -> Self {
        LexivoxError::Other(s.to_string())
    }
}

impl From<serde_yaml::Error> for LexivoxError {
    fn from(e: serde_yaml::Error) -> Self {
        LexivoxError::Package(format!("YAML error: {}", e))
    }
}
