//! Speech backends

// Native TTS backend using the tts crate (cross-platform)
pub mod native;

// espeak-ng subprocess reading SSML
pub mod espeak;

// In-memory recorder for --print and tests
pub mod transcript;

pub use espeak::EspeakSynth;
pub use native::NativeSynth;
pub use transcript::TranscriptSynth;
