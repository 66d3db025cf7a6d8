//! Speech requests submitted by text sources

use crate::queue::Origin;

/// Voice parameters for one request
///
/// Unset fields leave the synthesizer's current setting alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceParams {
    /// Backend-specific voice name
    pub voice: Option<String>,

    /// Speech rate (0-100)
    pub rate: Option<u8>,

    /// Speech volume (0-100)
    pub volume: Option<u8>,
}

/// A piece of game text to be spoken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SayRequest {
    pub origin: Origin,

    /// Name of the character speaking, if known
    pub speaker: Option<String>,

    /// Raw text, before lexicon rewriting
    pub text: String,

    pub voice: VoiceParams,
}

impl SayRequest {
    pub fn new(origin: impl Into<Origin>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            speaker: None,
            text: text.into(),
            voice: VoiceParams::default(),
        }
    }

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    pub fn with_voice(mut self, voice: VoiceParams) -> Self {
        self.voice = voice;
        self
    }
}
