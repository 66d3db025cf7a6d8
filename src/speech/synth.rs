//! Speech synthesizer abstraction
//!
//! A `Synth` renders one utterance of speech markup at a time and blocks
//! until the audio has finished or the abort flag is raised. All methods
//! take `&self` so the queue can call `stop` from a cancelling thread while
//! the worker is blocked in `speak`.

use crate::queue::{AbortFlag, Playback};
use crate::{LexivoxError, Result};
use log::info;
use std::str::FromStr;

/// Speech synthesizer trait
///
/// All backends implement this to turn rewritten markup into audio.
pub trait Synth: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Set speech rate (0-100, where 50 is normal)
    fn set_rate(&self, rate: u8) -> Result<()>;

    /// Set speech volume (0-100)
    fn set_volume(&self, volume: u8) -> Result<()>;

    /// Select a voice by backend-specific name
    ///
    /// Fails with `VoiceSelection` when no such voice exists; the current
    /// voice stays active.
    fn set_voice(&self, name: &str) -> Result<()>;

    /// Locale of the active voice, when the backend knows it
    fn language(&self) -> Option<String>;

    /// Speak one utterance of SSML and wait for it to finish
    fn speak(&self, markup: &str, abort: &AbortFlag) -> Result<Playback>;

    /// Silence the current utterance immediately
    fn stop(&self) -> Result<()>;
}

/// Which backend `create_synth` should build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthKind {
    /// Native platform TTS, falling back to espeak-ng
    #[default]
    Auto,
    /// Platform TTS through the `tts` crate
    Native,
    /// espeak-ng subprocess with SSML input
    Espeak,
    /// Print markup to stdout instead of speaking
    Print,
}

impl FromStr for SynthKind {
    type Err = LexivoxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SynthKind::Auto),
            "native" => Ok(SynthKind::Native),
            "espeak" | "espeak-ng" => Ok(SynthKind::Espeak),
            "print" => Ok(SynthKind::Print),
            other => Err(LexivoxError::Config(format!(
                "Unknown speech backend '{}'",
                other
            ))),
        }
    }
}

/// Create a speech synthesizer
///
/// `Auto` tries, in order:
/// 1. Native TTS (Speech Dispatcher on Linux, AVFoundation on macOS,
///    SAPI on Windows)
/// 2. espeak-ng (reads SSML directly, so phoneme hints reach the engine)
pub fn create_synth(kind: SynthKind) -> Result<Box<dyn Synth>> {
    use super::backends::espeak::EspeakSynth;
    use super::backends::native::NativeSynth;
    use super::backends::transcript::TranscriptSynth;

    match kind {
        SynthKind::Native => Ok(Box::new(NativeSynth::new()?)),
        SynthKind::Espeak => Ok(Box::new(EspeakSynth::new()?)),
        SynthKind::Print => Ok(Box::new(TranscriptSynth::echoing())),
        SynthKind::Auto => {
            info!("Trying native TTS backend...");
            match NativeSynth::new() {
                Ok(synth) => {
                    info!("✓ Successfully initialized native TTS backend");
                    return Ok(Box::new(synth));
                }
                Err(e) => {
                    info!("✗ Native TTS backend unavailable: {}", e);
                }
            }

            info!("Trying espeak-ng backend...");
            match EspeakSynth::new() {
                Ok(synth) => {
                    info!("✓ Successfully initialized espeak-ng backend");
                    Ok(Box::new(synth))
                }
                Err(e) => Err(LexivoxError::Speech(format!(
                    "No speech backend available. Tried:\n\
                     1. Native TTS (install: sudo apt install speech-dispatcher)\n\
                     2. espeak-ng (install: sudo apt install espeak-ng)\n\
                     Error: {}",
                    e
                ))),
            }
        }
    }
}
