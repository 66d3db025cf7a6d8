//! In-memory backend that records utterances instead of speaking them
//!
//! Backs the `--print` mode of the binary and lets tests observe exactly
//! what markup would have reached an engine.

use crate::queue::{AbortFlag, Playback};
use crate::speech::Synth;
use crate::Result;
use log::debug;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Default)]
struct TranscriptState {
    utterances: Vec<String>,
    rate: Option<u8>,
    volume: Option<u8>,
    voice: Option<String>,
    stops: usize,
}

/// Recording synthesizer
#[derive(Debug, Clone, Default)]
pub struct TranscriptSynth {
    state: Arc<Mutex<TranscriptState>>,
    echo: bool,
    language: Option<String>,
}

impl TranscriptSynth {
    /// Record silently
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and print every utterance on stdout
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Report `language` as the voice locale
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Everything spoken so far, oldest first
    pub fn utterances(&self) -> Vec<String> {
        self.state.lock().utterances.clone()
    }

    pub fn voice(&self) -> Option<String> {
        self.state.lock().voice.clone()
    }

    pub fn rate(&self) -> Option<u8> {
        self.state.lock().rate
    }

    pub fn volume(&self) -> Option<u8> {
        self.state.lock().volume
    }

    /// How many times `stop` was called
    pub fn stop_count(&self) -> usize {
        self.state.lock().stops
    }
}

impl Synth for TranscriptSynth {
    fn name(&self) -> &str {
        "transcript"
    }

    fn set_rate(&self, rate: u8) -> Result<()> {
        self.state.lock().rate = Some(rate);
        Ok(())
    }

    fn set_volume(&self, volume: u8) -> Result<()> {
        self.state.lock().volume = Some(volume);
        Ok(())
    }

    fn set_voice(&self, name: &str) -> Result<()> {
        self.state.lock().voice = Some(name.to_string());
        Ok(())
    }

    fn language(&self) -> Option<String> {
        self.language.clone()
    }

    fn speak(&self, markup: &str, abort: &AbortFlag) -> Result<Playback> {
        if abort.is_aborted() {
            return Ok(Playback::Aborted);
        }

        debug!("Recording utterance: {}", markup);
        if self.echo {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", markup)?;
            stdout.flush()?;
        }

        self.state.lock().utterances.push(markup.to_string());
        Ok(Playback::Completed)
    }

    fn stop(&self) -> Result<()> {
        self.state.lock().stops += 1;
        Ok(())
    }
}
