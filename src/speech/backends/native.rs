//! Native Rust TTS backend using the tts crate
//!
//! This backend uses the `tts` crate which provides a unified interface to:
//! - Speech Dispatcher on Linux (via native bindings)
//! - AVFoundation on macOS/iOS (via native bindings)
//! - SAPI/WinRT on Windows
//!
//! None of these accept SSML through the crate, so markup is flattened to
//! plain text first: aliases still apply, phoneme hints are lost.

use crate::markup::to_plain_text;
use crate::queue::{AbortFlag, CompletionSignal, Playback};
use crate::speech::Synth;
use crate::{LexivoxError, Result};
use log::{debug, error, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tts::{Tts as TtsCrate, UtteranceId};

/// How often the abort flag and `is_speaking` are checked
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Grace period before polling `is_speaking`, which reads false until the
/// engine has actually started
const START_DELAY: Duration = Duration::from_millis(50);

/// How the backend learns that an utterance has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndDetection {
    /// Utterance-end callback feeding the completion signal
    Callback,
    /// Polling `is_speaking`
    Polling,
    /// Neither is supported; speech is fire-and-forget
    None,
}

/// Native TTS backend using the tts crate
pub struct NativeSynth {
    /// The tts crate's TTS instance
    tts: Mutex<TtsCrate>,

    /// Set by the utterance-end callback
    finished: Arc<CompletionSignal>,

    end_detection: EndDetection,
}

impl NativeSynth {
    /// Create a new native TTS synthesizer
    ///
    /// Initializes the platform-appropriate TTS backend
    pub fn new() -> Result<Self> {
        debug!("Creating native TTS backend");

        let tts = TtsCrate::default()
            .map_err(|e| LexivoxError::Speech(format!("Failed to initialize TTS: {}", e)))?;

        let finished = Arc::new(CompletionSignal::new());
        let features = tts.supported_features();

        let end_detection = if features.utterance_callbacks {
            let signal = Arc::clone(&finished);
            tts.on_utterance_end(Some(Box::new(move |_id: UtteranceId| signal.complete())))
                .map_err(|e| {
                    LexivoxError::Speech(format!("Failed to register utterance callback: {}", e))
                })?;
            EndDetection::Callback
        } else if features.is_speaking {
            EndDetection::Polling
        } else {
            warn!("Platform TTS cannot report when speech ends; queue will not wait");
            EndDetection::None
        };

        debug!(
            "Native TTS backend created successfully (end detection: {:?})",
            end_detection
        );

        Ok(Self {
            tts: Mutex::new(tts),
            finished,
            end_detection,
        })
    }

    /// Convert rate (0-100) to the platform's rate range
    fn convert_rate(rate: u8, min: f32, max: f32) -> f32 {
        min + (max - min) * (rate.min(100) as f32 / 100.0)
    }

    /// Convert volume (0-100) to tts crate volume (0.0-1.0)
    fn convert_volume(volume: u8) -> f32 {
        volume.min(100) as f32 / 100.0
    }

    fn poll_until_silent(&self, abort: &AbortFlag) -> Result<Playback> {
        thread::sleep(START_DELAY);
        loop {
            if abort.is_aborted() {
                self.stop()?;
                return Ok(Playback::Aborted);
            }

            let speaking = self
                .tts
                .lock()
                .is_speaking()
                .map_err(|e| LexivoxError::Speech(format!("is_speaking failed: {}", e)))?;
            if !speaking {
                return Ok(Playback::Completed);
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Synth for NativeSynth {
    fn name(&self) -> &str {
        "native"
    }

    fn set_rate(&self, rate: u8) -> Result<()> {
        debug!("Setting rate to {}", rate);
        let mut tts = self.tts.lock();

        if !tts.supported_features().rate {
            warn!("Rate control not supported on this platform");
            return Ok(());
        }

        let converted = Self::convert_rate(rate, tts.min_rate(), tts.max_rate());
        tts.set_rate(converted)
            .map_err(|e| LexivoxError::Speech(format!("Failed to set rate: {}", e)))?;

        Ok(())
    }

    fn set_volume(&self, volume: u8) -> Result<()> {
        debug!("Setting volume to {}", volume);
        let mut tts = self.tts.lock();

        if !tts.supported_features().volume {
            warn!("Volume control not supported on this platform");
            return Ok(());
        }

        tts.set_volume(Self::convert_volume(volume))
            .map_err(|e| LexivoxError::Speech(format!("Failed to set volume: {}", e)))?;

        Ok(())
    }

    fn set_voice(&self, name: &str) -> Result<()> {
        debug!("Setting voice to {}", name);
        let mut tts = self.tts.lock();

        if !tts.supported_features().voice {
            return Err(LexivoxError::VoiceSelection(
                "voice selection not supported on this platform".to_string(),
            ));
        }

        let voices = tts
            .voices()
            .map_err(|e| LexivoxError::VoiceSelection(format!("Failed to get voices: {}", e)))?;

        let voice = voices
            .iter()
            .find(|v| v.name() == name || v.id() == name)
            .ok_or_else(|| {
                LexivoxError::VoiceSelection(format!(
                    "no voice named '{}' ({} available)",
                    name,
                    voices.len()
                ))
            })?;

        tts.set_voice(voice)
            .map_err(|e| LexivoxError::VoiceSelection(format!("Failed to set voice: {}", e)))?;

        Ok(())
    }

    fn language(&self) -> Option<String> {
        let tts = self.tts.lock();
        if !tts.supported_features().get_voice {
            return None;
        }

        match tts.voice() {
            Ok(voice) => voice.map(|v| v.language().to_string()),
            Err(e) => {
                debug!("Failed to read current voice: {}", e);
                None
            }
        }
    }

    fn speak(&self, markup: &str, abort: &AbortFlag) -> Result<Playback> {
        let text = to_plain_text(markup);
        if text.trim().is_empty() {
            return Ok(Playback::Completed);
        }

        debug!("Speaking: {}", text);
        self.finished.reset();
        self.tts.lock().speak(text, false).map_err(|e| {
            error!("Failed to speak: {}", e);
            LexivoxError::Speech(format!("Speak failed: {}", e))
        })?;

        match self.end_detection {
            EndDetection::Callback => {
                let outcome = self.finished.wait(abort, POLL_INTERVAL);
                if outcome == Playback::Aborted {
                    self.stop()?;
                }
                Ok(outcome)
            }
            EndDetection::Polling => self.poll_until_silent(abort),
            EndDetection::None => Ok(Playback::Completed),
        }
    }

    fn stop(&self) -> Result<()> {
        debug!("Canceling speech");
        self.tts.lock().stop().map_err(|e| {
            error!("Failed to cancel speech: {}", e);
            LexivoxError::Speech(format!("Cancel failed: {}", e))
        })?;

        Ok(())
    }
}
