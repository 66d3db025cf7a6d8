//! espeak-ng backend
//!
//! Spawns one `espeak-ng -m` process per utterance, so the rewritten SSML is
//! read as markup rather than spoken tag by tag. On WSL with WSLg the
//! PulseAudio server is picked up from /mnt/wslg/PulseServer.
//!
//! Dependencies:
//! - espeak-ng (install with: sudo apt install espeak-ng)

use crate::queue::{AbortFlag, Playback};
use crate::speech::Synth;
use crate::{LexivoxError, Result};
use log::{debug, error, info};
use parking_lot::Mutex;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

/// How often a running utterance is checked for exit or abort
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
struct EspeakSettings {
    rate: u8,
    volume: u8,
    voice: String,
}

/// espeak-ng subprocess synthesizer
pub struct EspeakSynth {
    /// Currently running espeak-ng process
    current_process: Mutex<Option<Child>>,

    settings: Mutex<EspeakSettings>,

    /// Path to espeak-ng
    espeak_path: String,
}

impl EspeakSynth {
    /// Point PulseAudio clients at the WSLg server when nothing else is set
    fn setup_pulseaudio() {
        const WSLG_PULSE_PATH: &str = "/mnt/wslg/PulseServer";

        if std::env::var("PULSE_SERVER").is_ok() {
            debug!("PULSE_SERVER already set via environment");
            return;
        }

        if std::path::Path::new(WSLG_PULSE_PATH).exists() {
            info!("Auto-detected WSLG PulseAudio server at {}", WSLG_PULSE_PATH);
            std::env::set_var("PULSE_SERVER", WSLG_PULSE_PATH);
        }
    }

    /// Create a new espeak-ng synthesizer
    ///
    /// Fails when no espeak-ng executable can be run.
    pub fn new() -> Result<Self> {
        debug!("Creating espeak-ng backend");

        Self::setup_pulseaudio();

        let espeak_path = Self::find_espeak()?;
        debug!("Found espeak-ng at: {}", espeak_path);

        Ok(Self {
            current_process: Mutex::new(None),
            settings: Mutex::new(EspeakSettings {
                rate: 50,
                volume: 80,
                voice: "en".to_string(),
            }),
            espeak_path,
        })
    }

    /// Find espeak-ng executable
    fn find_espeak() -> Result<String> {
        let paths = ["espeak-ng", "/usr/bin/espeak-ng"];

        for path in paths {
            if let Ok(status) = Command::new(path)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
            {
                if status.success() {
                    return Ok(path.to_string());
                }
            }
        }

        Err(LexivoxError::Speech(
            "espeak-ng not found. Install with: sudo apt install espeak-ng".to_string(),
        ))
    }

    /// Convert rate (0-100) to espeak speed (80-450 wpm)
    fn rate_to_espeak_speed(rate: u8) -> u16 {
        80 + ((rate.min(100) as u16) * 370 / 100)
    }

    /// Convert volume (0-100) to espeak amplitude (0-200)
    fn volume_to_espeak_amplitude(volume: u8) -> u8 {
        ((volume.min(100) as u16 * 200) / 100) as u8
    }

    /// Build the espeak-ng invocation for one utterance
    fn command(&self, markup: &str) -> Command {
        let settings = self.settings.lock().clone();

        let mut cmd = Command::new(&self.espeak_path);
        cmd.arg("-m");
        cmd.arg("-v").arg(&settings.voice);
        cmd.arg("-s")
            .arg(Self::rate_to_espeak_speed(settings.rate).to_string());
        cmd.arg("-a")
            .arg(Self::volume_to_espeak_amplitude(settings.volume).to_string());
        cmd.arg("--").arg(markup);
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        cmd
    }

    /// Kill the running espeak-ng process, if any
    fn cancel_process(&self) {
        if let Some(mut child) = self.current_process.lock().take() {
            debug!("Killing espeak-ng process");
            match child.kill() {
                Ok(_) => {
                    let _ = child.wait(); // Clean up zombie
                }
                Err(e) => {
                    debug!("Failed to kill espeak-ng process: {}", e);
                }
            }
        }
    }
}

impl Synth for EspeakSynth {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    fn set_rate(&self, rate: u8) -> Result<()> {
        debug!("Setting rate to {}", rate);
        self.settings.lock().rate = rate;
        Ok(())
    }

    fn set_volume(&self, volume: u8) -> Result<()> {
        debug!("Setting volume to {}", volume);
        self.settings.lock().volume = volume;
        Ok(())
    }

    fn set_voice(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LexivoxError::VoiceSelection(
                "empty espeak-ng voice name".to_string(),
            ));
        }
        debug!("Setting voice to {}", name);
        self.settings.lock().voice = name.to_string();
        Ok(())
    }

    fn language(&self) -> Option<String> {
        language_tag(&self.settings.lock().voice)
    }

    fn speak(&self, markup: &str, abort: &AbortFlag) -> Result<Playback> {
        if markup.is_empty() {
            return Ok(Playback::Completed);
        }

        self.cancel_process();

        let child = self.command(markup).spawn().map_err(|e| {
            error!("Failed to spawn espeak-ng: {}", e);
            LexivoxError::Speech(format!("Failed to start espeak-ng: {}", e))
        })?;
        *self.current_process.lock() = Some(child);
        debug!("espeak-ng process started");

        loop {
            {
                let mut guard = self.current_process.lock();
                let Some(child) = guard.as_mut() else {
                    // Killed by stop()
                    return Ok(Playback::Aborted);
                };

                if let Some(status) = child.try_wait()? {
                    guard.take();
                    if !status.success() && !abort.is_aborted() {
                        return Err(LexivoxError::Speech(format!(
                            "espeak-ng exited with {}",
                            status
                        )));
                    }
                    return Ok(if abort.is_aborted() {
                        Playback::Aborted
                    } else {
                        Playback::Completed
                    });
                }
            }

            if abort.is_aborted() {
                self.cancel_process();
                return Ok(Playback::Aborted);
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    fn stop(&self) -> Result<()> {
        debug!("Canceling speech");
        self.cancel_process();
        Ok(())
    }
}

impl Drop for EspeakSynth {
    fn drop(&mut self) {
        debug!("Shutting down espeak-ng backend");
        self.cancel_process();
    }
}

/// The language tag named by an espeak-ng voice, if it names one
///
/// Voices may carry a family path (`gmw/en-US`) and a variant (`en+f3`).
/// Names such as `mb-en1` are voices, not languages.
fn language_tag(voice: &str) -> Option<String> {
    let voice = voice.split('+').next().unwrap_or(voice);
    let name = voice.rsplit('/').next().unwrap_or(voice);

    let mut subtags = name.split('-');
    let primary = subtags.next()?;
    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let valid = subtags.all(|tag| match tag.len() {
        2 | 4 => tag.chars().all(|c| c.is_ascii_alphabetic()),
        3 => tag.chars().all(|c| c.is_ascii_digit()),
        5..=8 => tag.chars().all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    });

    valid.then(|| name.to_string())
}
