//! Configuration management

use crate::lexicon::{LexiconPackage, LexiconStore};
use crate::queue::{QueueConfig, DEFAULT_IDLE_POLL};
use crate::speech::{SynthKind, VoiceParams};
use crate::{LexivoxError, Result};
use ini::Ini;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Language used when the synthesizer cannot report one
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Application configuration
///
/// Manages speech defaults, queue tuning and the lexicons loaded at startup.
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.lexivox.cfg by default)
    path: PathBuf,

    /// Lexicon files (id -> path), in file order
    pub lexicons: Vec<(String, String)>,
}

impl Config {
    /// Load configuration from ~/.lexivox.cfg, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path`, creating a default file if missing
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| LexivoxError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| LexivoxError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        let mut config = Self {
            ini,
            path,
            lexicons: Vec::new(),
        };
        config.parse_lexicons();

        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| LexivoxError::Config(format!("Failed to save config: {}", e)))
    }

    /// Get config file path (~/.lexivox.cfg)
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lexivox.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("speech"))
            .set("backend", "auto")
            .set("language", DEFAULT_LANGUAGE);

        ini.with_section(Some("queue"))
            .set("idle_poll_ms", DEFAULT_IDLE_POLL.as_millis().to_string());

        ini.with_section(Some("lexicons"));
        ini.with_section(Some("packages"));

        ini
    }

    /// Parse lexicon files from config
    fn parse_lexicons(&mut self) {
        self.lexicons.clear();
        if let Some(section) = self.ini.section(Some("lexicons")) {
            for (id, path) in section.iter() {
                self.lexicons.push((id.to_string(), path.to_string()));
            }
        }
        debug!("Configured {} lexicon files", self.lexicons.len());
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
        if section == "lexicons" {
            self.parse_lexicons();
        }
    }

    /// Remove a value from config
    pub fn remove(&mut self, section: &str, key: &str) {
        self.ini.delete_from(Some(section), key);
        if section == "lexicons" {
            self.parse_lexicons();
        }
    }

    /// Which synthesizer to create
    pub fn backend(&self) -> Result<SynthKind> {
        self.get_string("speech", "backend", "auto").parse()
    }

    /// Fallback language tag for the speech envelope
    pub fn language(&self) -> String {
        self.get_string("speech", "language", DEFAULT_LANGUAGE)
    }

    /// Speech rate (0-100)
    pub fn rate(&self) -> Option<u8> {
        self.get_int("speech", "rate", -1)
            .try_into()
            .ok()
            .filter(|&r| r <= 100)
    }

    /// Speech volume (0-100)
    pub fn volume(&self) -> Option<u8> {
        self.get_int("speech", "volume", -1)
            .try_into()
            .ok()
            .filter(|&v| v <= 100)
    }

    /// Voice name for the TTS engine
    pub fn voice(&self) -> Option<String> {
        self.ini
            .get_from(Some("speech"), "voice")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Default voice parameters for new requests
    pub fn voice_params(&self) -> VoiceParams {
        VoiceParams {
            voice: self.voice(),
            rate: self.rate(),
            volume: self.volume(),
        }
    }

    /// Worker tuning for speech queues
    pub fn queue_config(&self) -> QueueConfig {
        let default_ms = DEFAULT_IDLE_POLL.as_millis() as i64;
        let ms = self.get_int("queue", "idle_poll_ms", default_ms);
        let ms = if ms > 0 { ms as u64 } else { default_ms as u64 };
        QueueConfig {
            idle_poll: Duration::from_millis(ms),
        }
    }

    /// Root directory of installed lexicon packages
    pub fn package_dir(&self) -> PathBuf {
        match self.ini.get_from(Some("packages"), "dir") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
            _ => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".lexivox")
                .join("lexicons"),
        }
    }

    /// Names of the packages to load at startup
    pub fn enabled_packages(&self) -> Vec<String> {
        self.get_string("packages", "enabled", "")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Load every configured lexicon file and package into `store`
    ///
    /// Lexicon files that fail to load are removed from the configuration,
    /// which is then saved, so a broken entry only costs one failed start.
    /// Returns the number of entries added.
    pub fn load_lexicons(&mut self, store: &mut LexiconStore) -> Result<usize> {
        let mut added = 0;
        let mut broken = Vec::new();

        for (id, path) in &self.lexicons {
            let result = std::fs::read_to_string(path)
                .map_err(LexivoxError::from)
                .and_then(|source| store.add_lexicon(id, &source));
            match result {
                Ok(count) => added += count,
                Err(e) => {
                    error!("Failed to add lexicon {} - removing from configuration: {}", id, e);
                    broken.push(id.clone());
                }
            }
        }

        if !broken.is_empty() {
            for id in &broken {
                self.ini.delete_from(Some("lexicons"), id);
            }
            self.parse_lexicons();
            self.save()?;
        }

        let root = self.package_dir();
        for name in self.enabled_packages() {
            match LexiconPackage::open(root.join(&name)).and_then(|p| p.install(store)) {
                Ok(count) => added += count,
                Err(e) => warn!("Failed to load lexicon package {}: {}", name, e),
            }
        }

        info!("Loaded {} lexicon entries", added);
        Ok(added)
    }
}
