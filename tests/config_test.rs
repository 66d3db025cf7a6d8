//! Configuration loading tests
//!
//! Every test works on a config file inside a temporary directory so the
//! user's ~/.lexivox.cfg is never touched.

use lexivox::config::{Config, DEFAULT_LANGUAGE};
use lexivox::lexicon::LexiconStore;
use lexivox::speech::SynthKind;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

const NAMES: &str = "<lexicon><lexeme><grapheme>Thancred</grapheme>\
    <phoneme>θænkrɛd</phoneme></lexeme></lexicon>";

#[test]
fn test_default_config_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lexivox.cfg");

    let config = Config::load_from(&path).expect("Failed to load config");
    assert!(path.exists());
    assert_eq!(config.path(), path.as_path());

    assert_eq!(config.backend().unwrap(), SynthKind::Auto);
    assert_eq!(config.language(), DEFAULT_LANGUAGE);
    assert_eq!(config.rate(), None);
    assert_eq!(config.voice(), None);
    assert_eq!(config.queue_config().idle_poll, Duration::from_millis(100));
    assert!(config.lexicons.is_empty());
    assert!(config.enabled_packages().is_empty());
}

#[test]
fn test_values_read_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lexivox.cfg");
    fs::write(
        &path,
        "[speech]\nbackend = espeak-ng\nlanguage = en-GB\nrate = 70\nvolume = 150\nvoice = Amy\n\
         [queue]\nidle_poll_ms = 25\n\
         [packages]\ndir = /opt/lexicons\nenabled = ffxiv, , extra\n",
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.backend().unwrap(), SynthKind::Espeak);
    assert_eq!(config.language(), "en-GB");
    assert_eq!(config.rate(), Some(70));
    // Out of range
    assert_eq!(config.volume(), None);
    assert_eq!(config.voice().as_deref(), Some("Amy"));

    let params = config.voice_params();
    assert_eq!(params.voice.as_deref(), Some("Amy"));
    assert_eq!(params.rate, Some(70));

    assert_eq!(config.queue_config().idle_poll, Duration::from_millis(25));
    assert_eq!(config.package_dir(), std::path::PathBuf::from("/opt/lexicons"));
    assert_eq!(config.enabled_packages(), vec!["ffxiv", "extra"]);
}

#[test]
fn test_unknown_backend_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lexivox.cfg");
    fs::write(&path, "[speech]\nbackend = carrier-pigeon\n").unwrap();

    let config = Config::load_from(&path).unwrap();
    assert!(config.backend().is_err());
}

#[test]
fn test_broken_lexicons_removed_and_saved() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("names.pls");
    let bad = dir.path().join("bad.pls");
    fs::write(&good, NAMES).unwrap();
    fs::write(&bad, "<lexicon><lexeme>").unwrap();

    let path = dir.path().join("lexivox.cfg");
    let mut config = Config::load_from(&path).unwrap();
    config.set("lexicons", "names", &good.to_string_lossy());
    config.set("lexicons", "bad", &bad.to_string_lossy());
    config.set("lexicons", "gone", &dir.path().join("gone.pls").to_string_lossy());
    config.save().unwrap();
    assert_eq!(config.lexicons.len(), 3);

    let mut store = LexiconStore::new();
    assert_eq!(config.load_lexicons(&mut store).unwrap(), 1);
    assert!(store.has_lexicon("names"));
    assert_eq!(store.len(), 1);

    let ids: Vec<&str> = config.lexicons.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["names"]);

    // The pruned list was written back
    let reloaded = Config::load_from(&path).unwrap();
    assert_eq!(reloaded.lexicons.len(), 1);
    assert_eq!(reloaded.lexicons[0].0, "names");
}

#[test]
fn test_enabled_packages_loaded() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("packages");
    let pkg = root.join("ffxiv");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join("package.yml"), "name: FFXIV\nfiles:\n  - names.pls\n").unwrap();
    fs::write(pkg.join("names.pls"), NAMES).unwrap();

    let path = dir.path().join("lexivox.cfg");
    let mut config = Config::load_from(&path).unwrap();
    config.set("packages", "dir", &root.to_string_lossy());
    config.set("packages", "enabled", "ffxiv,missing");

    let mut store = LexiconStore::new();
    assert_eq!(config.load_lexicons(&mut store).unwrap(), 1);
    assert!(store.has_lexicon("ffxiv/names.pls"));
}

#[test]
fn test_remove_lexicon_entry() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::load_from(dir.path().join("lexivox.cfg")).unwrap();

    config.set("lexicons", "a", "/tmp/a.pls");
    config.set("lexicons", "b", "/tmp/b.pls");
    config.remove("lexicons", "a");

    assert_eq!(config.lexicons, vec![("b".to_string(), "/tmp/b.pls".to_string())]);
}
