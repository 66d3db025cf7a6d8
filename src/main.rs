//! lexivox main entry point
//!
//! Reads lines of text from stdin and speaks them through the configured
//! backend, applying the configured pronunciation lexicons. Two commands are
//! understood:
//! - `/cancel` silences everything
//! - `/cancel ORIGIN` drops everything from one origin

use anyhow::{bail, Context};
use lexivox::backend::{BackendManager, SynthBackend};
use lexivox::config::Config;
use lexivox::lexicon::LexiconStore;
use lexivox::queue::{LogSink, Origin};
use lexivox::speech::{create_synth, SayRequest, SynthKind};
use log::{debug, error, info, warn};
use std::io::{self, BufRead};
use std::process;
use std::sync::Arc;
use std::time::Duration;

/// How long to wait for queued speech at end of input
const DRAIN_TIMEOUT: Duration = Duration::from_secs(600);

/// Command line options
#[derive(Debug, Default)]
struct Options {
    debug: bool,
    print: bool,
    language: Option<String>,
    origin: Option<String>,
    lexicons: Vec<String>,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut options = Options::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--debug" | "-d" => options.debug = true,
                "--print" | "-p" => options.print = true,
                "--lang" => options.language = Some(args.next().context("--lang needs a value")?),
                "--origin" => {
                    options.origin = Some(args.next().context("--origin needs a value")?)
                }
                "--lexicon" => options
                    .lexicons
                    .push(args.next().context("--lexicon needs a path")?),
                other => bail!("Unknown argument: {}", other),
            }
        }

        Ok(options)
    }
}

fn main() {
    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!(
                "Usage: lexivox [--debug] [--print] [--lang TAG] [--origin NAME] [--lexicon PATH]..."
            );
            process::exit(2);
        }
    };

    // Initialize logger
    if options.debug {
        // Debug mode: write to lexivox.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("lexivox.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open lexivox.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "lexivox version {} starting (debug mode, logging to lexivox.log)",
            lexivox::VERSION
        );
    } else {
        // Normal mode: minimal logging to stderr, only errors
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    if let Err(e) = run(options) {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(options: Options) -> anyhow::Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    info!("Configuration loaded from {:?}", config.path());

    let lexicons = LexiconStore::shared();
    {
        let mut store = lexicons.write();
        config.load_lexicons(&mut store)?;
        for path in &options.lexicons {
            store
                .add_lexicon_file(path)
                .with_context(|| format!("Failed to load lexicon {}", path))?;
        }
        info!(
            "{} lexicons with {} entries",
            store.len(),
            store.entry_count()
        );
    }

    let kind = if options.print {
        SynthKind::Print
    } else {
        config.backend()?
    };
    let synth = create_synth(kind).context("Failed to create speech backend")?;
    if let Some(rate) = config.rate() {
        synth.set_rate(rate)?;
    }
    if let Some(volume) = config.volume() {
        synth.set_volume(volume)?;
    }

    let language = options.language.clone().unwrap_or_else(|| config.language());
    let backend = SynthBackend::with_config(
        synth,
        Arc::clone(&lexicons),
        &language,
        Arc::new(LogSink),
        config.queue_config(),
    )?;

    let mut manager = BackendManager::new();
    manager.set_backend(Box::new(backend));

    let origin = Origin::new(options.origin.as_deref().unwrap_or("chat"));
    let voice = config.voice_params();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let line = line.trim();

        if line == "/cancel" {
            manager.cancel_all();
            continue;
        }
        if let Some(target) = line.strip_prefix("/cancel ") {
            manager.cancel_from(&Origin::new(target.trim()));
            continue;
        }
        if line.is_empty() {
            continue;
        }

        debug!("Queueing line from {}", origin);
        manager.say(SayRequest::new(origin.clone(), line).with_voice(voice.clone()))?;
    }

    // Let queued speech finish before the backend is dropped
    if let Some(name) = manager.backend_name() {
        debug!("End of input, waiting for {} to drain", name);
    }
    if !manager.wait_idle(DRAIN_TIMEOUT) {
        warn!("Speech still queued after {:?}, giving up", DRAIN_TIMEOUT);
    }
    manager.clear();

    Ok(())
}
