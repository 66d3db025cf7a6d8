//! Queue player that rewrites text and hands it to a synthesizer

use super::request::SayRequest;
use super::synth::Synth;
use crate::lexicon::SharedLexicons;
use crate::markup;
use crate::queue::{FailureSink, LogSink, Playback, Player, QueueItem, SynthesisFailure};
use crate::Result;
use log::{debug, warn};
use std::sync::Arc;

/// Plays `SayRequest`s through a `Synth`
///
/// For every drained request the voice parameters are applied, the text is
/// rewritten with the dictionaries registered at that moment, and the
/// resulting markup is spoken in the active voice's language.
pub struct SynthPlayer {
    synth: Box<dyn Synth>,
    lexicons: SharedLexicons,
    default_language: String,
    sink: Arc<dyn FailureSink>,
}

impl SynthPlayer {
    pub fn new(synth: Box<dyn Synth>, lexicons: SharedLexicons, default_language: &str) -> Self {
        Self {
            synth,
            lexicons,
            default_language: default_language.to_string(),
            sink: Arc::new(LogSink),
        }
    }

    /// Report voice selection failures to `sink` instead of only logging
    pub fn with_sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn synth(&self) -> &dyn Synth {
        self.synth.as_ref()
    }

    fn apply_voice(&self, item: &QueueItem<SayRequest>) -> Result<()> {
        let params = &item.payload().voice;

        if let Some(name) = &params.voice {
            // A missing voice is not fatal: speak with the current one
            if let Err(e) = self.synth.set_voice(name) {
                warn!("Failed to select voice {}: {}", name, e);
                self.sink
                    .report(SynthesisFailure::new(item.origin().clone(), e));
            }
        }
        if let Some(rate) = params.rate {
            self.synth.set_rate(rate)?;
        }
        if let Some(volume) = params.volume {
            self.synth.set_volume(volume)?;
        }
        Ok(())
    }

    /// Rewrite a request's text into markup for the active voice
    pub fn markup_for(&self, request: &SayRequest) -> String {
        let language = self
            .synth
            .language()
            .unwrap_or_else(|| self.default_language.clone());
        let store = self.lexicons.read();
        markup::rewrite(&request.text, store.dictionaries(), &language)
    }
}

impl Player<SayRequest> for SynthPlayer {
    fn play(&self, item: &QueueItem<SayRequest>) -> Result<Playback> {
        self.apply_voice(item)?;

        let markup = self.markup_for(item.payload());
        debug!("{} markup: {}", self.synth.name(), markup);

        if item.is_aborted() {
            return Ok(Playback::Aborted);
        }
        self.synth.speak(&markup, item.abort_flag())
    }

    fn stop(&self) {
        if let Err(e) = self.synth.stop() {
            warn!("Failed to stop {}: {}", self.synth.name(), e);
        }
    }
}
