//! Voice backends and the manager that switches between them
//!
//! A backend accepts speech requests and cancellations. The manager holds
//! at most one active backend; switching shuts the old one down before the
//! new one takes over, so two backends never play at once.

use crate::lexicon::SharedLexicons;
use crate::queue::{FailureSink, LogSink, Origin, QueueConfig, RequestQueue};
use crate::speech::{SayRequest, Synth, SynthPlayer};
use crate::Result;
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// Capabilities every voice backend provides
pub trait VoiceBackend: Send {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Queue a request for speaking
    fn say(&self, request: SayRequest) -> Result<()>;

    /// Drop everything queued and silence the current utterance
    fn cancel_all(&self);

    /// Drop everything queued from `origin` and abort its current utterance
    fn cancel_from(&self, origin: &Origin);

    /// Origin of the utterance being spoken right now
    fn currently_speaking(&self) -> Option<Origin>;

    /// Block until nothing is queued or playing, up to `timeout`
    fn wait_idle(&self, timeout: Duration) -> bool;
}

/// Backend speaking through a local synthesizer
pub struct SynthBackend {
    name: String,
    queue: RequestQueue<SayRequest>,
}

impl SynthBackend {
    /// Start a backend whose failures are only logged
    pub fn new(synth: Box<dyn Synth>, lexicons: SharedLexicons, language: &str) -> Result<Self> {
        Self::with_config(
            synth,
            lexicons,
            language,
            Arc::new(LogSink),
            QueueConfig::default(),
        )
    }

    /// Start a backend reporting failures to `sink`
    pub fn with_config(
        synth: Box<dyn Synth>,
        lexicons: SharedLexicons,
        language: &str,
        sink: Arc<dyn FailureSink>,
        config: QueueConfig,
    ) -> Result<Self> {
        let name = synth.name().to_string();
        let player = SynthPlayer::new(synth, lexicons, language).with_sink(Arc::clone(&sink));
        let queue = RequestQueue::with_config(Arc::new(player), sink, config)?;

        info!("Started {} backend", name);
        Ok(Self { name, queue })
    }

    pub fn queue(&self) -> &RequestQueue<SayRequest> {
        &self.queue
    }
}

impl VoiceBackend for SynthBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn say(&self, request: SayRequest) -> Result<()> {
        let origin = request.origin.clone();
        self.queue.enqueue(origin, request)
    }

    fn cancel_all(&self) {
        self.queue.cancel_all();
    }

    fn cancel_from(&self, origin: &Origin) {
        self.queue.cancel_from(origin);
    }

    fn currently_speaking(&self) -> Option<Origin> {
        self.queue.currently_speaking()
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        self.queue.wait_idle(timeout)
    }
}

/// Holds the active backend and forwards calls to it
///
/// Without a backend, requests are dropped and nothing is speaking.
#[derive(Default)]
pub struct BackendManager {
    backend: Option<Box<dyn VoiceBackend>>,
}

impl BackendManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active backend
    ///
    /// The previous backend is dropped first, which stops its queue.
    pub fn set_backend(&mut self, backend: Box<dyn VoiceBackend>) {
        if let Some(old) = self.backend.take() {
            info!("Disposing {} backend", old.name());
            drop(old);
        }
        info!("Switched to {} backend", backend.name());
        self.backend = Some(backend);
    }

    /// Remove and shut down the active backend
    pub fn clear(&mut self) {
        if let Some(old) = self.backend.take() {
            info!("Disposing {} backend", old.name());
        }
    }

    pub fn backend(&self) -> Option<&dyn VoiceBackend> {
        self.backend.as_deref()
    }

    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_ref().map(|b| b.name())
    }

    pub fn say(&self, request: SayRequest) -> Result<()> {
        match &self.backend {
            Some(backend) => backend.say(request),
            None => Ok(()),
        }
    }

    pub fn cancel_all(&self) {
        if let Some(backend) = &self.backend {
            backend.cancel_all();
        }
    }

    pub fn cancel_from(&self, origin: &Origin) {
        if let Some(backend) = &self.backend {
            backend.cancel_from(origin);
        }
    }

    pub fn currently_speaking(&self) -> Option<Origin> {
        self.backend.as_ref().and_then(|b| b.currently_speaking())
    }

    /// Wait for the active backend to go quiet; true when there is none
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.backend.as_ref().map_or(true, |b| b.wait_idle(timeout))
    }
}
