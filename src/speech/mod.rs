//! Speech synthesis system

pub mod backends;
pub mod player;
pub mod request;
pub mod synth;

pub use player::SynthPlayer;
pub use request::{SayRequest, VoiceParams};
pub use synth::{create_synth, Synth, SynthKind};
