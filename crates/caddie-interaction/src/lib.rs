//! Remote model and playback adapters for the caddie.

pub mod gemini_chat_backend;
pub mod persona;
pub mod speech_sink;

pub use gemini_chat_backend::GeminiChatBackend;
pub use speech_sink::{CommandSpeechSink, speech_sink_from_config};
