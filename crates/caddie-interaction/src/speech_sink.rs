//! Spoken playback through an external text-to-speech program.

use caddie_core::config::SpeechConfig;
use caddie_core::error::{CaddieError, Result};
use caddie_core::speech::{SilentSpeechSink, SpeechSink};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};

/// Runs a TTS program (`say`, `espeak`, ...) per utterance.
///
/// The program receives the configured arguments followed by the text. Only
/// one utterance runs at a time: `cancel` kills the running child.
pub struct CommandSpeechSink {
    program: String,
    args: Vec<String>,
    current: Mutex<Option<Child>>,
}

impl CommandSpeechSink {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            current: Mutex::new(None),
        }
    }

    fn take_current(&self) -> Option<Child> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

impl SpeechSink for CommandSpeechSink {
    fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(CaddieError::internal("Nothing to speak"));
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CaddieError::io(format!("Failed to run '{}': {}", self.program, e)))?;

        let previous = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(child);
        if let Some(mut previous) = previous {
            let _ = previous.kill();
            let _ = previous.wait();
        }
        Ok(())
    }

    fn cancel(&self) {
        if let Some(mut child) = self.take_current() {
            // Already-finished children just get reaped.
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for CommandSpeechSink {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Builds the sink described by the `[speech]` config section.
pub fn speech_sink_from_config(config: &SpeechConfig) -> Arc<dyn SpeechSink> {
    match (&config.command, config.enabled) {
        (Some(command), true) => Arc::new(CommandSpeechSink::new(command, config.args.clone())),
        (None, true) => {
            tracing::warn!("[Speech] Speech enabled but no command configured; staying silent");
            Arc::new(SilentSpeechSink)
        }
        (_, false) => Arc::new(SilentSpeechSink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_text() {
        let sink = CommandSpeechSink::new("true", Vec::new());
        assert!(sink.speak("   ").is_err());
    }

    #[test]
    fn test_missing_program_is_error() {
        let sink = CommandSpeechSink::new("definitely-not-a-tts-program", Vec::new());
        assert!(sink.speak("hello").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_new_utterance_replaces_previous() {
        let sink = CommandSpeechSink::new("sleep", Vec::new());
        sink.speak("5").unwrap();
        sink.speak("5").unwrap();
        assert!(sink.current.lock().unwrap().is_some());

        sink.cancel();
        assert!(sink.current.lock().unwrap().is_none());
    }

    #[test]
    fn test_disabled_config_is_silent() {
        let sink = speech_sink_from_config(&SpeechConfig::default());
        assert!(sink.speak("hello").is_ok());
    }
}
