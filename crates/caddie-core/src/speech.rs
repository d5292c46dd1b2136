//! Speech intake and outtake contracts.
//!
//! Transcribed speech is ordinary text input; spoken replies are a
//! fire-and-forget side effect. Platform engines sit behind
//! [`SpeechRecognizer`] and [`SpeechSink`].
//!
//! [`RestartableListener`] is the intake seam for front ends with a
//! microphone: they forward their engine's callbacks to it and build it with
//! the session's shared [`MediaGate`], so listening and photo capture never
//! overlap. The terminal front end takes typed input only.

use crate::error::Result;
use crate::media::{MediaGate, MediaGuard, MediaKind};
use regex::Regex;
use std::sync::{Arc, LazyLock};

// Artefact some recognizers emit for censored words.
static MASK_ARTEFACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*{3,}\s*astiscrk").expect("valid transcript regex"));

/// Removes recognizer artefacts and surrounding whitespace from a transcript.
pub fn sanitize_transcript(text: &str) -> String {
    MASK_ARTEFACT.replace_all(text, "").trim().to_string()
}

/// A platform speech-to-text engine.
pub trait SpeechRecognizer: Send {
    /// Begins (or resumes) recognition.
    fn start(&mut self) -> Result<()>;
    /// Requests recognition to stop. The engine reports the end separately.
    fn stop(&mut self);
}

/// Listener state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListeningState {
    #[default]
    Idle,
    Listening,
    /// Stop requested by the golfer; the next end is expected.
    StoppingManually,
}

/// One recognized segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub text: String,
    pub is_final: bool,
}

/// Keeps a recognizer running until the golfer stops it.
///
/// Engines end sessions on their own (silence timeouts and the like). An end
/// while `Listening` re-arms the recognizer; an end after a manual stop
/// returns to `Idle`. The microphone is held from `start_listening` until the
/// listener returns to `Idle`.
pub struct RestartableListener<R: SpeechRecognizer> {
    recognizer: R,
    gate: MediaGate,
    microphone: Option<MediaGuard>,
    state: ListeningState,
    final_transcript: String,
    transcript: String,
    last_error: Option<String>,
}

impl<R: SpeechRecognizer> RestartableListener<R> {
    pub fn new(recognizer: R, gate: MediaGate) -> Self {
        Self {
            recognizer,
            gate,
            microphone: None,
            state: ListeningState::Idle,
            final_transcript: String::new(),
            transcript: String::new(),
            last_error: None,
        }
    }

    pub fn state(&self) -> ListeningState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state != ListeningState::Idle
    }

    /// Current transcript (final segments plus the latest interim text).
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Starts a fresh transcript. No-op while already listening.
    ///
    /// # Errors
    ///
    /// `MediaBusy` if another capture resource is held, or the recognizer's
    /// own start error.
    pub fn start_listening(&mut self) -> Result<()> {
        if self.is_listening() {
            return Ok(());
        }

        let microphone = self.gate.acquire(MediaKind::Microphone)?;
        self.final_transcript.clear();
        self.transcript.clear();
        if let Err(e) = self.recognizer.start() {
            self.last_error = Some("Could not start listening. Please try again.".to_string());
            return Err(e);
        }

        self.microphone = Some(microphone);
        self.state = ListeningState::Listening;
        self.last_error = None;
        Ok(())
    }

    /// Stops listening on the golfer's request.
    pub fn stop_listening(&mut self) {
        if self.state == ListeningState::Listening {
            self.state = ListeningState::StoppingManually;
            self.recognizer.stop();
        }
    }

    /// Folds recognizer results into the transcript and returns it.
    pub fn on_result(&mut self, segments: &[TranscriptSegment]) -> &str {
        let mut interim = String::new();
        for segment in segments {
            if segment.is_final {
                self.final_transcript.push_str(&segment.text);
                self.final_transcript.push(' ');
            } else {
                interim.push_str(&segment.text);
            }
        }

        self.transcript = sanitize_transcript(&format!("{}{}", self.final_transcript, interim));
        &self.transcript
    }

    /// Handles the recognizer reporting the end of a session.
    ///
    /// # Errors
    ///
    /// Returns the restart error if re-arming failed; the listener is then
    /// `Idle`.
    pub fn on_end(&mut self) -> Result<()> {
        match self.state {
            ListeningState::Listening => {
                if let Err(e) = self.recognizer.start() {
                    tracing::warn!("[Speech] Failed to restart recognition: {}", e);
                    self.last_error =
                        Some("Speech recognition was interrupted and could not restart.".into());
                    self.go_idle();
                    return Err(e);
                }
                tracing::debug!("[Speech] Recognition ended unexpectedly, restarted");
                Ok(())
            }
            ListeningState::StoppingManually | ListeningState::Idle => {
                self.go_idle();
                Ok(())
            }
        }
    }

    /// Handles a recognizer error. Errors never trigger a restart.
    pub fn on_error(&mut self, code: &str) {
        self.last_error = Some(format!("Speech recognition error: {code}"));
        self.go_idle();
    }

    fn go_idle(&mut self) {
        self.state = ListeningState::Idle;
        self.microphone = None;
    }
}

/// A platform text-to-speech engine.
pub trait SpeechSink: Send + Sync {
    /// Starts speaking `text` without waiting for it to finish.
    fn speak(&self, text: &str) -> Result<()>;
    /// Stops any utterance in progress.
    fn cancel(&self);
}

/// Speaks replies so that only the most recent one is audible.
#[derive(Clone)]
pub struct PlaybackController {
    sink: Arc<dyn SpeechSink>,
}

impl PlaybackController {
    pub fn new(sink: Arc<dyn SpeechSink>) -> Self {
        Self { sink }
    }

    /// Cancels current playback and speaks `text`. Failures are logged only.
    pub fn say(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.sink.cancel();
        if let Err(e) = self.sink.speak(text) {
            tracing::warn!("[Speech] Playback failed: {}", e);
        }
    }

    pub fn cancel(&self) {
        self.sink.cancel();
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeechSink;

impl SpeechSink for SilentSpeechSink {
    fn speak(&self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn cancel(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CaddieError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRecognizer {
        starts: usize,
        stops: usize,
        fail_after: Option<usize>,
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn start(&mut self) -> Result<()> {
            if self.fail_after.is_some_and(|limit| self.starts >= limit) {
                return Err(CaddieError::internal("recognizer already started"));
            }
            self.starts += 1;
            Ok(())
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    fn segment(text: &str, is_final: bool) -> TranscriptSegment {
        TranscriptSegment {
            text: text.to_string(),
            is_final,
        }
    }

    #[test]
    fn test_sanitize_transcript() {
        assert_eq!(sanitize_transcript("  what a **** astiscrk shot "), "what a  shot");
        assert_eq!(sanitize_transcript("hit the green"), "hit the green");
    }

    #[test]
    fn test_unexpected_end_restarts() {
        let mut listener = RestartableListener::new(FakeRecognizer::default(), MediaGate::new());
        listener.start_listening().unwrap();
        listener.on_end().unwrap();

        assert_eq!(listener.state(), ListeningState::Listening);
        assert_eq!(listener.recognizer.starts, 2);
    }

    #[test]
    fn test_manual_stop_goes_idle() {
        let gate = MediaGate::new();
        let mut listener = RestartableListener::new(FakeRecognizer::default(), gate.clone());
        listener.start_listening().unwrap();
        assert_eq!(gate.held(), Some(MediaKind::Microphone));

        listener.stop_listening();
        assert_eq!(listener.state(), ListeningState::StoppingManually);
        listener.on_end().unwrap();

        assert_eq!(listener.state(), ListeningState::Idle);
        assert_eq!(listener.recognizer.starts, 1);
        assert_eq!(listener.recognizer.stops, 1);
        assert!(gate.held().is_none());
    }

    #[test]
    fn test_failed_restart_reports_error() {
        let recognizer = FakeRecognizer {
            fail_after: Some(1),
            ..Default::default()
        };
        let mut listener = RestartableListener::new(recognizer, MediaGate::new());
        listener.start_listening().unwrap();

        assert!(listener.on_end().is_err());
        assert_eq!(listener.state(), ListeningState::Idle);
        assert!(listener.last_error().unwrap().contains("could not restart"));
    }

    #[test]
    fn test_error_does_not_restart() {
        let mut listener = RestartableListener::new(FakeRecognizer::default(), MediaGate::new());
        listener.start_listening().unwrap();
        listener.on_error("no-speech");

        assert_eq!(listener.state(), ListeningState::Idle);
        assert_eq!(listener.recognizer.starts, 1);
        assert_eq!(listener.last_error(), Some("Speech recognition error: no-speech"));
    }

    #[test]
    fn test_transcript_accumulates_final_segments() {
        let mut listener = RestartableListener::new(FakeRecognizer::default(), MediaGate::new());
        listener.start_listening().unwrap();

        listener.on_result(&[segment("hit the", true)]);
        let text = listener.on_result(&[segment("fairway", false)]).to_string();
        assert_eq!(text, "hit the fairway");

        listener.on_result(&[segment("fairway", true), segment("two", false)]);
        assert_eq!(listener.transcript(), "hit the fairway two");
    }

    #[test]
    fn test_start_clears_previous_transcript() {
        let mut listener = RestartableListener::new(FakeRecognizer::default(), MediaGate::new());
        listener.start_listening().unwrap();
        listener.on_result(&[segment("old", true)]);
        listener.stop_listening();
        listener.on_end().unwrap();

        listener.start_listening().unwrap();
        assert_eq!(listener.transcript(), "");
    }

    #[test]
    fn test_busy_camera_blocks_listening() {
        let gate = MediaGate::new();
        let _camera = gate.acquire(MediaKind::Camera).unwrap();
        let mut listener = RestartableListener::new(FakeRecognizer::default(), gate);

        assert!(listener.start_listening().is_err());
        assert_eq!(listener.state(), ListeningState::Idle);
    }

    #[derive(Default)]
    struct RecordingSink {
        log: Mutex<Vec<String>>,
    }

    impl SpeechSink for RecordingSink {
        fn speak(&self, text: &str) -> Result<()> {
            self.log.lock().unwrap().push(format!("speak:{text}"));
            Ok(())
        }

        fn cancel(&self) {
            self.log.lock().unwrap().push("cancel".to_string());
        }
    }

    #[test]
    fn test_playback_cancels_before_speaking() {
        let sink = Arc::new(RecordingSink::default());
        let playback = PlaybackController::new(sink.clone());
        playback.say("first");
        playback.say("second");
        playback.say("   ");

        assert_eq!(
            *sink.log.lock().unwrap(),
            vec!["cancel", "speak:first", "cancel", "speak:second"]
        );
    }
}
