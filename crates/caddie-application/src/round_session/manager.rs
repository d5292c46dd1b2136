use caddie_core::chat::{ChatBackend, ChatBridge, ChatSession, ChatTurn};
use caddie_core::error::{CaddieError, Result};
use caddie_core::media::{MediaGate, PhotoBlob};
use caddie_core::round::{
    FALLBACK_REPLY, GolfData, GolfDataRepository, ImageAttachment, MAX_HOLE_STROKES, Message,
    RoundStats, Screen, ScreenEvent, append_message, current_messages, full_history, start_new_round,
    update_round_stats,
};
use caddie_core::scorecard::{ScorecardSummary, extract};
use caddie_core::speech::{PlaybackController, SpeechSink};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Source of "now" for round ids and timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Result of one golfer turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Round the exchange was recorded in (the round active when it was sent).
    pub round_id: String,
    /// Text appended as the model's reply.
    pub reply: String,
    /// True when `reply` is the fallback apology.
    pub failed: bool,
}

#[derive(Default)]
struct SessionState {
    data: Option<GolfData>,
    screen: Screen,
    last_error: Option<String>,
}

/// Owns the `GolfData` aggregate and drives every change to it.
///
/// `RoundSessionManager` is responsible for:
/// - Loading the aggregate on startup and recovering from corrupt storage
/// - Starting, resuming and leaving rounds (screen state machine)
/// - Running golfer turns: append, persist, ask the model, append, extract
/// - Keeping the chat session in step with the rounds
/// - Persisting after every mutation
///
/// Other components only ever see copies of the aggregate.
pub struct RoundSessionManager {
    repository: Arc<dyn GolfDataRepository>,
    bridge: ChatBridge,
    playback: PlaybackController,
    clock: Clock,
    media: MediaGate,
    // Guards the aggregate and the bridge's current session together.
    state: Mutex<SessionState>,
    // Serializes whole turns so a round's log keeps alternating.
    turn_lock: Mutex<()>,
}

impl RoundSessionManager {
    /// Creates a manager. Call [`bootstrap`](Self::bootstrap) before use.
    pub fn new(
        repository: Arc<dyn GolfDataRepository>,
        backend: Arc<dyn ChatBackend>,
        speech: Arc<dyn SpeechSink>,
    ) -> Self {
        Self {
            repository,
            bridge: ChatBridge::new(backend),
            playback: PlaybackController::new(speech),
            clock: Arc::new(Utc::now),
            media: MediaGate::new(),
            state: Mutex::new(SessionState::default()),
            turn_lock: Mutex::new(()),
        }
    }

    /// Replaces the clock (tests, replays).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// The camera/microphone gate shared by every capture source of this
    /// session (photo intake, speech listener).
    pub fn media_gate(&self) -> MediaGate {
        self.media.clone()
    }

    // ============================================================================
    // Lifecycle
    // ============================================================================

    /// Loads persisted data and moves from `NoData` to `Welcome`.
    ///
    /// Corrupt storage is discarded and treated as a first run. When data
    /// exists the chat session is seeded with the full history.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself is unreachable.
    pub async fn bootstrap(&self) -> Result<Screen> {
        let loaded = match self.repository.load().await {
            Ok(data) => data,
            Err(e) if e.is_storage_corrupt() => {
                tracing::warn!("[RoundSession] {}; starting fresh", e);
                self.repository.clear().await?;
                None
            }
            Err(e) => return Err(e),
        };

        let mut state = self.state.lock().await;
        if let Some(data) = &loaded {
            self.bridge.initialize(&full_history(data)).await;
            tracing::info!(
                "[RoundSession] Restored {} rounds (current: {:?})",
                data.rounds.len(),
                data.current_round_id
            );
        } else {
            tracing::info!("[RoundSession] No saved rounds, first run");
        }

        let has_current = loaded.as_ref().is_some_and(GolfData::has_current_round);
        state.screen = state.screen.transition(ScreenEvent::Loaded, has_current)?;
        state.data = loaded;
        state.last_error = None;
        Ok(state.screen)
    }

    /// Starts a new round from any screen and returns its id.
    ///
    /// The chat session is rebuilt from the full history and the greeting
    /// is spoken.
    pub async fn start_new_round(&self) -> Result<String> {
        let (round_id, greeting) = {
            let mut state = self.state.lock().await;
            let data = start_new_round(state.data.clone(), self.now());
            self.repository.save(&data).await?;

            let round_id = data
                .current_round_id
                .clone()
                .ok_or_else(|| CaddieError::internal("New round has no id"))?;
            let greeting = current_messages(&data)
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            self.bridge.initialize(&full_history(&data)).await;

            state.screen = state.screen.transition(ScreenEvent::StartNewRound, true)?;
            state.data = Some(data);
            state.last_error = None;
            (round_id, greeting)
        };

        self.playback.say(&greeting);
        tracing::info!("[RoundSession] Started round {}", round_id);
        Ok(round_id)
    }

    /// Returns to the current round from `Welcome` or `MainMenu`.
    pub async fn resume(&self) -> Result<Screen> {
        self.navigate(ScreenEvent::Resume).await
    }

    /// Leaves the active round for the main menu.
    pub async fn go_to_main_menu(&self) -> Result<Screen> {
        self.navigate(ScreenEvent::GoToMainMenu).await
    }

    async fn navigate(&self, event: ScreenEvent) -> Result<Screen> {
        let mut state = self.state.lock().await;
        let has_current = state.data.as_ref().is_some_and(GolfData::has_current_round);
        state.screen = state.screen.transition(event, has_current)?;
        Ok(state.screen)
    }

    /// Discards all stored rounds and returns to the welcome screen.
    pub async fn reset(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.repository.clear().await?;
        *state = SessionState::default();
        state.screen = state.screen.transition(ScreenEvent::Loaded, false)?;
        self.playback.cancel();
        tracing::info!("[RoundSession] Cleared all rounds");
        Ok(())
    }

    // ============================================================================
    // Turns
    // ============================================================================

    /// Sends typed or transcribed text as a golfer turn.
    ///
    /// Blank input is ignored and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Fails if there is no current round or the store cannot be written.
    /// Model failures do not error: they produce the fallback reply.
    pub async fn send_text(&self, text: &str) -> Result<Option<TurnOutcome>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        self.run_turn(Message::user(text), Vec::new()).await.map(Some)
    }

    /// Sends a photo (with its description) as a golfer turn.
    pub async fn send_photo(&self, photo: &PhotoBlob) -> Result<TurnOutcome> {
        let attachment = photo.to_attachment();
        let message = Message::user(photo.caption()).with_image(attachment.clone());
        self.run_turn(message, vec![attachment]).await
    }

    async fn run_turn(
        &self,
        user_message: Message,
        attachments: Vec<ImageAttachment>,
    ) -> Result<TurnOutcome> {
        let _turn = self.turn_lock.lock().await;
        let user_text = user_message.content.clone();

        // The reply belongs to the round and session active now, whatever
        // happens later.
        let (round_id, session) = {
            let mut state = self.state.lock().await;
            let data = state
                .data
                .clone()
                .ok_or_else(|| CaddieError::internal("No round in progress"))?;
            let round_id = data
                .current_round_id
                .clone()
                .ok_or_else(|| CaddieError::internal("No round in progress"))?;

            let data = append_message(data, &round_id, user_message)?;
            self.repository.save(&data).await?;
            let session = self.current_session(&data).await?;
            state.data = Some(data);
            state.last_error = None;
            (round_id, session)
        };

        let (reply, failed) = match Self::request_reply(&session, &user_text, attachments).await {
            Ok(reply) => (reply, false),
            Err(e) => {
                tracing::error!("[RoundSession] Caddie reply failed for round {}: {}", round_id, e);
                (FALLBACK_REPLY.to_string(), true)
            }
        };

        let exchange = format!("{user_text} {reply}");
        let now = self.now();
        {
            let mut state = self.state.lock().await;
            let data = state
                .data
                .clone()
                .ok_or_else(|| CaddieError::internal("Round data vanished mid-turn"))?;
            let data = append_message(data, &round_id, Message::model(&reply))?;
            let data = update_round_stats(data, &round_id, now, |stats| {
                *stats = extract(&exchange, stats);
            })?;
            let saved = self.repository.save(&data).await;

            if data.current_round_id.as_deref() != Some(round_id.as_str()) {
                // A round started mid-turn replayed this exchange without its
                // reply. No other turn can be running, so rebuild it.
                self.bridge.initialize(&full_history(&data)).await;
            }

            // Memory keeps the reply even if the store failed; the next
            // successful save writes it.
            state.data = Some(data);
            if failed {
                state.last_error = Some(FALLBACK_REPLY.to_string());
            }
            if let Err(e) = saved {
                tracing::error!("[RoundSession] Failed to save reply for round {}: {}", round_id, e);
                return Err(e);
            }
        }

        self.playback.say(&reply);
        Ok(TurnOutcome {
            round_id,
            reply,
            failed,
        })
    }

    /// Returns the bridge's session, seeding it from `data` if missing.
    /// Call with the state lock held.
    async fn current_session(&self, data: &GolfData) -> Result<Arc<ChatSession>> {
        if !self.bridge.is_initialized().await {
            // Every round start and restore initializes the bridge; this only
            // covers integrations that skipped it.
            tracing::warn!("[RoundSession] Chat session missing, rebuilding from history");
            self.bridge.initialize(&full_history(data)).await;
        }
        self.bridge.session().await
    }

    /// Asks `session` for a reply, retrying once on a retryable upstream
    /// error. Both attempts use the same session.
    async fn request_reply(
        session: &ChatSession,
        text: &str,
        attachments: Vec<ImageAttachment>,
    ) -> Result<String> {
        let turn = ChatTurn::user(text, attachments);
        match session.send(turn.clone()).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!("[RoundSession] Retrying once after: {}", e);
                session.send(turn).await
            }
            other => other,
        }
    }

    // ============================================================================
    // Scorecard actions
    // ============================================================================

    /// Moves the active round to `hole_number`.
    pub async fn set_current_hole(&self, hole_number: u32) -> Result<()> {
        if hole_number == 0 {
            return Err(CaddieError::invalid_input("Hole numbers start at 1"));
        }
        self.update_current_stats(|stats| stats.current_hole = hole_number)
            .await
    }

    /// Names the course of the active round.
    pub async fn set_course_name(&self, name: &str) -> Result<()> {
        let name = name.trim().to_string();
        self.update_current_stats(move |stats| {
            stats.course_name = (!name.is_empty()).then_some(name);
        })
        .await
    }

    /// Records the score (and optionally par) of a hole in the active round.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for hole 0, or strokes or par outside
    /// `1..=MAX_HOLE_STROKES`.
    pub async fn record_hole_score(&self, hole_number: u32, score: u32, par: Option<u32>) -> Result<()> {
        if hole_number == 0 {
            return Err(CaddieError::invalid_input("Hole numbers start at 1"));
        }
        let in_range = |value: u32| (1..=MAX_HOLE_STROKES).contains(&value);
        if !in_range(score) || par.is_some_and(|par| !in_range(par)) {
            return Err(CaddieError::invalid_input(format!(
                "Strokes and par must be between 1 and {MAX_HOLE_STROKES}"
            )));
        }
        self.update_current_stats(|stats| {
            let hole = stats.hole_mut_or_default(hole_number);
            hole.score = Some(score);
            if let Some(par) = par {
                hole.par = par;
            }
        })
        .await
    }

    async fn update_current_stats<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&mut RoundStats),
    {
        let now = self.now();
        let mut state = self.state.lock().await;
        let data = state
            .data
            .clone()
            .ok_or_else(|| CaddieError::internal("No round in progress"))?;
        let round_id = data
            .current_round_id
            .clone()
            .ok_or_else(|| CaddieError::internal("No round in progress"))?;

        let data = update_round_stats(data, &round_id, now, update)?;
        self.repository.save(&data).await?;
        state.data = Some(data);
        Ok(())
    }

    // ============================================================================
    // Views
    // ============================================================================

    pub async fn screen(&self) -> Screen {
        self.state.lock().await.screen
    }

    /// Copy of the whole aggregate.
    pub async fn snapshot(&self) -> Option<GolfData> {
        self.state.lock().await.data.clone()
    }

    pub async fn current_round_id(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .data
            .as_ref()
            .and_then(|d| d.current_round_id.clone())
    }

    /// Messages of the current round.
    pub async fn current_messages(&self) -> Vec<Message> {
        self.state
            .lock()
            .await
            .data
            .as_ref()
            .map(|d| current_messages(d).to_vec())
            .unwrap_or_default()
    }

    /// Statistics of the current round.
    pub async fn current_round_stats(&self) -> Option<RoundStats> {
        let state = self.state.lock().await;
        let data = state.data.as_ref()?;
        let round_id = data.current_round_id.as_deref()?;
        data.stats(round_id).cloned()
    }

    /// Totals for the current round.
    pub async fn scorecard(&self) -> Option<ScorecardSummary> {
        self.current_round_stats()
            .await
            .map(|stats| ScorecardSummary::from_stats(&stats))
    }

    /// User-visible error from the last turn, if it failed.
    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }
}
