//! Chat bridge to the remote caddie model.
//!
//! A [`ChatSession`] is one remote conversational context: the replayed
//! history plus every exchange completed through it. The [`ChatBridge`]
//! holds the current session and replaces it wholesale on `initialize`, so
//! nothing leaks from one round's session into the next.

use crate::error::{CaddieError, Result};
use crate::round::{ImageAttachment, Message, Role};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// One turn as sent to the remote model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
    pub images: Vec<ImageAttachment>,
}

impl ChatTurn {
    /// A user turn with optional inline images.
    pub fn user(text: impl Into<String>, images: Vec<ImageAttachment>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            images,
        }
    }

    /// A model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            images: Vec::new(),
        }
    }

    /// Replay form of a stored message. Photos are not replayed.
    fn replay(message: &Message) -> Self {
        Self {
            role: message.role,
            text: message.content.clone(),
            images: Vec::new(),
        }
    }
}

/// A remote model that answers a new turn given prior turns.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns the model's reply to `turn` in the context of `history`.
    ///
    /// # Errors
    ///
    /// Returns `Upstream` if the call fails or yields no text.
    async fn generate(&self, history: &[ChatTurn], turn: &ChatTurn) -> Result<String>;
}

/// One remote conversational context.
pub struct ChatSession {
    id: Uuid,
    backend: Arc<dyn ChatBackend>,
    // Held across the remote call so turns in a session never interleave.
    history: Mutex<Vec<ChatTurn>>,
}

impl ChatSession {
    /// Builds a session replaying `history` as prior turns.
    ///
    /// A trailing user message is dropped: the replayed context must end on a
    /// model turn (or be empty) because the pending user turn is sent
    /// explicitly.
    pub fn new(backend: Arc<dyn ChatBackend>, history: &[Message]) -> Self {
        let mut turns: Vec<ChatTurn> = history.iter().map(ChatTurn::replay).collect();
        if turns.last().is_some_and(|turn| turn.role == Role::User) {
            turns.pop();
        }

        Self {
            id: Uuid::new_v4(),
            backend,
            history: Mutex::new(turns),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Number of turns currently in the session context.
    pub async fn len(&self) -> usize {
        self.history.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of the session context.
    pub async fn turns(&self) -> Vec<ChatTurn> {
        self.history.lock().await.clone()
    }

    /// Sends one user turn and records the exchange on success.
    ///
    /// A failed call leaves the session context unchanged.
    pub async fn send(&self, turn: ChatTurn) -> Result<String> {
        let mut history = self.history.lock().await;
        let reply = self.backend.generate(&history, &turn).await?;
        if reply.trim().is_empty() {
            return Err(CaddieError::upstream(
                None,
                "Model returned an empty reply",
                false,
            ));
        }

        history.push(turn);
        history.push(ChatTurn::model(reply.clone()));
        Ok(reply)
    }
}

/// Holds the current [`ChatSession`].
pub struct ChatBridge {
    backend: Arc<dyn ChatBackend>,
    session: RwLock<Option<Arc<ChatSession>>>,
}

impl ChatBridge {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            session: RwLock::new(None),
        }
    }

    /// Starts a fresh session seeded with `history`, replacing any previous
    /// one. Calls already in flight finish against the session they started
    /// on.
    pub async fn initialize(&self, history: &[Message]) {
        let session = Arc::new(ChatSession::new(self.backend.clone(), history));
        tracing::debug!(
            "[ChatBridge] Initialized session {} with {} prior turns",
            session.id(),
            session.len().await
        );
        *self.session.write().await = Some(session);
    }

    /// Returns the current session.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before the first `initialize`.
    pub async fn session(&self) -> Result<Arc<ChatSession>> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(CaddieError::NotInitialized)
    }

    pub async fn is_initialized(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Sends one user turn in the current session and returns the reply.
    ///
    /// A second call waits for the first to settle.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` before the first `initialize`
    /// - `Upstream` if the model call fails or returns no text
    pub async fn send_message(&self, text: &str, attachments: Vec<ImageAttachment>) -> Result<String> {
        let session = self.session().await?;
        session.send(ChatTurn::user(text, attachments)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Echoes the user text and records the history length it was given.
    struct EchoBackend {
        seen: StdMutex<Vec<usize>>,
    }

    impl EchoBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: StdMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn generate(&self, history: &[ChatTurn], turn: &ChatTurn) -> Result<String> {
            self.seen.lock().unwrap().push(history.len());
            Ok(format!("echo: {}", turn.text))
        }
    }

    struct FailingBackend {
        reply: Option<String>,
    }

    #[async_trait]
    impl ChatBackend for FailingBackend {
        async fn generate(&self, _history: &[ChatTurn], _turn: &ChatTurn) -> Result<String> {
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(CaddieError::upstream(Some(500), "boom", true)),
            }
        }
    }

    #[tokio::test]
    async fn test_send_before_initialize_fails() {
        let bridge = ChatBridge::new(EchoBackend::new());
        let err = bridge.send_message("hello", Vec::new()).await.unwrap_err();
        assert!(err.is_not_initialized());
    }

    #[tokio::test]
    async fn test_trailing_user_turn_is_dropped() {
        let session = ChatSession::new(
            EchoBackend::new(),
            &[Message::model("greeting"), Message::user("pending")],
        );
        let turns = session.turns().await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::Model);
    }

    #[tokio::test]
    async fn test_history_ending_on_model_is_kept() {
        let session = ChatSession::new(
            EchoBackend::new(),
            &[Message::model("a"), Message::user("b"), Message::model("c")],
        );
        assert_eq!(session.len().await, 3);
    }

    #[tokio::test]
    async fn test_exchange_extends_session() {
        let backend = EchoBackend::new();
        let bridge = ChatBridge::new(backend.clone());
        bridge.initialize(&[Message::model("greeting")]).await;

        let reply = bridge.send_message("driver", Vec::new()).await.unwrap();
        assert_eq!(reply, "echo: driver");
        bridge.send_message("wedge", Vec::new()).await.unwrap();

        assert_eq!(*backend.seen.lock().unwrap(), vec![1, 3]);
        assert_eq!(bridge.session().await.unwrap().len().await, 5);
    }

    #[tokio::test]
    async fn test_initialize_replaces_session() {
        let backend = EchoBackend::new();
        let bridge = ChatBridge::new(backend.clone());
        bridge.initialize(&[Message::model("one")]).await;
        bridge.send_message("hi", Vec::new()).await.unwrap();
        let old = bridge.session().await.unwrap();

        bridge.initialize(&[]).await;
        let new = bridge.session().await.unwrap();
        assert_ne!(old.id(), new.id());
        assert!(new.is_empty().await);

        bridge.send_message("fresh", Vec::new()).await.unwrap();
        assert_eq!(*backend.seen.lock().unwrap(), vec![1, 0]);
    }

    #[tokio::test]
    async fn test_failed_call_leaves_session_unchanged() {
        let bridge = ChatBridge::new(Arc::new(FailingBackend { reply: None }));
        bridge.initialize(&[Message::model("greeting")]).await;

        let err = bridge.send_message("hi", Vec::new()).await.unwrap_err();
        assert!(err.is_upstream());
        assert_eq!(bridge.session().await.unwrap().len().await, 1);
    }

    #[tokio::test]
    async fn test_blank_reply_is_upstream_error() {
        let bridge = ChatBridge::new(Arc::new(FailingBackend {
            reply: Some("   ".to_string()),
        }));
        bridge.initialize(&[]).await;
        let err = bridge.send_message("hi", Vec::new()).await.unwrap_err();
        assert!(err.is_upstream());
    }
}
