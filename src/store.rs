//! In-memory session store
//!
//! Holds every session's message history, its single checkpoint and its
//! campaign parameters. Nothing is written to disk.

mod schema;

pub use schema::*;

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Message not found: {0}")]
    MessageNotFound(String),
    #[error("No checkpoint to restore")]
    NoCheckpoint,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Thread-safe store handle
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // Every mutation is a single push or assignment, so poisoning is ignored
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))?;
        f(session)
    }

    // ==================== Session Operations ====================

    /// Create a session seeded with the greeting message
    pub fn create_session(&self, id: &str) -> Session {
        let session = Session {
            id: id.to_string(),
            created_at: Utc::now(),
            messages: vec![NewMessage::ai(GREETING).into_message(new_message_id())],
            checkpoint: None,
            parameters: CampaignParameters::default(),
        };
        self.lock().insert(id.to_string(), session.clone());
        session
    }

    pub fn get_session(&self, id: &str) -> StoreResult<Session> {
        self.with_session(id, |s| Ok(s.clone()))
    }

    /// List sessions, newest first
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .lock()
            .values()
            .map(|s| SessionSummary {
                id: s.id.clone(),
                created_at: s.created_at,
                message_count: s.messages.len(),
                segment_name: s.parameters.segment_name.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    pub fn delete_session(&self, id: &str) -> StoreResult<()> {
        self.lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))
    }

    // ==================== Message Operations ====================

    /// Append a message, assigning its ID
    pub fn add_message(&self, session_id: &str, message: NewMessage) -> StoreResult<Message> {
        self.with_session(session_id, |s| {
            let msg = message.into_message(new_message_id());
            s.messages.push(msg.clone());
            Ok(msg)
        })
    }

    pub fn get_messages(&self, session_id: &str) -> StoreResult<Vec<Message>> {
        self.with_session(session_id, |s| Ok(s.messages.clone()))
    }

    pub fn get_message(&self, session_id: &str, message_id: &str) -> StoreResult<Message> {
        self.with_session(session_id, |s| {
            s.messages
                .iter()
                .find(|m| m.id == message_id)
                .cloned()
                .ok_or_else(|| StoreError::MessageNotFound(message_id.to_string()))
        })
    }

    /// Flag a message as approved. Setting it again is a no-op.
    pub fn mark_approved(&self, session_id: &str, message_id: &str) -> StoreResult<Message> {
        self.with_session(session_id, |s| {
            let msg = s
                .messages
                .iter_mut()
                .find(|m| m.id == message_id)
                .ok_or_else(|| StoreError::MessageNotFound(message_id.to_string()))?;
            msg.approved = Some(true);
            Ok(msg.clone())
        })
    }

    // ==================== Checkpoint Operations ====================

    /// Snapshot the message list, replacing any earlier checkpoint.
    /// Returns the number of messages captured.
    pub fn create_checkpoint(&self, session_id: &str) -> StoreResult<usize> {
        self.with_session(session_id, |s| {
            let len = s.messages.len();
            s.checkpoint = Some(s.messages.clone());
            Ok(len)
        })
    }

    /// Replace the live message list with the checkpoint. The checkpoint stays.
    pub fn restore_checkpoint(&self, session_id: &str) -> StoreResult<Vec<Message>> {
        self.with_session(session_id, |s| {
            let snapshot = s.checkpoint.clone().ok_or(StoreError::NoCheckpoint)?;
            s.messages.clone_from(&snapshot);
            Ok(snapshot)
        })
    }

    pub fn has_checkpoint(&self, session_id: &str) -> StoreResult<bool> {
        self.with_session(session_id, |s| Ok(s.has_checkpoint()))
    }

    // ==================== Parameter Operations ====================

    pub fn get_parameters(&self, session_id: &str) -> StoreResult<CampaignParameters> {
        self.with_session(session_id, |s| Ok(s.parameters.clone()))
    }

    pub fn set_parameters(
        &self,
        session_id: &str,
        parameters: CampaignParameters,
    ) -> StoreResult<()> {
        self.with_session(session_id, |s| {
            s.parameters = parameters;
            Ok(())
        })
    }
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
