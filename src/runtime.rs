//! Runtime for executing sessions
//!
//! One background task per session owns its turn state. The manager routes
//! API calls to those tasks and exposes their broadcast streams.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::campaign::CampaignReply;
use crate::state_machine::{Event, Stage, TurnState};
use crate::store::{
    CampaignParameters, MemoryStore, MergePolicy, Message, MessageKind, Sender, Session,
    SessionSummary, StoreError,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tokio_util::sync::CancellationToken;

/// Runtime over shared trait objects, as the server builds it
pub type SharedRuntime = SessionRuntime<dyn CampaignAssistant, dyn WorkflowClient>;

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Message { message: Message },
    MessageUpdated { message: Message },
    MessagesRestored { messages: Vec<Message> },
    Parameters {
        parameters: CampaignParameters,
        stage: Stage,
    },
    StateChange { state: TurnState },
    TurnComplete,
    Error { message: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManagerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Message {0} is not a campaign proposal")]
    NotAProposal(String),
    #[error("Session runtime has stopped")]
    RuntimeStopped,
}

/// Handle to interact with a running session
struct SessionHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    state_rx: watch::Receiver<TurnState>,
    cancel: CancellationToken,
}

/// Session data plus the live turn state
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session: Session,
    pub state: TurnState,
}

impl SessionSnapshot {
    pub fn stage(&self) -> Stage {
        Stage::of(&self.session.parameters)
    }
}

/// Manager for all session runtimes
pub struct SessionManager {
    store: MemoryStore,
    assistant: Arc<dyn CampaignAssistant>,
    workflow: Arc<dyn WorkflowClient>,
    merge_policy: MergePolicy,
    runtimes: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(
        store: MemoryStore,
        assistant: Arc<dyn CampaignAssistant>,
        workflow: Arc<dyn WorkflowClient>,
        merge_policy: MergePolicy,
    ) -> Self {
        Self {
            store,
            assistant,
            workflow,
            merge_policy,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Create a session and start its runtime
    pub async fn create_session(&self) -> Session {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = self.store.create_session(&session_id);

        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (state_tx, state_rx) = watch::channel(TurnState::Idle);
        let cancel = CancellationToken::new();

        let runtime: SharedRuntime = SessionRuntime::new(
            session_id.clone(),
            self.merge_policy,
            self.store.clone(),
            self.assistant.clone(),
            self.workflow.clone(),
            event_rx,
            event_tx.clone(),
            broadcast_tx.clone(),
            state_tx,
            cancel.clone(),
        );

        tokio::spawn(runtime.run());

        self.runtimes.write().await.insert(
            session_id.clone(),
            SessionHandle {
                event_tx,
                broadcast_tx,
                state_rx,
                cancel,
            },
        );

        tracing::info!(session_id = %session_id, "Session created");
        session
    }

    /// List sessions, newest first, with their busy flag
    pub async fn list_sessions(&self) -> Vec<(SessionSummary, bool)> {
        let runtimes = self.runtimes.read().await;
        self.store
            .list_sessions()
            .into_iter()
            .map(|summary| {
                let busy = runtimes
                    .get(&summary.id)
                    .is_some_and(|h| h.state_rx.borrow().is_busy());
                (summary, busy)
            })
            .collect()
    }

    pub async fn get_session(&self, session_id: &str) -> Result<SessionSnapshot, ManagerError> {
        let state = self.state(session_id).await?;
        let session = self.store.get_session(session_id)?;
        Ok(SessionSnapshot { session, state })
    }

    /// Current turn state
    pub async fn state(&self, session_id: &str) -> Result<TurnState, ManagerError> {
        let runtimes = self.runtimes.read().await;
        let handle = runtimes
            .get(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        let state = handle.state_rx.borrow().clone();
        Ok(state)
    }

    /// Send an event to a session
    pub async fn send_event(&self, session_id: &str, event: Event) -> Result<(), ManagerError> {
        let event_tx = {
            let runtimes = self.runtimes.read().await;
            runtimes
                .get(session_id)
                .map(|h| h.event_tx.clone())
                .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?
        };
        tracing::debug!(session_id = %session_id, event = event.name(), "Queueing event");
        event_tx
            .send(event)
            .await
            .map_err(|_| ManagerError::RuntimeStopped)
    }

    /// Queue approval of the proposal hosted by `message_id`
    pub async fn approve(&self, session_id: &str, message_id: &str) -> Result<(), ManagerError> {
        let message = self.store.get_message(session_id, message_id)?;
        let hosted_by_reply = message.sender == Sender::Ai && message.kind == MessageKind::Text;
        let campaign = hosted_by_reply
            .then(|| CampaignReply::parse(&message.content))
            .and_then(|reply| reply.proposal().cloned())
            .ok_or_else(|| ManagerError::NotAProposal(message_id.to_string()))?;

        self.send_event(
            session_id,
            Event::ApproveRequested {
                message_id: message_id.to_string(),
                campaign,
            },
        )
        .await
    }

    /// Subscribe to session updates. The snapshot is taken after subscribing
    /// so nothing falls between the two.
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<(broadcast::Receiver<SseEvent>, SessionSnapshot), ManagerError> {
        let rx = {
            let runtimes = self.runtimes.read().await;
            runtimes
                .get(session_id)
                .map(|h| h.broadcast_tx.subscribe())
                .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?
        };
        let snapshot = self.get_session(session_id).await?;
        Ok((rx, snapshot))
    }

    /// Stop the runtime and drop the session
    pub async fn delete_session(&self, session_id: &str) -> Result<(), ManagerError> {
        if let Some(handle) = self.runtimes.write().await.remove(session_id) {
            handle.cancel.cancel();
        }
        self.store.delete_session(session_id)?;
        tracing::info!(session_id = %session_id, "Session deleted");
        Ok(())
    }
}
