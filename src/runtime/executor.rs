//! Session runtime executor

use super::traits::{CampaignAssistant, WorkflowClient};
use super::SseEvent;

use crate::state_machine::{transition, Effect, Event, Stage, TurnContext, TurnState};
use crate::store::{MemoryStore, MergePolicy};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Generic session runtime that can work with any assistant and workflow
/// implementations
pub struct SessionRuntime<A, W>
where
    A: CampaignAssistant + ?Sized + 'static,
    W: WorkflowClient + ?Sized + 'static,
{
    session_id: String,
    merge_policy: MergePolicy,
    state: TurnState,
    store: MemoryStore,
    assistant: Arc<A>,
    workflow: Arc<W>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    /// Published after every transition so handlers can read busy status
    state_tx: watch::Sender<TurnState>,
    cancel: CancellationToken,
}

impl<A, W> SessionRuntime<A, W>
where
    A: CampaignAssistant + ?Sized + 'static,
    W: WorkflowClient + ?Sized + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: impl Into<String>,
        merge_policy: MergePolicy,
        store: MemoryStore,
        assistant: Arc<A>,
        workflow: Arc<W>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<SseEvent>,
        state_tx: watch::Sender<TurnState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            merge_policy,
            state: TurnState::Idle,
            store,
            assistant,
            workflow,
            event_rx,
            event_tx,
            broadcast_tx,
            state_tx,
            cancel,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "Starting session runtime");

        // Process events one at a time; spawned calls report back through event_tx
        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::error!(session_id = %self.session_id, error = %e, "Error handling event");
                        let _ = self.broadcast_tx.send(SseEvent::Error { message: e });
                    }
                }

                else => break,
            }
        }

        tracing::info!(session_id = %self.session_id, "Session runtime stopped");
    }

    fn context(&self) -> Result<TurnContext, String> {
        let sid = self.session_id.as_str();
        let parameters = self.store.get_parameters(sid).map_err(|e| e.to_string())?;
        let has_checkpoint = self.store.has_checkpoint(sid).map_err(|e| e.to_string())?;
        Ok(TurnContext {
            session_id: self.session_id.clone(),
            parameters,
            has_checkpoint,
            merge_policy: self.merge_policy,
        })
    }

    fn process_event(&mut self, event: Event) -> Result<(), String> {
        let context = self.context()?;
        let is_user_event = event.is_user_event();
        let event_name = event.name();

        // Pure state transition
        let result = match transition(&self.state, &context, event) {
            Ok(r) => r,
            Err(e) if is_user_event => {
                // User-facing rejection (busy, nothing to restore, empty text)
                tracing::info!(
                    session_id = %self.session_id,
                    state = %self.state,
                    event = event_name,
                    error = %e,
                    "Rejected user event"
                );
                let _ = self.broadcast_tx.send(SseEvent::Error {
                    message: e.to_string(),
                });
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    state = %self.state,
                    event = event_name,
                    error = %e,
                    "Dropping result event"
                );
                return Ok(());
            }
        };

        tracing::debug!(
            session_id = %self.session_id,
            from = %self.state,
            to = %result.new_state,
            event = event_name,
            effects = result.effects.len(),
            spawns_call = result.effects.iter().any(Effect::is_io),
            "Transition"
        );

        self.state = result.new_state;
        self.state_tx.send_replace(self.state.clone());

        for effect in result.effects {
            self.execute_effect(effect)?;
        }

        Ok(())
    }

    fn execute_effect(&self, effect: Effect) -> Result<(), String> {
        let sid = self.session_id.as_str();
        match effect {
            Effect::AddMessage(message) => {
                let msg = self
                    .store
                    .add_message(sid, message)
                    .map_err(|e| e.to_string())?;
                let _ = self.broadcast_tx.send(SseEvent::Message { message: msg });
            }

            Effect::SetParameters(parameters) => {
                self.store
                    .set_parameters(sid, parameters.clone())
                    .map_err(|e| e.to_string())?;
                let stage = Stage::of(&parameters);
                let _ = self
                    .broadcast_tx
                    .send(SseEvent::Parameters { parameters, stage });
            }

            Effect::Checkpoint => {
                let captured = self
                    .store
                    .create_checkpoint(sid)
                    .map_err(|e| e.to_string())?;
                tracing::debug!(session_id = %sid, captured, "Checkpoint created");
            }

            Effect::RestoreCheckpoint => {
                let messages = self
                    .store
                    .restore_checkpoint(sid)
                    .map_err(|e| e.to_string())?;
                tracing::info!(session_id = %sid, restored = messages.len(), "Checkpoint restored");
                let _ = self
                    .broadcast_tx
                    .send(SseEvent::MessagesRestored { messages });
            }

            Effect::MarkApproved { message_id } => {
                let msg = self
                    .store
                    .mark_approved(sid, &message_id)
                    .map_err(|e| e.to_string())?;
                let _ = self
                    .broadcast_tx
                    .send(SseEvent::MessageUpdated { message: msg });
            }

            Effect::NotifyState => {
                let _ = self.broadcast_tx.send(SseEvent::StateChange {
                    state: self.state.clone(),
                });
            }

            Effect::TurnComplete => {
                let _ = self.broadcast_tx.send(SseEvent::TurnComplete);
            }

            io => self.spawn_io(io),
        }
        Ok(())
    }

    /// Run an I/O effect in the background and feed its outcome back as an event
    fn spawn_io(&self, effect: Effect) {
        let assistant = self.assistant.clone();
        let workflow = self.workflow.clone();
        let event_tx = self.event_tx.clone();
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            let event = match effect {
                Effect::Validate { text, context } => Event::ValidationComplete {
                    validation: assistant.validate(&text, context).await,
                },
                Effect::Extract { text } => Event::ExtractionComplete {
                    result: assistant.extract(&text).await.map_err(|e| e.to_string()),
                },
                Effect::SendToWorkflow { parameters } => {
                    tracing::info!(session_id = %session_id, "Sending parameters to workflow");
                    let result = workflow.generate(&parameters).await;
                    if let Err(e) = &result {
                        tracing::warn!(session_id = %session_id, status = ?e.status(), error = %e, "Workflow call failed");
                    }
                    Event::WorkflowComplete {
                        result: result.map_err(|e| e.to_string()),
                    }
                }
                Effect::SendApproval {
                    campaign,
                    parameters,
                } => {
                    tracing::info!(
                        session_id = %session_id,
                        campaign_id = %campaign.campaign_id,
                        "Sending approval to workflow"
                    );
                    let result = workflow.approve(&campaign, &parameters).await;
                    if let Err(e) = &result {
                        tracing::warn!(session_id = %session_id, status = ?e.status(), error = %e, "Approval call failed");
                    }
                    Event::ApprovalComplete {
                        result: result.map_err(|e| e.to_string()),
                    }
                }
                Effect::Celebrate { campaign } => Event::CelebrationComplete {
                    text: assistant.celebrate(&campaign).await,
                },
                Effect::Brainstorm { text } => Event::BrainstormComplete {
                    result: assistant.brainstorm(&text).await.map_err(|e| e.to_string()),
                },
                other => {
                    tracing::error!(effect = ?other, "Not an I/O effect");
                    return;
                }
            };

            if event_tx.send(event).await.is_err() {
                tracing::debug!(session_id = %session_id, "Session closed before call completed");
            }
        });
    }
}
