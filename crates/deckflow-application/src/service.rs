//! Conversation service.
//!
//! The application-layer engine behind the frame endpoint: every inbound
//! frame passes through the gate, takes the session's lock, runs the state
//! machine, performs the decided work and persists the session before the
//! reply goes back to the transport. One frame in, one reply out.

use std::sync::Arc;

use deckflow_core::config::EngineConfig;
use deckflow_core::content::ContentManifest;
use deckflow_core::gate::{GateDecision, InboundFrame, MessageGate};
use deckflow_core::rollout::{PipelineRevision, RolloutSelector};
use deckflow_core::session::{
    Intent, Session, SessionRepository, SessionStateMachine, Stage, StageAction, StageArtifact,
};
use deckflow_core::{DeckflowError, Result};
use deckflow_generation::ContentOrchestrator;

use crate::classifier::IntentClassifier;
use crate::locks::SessionLocks;
use crate::planner::OutlinePlanner;
use crate::reply::{PromptKind, SessionReply};

/// Drives deck-building sessions from inbound frames to replies.
///
/// The service owns no session state itself; sessions live in the
/// repository and the per-session locks only serialize concurrent frames
/// for the same id. Frames for different sessions run in parallel.
pub struct ConversationService {
    repository: Arc<dyn SessionRepository>,
    intent_classifier: Arc<dyn IntentClassifier>,
    planner: Arc<dyn OutlinePlanner>,
    established: Arc<ContentOrchestrator>,
    candidate: Option<Arc<ContentOrchestrator>>,
    config: EngineConfig,
    locks: SessionLocks,
}

impl ConversationService {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        intent_classifier: Arc<dyn IntentClassifier>,
        planner: Arc<dyn OutlinePlanner>,
        established: Arc<ContentOrchestrator>,
        config: EngineConfig,
    ) -> Self {
        Self {
            repository,
            intent_classifier,
            planner,
            established,
            candidate: None,
            config,
            locks: SessionLocks::new(),
        }
    }

    /// Registers the candidate generation pipeline.
    ///
    /// Sessions whose rollout bucket falls under `rollout_percentage` are
    /// served by this orchestrator; without one, every session stays on the
    /// established pipeline no matter the percentage.
    pub fn with_candidate_pipeline(mut self, orchestrator: Arc<ContentOrchestrator>) -> Self {
        self.candidate = Some(orchestrator);
        self
    }

    /// Handles one inbound frame for a session.
    ///
    /// # Arguments
    /// * `session_id` - The session the frame belongs to
    /// * `owner_id` - The authenticated user, used when the frame creates
    ///   the session
    /// * `frame` - The frame as delivered by the transport
    ///
    /// # Returns
    /// The reply to send back. Control frames and unknown action tokens
    /// return [`SessionReply::Ignored`] without touching any state. An
    /// `Err` means the frame's work failed and the stored session was left
    /// exactly as it was, so the same frame can be retried.
    pub async fn handle_frame(
        &self,
        session_id: &str,
        owner_id: &str,
        frame: InboundFrame,
    ) -> Result<SessionReply> {
        match MessageGate::classify_frame(&frame) {
            GateDecision::Drop => Ok(SessionReply::Ignored),
            GateDecision::DirectIntent(intent) => {
                let _guard = self.locks.lock(session_id).await;
                let mut session = self.load_or_create(session_id, owner_id).await?;
                self.apply(&mut session, intent, None).await
            }
            GateDecision::NeedsClassification(text) => {
                // The lock is taken before classification so the classifier
                // sees the stage the frame will actually be applied against.
                let _guard = self.locks.lock(session_id).await;
                let mut session = self.load_or_create(session_id, owner_id).await?;
                let intent = match self
                    .intent_classifier
                    .classify_intent(session.stage, &text)
                    .await
                {
                    Ok(intent) => intent,
                    Err(e) => {
                        tracing::warn!(
                            target: "conversation",
                            "Intent classification failed for session {}: {}",
                            session.id,
                            e
                        );
                        Intent::Unknown
                    }
                };
                self.apply(&mut session, intent, Some(text)).await
            }
        }
    }

    /// Runs the decided transition for `intent` against the session.
    ///
    /// `text` carries the user's message when the intent came from free-form
    /// input; action tokens carry none. The session is persisted once, after
    /// the action's work succeeded, so every failure path leaves the stored
    /// session untouched.
    async fn apply(
        &self,
        session: &mut Session,
        intent: Intent,
        text: Option<String>,
    ) -> Result<SessionReply> {
        let decision = SessionStateMachine::decide(session, intent);
        match decision.action {
            StageAction::Ignore => {
                if intent != Intent::Unknown {
                    let conflict = DeckflowError::conflicting_transition(
                        session.stage.to_string(),
                        intent.to_string(),
                    );
                    tracing::debug!(target: "conversation", "Session {}: {}", session.id, conflict);
                }
                Ok(SessionReply::NoOp {
                    stage: session.stage,
                })
            }

            StageAction::AskClarifications => {
                if let Some(text) = text {
                    session.push_brief(text);
                }
                self.advance(session, decision.next_stage).await?;
                Ok(SessionReply::Prompt {
                    stage: session.stage,
                    kind: PromptKind::AskClarifications,
                })
            }

            StageAction::ProposePlan => {
                if let Some(text) = text {
                    session.push_brief(text);
                }
                self.advance(session, decision.next_stage).await?;
                Ok(SessionReply::Prompt {
                    stage: session.stage,
                    kind: PromptKind::ProposePlan,
                })
            }

            StageAction::ProduceOutline => {
                if let Some(text) = text {
                    session.push_brief(text);
                }
                let outline = self.planner.draft(&session.brief).await?;
                outline.validate()?;
                session.record_artifact(Stage::Outline, StageArtifact::Outline(outline.clone()));
                self.advance(session, decision.next_stage).await?;
                Ok(SessionReply::Outline {
                    stage: session.stage,
                    outline,
                    reused: false,
                })
            }

            StageAction::ReviseOutline => {
                let current = session.outline().cloned().ok_or_else(|| {
                    DeckflowError::internal(format!(
                        "session {} reached refinement without an outline",
                        session.id
                    ))
                })?;
                let instructions = text.unwrap_or_default();
                let revised = self.planner.revise(&current, &instructions).await?;
                revised.validate()?;
                session.push_brief(instructions);
                session.record_artifact(Stage::Outline, StageArtifact::Outline(revised.clone()));
                self.advance(session, decision.next_stage).await?;
                Ok(SessionReply::Outline {
                    stage: session.stage,
                    outline: revised,
                    reused: false,
                })
            }

            StageAction::ReplayOutline => {
                let outline = session.outline().cloned().ok_or_else(|| {
                    DeckflowError::internal(format!(
                        "session {} marked the outline complete but stores none",
                        session.id
                    ))
                })?;
                tracing::debug!(
                    target: "conversation",
                    "Session {}: replaying the stored outline",
                    session.id
                );
                Ok(SessionReply::Outline {
                    stage: session.stage,
                    outline,
                    reused: true,
                })
            }

            StageAction::ReplayManifest => {
                let manifest = session.manifest().cloned().ok_or_else(|| {
                    DeckflowError::internal(format!(
                        "session {} marked generation complete but stores no manifest",
                        session.id
                    ))
                })?;
                tracing::debug!(
                    target: "conversation",
                    "Session {}: replaying the stored manifest",
                    session.id
                );
                Ok(SessionReply::Manifest {
                    stage: session.stage,
                    manifest,
                    reused: true,
                })
            }

            StageAction::RunGeneration => self.run_generation(session, decision.next_stage).await,
        }
    }

    /// Runs the generation batch and stores the manifest.
    ///
    /// A batch where every item failed is a stage-level failure: nothing is
    /// persisted, the session keeps its pre-generation stage and the caller
    /// gets [`DeckflowError::BatchFailed`], leaving an explicit retry open.
    /// Partial failure is a delivery - the manifest carries the per-item
    /// failure markers.
    async fn run_generation(
        &self,
        session: &mut Session,
        next_stage: Stage,
    ) -> Result<SessionReply> {
        let outline = session.outline().cloned().ok_or_else(|| {
            DeckflowError::internal(format!(
                "session {} reached generation without an outline",
                session.id
            ))
        })?;

        let (pipeline, orchestrator) = self.pick_pipeline(&session.id);
        tracing::info!(
            target: "conversation",
            "Session {}: generating {} items on the {} pipeline",
            session.id,
            outline.len(),
            pipeline
        );

        let batch = orchestrator.run(&outline).await;
        if batch.is_total_failure() {
            tracing::warn!(
                target: "conversation",
                "Session {}: generation failed for all {} items",
                session.id,
                batch.failed
            );
            return Err(DeckflowError::batch_failed(batch.failed, batch.total()));
        }

        let manifest = ContentManifest {
            batch_id: uuid::Uuid::new_v4().to_string(),
            pipeline,
            results: batch.results,
            succeeded: batch.succeeded,
            failed: batch.failed,
            completed_at: chrono::Utc::now().to_rfc3339(),
        };
        session.record_artifact(Stage::Generate, StageArtifact::Manifest(manifest.clone()));
        self.advance(session, next_stage).await?;
        Ok(SessionReply::Manifest {
            stage: session.stage,
            manifest,
            reused: false,
        })
    }

    /// Picks the pipeline for a session.
    ///
    /// The rollout selector is consulted fresh on every batch; there is no
    /// cached assignment. A session selected for rollout while no candidate
    /// is registered runs on the established pipeline, and the manifest
    /// records the pipeline that actually served it.
    fn pick_pipeline(&self, session_id: &str) -> (PipelineRevision, Arc<ContentOrchestrator>) {
        let selected = RolloutSelector::select(session_id, self.config.rollout_percentage);
        match (selected, &self.candidate) {
            (PipelineRevision::New, Some(candidate)) => {
                (PipelineRevision::New, candidate.clone())
            }
            (PipelineRevision::New, None) => {
                tracing::debug!(
                    target: "conversation",
                    "Session {} is in the rollout bucket but no candidate pipeline is registered",
                    session_id
                );
                (PipelineRevision::Established, self.established.clone())
            }
            (PipelineRevision::Established, _) => {
                (PipelineRevision::Established, self.established.clone())
            }
        }
    }

    /// Moves the session to `next_stage` and persists it.
    async fn advance(&self, session: &mut Session, next_stage: Stage) -> Result<()> {
        session.stage = next_stage;
        session.touch();
        session.version = self.repository.upsert(session).await?;
        Ok(())
    }

    async fn load_or_create(&self, session_id: &str, owner_id: &str) -> Result<Session> {
        if let Some(session) = self.repository.find_by_id(session_id).await? {
            return Ok(session);
        }
        let mut session = Session::new(session_id, owner_id);
        session.version = self.repository.upsert(&session).await?;
        tracing::info!(
            target: "conversation",
            "Created session {} for owner {}",
            session_id,
            owner_id
        );
        Ok(session)
    }
}
