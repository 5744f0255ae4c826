//! Session state machine.
//!
//! The full stage/intent transition table for the deck-building workflow.
//! The machine is a pure function: it inspects a session and an intent and
//! says what should happen, it never performs the work or writes anything.
//! Pairs absent from the table are explicit no-ops, so an out-of-order or
//! replayed frame can never move a session somewhere unexpected.

use super::intent::Intent;
use super::model::Session;
use super::stage::Stage;

/// The work the caller should perform for a decided transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    /// Ask the user for audience, tone and scope.
    AskClarifications,
    /// Propose a high-level approach for acceptance.
    ProposePlan,
    /// Draft the outline via the planner. Expensive.
    ProduceOutline,
    /// Revise the stored outline against the user's instructions.
    ReviseOutline,
    /// Run the generation batch against downstream services. Expensive.
    RunGeneration,
    /// Return the already-stored outline; no planner call.
    ReplayOutline,
    /// Return the already-stored manifest; no generation.
    ReplayManifest,
    /// The intent has no transition from the current stage. Do nothing.
    Ignore,
}

/// A decided transition.
///
/// `next_stage` is the stage the caller persists once the action's work
/// succeeds. When the work fails the stored session stays untouched, which
/// is what keeps failed generations retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub next_stage: Stage,
    pub action: StageAction,
}

/// The transition table, total over every (stage, intent) pair.
pub struct SessionStateMachine;

impl SessionStateMachine {
    /// Decides what to do for `intent` given the session's current state.
    ///
    /// Stages whose expensive work already completed replay their stored
    /// artifact instead of repeating the work, which makes duplicate
    /// delivery of accept/request frames harmless.
    pub fn decide(session: &Session, intent: Intent) -> Decision {
        match (session.stage, intent) {
            (Stage::Greeting, Intent::DeckRequested) => Decision {
                next_stage: Stage::Clarify,
                action: StageAction::AskClarifications,
            },

            (Stage::Clarify, Intent::ClarificationsProvided) => Decision {
                next_stage: Stage::Plan,
                action: StageAction::ProposePlan,
            },

            (Stage::Plan, Intent::PlanAccepted)
            | (Stage::Outline, Intent::PlanAccepted | Intent::OutlineRequested) => {
                Self::outline_decision(session)
            }

            (Stage::Outline | Stage::Refine, Intent::RefinementRequested) => Decision {
                next_stage: Stage::Refine,
                action: StageAction::ReviseOutline,
            },

            (
                Stage::Outline | Stage::Refine | Stage::Generate,
                Intent::OutlineAccepted | Intent::GenerationRequested | Intent::RetryRequested,
            ) => Self::generation_decision(session),

            // Every other pair is a deliberate no-op: the stage is preserved
            // and nothing runs.
            (stage, _) => Decision {
                next_stage: stage,
                action: StageAction::Ignore,
            },
        }
    }

    fn outline_decision(session: &Session) -> Decision {
        let action = if session.is_complete(Stage::Outline) {
            StageAction::ReplayOutline
        } else {
            StageAction::ProduceOutline
        };
        Decision {
            next_stage: Stage::Outline,
            action,
        }
    }

    fn generation_decision(session: &Session) -> Decision {
        let action = if session.is_complete(Stage::Generate) {
            StageAction::ReplayManifest
        } else {
            StageAction::RunGeneration
        };
        Decision {
            next_stage: Stage::Generate,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentItemSpec, ContentManifest, OutlineSpec};
    use crate::rollout::PipelineRevision;
    use crate::session::model::StageArtifact;

    const ALL_STAGES: [Stage; 6] = [
        Stage::Greeting,
        Stage::Clarify,
        Stage::Plan,
        Stage::Outline,
        Stage::Refine,
        Stage::Generate,
    ];

    const ALL_INTENTS: [Intent; 9] = [
        Intent::DeckRequested,
        Intent::ClarificationsProvided,
        Intent::PlanAccepted,
        Intent::OutlineRequested,
        Intent::RefinementRequested,
        Intent::OutlineAccepted,
        Intent::GenerationRequested,
        Intent::RetryRequested,
        Intent::Unknown,
    ];

    fn session_at(stage: Stage) -> Session {
        let mut session = Session::new("s-1", "u-1");
        session.stage = stage;
        if matches!(stage, Stage::Outline | Stage::Refine | Stage::Generate) {
            session.record_artifact(
                Stage::Outline,
                StageArtifact::Outline(
                    OutlineSpec::new("Topic", vec![ContentItemSpec::new(1, "Intro")]).unwrap(),
                ),
            );
        }
        if stage == Stage::Generate {
            session.record_artifact(
                Stage::Generate,
                StageArtifact::Manifest(ContentManifest {
                    batch_id: "b-1".to_string(),
                    pipeline: PipelineRevision::Established,
                    results: Vec::new(),
                    succeeded: 1,
                    failed: 0,
                    completed_at: "2026-01-01T00:00:00Z".to_string(),
                }),
            );
        }
        session
    }

    #[test]
    fn happy_path_walks_every_stage() {
        let steps = [
            (Stage::Greeting, Intent::DeckRequested, Stage::Clarify, StageAction::AskClarifications),
            (Stage::Clarify, Intent::ClarificationsProvided, Stage::Plan, StageAction::ProposePlan),
            (Stage::Plan, Intent::PlanAccepted, Stage::Outline, StageAction::ProduceOutline),
            (Stage::Outline, Intent::OutlineAccepted, Stage::Generate, StageAction::RunGeneration),
        ];
        for (stage, intent, expected_stage, expected_action) in steps {
            let mut session = session_at(stage);
            // The happy path reaches each stage with no later work done yet.
            session.completed.clear();
            let decision = SessionStateMachine::decide(&session, intent);
            assert_eq!(decision.next_stage, expected_stage, "from {stage}/{intent}");
            assert_eq!(decision.action, expected_action, "from {stage}/{intent}");
        }
    }

    #[test]
    fn completed_outline_is_replayed_not_rebuilt() {
        let session = session_at(Stage::Outline);
        let decision = SessionStateMachine::decide(&session, Intent::OutlineRequested);
        assert_eq!(decision.action, StageAction::ReplayOutline);
        assert_eq!(decision.next_stage, Stage::Outline);
    }

    #[test]
    fn duplicate_plan_acceptance_replays_after_the_advance() {
        // First accept-plan moved the session to Outline and stored the
        // artifact; the redelivered frame must not invoke the planner again.
        let session = session_at(Stage::Outline);
        let decision = SessionStateMachine::decide(&session, Intent::PlanAccepted);
        assert_eq!(decision.action, StageAction::ReplayOutline);
    }

    #[test]
    fn refinement_loops_in_the_refine_stage() {
        for stage in [Stage::Outline, Stage::Refine] {
            let decision =
                SessionStateMachine::decide(&session_at(stage), Intent::RefinementRequested);
            assert_eq!(decision.next_stage, Stage::Refine);
            assert_eq!(decision.action, StageAction::ReviseOutline);
        }
    }

    #[test]
    fn acceptance_from_refine_starts_generation() {
        let decision =
            SessionStateMachine::decide(&session_at(Stage::Refine), Intent::OutlineAccepted);
        assert_eq!(decision.next_stage, Stage::Generate);
        assert_eq!(decision.action, StageAction::RunGeneration);
    }

    #[test]
    fn retry_reruns_generation_when_no_manifest_exists() {
        // A fully failed batch leaves the session in Outline/Refine with no
        // manifest; an explicit retry runs the batch again.
        for stage in [Stage::Outline, Stage::Refine] {
            let decision = SessionStateMachine::decide(&session_at(stage), Intent::RetryRequested);
            assert_eq!(decision.action, StageAction::RunGeneration);
        }
    }

    #[test]
    fn terminal_stage_replays_the_manifest() {
        let session = session_at(Stage::Generate);
        for intent in [
            Intent::GenerationRequested,
            Intent::RetryRequested,
            Intent::OutlineAccepted,
        ] {
            let decision = SessionStateMachine::decide(&session, intent);
            assert_eq!(decision.next_stage, Stage::Generate);
            assert_eq!(decision.action, StageAction::ReplayManifest);
        }
    }

    #[test]
    fn unlisted_pairs_are_noops_that_preserve_the_stage() {
        let cases = [
            (Stage::Greeting, Intent::PlanAccepted),
            (Stage::Greeting, Intent::GenerationRequested),
            (Stage::Clarify, Intent::DeckRequested),
            (Stage::Plan, Intent::RefinementRequested),
            (Stage::Generate, Intent::DeckRequested),
        ];
        for (stage, intent) in cases {
            let decision = SessionStateMachine::decide(&session_at(stage), intent);
            assert_eq!(decision.action, StageAction::Ignore, "{stage}/{intent}");
            assert_eq!(decision.next_stage, stage, "{stage}/{intent}");
        }
    }

    #[test]
    fn table_is_total_and_unknown_intent_never_moves_a_session() {
        for stage in ALL_STAGES {
            for intent in ALL_INTENTS {
                let session = session_at(stage);
                let decision = SessionStateMachine::decide(&session, intent);
                if decision.action == StageAction::Ignore {
                    assert_eq!(decision.next_stage, stage);
                }
            }
            let decision = SessionStateMachine::decide(&session_at(stage), Intent::Unknown);
            assert_eq!(decision.action, StageAction::Ignore);
        }
    }
}
