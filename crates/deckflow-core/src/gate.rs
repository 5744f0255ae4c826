//! Inbound frame gate.
//!
//! Every frame from the transport passes through here before any session
//! logic runs. The gate separates machine chatter (delivery acks, keepalive
//! pings, transport control frames) from actual user turns, and resolves
//! structured action tokens without involving the intent classifier.

use serde::{Deserialize, Serialize};

use crate::session::Intent;

/// A frame as delivered by the transport.
///
/// The `type` tag is part of the wire contract with clients; control-plane
/// frames are distinguished structurally, never by inspecting text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundFrame {
    /// Transport control frame (close, resume, flow control).
    Control {
        #[serde(default)]
        reason: Option<String>,
    },
    /// Keepalive ping.
    Heartbeat,
    /// Delivery acknowledgement for a frame this engine sent.
    Ack {
        #[serde(default)]
        frame_id: Option<String>,
    },
    /// Free-form user text.
    UserInput { text: String },
    /// Structured action token from a client control, e.g. "accept-plan".
    ActionToken { token: String },
}

impl InboundFrame {
    /// Whether this frame is machine chatter rather than a user turn.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            InboundFrame::Control { .. } | InboundFrame::Heartbeat | InboundFrame::Ack { .. }
        )
    }
}

/// What the gate decided about a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Discard the frame. No session logic runs, no state is touched.
    Drop,
    /// A known action token resolved directly to an intent.
    DirectIntent(Intent),
    /// Free-form text that needs the probabilistic intent classifier.
    NeedsClassification(String),
}

/// Structural frame filter and action-token resolver.
pub struct MessageGate;

impl MessageGate {
    /// Classifies one inbound frame.
    ///
    /// Control-plane frames are dropped before any session logic. Action
    /// tokens map through the fixed token table; a token not in the table
    /// is dropped with a warning rather than guessed at. Only free-form
    /// user text ever reaches the classifier - including empty text, whose
    /// handling is the classifier's call, not the gate's.
    pub fn classify_frame(frame: &InboundFrame) -> GateDecision {
        match frame {
            InboundFrame::Control { reason } => {
                tracing::debug!(
                    target: "gate",
                    "Dropping control frame (reason: {:?})",
                    reason
                );
                GateDecision::Drop
            }
            InboundFrame::Heartbeat => GateDecision::Drop,
            InboundFrame::Ack { frame_id } => {
                tracing::trace!(target: "gate", "Dropping ack frame (frame_id: {:?})", frame_id);
                GateDecision::Drop
            }
            InboundFrame::ActionToken { token } => match Intent::from_action_token(token) {
                Some(intent) => GateDecision::DirectIntent(intent),
                None => {
                    tracing::warn!(target: "gate", "Dropping unknown action token '{}'", token);
                    GateDecision::Drop
                }
            },
            InboundFrame::UserInput { text } => GateDecision::NeedsClassification(text.clone()),
        }
    }
}
