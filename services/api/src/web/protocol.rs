//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the
//! API server for a live search session.

use lookup_core::pipeline::{Outcome, PipelineState, STAGE_LABELS};
use lookup_core::{LookupMode, PlatformId, SearchResult};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Starts a search for the given username.
    Submit { username: String },

    /// Abandons the current search or clears the settled result.
    Reset,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// How a search ended.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettledStatus {
    Found,
    NotFound,
    Error,
}

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the connection is bound to a platform and ready for searches.
    SessionReady { platform: PlatformId, mode: LookupMode },

    /// A progress stage is being held; `progress` fills the progress bar.
    Stage { stage: usize, label: String, progress: f32 },

    /// The dataset lookup itself is running.
    Executing,

    /// The search finished.
    Settled { status: SettledStatus, result: SearchResult },

    /// The search box is empty again.
    Idle,

    /// The username was rejected before submission; shown inline.
    ValidationFailed { message: String },

    /// A search is already in flight.
    Busy,

    /// Reports a fatal error to the client, which should display an error message.
    Error { message: String },
}

impl ServerMessage {
    pub fn from_state(state: &PipelineState) -> Self {
        match state {
            PipelineState::Idle => ServerMessage::Idle,
            PipelineState::Staging { stage } => ServerMessage::Stage {
                stage: *stage,
                label: STAGE_LABELS[*stage].to_string(),
                progress: state.progress().unwrap_or_default(),
            },
            PipelineState::Executing => ServerMessage::Executing,
            PipelineState::Settled(outcome) => ServerMessage::Settled {
                status: match outcome {
                    Outcome::Found(_) => SettledStatus::Found,
                    Outcome::NotFound(_) => SettledStatus::NotFound,
                    Outcome::Errored(_) => SettledStatus::Error,
                },
                result: outcome.result(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_tags() {
        let submit: ClientMessage =
            serde_json::from_str(r#"{"type":"submit","username":"@testuser12"}"#).unwrap();
        assert_eq!(submit, ClientMessage::Submit { username: "@testuser12".to_string() });
        let reset: ClientMessage = serde_json::from_str(r#"{"type":"reset"}"#).unwrap();
        assert_eq!(reset, ClientMessage::Reset);
    }

    #[test]
    fn stage_messages_carry_progress() {
        let msg = ServerMessage::from_state(&PipelineState::Staging { stage: 2 });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "stage");
        assert_eq!(json["stage"], 2);
        assert_eq!(json["progress"], 0.75);
        assert_eq!(json["label"], STAGE_LABELS[2]);
    }

    #[test]
    fn settled_messages_name_the_status() {
        let msg = ServerMessage::from_state(&PipelineState::Settled(Outcome::NotFound(
            SearchResult::not_found(),
        )));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "settled");
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["result"]["found"], false);
        assert!(json["result"]["data"].is_null());
    }
}
