use serde::Serialize;

use crate::{
    connection::ConnectionStatus, feedback::FeedbackId, model::cue::CueDescriptor,
    variables::VariableValues,
};

/// Notifications pushed to every connected panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "param", rename_all_fields = "camelCase")]
pub enum UiEvent {
    ConnectionStatusChanged {
        status: ConnectionStatus,
    },
    CueListUpdated {
        cues: Vec<CueDescriptor>,
    },
    /// Action and preset definitions depend on the cue list and must be re-fetched.
    DefinitionsChanged,
    VariablesChanged {
        values: VariableValues,
    },
    FeedbacksInvalidated {
        feedback_ids: Vec<FeedbackId>,
    },
}
