use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{
    model::{CueMirror, cue::CueDescriptor},
    protocol::{OutboundCommand, StopBehavior},
};

const STOP_ALL: &str = "stop_all";
const PLAY_CUE_PREFIX: &str = "play_cue_";
const STOP_CUE_PREFIX: &str = "stop_cue_";
const TOGGLE_CUE_PREFIX: &str = "toggle_cue_";

/// Button action identifiers, e.g. `stop_all` or `toggle_cue_<cue id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionId {
    StopAll,
    PlayCue(String),
    StopCue(String),
    ToggleCue(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown action id '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for ActionId {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == STOP_ALL {
            return Ok(ActionId::StopAll);
        }
        let cue_action = [
            (PLAY_CUE_PREFIX, ActionId::PlayCue as fn(String) -> ActionId),
            (STOP_CUE_PREFIX, ActionId::StopCue),
            (TOGGLE_CUE_PREFIX, ActionId::ToggleCue),
        ]
        .into_iter()
        .find_map(|(prefix, build)| {
            s.strip_prefix(prefix)
                .filter(|cue_id| !cue_id.is_empty())
                .map(|cue_id| build(cue_id.to_string()))
        });
        cue_action.ok_or_else(|| UnknownAction(s.to_string()))
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionId::StopAll => f.write_str(STOP_ALL),
            ActionId::PlayCue(cue_id) => write!(f, "{PLAY_CUE_PREFIX}{cue_id}"),
            ActionId::StopCue(cue_id) => write!(f, "{STOP_CUE_PREFIX}{cue_id}"),
            ActionId::ToggleCue(cue_id) => write!(f, "{TOGGLE_CUE_PREFIX}{cue_id}"),
        }
    }
}

impl ActionId {
    /// Resolves the outbound command for this button. Cue actions only exist
    /// for cues in the current list, so anything else yields `None`.
    pub fn to_command(&self, mirror: &CueMirror) -> Option<OutboundCommand> {
        let known = |cue_id: &String| mirror.contains(cue_id);
        match self {
            ActionId::StopAll => Some(OutboundCommand::StopAllCues {
                behavior: StopBehavior::FadeOutAndStop,
            }),
            ActionId::PlayCue(cue_id) if known(cue_id) => Some(OutboundCommand::PlayCue {
                cue_id: cue_id.clone(),
            }),
            ActionId::StopCue(cue_id) if known(cue_id) => Some(OutboundCommand::StopCue {
                cue_id: cue_id.clone(),
            }),
            ActionId::ToggleCue(cue_id) if known(cue_id) => Some(OutboundCommand::ToggleCue {
                cue_id: cue_id.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub action_id: String,
    pub name: String,
}

pub fn action_definitions(cues: &[CueDescriptor]) -> Vec<ActionDefinition> {
    let mut definitions = Vec::with_capacity(1 + cues.len() * 3);
    definitions.push(ActionDefinition {
        action_id: ActionId::StopAll.to_string(),
        name: "Stop All Audio".to_string(),
    });

    for cue in cues {
        let label = cue.display_name();
        let entries = [
            (ActionId::PlayCue(cue.id.clone()), "Play"),
            (ActionId::StopCue(cue.id.clone()), "Stop"),
            (ActionId::ToggleCue(cue.id.clone()), "Toggle"),
        ];
        for (action_id, verb) in entries {
            definitions.push(ActionDefinition {
                action_id: action_id.to_string(),
                name: format!("{verb}: {label}"),
            });
        }
    }
    definitions
}
