use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::cue::{CueDescriptor, PlaybackStatus, deserialize_cue_id};

const CUES_LIST_UPDATE: &str = "cuesListUpdate";
const CUE_STATUS: &str = "cueStatus";
const PLAYBACK_TIME_UPDATE: &str = "playbackTimeUpdate";

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Malformed '{tag}' message: {reason}")]
    Malformed { tag: &'static str, reason: String },
}

fn malformed(tag: &'static str, reason: impl ToString) -> ProtocolError {
    ProtocolError::Malformed {
        tag,
        reason: reason.to_string(),
    }
}

/// Notifications pushed by the soundboard.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    CuesListUpdate(Vec<CueDescriptor>),
    /// Superseded by `PlaybackTimeUpdate`; carried for logging only.
    CueStatus(Value),
    PlaybackTimeUpdate(PlaybackUpdate),
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackUpdate {
    #[serde(deserialize_with = "deserialize_cue_id")]
    pub cue_id: String,
    pub status: PlaybackStatus,
    pub cue_name: Option<String>,
    pub playlist_item_name: Option<String>,
    pub current_time_formatted: Option<String>,
    pub total_duration_formatted: Option<String>,
    pub remaining_time_formatted: Option<String>,
    pub current_time_sec: Option<f64>,
    pub total_duration_sec: Option<f64>,
    pub remaining_time_sec: Option<f64>,
}

impl PlaybackUpdate {
    pub fn new(cue_id: impl Into<String>, status: PlaybackStatus) -> Self {
        Self {
            cue_id: cue_id.into(),
            status,
            cue_name: None,
            playlist_item_name: None,
            current_time_formatted: None,
            total_duration_formatted: None,
            remaining_time_formatted: None,
            current_time_sec: None,
            total_duration_sec: None,
            remaining_time_sec: None,
        }
    }
}

/// Decodes one text frame from the soundboard.
///
/// Lists arrive as `{"event": .., "payload": ..}` while playback updates use
/// `{"type": .., "data": ..}`, so the tag is looked up by hand instead of
/// through a tagged enum.
pub fn decode_inbound(text: &str) -> Result<InboundMessage, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;

    match value.get("event").and_then(Value::as_str) {
        Some(CUES_LIST_UPDATE) => {
            let cues = value
                .get("payload")
                .and_then(|payload| payload.get("cues"))
                .filter(|cues| cues.is_array())
                .ok_or_else(|| malformed(CUES_LIST_UPDATE, "payload.cues is not an array"))?;
            let cues = Vec::<CueDescriptor>::deserialize(cues)
                .map_err(|e| malformed(CUES_LIST_UPDATE, e))?;
            return Ok(InboundMessage::CuesListUpdate(cues));
        }
        Some(CUE_STATUS) => {
            let payload = value.get("payload").cloned().unwrap_or(Value::Null);
            return Ok(InboundMessage::CueStatus(payload));
        }
        _ => {}
    }

    if value.get("type").and_then(Value::as_str) == Some(PLAYBACK_TIME_UPDATE) {
        let data = value
            .get("data")
            .filter(|data| data.is_object())
            .ok_or_else(|| malformed(PLAYBACK_TIME_UPDATE, "missing data object"))?;
        let update =
            PlaybackUpdate::deserialize(data).map_err(|e| malformed(PLAYBACK_TIME_UPDATE, e))?;
        if update.cue_id.is_empty() || update.status.as_str().is_empty() {
            return Err(malformed(PLAYBACK_TIME_UPDATE, "empty cueId or status"));
        }
        return Ok(InboundMessage::PlaybackTimeUpdate(update));
    }

    Ok(InboundMessage::Unknown)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopBehavior {
    FadeOutAndStop,
}

/// Commands sent to the soundboard.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(
    tag = "action",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum OutboundCommand {
    PlayCue { cue_id: String },
    StopCue { cue_id: String },
    ToggleCue { cue_id: String },
    StopAllCues { behavior: StopBehavior },
}

impl OutboundCommand {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
