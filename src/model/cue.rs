use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A cue as announced by the soundboard. Only the fields the bridge uses are kept.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CueDescriptor {
    #[serde(deserialize_with = "deserialize_cue_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl CueDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }

    /// Name shown on buttons and in action labels, falling back to the id.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCueId {
    Text(String),
    Number(serde_json::Number),
}

/// Cue ids are kept as strings; numeric ids from the soundboard are stringified.
pub fn deserialize_cue_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawCueId::deserialize(deserializer)? {
        RawCueId::Text(id) => id,
        RawCueId::Number(id) => id.to_string(),
    })
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
    Error,
    Other(String),
}

impl PlaybackStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Stopped => "stopped",
            PlaybackStatus::Error => "error",
            PlaybackStatus::Other(status) => status,
        }
    }

    /// Playing or paused cues count as the "current" cue.
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackStatus::Playing | PlaybackStatus::Paused)
    }
}

impl From<&str> for PlaybackStatus {
    fn from(value: &str) -> Self {
        match value {
            "playing" => PlaybackStatus::Playing,
            "paused" => PlaybackStatus::Paused,
            "stopped" => PlaybackStatus::Stopped,
            "error" => PlaybackStatus::Error,
            other => PlaybackStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for PlaybackStatus {
    fn from(value: String) -> Self {
        PlaybackStatus::from(value.as_str())
    }
}

impl From<PlaybackStatus> for String {
    fn from(value: PlaybackStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
