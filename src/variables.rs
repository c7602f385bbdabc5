use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::protocol::PlaybackUpdate;

/// Number of cue slots (`cue_1` .. `cue_20`) exposed as variables.
pub const MAX_CUES_FOR_VARIABLES: usize = 20;
pub const CURRENT_CUE_PREFIX: &str = "current_cue";

const DEFAULT_NAME: &str = "N/A";
const DEFAULT_STATUS: &str = "stopped";
const DEFAULT_TIME: &str = "00:00";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum VariableValue {
    Text(String),
    Number(f64),
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::Text(value.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        VariableValue::Text(value)
    }
}

impl From<f64> for VariableValue {
    fn from(value: f64) -> Self {
        VariableValue::Number(value)
    }
}

/// A batch of variable assignments keyed by variable id.
pub type VariableValues = BTreeMap<String, VariableValue>;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VariableDefinition {
    pub variable_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueField {
    Name,
    Status,
    PlaylistItemName,
    TimeFormatted,
    DurationFormatted,
    RemainingFormatted,
    TimeSec,
    DurationSec,
    RemainingSec,
}

impl CueField {
    pub const ALL: [CueField; 9] = [
        CueField::Name,
        CueField::Status,
        CueField::PlaylistItemName,
        CueField::TimeFormatted,
        CueField::DurationFormatted,
        CueField::RemainingFormatted,
        CueField::TimeSec,
        CueField::DurationSec,
        CueField::RemainingSec,
    ];

    fn suffix(self) -> &'static str {
        match self {
            CueField::Name => "name",
            CueField::Status => "status",
            CueField::PlaylistItemName => "playlist_item_name",
            CueField::TimeFormatted => "time_formatted",
            CueField::DurationFormatted => "duration_formatted",
            CueField::RemainingFormatted => "remaining_formatted",
            CueField::TimeSec => "time_sec",
            CueField::DurationSec => "duration_sec",
            CueField::RemainingSec => "remaining_sec",
        }
    }

    fn current_label(self) -> &'static str {
        match self {
            CueField::Name => "Currently Playing Cue Name",
            CueField::Status => "Currently Playing Cue Status",
            CueField::PlaylistItemName => "Currently Playing Cue Item Name",
            CueField::TimeFormatted => "Currently Playing Time Formatted",
            CueField::DurationFormatted => "Currently Playing Duration Formatted",
            CueField::RemainingFormatted => "Currently Playing Remaining Formatted",
            CueField::TimeSec => "Currently Playing Time (s)",
            CueField::DurationSec => "Currently Playing Duration (s)",
            CueField::RemainingSec => "Currently Playing Remaining (s)",
        }
    }

    fn slot_label(self) -> &'static str {
        match self {
            CueField::Name => "Name",
            CueField::Status => "Status",
            CueField::PlaylistItemName => "Playlist Item Name",
            CueField::TimeFormatted => "Time Formatted",
            CueField::DurationFormatted => "Duration Formatted",
            CueField::RemainingFormatted => "Remaining Formatted",
            CueField::TimeSec => "Time (s)",
            CueField::DurationSec => "Duration (s)",
            CueField::RemainingSec => "Remaining (s)",
        }
    }

    fn default_value(self) -> VariableValue {
        match self {
            CueField::Name => DEFAULT_NAME.into(),
            CueField::Status => DEFAULT_STATUS.into(),
            CueField::PlaylistItemName => "".into(),
            CueField::TimeFormatted
            | CueField::DurationFormatted
            | CueField::RemainingFormatted => DEFAULT_TIME.into(),
            CueField::TimeSec | CueField::DurationSec | CueField::RemainingSec => 0.0.into(),
        }
    }
}

pub fn variable_id(prefix: &str, field: CueField) -> String {
    format!("{}_{}", prefix, field.suffix())
}

/// Variable prefix for the zero-based position of a cue in the list.
pub fn slot_prefix(index: usize) -> String {
    format!("cue_{}", index + 1)
}

pub fn variable_definitions() -> Vec<VariableDefinition> {
    let mut definitions = Vec::with_capacity(CueField::ALL.len() * (MAX_CUES_FOR_VARIABLES + 1));

    for field in CueField::ALL {
        definitions.push(VariableDefinition {
            variable_id: variable_id(CURRENT_CUE_PREFIX, field),
            name: field.current_label().to_string(),
        });
    }
    for index in 0..MAX_CUES_FOR_VARIABLES {
        let prefix = slot_prefix(index);
        for field in CueField::ALL {
            definitions.push(VariableDefinition {
                variable_id: variable_id(&prefix, field),
                name: format!("Cue {} {}", index + 1, field.slot_label()),
            });
        }
    }
    definitions
}

/// Resets every field under `prefix` to its idle value.
pub fn default_values(prefix: &str) -> VariableValues {
    CueField::ALL
        .into_iter()
        .map(|field| (variable_id(prefix, field), field.default_value()))
        .collect()
}

/// Fields under `prefix` taken from a playback update, missing parts falling back to idle values.
pub fn values_from_update(prefix: &str, update: &PlaybackUpdate, name: &str) -> VariableValues {
    let text = |value: &Option<String>, fallback: &str| -> VariableValue {
        value.clone().unwrap_or_else(|| fallback.to_string()).into()
    };
    let seconds = |value: Option<f64>| -> VariableValue { value.unwrap_or(0.0).into() };

    CueField::ALL
        .into_iter()
        .map(|field| {
            let value = match field {
                CueField::Name => name.into(),
                CueField::Status => update.status.as_str().into(),
                CueField::PlaylistItemName => text(&update.playlist_item_name, ""),
                CueField::TimeFormatted => text(&update.current_time_formatted, DEFAULT_TIME),
                CueField::DurationFormatted => text(&update.total_duration_formatted, DEFAULT_TIME),
                CueField::RemainingFormatted => {
                    text(&update.remaining_time_formatted, DEFAULT_TIME)
                }
                CueField::TimeSec => seconds(update.current_time_sec),
                CueField::DurationSec => seconds(update.total_duration_sec),
                CueField::RemainingSec => seconds(update.remaining_time_sec),
            };
            (variable_id(prefix, field), value)
        })
        .collect()
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct VariableStore {
    values: VariableValues,
}

impl VariableStore {
    /// Every defined variable at its idle value.
    pub fn initial() -> Self {
        let mut values = default_values(CURRENT_CUE_PREFIX);
        for index in 0..MAX_CUES_FOR_VARIABLES {
            values.extend(default_values(&slot_prefix(index)));
        }
        Self { values }
    }

    pub fn get(&self, variable_id: &str) -> Option<&VariableValue> {
        self.values.get(variable_id)
    }

    /// Applies a batch and returns the ids whose value actually changed.
    pub fn set_many(&mut self, values: VariableValues) -> Vec<String> {
        let mut changed = Vec::new();
        for (id, value) in values {
            if self.values.get(&id) != Some(&value) {
                changed.push(id.clone());
                self.values.insert(id, value);
            }
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariableValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::initial()
    }
}
