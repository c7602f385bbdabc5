use serde::Serialize;

use crate::{
    event::UiEvent,
    feedback::FeedbackId,
    model::{
        CueMirror,
        cue::{CueDescriptor, PlaybackStatus},
    },
    protocol::{InboundMessage, PlaybackUpdate},
    variables::{
        self, CURRENT_CUE_PREFIX, CueField, MAX_CUES_FOR_VARIABLES, VariableStore, VariableValues,
        slot_prefix, values_from_update, variable_id,
    },
};

const NO_NAME: &str = "N/A";

/// Everything the bridge knows about the soundboard: the cue mirror and the
/// display variables derived from it.
#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct BridgeState {
    pub mirror: CueMirror,
    pub variables: VariableStore,
}

impl BridgeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one inbound notification and returns the events panels need to see.
    pub fn apply(&mut self, message: InboundMessage) -> Vec<UiEvent> {
        match message {
            InboundMessage::CuesListUpdate(cues) => self.apply_cue_list(cues),
            InboundMessage::PlaybackTimeUpdate(update) => self.apply_playback_update(update),
            InboundMessage::CueStatus(payload) => {
                log::debug!("Ignoring cueStatus notification: {}", payload);
                Vec::new()
            }
            InboundMessage::Unknown => Vec::new(),
        }
    }

    fn apply_cue_list(&mut self, cues: Vec<CueDescriptor>) -> Vec<UiEvent> {
        self.mirror.replace_cues(cues);
        log::info!("Received {} cues from soundboard.", self.mirror.cues.len());

        let mut values = VariableValues::new();
        for index in 0..MAX_CUES_FOR_VARIABLES {
            let prefix = slot_prefix(index);
            values.extend(variables::default_values(&prefix));
            if let Some(cue) = self.mirror.cues.get(index) {
                let name = match cue.name.as_deref() {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => format!("Cue {}", index + 1),
                };
                values.insert(variable_id(&prefix, CueField::Name), name.into());
            }
        }

        if let Some(current) = self.mirror.current_cue_id.as_deref() {
            if !self.mirror.contains(current) {
                log::debug!("Current cue '{}' left the cue list.", current);
                self.mirror.current_cue_id = None;
                values.extend(variables::default_values(CURRENT_CUE_PREFIX));
            }
        }

        let mut events = vec![
            UiEvent::CueListUpdated {
                cues: self.mirror.cues.clone(),
            },
            UiEvent::DefinitionsChanged,
        ];
        events.extend(self.set_variables(values));
        events
    }

    fn apply_playback_update(&mut self, update: PlaybackUpdate) -> Vec<UiEvent> {
        let name = update
            .cue_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(NO_NAME);

        let mut values = VariableValues::new();
        match self.mirror.cue_index(&update.cue_id) {
            Some(index) if index < MAX_CUES_FOR_VARIABLES => {
                values.extend(values_from_update(&slot_prefix(index), &update, name));
            }
            Some(_) => log::debug!(
                "Cue {} ({}) is beyond variable range ({}). Not setting individual variables.",
                update.cue_id,
                name,
                MAX_CUES_FOR_VARIABLES
            ),
            None => {}
        }

        if update.status.is_active() {
            self.mirror.current_cue_id = Some(update.cue_id.clone());
            values.extend(values_from_update(CURRENT_CUE_PREFIX, &update, name));
        } else if update.status == PlaybackStatus::Stopped
            && self.mirror.current_cue_id.as_deref() == Some(update.cue_id.as_str())
        {
            self.mirror.current_cue_id = None;
            values.extend(variables::default_values(CURRENT_CUE_PREFIX));
        }

        let mut events: Vec<UiEvent> = self.set_variables(values).into_iter().collect();

        if self.mirror.set_status(&update.cue_id, update.status) {
            events.push(UiEvent::FeedbacksInvalidated {
                feedback_ids: FeedbackId::ALL.to_vec(),
            });
        }
        events
    }

    fn set_variables(&mut self, values: VariableValues) -> Option<UiEvent> {
        if values.is_empty() {
            return None;
        }
        let changed = self.variables.set_many(values.clone());
        log::trace!("Set {} variables, {} changed.", values.len(), changed.len());
        Some(UiEvent::VariablesChanged { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VariableValue;

    fn text(value: &str) -> VariableValue {
        VariableValue::from(value)
    }

    fn cue_list(count: usize) -> InboundMessage {
        InboundMessage::CuesListUpdate(
            (0..count)
                .map(|i| CueDescriptor::new(format!("c{}", i + 1), format!("Cue Name {}", i + 1)))
                .collect(),
        )
    }

    fn playing(cue_id: &str) -> PlaybackUpdate {
        let mut update = PlaybackUpdate::new(cue_id, PlaybackStatus::Playing);
        update.cue_name = Some(format!("Name of {cue_id}"));
        update.playlist_item_name = Some("item.mp3".to_string());
        update.current_time_formatted = Some("00:05".to_string());
        update.total_duration_formatted = Some("01:00".to_string());
        update.remaining_time_formatted = Some("00:55".to_string());
        update.current_time_sec = Some(5.0);
        update.total_duration_sec = Some(60.0);
        update.remaining_time_sec = Some(55.0);
        update
    }

    #[test]
    fn cue_list_fills_slots() {
        let mut state = BridgeState::new();
        let events = state.apply(InboundMessage::CuesListUpdate(vec![
            CueDescriptor::new("a", "Intro"),
            CueDescriptor { id: "b".to_string(), name: None },
            CueDescriptor::new("c", ""),
        ]));

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], UiEvent::CueListUpdated { cues } if cues.len() == 3));
        assert_eq!(events[1], UiEvent::DefinitionsChanged);
        let UiEvent::VariablesChanged { values } = &events[2] else {
            panic!("Expected a variables update.");
        };
        assert_eq!(values.len(), 9 * MAX_CUES_FOR_VARIABLES);

        let variables = &state.variables;
        assert_eq!(variables.get("cue_1_name"), Some(&text("Intro")));
        assert_eq!(variables.get("cue_2_name"), Some(&text("Cue 2")));
        assert_eq!(variables.get("cue_3_name"), Some(&text("Cue 3")));
        assert_eq!(variables.get("cue_4_name"), Some(&text("N/A")));
        assert_eq!(variables.get("cue_20_name"), Some(&text("N/A")));
        assert_eq!(variables.get("cue_1_status"), Some(&text("stopped")));
    }

    #[test]
    fn cue_list_resets_slot_playback_fields() {
        let mut state = BridgeState::new();
        state.apply(cue_list(2));
        state.apply(InboundMessage::PlaybackTimeUpdate(playing("c2")));
        assert_eq!(state.variables.get("cue_2_time_formatted"), Some(&text("00:05")));

        state.apply(cue_list(2));
        assert_eq!(state.variables.get("cue_2_time_formatted"), Some(&text("00:00")));
        assert_eq!(state.variables.get("cue_2_status"), Some(&text("stopped")));
        assert_eq!(state.variables.get("cue_2_time_sec"), Some(&VariableValue::Number(0.0)));
        // Still in the list, so it stays the current cue.
        assert_eq!(state.mirror.current_cue_id.as_deref(), Some("c2"));
        assert_eq!(state.variables.get("current_cue_name"), Some(&text("Name of c2")));
    }

    #[test]
    fn cue_list_clears_vanished_current_cue() {
        let mut state = BridgeState::new();
        state.apply(cue_list(3));
        state.apply(InboundMessage::PlaybackTimeUpdate(playing("c3")));
        assert_eq!(state.mirror.current_cue_id.as_deref(), Some("c3"));

        state.apply(cue_list(2));
        assert_eq!(state.mirror.current_cue_id, None);
        assert_eq!(state.variables.get("current_cue_name"), Some(&text("N/A")));
        assert_eq!(state.variables.get("current_cue_status"), Some(&text("stopped")));
        assert_eq!(state.variables.get("current_cue_remaining_formatted"), Some(&text("00:00")));
        assert_eq!(state.variables.get("cue_3_name"), Some(&text("N/A")));
    }

    #[test]
    fn playback_update_sets_slot_and_current() {
        let mut state = BridgeState::new();
        state.apply(cue_list(2));

        let events = state.apply(InboundMessage::PlaybackTimeUpdate(playing("c2")));
        assert_eq!(events.len(), 2);
        let UiEvent::VariablesChanged { values } = &events[0] else {
            panic!("Expected a variables update.");
        };
        assert_eq!(values.len(), 18);
        assert_eq!(
            events[1],
            UiEvent::FeedbacksInvalidated {
                feedback_ids: vec![
                    FeedbackId::CueIsPlaying,
                    FeedbackId::CueIsPaused,
                    FeedbackId::CueIsStopped
                ]
            }
        );

        let variables = &state.variables;
        assert_eq!(variables.get("cue_2_name"), Some(&text("Name of c2")));
        assert_eq!(variables.get("cue_2_status"), Some(&text("playing")));
        assert_eq!(variables.get("cue_2_playlist_item_name"), Some(&text("item.mp3")));
        assert_eq!(variables.get("cue_2_remaining_sec"), Some(&VariableValue::Number(55.0)));
        assert_eq!(variables.get("current_cue_name"), Some(&text("Name of c2")));
        assert_eq!(variables.get("current_cue_duration_formatted"), Some(&text("01:00")));
        assert_eq!(variables.get("cue_1_status"), Some(&text("stopped")));
        assert_eq!(state.mirror.status("c2"), Some(&PlaybackStatus::Playing));
    }

    #[test]
    fn repeated_status_does_not_invalidate_feedbacks() {
        let mut state = BridgeState::new();
        state.apply(cue_list(1));
        state.apply(InboundMessage::PlaybackTimeUpdate(playing("c1")));

        let mut later = playing("c1");
        later.current_time_sec = Some(6.0);
        let events = state.apply(InboundMessage::PlaybackTimeUpdate(later));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], UiEvent::VariablesChanged { .. }));
        assert_eq!(state.variables.get("cue_1_time_sec"), Some(&VariableValue::Number(6.0)));
    }

    #[test]
    fn stopping_current_cue_resets_current_variables() {
        let mut state = BridgeState::new();
        state.apply(cue_list(2));
        state.apply(InboundMessage::PlaybackTimeUpdate(playing("c1")));

        // A different cue stopping leaves the current cue alone.
        state.apply(InboundMessage::PlaybackTimeUpdate(PlaybackUpdate::new(
            "c2",
            PlaybackStatus::Stopped,
        )));
        assert_eq!(state.mirror.current_cue_id.as_deref(), Some("c1"));

        let mut stopped = PlaybackUpdate::new("c1", PlaybackStatus::Stopped);
        stopped.cue_name = Some("Name of c1".to_string());
        state.apply(InboundMessage::PlaybackTimeUpdate(stopped));

        assert_eq!(state.mirror.current_cue_id, None);
        assert_eq!(state.variables.get("current_cue_name"), Some(&text("N/A")));
        assert_eq!(state.variables.get("current_cue_time_sec"), Some(&VariableValue::Number(0.0)));
        assert_eq!(state.variables.get("cue_1_status"), Some(&text("stopped")));
        assert_eq!(state.variables.get("cue_1_name"), Some(&text("Name of c1")));
    }

    #[test]
    fn paused_cue_becomes_current() {
        let mut state = BridgeState::new();
        state.apply(cue_list(2));
        state.apply(InboundMessage::PlaybackTimeUpdate(playing("c1")));

        let mut paused = PlaybackUpdate::new("c2", PlaybackStatus::Paused);
        paused.cue_name = Some("Second".to_string());
        state.apply(InboundMessage::PlaybackTimeUpdate(paused));

        assert_eq!(state.mirror.current_cue_id.as_deref(), Some("c2"));
        assert_eq!(state.variables.get("current_cue_status"), Some(&text("paused")));
        assert_eq!(state.variables.get("current_cue_name"), Some(&text("Second")));
        assert_eq!(state.variables.get("current_cue_time_formatted"), Some(&text("00:00")));
    }

    #[test]
    fn cue_beyond_slots_only_updates_current() {
        let mut state = BridgeState::new();
        state.apply(cue_list(25));

        let events = state.apply(InboundMessage::PlaybackTimeUpdate(playing("c22")));
        let UiEvent::VariablesChanged { values } = &events[0] else {
            panic!("Expected a variables update.");
        };
        assert_eq!(values.len(), 9);
        assert!(values.keys().all(|id| id.starts_with("current_cue_")));
        assert_eq!(state.mirror.status("c22"), Some(&PlaybackStatus::Playing));
    }

    #[test]
    fn update_for_unlisted_cue_still_tracks_status() {
        let mut state = BridgeState::new();
        let events = state.apply(InboundMessage::PlaybackTimeUpdate(PlaybackUpdate::new(
            "ghost",
            PlaybackStatus::Error,
        )));

        assert_eq!(
            events,
            vec![UiEvent::FeedbacksInvalidated {
                feedback_ids: FeedbackId::ALL.to_vec()
            }]
        );
        assert_eq!(state.mirror.status("ghost"), Some(&PlaybackStatus::Error));
        assert_eq!(state.mirror.current_cue_id, None);
    }

    #[test]
    fn ignored_messages_change_nothing() {
        let mut state = BridgeState::new();
        assert!(state.apply(InboundMessage::Unknown).is_empty());
        assert!(
            state
                .apply(InboundMessage::CueStatus(serde_json::json!({ "cueId": "c1" })))
                .is_empty()
        );
        assert_eq!(state.variables, VariableStore::initial());
    }
}
