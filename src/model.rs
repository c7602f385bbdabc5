use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::cue::{CueDescriptor, PlaybackStatus};

pub mod cue;

/// Local copy of the soundboard's cue list and per-cue playback status.
#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CueMirror {
    pub cues: Vec<CueDescriptor>,
    pub play_states: HashMap<String, PlaybackStatus>,
    pub current_cue_id: Option<String>,
}

impl CueMirror {
    /// Replaces the cue list. Later entries reusing an id are dropped.
    pub fn replace_cues(&mut self, cues: Vec<CueDescriptor>) {
        let mut seen = HashSet::with_capacity(cues.len());
        self.cues = cues
            .into_iter()
            .filter(|cue| {
                if seen.insert(cue.id.clone()) {
                    true
                } else {
                    log::warn!("Dropping duplicate cue id '{}' from cue list.", cue.id);
                    false
                }
            })
            .collect();
    }

    pub fn cue_index(&self, cue_id: &str) -> Option<usize> {
        self.cues.iter().position(|c| c.id == cue_id)
    }

    pub fn contains(&self, cue_id: &str) -> bool {
        self.cue_index(cue_id).is_some()
    }

    pub fn status(&self, cue_id: &str) -> Option<&PlaybackStatus> {
        self.play_states.get(cue_id)
    }

    /// Returns true when the stored status differs from the previous one.
    pub fn set_status(&mut self, cue_id: &str, status: PlaybackStatus) -> bool {
        let old = self.play_states.insert(cue_id.to_string(), status.clone());
        old.as_ref() != Some(&status)
    }
}
