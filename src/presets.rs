use serde::Serialize;

use crate::{
    actions::ActionId,
    feedback::{
        BLACK, ButtonStyle, FeedbackBinding, FeedbackId, FeedbackStyle, ORANGE, WHITE, combine_rgb,
    },
    model::cue::CueDescriptor,
};

const PLAYING_BG: u32 = combine_rgb(0, 160, 0);
const STOP_ALL_BG: u32 = combine_rgb(200, 0, 0);

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetCategory {
    #[serde(rename = "Sound Cues")]
    SoundCues,
    #[serde(rename = "Controls")]
    Controls,
}

/// A ready-made button: its idle look, what a press does and which feedbacks recolor it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ButtonPreset {
    pub category: PresetCategory,
    pub name: String,
    pub style: ButtonStyle,
    pub on_press: String,
    pub feedbacks: Vec<FeedbackBinding>,
}

pub fn toggle_preset(cue: &CueDescriptor) -> ButtonPreset {
    let label = cue.display_name();
    ButtonPreset {
        category: PresetCategory::SoundCues,
        name: format!("Play {label}"),
        style: ButtonStyle {
            text: format!("TOGGLE\n{label}"),
            color: WHITE,
            bgcolor: BLACK,
        },
        on_press: ActionId::ToggleCue(cue.id.clone()).to_string(),
        feedbacks: vec![
            FeedbackBinding {
                feedback_id: FeedbackId::CueIsPlaying,
                cue_id: cue.id.clone(),
                style: FeedbackStyle::background(PLAYING_BG),
            },
            FeedbackBinding {
                feedback_id: FeedbackId::CueIsPaused,
                cue_id: cue.id.clone(),
                style: FeedbackStyle::background(ORANGE),
            },
        ],
    }
}

pub fn stop_all_preset() -> ButtonPreset {
    ButtonPreset {
        category: PresetCategory::Controls,
        name: "Stop All Audio".to_string(),
        style: ButtonStyle {
            text: "STOP ALL".to_string(),
            color: WHITE,
            bgcolor: STOP_ALL_BG,
        },
        on_press: ActionId::StopAll.to_string(),
        feedbacks: Vec::new(),
    }
}

pub fn preset_definitions(cues: &[CueDescriptor]) -> Vec<ButtonPreset> {
    cues.iter()
        .map(toggle_preset)
        .chain(std::iter::once(stop_all_preset()))
        .collect()
}
