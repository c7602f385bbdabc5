use serde::{Deserialize, Serialize};

use crate::model::{CueMirror, cue::PlaybackStatus};

/// Packs a color as `0xRRGGBB`, the layout panels expect.
pub const fn combine_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

pub const BLACK: u32 = combine_rgb(0, 0, 0);
pub const WHITE: u32 = combine_rgb(255, 255, 255);
pub const GREEN: u32 = combine_rgb(0, 255, 0);
pub const ORANGE: u32 = combine_rgb(255, 165, 0);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackId {
    CueIsPlaying,
    CueIsPaused,
    CueIsStopped,
}

impl FeedbackId {
    pub const ALL: [FeedbackId; 3] = [
        FeedbackId::CueIsPlaying,
        FeedbackId::CueIsPaused,
        FeedbackId::CueIsStopped,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackId::CueIsPlaying => "cue_is_playing",
            FeedbackId::CueIsPaused => "cue_is_paused",
            FeedbackId::CueIsStopped => "cue_is_stopped",
        }
    }

    /// Whether the feedback is active for `cue_id`. Cues never reported count as stopped.
    pub fn evaluate(self, cue_id: &str, mirror: &CueMirror) -> bool {
        let status = mirror.status(cue_id);
        match self {
            FeedbackId::CueIsPlaying => status == Some(&PlaybackStatus::Playing),
            FeedbackId::CueIsPaused => status == Some(&PlaybackStatus::Paused),
            FeedbackId::CueIsStopped => matches!(
                status,
                None | Some(PlaybackStatus::Stopped) | Some(PlaybackStatus::Error)
            ),
        }
    }

    pub fn default_style(self) -> FeedbackStyle {
        match self {
            FeedbackId::CueIsPlaying => FeedbackStyle::new(BLACK, GREEN),
            FeedbackId::CueIsPaused => FeedbackStyle::new(BLACK, ORANGE),
            FeedbackId::CueIsStopped => FeedbackStyle::new(WHITE, BLACK),
        }
    }

    pub fn definition(self) -> FeedbackDefinition {
        let (name, description) = match self {
            FeedbackId::CueIsPlaying => (
                "Cue is Playing",
                "If the specified cue is currently playing.",
            ),
            FeedbackId::CueIsPaused => (
                "Cue is Paused",
                "If the specified cue is currently paused.",
            ),
            FeedbackId::CueIsStopped => (
                "Cue is Stopped / Inactive",
                "If the specified cue is currently stopped or not active.",
            ),
        };
        FeedbackDefinition {
            id: self,
            name,
            description,
            default_style: self.default_style(),
            options: vec![FeedbackOption {
                id: "cueId",
                label: "Cue ID",
                default: "",
            }],
        }
    }
}

/// Partial style applied on top of a button while its feedback is active.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedbackStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<u32>,
}

impl FeedbackStyle {
    pub fn new(color: u32, bgcolor: u32) -> Self {
        Self {
            color: Some(color),
            bgcolor: Some(bgcolor),
        }
    }

    pub fn background(bgcolor: u32) -> Self {
        Self {
            color: None,
            bgcolor: Some(bgcolor),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FeedbackOption {
    pub id: &'static str,
    pub label: &'static str,
    pub default: &'static str,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDefinition {
    pub id: FeedbackId,
    pub name: &'static str,
    pub description: &'static str,
    pub default_style: FeedbackStyle,
    pub options: Vec<FeedbackOption>,
}

pub fn feedback_definitions() -> Vec<FeedbackDefinition> {
    FeedbackId::ALL.into_iter().map(FeedbackId::definition).collect()
}

/// A feedback attached to a button, watching one cue.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackBinding {
    pub feedback_id: FeedbackId,
    pub cue_id: String,
    pub style: FeedbackStyle,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ButtonStyle {
    pub text: String,
    pub color: u32,
    pub bgcolor: u32,
}

impl ButtonStyle {
    /// Overlays the style of every active feedback, later bindings winning.
    pub fn resolve(&self, feedbacks: &[FeedbackBinding], mirror: &CueMirror) -> ButtonStyle {
        let mut style = self.clone();
        for binding in feedbacks {
            if binding.feedback_id.evaluate(&binding.cue_id, mirror) {
                if let Some(color) = binding.style.color {
                    style.color = color;
                }
                if let Some(bgcolor) = binding.style.bgcolor {
                    style.bgcolor = bgcolor;
                }
            }
        }
        style
    }
}
