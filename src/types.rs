//! Core types shared by the simulator seam, the runner and the image writer

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Camera frame laid out as `(height, width, channels)`
pub type RgbFrame = Array3<u8>;

/// Camera viewpoints captured by a snapshot run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viewpoint {
    /// Camera facing the robot across the table
    Front,
    /// Camera mounted on the gripper
    Wrist,
    /// Camera above the robot's left shoulder
    LeftShoulder,
}

impl Viewpoint {
    /// All viewpoints in capture order
    pub const ALL: [Viewpoint; 3] = [Viewpoint::Front, Viewpoint::Wrist, Viewpoint::LeftShoulder];

    /// Name used in output file names
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Wrist => "wrist",
            Self::LeftShoulder => "left_shoulder",
        }
    }

    /// Name of the RGB field in an observation
    #[must_use]
    pub fn rgb_field(self) -> &'static str {
        match self {
            Self::Front => "front_rgb",
            Self::Wrist => "wrist_rgb",
            Self::LeftShoulder => "left_shoulder_rgb",
        }
    }
}

impl fmt::Display for Viewpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point in a run at which a frame set is captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePhase {
    /// Right after the task reset
    Initial,
    /// After the final random action
    Step,
}

impl CapturePhase {
    /// Suffix appended after the viewpoint in output file names
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Initial => "",
            Self::Step => "_step",
        }
    }
}

/// Observation returned by the simulator on reset and on every step
///
/// Every field is optional: channels disabled in the observation config, or
/// unsupported by the current task, come back as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub front_rgb: Option<RgbFrame>,
    pub wrist_rgb: Option<RgbFrame>,
    pub left_shoulder_rgb: Option<RgbFrame>,
    pub joint_positions: Option<Vec<f64>>,
    pub gripper_open: Option<f64>,
}

impl Observation {
    /// RGB frame for a viewpoint, if present
    #[must_use]
    pub fn rgb(&self, viewpoint: Viewpoint) -> Option<&RgbFrame> {
        match viewpoint {
            Viewpoint::Front => self.front_rgb.as_ref(),
            Viewpoint::Wrist => self.wrist_rgb.as_ref(),
            Viewpoint::LeftShoulder => self.left_shoulder_rgb.as_ref(),
        }
    }

    /// Replace the RGB frame for a viewpoint
    pub fn set_rgb(&mut self, viewpoint: Viewpoint, frame: Option<RgbFrame>) {
        match viewpoint {
            Viewpoint::Front => self.front_rgb = frame,
            Viewpoint::Wrist => self.wrist_rgb = frame,
            Viewpoint::LeftShoulder => self.left_shoulder_rgb = frame,
        }
    }
}

/// Result of applying one action
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
}

/// Tag shared by both capture phases of one run: `{task}_var{n}` or `{task}_random`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTag {
    pub task: String,
    pub variation: Option<u32>,
}

impl SnapshotTag {
    #[must_use]
    pub fn new<S: Into<String>>(task: S, variation: Option<u32>) -> Self {
        Self {
            task: task.into(),
            variation,
        }
    }

    /// File name for one frame of this run
    #[must_use]
    pub fn frame_file_name(&self, epoch_ms: i64, viewpoint: Viewpoint, phase: CapturePhase) -> String {
        format!("{self}_{epoch_ms}_{viewpoint}{}.png", phase.suffix())
    }
}

impl fmt::Display for SnapshotTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variation {
            Some(variation) => write!(f, "{}_var{}", self.task, variation),
            None => write!(f, "{}_random", self.task),
        }
    }
}
