// src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneChangeState {
    #[default]
    Off,
    PreLaneChange,
    LaneChangeStarting,
    LaneChangeFinishing,
}

impl LaneChangeState {
    /// States in which the safety timer is held at zero.
    pub fn is_idle(&self) -> bool {
        matches!(self, LaneChangeState::Off | LaneChangeState::PreLaneChange)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LaneChangeState::Off => "OFF",
            LaneChangeState::PreLaneChange => "PRE_LANE_CHANGE",
            LaneChangeState::LaneChangeStarting => "STARTING",
            LaneChangeState::LaneChangeFinishing => "FINISHING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneChangeDirection {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Desire {
    #[default]
    None,
    LaneChangeLeft,
    LaneChangeRight,
    KeepLeft,
    KeepRight,
}

impl Desire {
    pub fn is_keep(&self) -> bool {
        matches!(self, Desire::KeepLeft | Desire::KeepRight)
    }
}

/// Vehicle state snapshot for one model cycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarState {
    /// Ego speed, m/s
    pub v_ego: f32,
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub steering_pressed: bool,
    /// Positive torque steers left
    pub steering_torque: f32,
    pub left_blindspot: bool,
    pub right_blindspot: bool,
}

impl CarState {
    /// Exactly one turn signal is on.
    pub fn one_blinker(&self) -> bool {
        self.left_blinker != self.right_blinker
    }
}

/// A lane boundary polyline: `x` is longitudinal distance ahead, `y` lateral position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneLine {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
}

impl LaneLine {
    pub fn new(x: Vec<f32>, y: Vec<f32>) -> Self {
        Self { x, y }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty()
    }
}

/// Perception model output consumed by the helper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelOutput {
    /// Lane boundaries ordered left to right: far left, ego left, ego right, far right.
    pub lane_lines: Vec<LaneLine>,
}

/// Everything the helper consumes in one cycle. Used by the replay tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CycleInput {
    pub car_state: CarState,
    pub lateral_active: bool,
    /// Model lane change uncertainty; lower means the change is closer to done.
    pub lane_change_prob: f32,
    pub model: ModelOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesireOutput {
    pub desire: Desire,
    pub lane_change_state: LaneChangeState,
    pub lane_change_direction: LaneChangeDirection,
    pub lane_line_blend_prob: f32,
}
