//! Lane change desire helper.
//!
//! Once per model cycle, turns turn-signal intent, vehicle state, model lane
//! lines and the model's lane change probability into a single discrete
//! [`Desire`] for the lateral planner, along with the lane change state,
//! direction and lane line blend probability.
//!
//! Optional nudgeless lane changes trigger automatically after a configured
//! delay, gated on the target lane being wide enough.

pub mod config;
pub mod desire;
pub mod desire_helper;
pub mod lane_availability;
pub mod pipeline;
pub mod types;

pub use config::{DesireConfig, MemoryParams, ParamStore, ParamsError, YamlParams};
pub use desire_helper::{DesireHelper, DT_MDL, LANE_CHANGE_SPEED_MIN, LANE_CHANGE_TIME_MAX};
pub use pipeline::{AbortReason, DesireEvent, MetricsSummary};
pub use types::{
    CarState, CycleInput, Desire, DesireOutput, LaneChangeDirection, LaneChangeState, LaneLine,
    ModelOutput,
};
