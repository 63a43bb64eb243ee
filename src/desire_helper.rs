// src/desire_helper.rs
//
// Lane change state machine. Called once per model cycle with the latest
// car state and model outputs; produces the desire for the lateral planner.
//
//   off ──blinker edge──► preLaneChange ──torque / nudgeless──► laneChangeStarting
//    ▲                        ▲    │                                   │
//    │                        │    └──blinker off / slow──► off        │ model certain
//    │                        │                                        ▼
//    └───── blinker off ──────┴──── blinker still on ◄──── laneChangeFinishing
//
// Lateral control dropping out or a change running longer than
// LANE_CHANGE_TIME_MAX forces off from any state.

use crate::config::{read_delay, DesireConfig, ParamStore, ParamsError};
use crate::desire::{desire_for, KeepPulse};
use crate::lane_availability::is_lane_available;
use crate::pipeline::{AbortReason, DesireEvent, DesireMetrics, EventBus, MetricsSummary};
use crate::types::{
    CarState, CycleInput, Desire, DesireOutput, LaneChangeDirection, LaneChangeState, ModelOutput,
};
use tracing::{debug, info, warn};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Model cycle period, seconds (20Hz)
pub const DT_MDL: f32 = 0.05;

const MPH_TO_MS: f32 = 0.44704;

/// Lane changes are only armed at or above 20 mph
pub const LANE_CHANGE_SPEED_MIN: f32 = 20.0 * MPH_TO_MS;

/// A change still running after this many seconds is abandoned
pub const LANE_CHANGE_TIME_MAX: f32 = 10.0;

/// Model uncertainty below which the change is considered done (98% certain)
const LANE_CHANGE_PROB_DONE: f32 = 0.02;
const LANE_LINE_FADED_OUT: f32 = 0.01;
const LANE_LINE_FADED_IN: f32 = 0.99;

const MAX_PENDING_EVENTS: usize = 64;

// ============================================================================
// STATE MACHINE
// ============================================================================

pub struct DesireHelper<P: ParamStore> {
    params: P,
    config: DesireConfig,

    state: LaneChangeState,
    direction: LaneChangeDirection,
    lane_change_timer: f32,
    lane_change_ll_prob: f32,
    keep_pulse: KeepPulse,
    prev_one_blinker: bool,
    desire: Desire,

    // Nudgeless bookkeeping
    lane_available: bool,
    lane_change_completed: bool,
    delay_recheck_pending: bool,
    lane_change_wait_timer: f32,

    cycle: u64,
    events: EventBus,
    metrics: DesireMetrics,
}

impl<P: ParamStore> DesireHelper<P> {
    /// Build a helper for one driving session. Fails if required params are unreadable.
    pub fn new(params: P) -> Result<Self, ParamsError> {
        let config = DesireConfig::from_params(&params)?;
        Ok(Self::with_config(params, config))
    }

    /// Build a helper from an already-read snapshot. `params` is only used for
    /// the per-episode delay re-check.
    pub fn with_config(params: P, config: DesireConfig) -> Self {
        Self {
            params,
            config,
            state: LaneChangeState::Off,
            direction: LaneChangeDirection::None,
            lane_change_timer: 0.0,
            lane_change_ll_prob: 1.0,
            keep_pulse: KeepPulse::new(),
            prev_one_blinker: false,
            desire: Desire::None,
            lane_available: false,
            lane_change_completed: false,
            delay_recheck_pending: true,
            lane_change_wait_timer: 0.0,
            cycle: 0,
            events: EventBus::new(MAX_PENDING_EVENTS),
            metrics: DesireMetrics::new(),
        }
    }

    pub fn update_from(&mut self, input: &CycleInput) -> DesireOutput {
        self.update(
            &input.car_state,
            input.lateral_active,
            input.lane_change_prob,
            &input.model,
        )
    }

    /// Advance one model cycle.
    pub fn update(
        &mut self,
        car: &CarState,
        lateral_active: bool,
        lane_change_prob: f32,
        model: &ModelOutput,
    ) -> DesireOutput {
        self.cycle += 1;
        self.metrics.record_cycle(lateral_active);

        let one_blinker = car.one_blinker();
        let below_lane_change_speed = car.v_ego < LANE_CHANGE_SPEED_MIN;

        // The delay may have been changed mid drive
        if self.config.nudgeless && one_blinker && self.delay_recheck_pending {
            self.recheck_delay();
        }

        self.lane_available = self.check_lane_available(car, model, one_blinker);

        if !lateral_active || self.lane_change_timer > LANE_CHANGE_TIME_MAX {
            if self.state != LaneChangeState::Off {
                let reason = if !lateral_active {
                    AbortReason::LateralInactive
                } else {
                    warn!(
                        "✗ Lane change timeout after {:.1}s",
                        self.lane_change_timer
                    );
                    AbortReason::Timeout
                };
                self.abort(reason);
            }
            self.state = LaneChangeState::Off;
            self.direction = LaneChangeDirection::None;
        } else {
            match self.state {
                LaneChangeState::Off => {
                    if one_blinker && !self.prev_one_blinker && !below_lane_change_speed {
                        self.state = LaneChangeState::PreLaneChange;
                        self.direction = blinker_direction(car);
                        self.lane_change_ll_prob = 1.0;
                        self.lane_change_wait_timer = 0.0;
                        info!("→ Lane change armed: {:?}", self.direction);
                        self.publish(DesireEvent::Armed {
                            direction: self.direction,
                        });
                    }
                }
                LaneChangeState::PreLaneChange => {
                    self.update_pre_lane_change(car, one_blinker, below_lane_change_speed);
                }
                LaneChangeState::LaneChangeStarting => {
                    // Fade out lane lines over 0.5s
                    self.lane_change_ll_prob = (self.lane_change_ll_prob - 2.0 * DT_MDL).max(0.0);

                    if lane_change_prob < LANE_CHANGE_PROB_DONE
                        && self.lane_change_ll_prob < LANE_LINE_FADED_OUT
                    {
                        self.state = LaneChangeState::LaneChangeFinishing;
                        debug!("Lane change finishing: {:?}", self.direction);
                        self.publish(DesireEvent::Finishing {
                            direction: self.direction,
                        });
                    }
                }
                LaneChangeState::LaneChangeFinishing => {
                    // Fade lane lines back in over 1s
                    self.lane_change_ll_prob = (self.lane_change_ll_prob + DT_MDL).min(1.0);

                    if self.lane_change_ll_prob > LANE_LINE_FADED_IN {
                        self.finish(one_blinker);
                    }
                }
            }
        }

        if self.state.is_idle() {
            self.lane_change_timer = 0.0;
        } else {
            self.lane_change_timer += DT_MDL;
        }

        self.prev_one_blinker = one_blinker;

        let base = desire_for(self.direction, self.state);
        self.desire = self.keep_pulse.apply(self.state, base, DT_MDL);

        self.output()
    }

    fn update_pre_lane_change(
        &mut self,
        car: &CarState,
        one_blinker: bool,
        below_lane_change_speed: bool,
    ) {
        self.direction = blinker_direction(car);

        let driver_torque = car.steering_pressed
            && match self.direction {
                LaneChangeDirection::Left => car.steering_torque > 0.0,
                LaneChangeDirection::Right => car.steering_torque < 0.0,
                LaneChangeDirection::None => false,
            };

        let blindspot_detected = match self.direction {
            LaneChangeDirection::Left => car.left_blindspot,
            LaneChangeDirection::Right => car.right_blindspot,
            LaneChangeDirection::None => false,
        };

        self.lane_change_wait_timer += DT_MDL;
        let mut torque_applied = driver_torque;
        let mut nudgeless_triggered = false;
        if self.config.nudgeless
            && self.lane_available
            && !self.lane_change_completed
            && self.lane_change_wait_timer >= self.config.lane_change_delay
        {
            torque_applied = true;
            nudgeless_triggered = true;
            self.lane_change_wait_timer = 0.0;
        }

        if !one_blinker || below_lane_change_speed {
            let reason = if !one_blinker {
                AbortReason::BlinkerReleased
            } else {
                AbortReason::BelowMinSpeed
            };
            self.abort(reason);
            self.state = LaneChangeState::Off;
            self.direction = LaneChangeDirection::None;
        } else if torque_applied && !blindspot_detected {
            // One lane change per signal: block further nudgeless triggers until the episode ends
            self.lane_change_completed = self.config.one_lane_change;
            self.state = LaneChangeState::LaneChangeStarting;

            let nudgeless = nudgeless_triggered && !driver_torque;
            info!(
                "→ Lane change started: {:?}{}",
                self.direction,
                if nudgeless { " (nudgeless)" } else { "" }
            );
            self.publish(DesireEvent::Started {
                direction: self.direction,
                nudgeless,
            });
        } else if torque_applied {
            debug!("Lane change held: {:?} blind spot occupied", self.direction);
            self.metrics.record_blindspot_block();
        }
    }

    fn finish(&mut self, one_blinker: bool) {
        let direction = self.direction;
        self.direction = LaneChangeDirection::None;

        if one_blinker {
            self.state = LaneChangeState::PreLaneChange;
            info!("✓ Lane change complete: {:?}, blinker still on", direction);
        } else {
            self.state = LaneChangeState::Off;
            self.lane_change_completed = false;
            self.delay_recheck_pending = true;
            info!("✓ Lane change complete: {:?}", direction);
        }

        self.publish(DesireEvent::Completed {
            direction,
            chained: one_blinker,
        });
    }

    fn abort(&mut self, reason: AbortReason) {
        debug!("Lane change aborted in {}: {:?}", self.state.as_str(), reason);
        self.publish(DesireEvent::Aborted {
            reason,
            cycle: self.cycle,
        });
    }

    fn recheck_delay(&mut self) {
        match read_delay(&self.params) {
            Ok(delay) => {
                if delay != self.config.lane_change_delay {
                    info!(
                        "Lane change delay updated: {:.0}s → {:.0}s",
                        self.config.lane_change_delay, delay
                    );
                }
                self.config.lane_change_delay = delay;
            }
            Err(e) => {
                warn!(
                    "Lane change delay re-check failed, keeping {:.0}s: {}",
                    self.config.lane_change_delay, e
                );
            }
        }
        self.delay_recheck_pending = false;
    }

    fn check_lane_available(&mut self, car: &CarState, model: &ModelOutput, one_blinker: bool) -> bool {
        if !(self.config.lane_detection && one_blinker) {
            return true;
        }

        let available = match is_lane_available(&model.lane_lines, blinker_direction(car)) {
            Ok(available) => available,
            Err(e) => {
                debug!("Lane geometry rejected: {}", e);
                false
            }
        };

        if !available {
            self.metrics.record_lane_unavailable();
        }
        available
    }

    fn publish(&mut self, event: DesireEvent) {
        self.metrics.record_event(&event);
        self.events.publish(event);
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn output(&self) -> DesireOutput {
        DesireOutput {
            desire: self.desire,
            lane_change_state: self.state,
            lane_change_direction: self.direction,
            lane_line_blend_prob: self.lane_change_ll_prob,
        }
    }

    pub fn state(&self) -> LaneChangeState {
        self.state
    }

    pub fn direction(&self) -> LaneChangeDirection {
        self.direction
    }

    pub fn desire(&self) -> Desire {
        self.desire
    }

    pub fn lane_change_timer(&self) -> f32 {
        self.lane_change_timer
    }

    pub fn lane_line_blend_prob(&self) -> f32 {
        self.lane_change_ll_prob
    }

    pub fn lane_change_wait_timer(&self) -> f32 {
        self.lane_change_wait_timer
    }

    pub fn lane_available(&self) -> bool {
        self.lane_available
    }

    pub fn config(&self) -> &DesireConfig {
        &self.config
    }

    pub fn params_mut(&mut self) -> &mut P {
        &mut self.params
    }

    pub fn drain_events(&mut self) -> Vec<DesireEvent> {
        self.events.drain()
    }

    pub fn metrics(&self) -> MetricsSummary {
        self.metrics.summary()
    }
}

fn blinker_direction(car: &CarState) -> LaneChangeDirection {
    if car.left_blinker {
        LaneChangeDirection::Left
    } else {
        LaneChangeDirection::Right
    }
}
