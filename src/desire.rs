// src/desire.rs

use crate::types::{Desire, LaneChangeDirection, LaneChangeState};

/// Keep desires are emitted at most once per this many seconds in pre lane change.
pub const KEEP_PULSE_PERIOD: f32 = 1.0;

/// Fixed mapping from (direction, state) to the planner desire.
pub fn desire_for(direction: LaneChangeDirection, state: LaneChangeState) -> Desire {
    use LaneChangeState::*;

    match (direction, state) {
        (LaneChangeDirection::Left, LaneChangeStarting | LaneChangeFinishing) => {
            Desire::LaneChangeLeft
        }
        (LaneChangeDirection::Right, LaneChangeStarting | LaneChangeFinishing) => {
            Desire::LaneChangeRight
        }
        _ => Desire::None,
    }
}

/// Turns a continuous keep desire into a once-per-second pulse while waiting
/// in pre lane change.
#[derive(Debug, Clone, Default)]
pub struct KeepPulse {
    timer: f32,
}

impl KeepPulse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn apply(&mut self, state: LaneChangeState, desire: Desire, dt: f32) -> Desire {
        match state {
            LaneChangeState::Off | LaneChangeState::LaneChangeStarting => {
                self.timer = 0.0;
                desire
            }
            LaneChangeState::PreLaneChange => {
                self.timer += dt;
                if self.timer > KEEP_PULSE_PERIOD {
                    self.timer = 0.0;
                    desire
                } else if desire.is_keep() {
                    // Unreachable with the current table: keep desires are never mapped.
                    Desire::None
                } else {
                    desire
                }
            }
            LaneChangeState::LaneChangeFinishing => desire,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.05;

    #[test]
    fn test_table_only_maps_active_changes() {
        let states = [
            LaneChangeState::Off,
            LaneChangeState::PreLaneChange,
            LaneChangeState::LaneChangeStarting,
            LaneChangeState::LaneChangeFinishing,
        ];

        for state in states {
            assert_eq!(desire_for(LaneChangeDirection::None, state), Desire::None);
        }

        for direction in [LaneChangeDirection::Left, LaneChangeDirection::Right] {
            assert_eq!(desire_for(direction, LaneChangeState::Off), Desire::None);
            assert_eq!(desire_for(direction, LaneChangeState::PreLaneChange), Desire::None);
        }

        assert_eq!(
            desire_for(LaneChangeDirection::Left, LaneChangeState::LaneChangeStarting),
            Desire::LaneChangeLeft
        );
        assert_eq!(
            desire_for(LaneChangeDirection::Left, LaneChangeState::LaneChangeFinishing),
            Desire::LaneChangeLeft
        );
        assert_eq!(
            desire_for(LaneChangeDirection::Right, LaneChangeState::LaneChangeStarting),
            Desire::LaneChangeRight
        );
        assert_eq!(
            desire_for(LaneChangeDirection::Right, LaneChangeState::LaneChangeFinishing),
            Desire::LaneChangeRight
        );
    }

    #[test]
    fn test_table_never_produces_keep() {
        for direction in [
            LaneChangeDirection::None,
            LaneChangeDirection::Left,
            LaneChangeDirection::Right,
        ] {
            for state in [
                LaneChangeState::Off,
                LaneChangeState::PreLaneChange,
                LaneChangeState::LaneChangeStarting,
                LaneChangeState::LaneChangeFinishing,
            ] {
                assert!(!desire_for(direction, state).is_keep());
            }
        }
    }

    #[test]
    fn test_keep_suppressed_between_pulses() {
        let mut pulse = KeepPulse::new();

        // Just under one period at 20Hz
        for _ in 0..19 {
            let out = pulse.apply(LaneChangeState::PreLaneChange, Desire::KeepLeft, DT);
            assert_eq!(out, Desire::None);
        }

        // Crossing the period lets one keep desire through and restarts the timer
        let mut passed = 0;
        for _ in 0..5 {
            if pulse.apply(LaneChangeState::PreLaneChange, Desire::KeepRight, DT) == Desire::KeepRight {
                passed += 1;
            }
        }
        assert_eq!(passed, 1);
        assert!(pulse.timer() < KEEP_PULSE_PERIOD);
    }

    #[test]
    fn test_timer_resets_in_off_and_starting() {
        let mut pulse = KeepPulse::new();
        for _ in 0..10 {
            pulse.apply(LaneChangeState::PreLaneChange, Desire::None, DT);
        }
        assert!(pulse.timer() > 0.4);

        pulse.apply(LaneChangeState::Off, Desire::None, DT);
        assert_eq!(pulse.timer(), 0.0);

        for _ in 0..10 {
            pulse.apply(LaneChangeState::PreLaneChange, Desire::None, DT);
        }
        pulse.apply(LaneChangeState::LaneChangeStarting, Desire::LaneChangeLeft, DT);
        assert_eq!(pulse.timer(), 0.0);
    }

    #[test]
    fn test_lane_change_desires_pass_through() {
        let mut pulse = KeepPulse::new();
        assert_eq!(
            pulse.apply(LaneChangeState::LaneChangeStarting, Desire::LaneChangeLeft, DT),
            Desire::LaneChangeLeft
        );
        assert_eq!(
            pulse.apply(LaneChangeState::LaneChangeFinishing, Desire::LaneChangeRight, DT),
            Desire::LaneChangeRight
        );
    }
}
