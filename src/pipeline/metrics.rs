// src/pipeline/metrics.rs
//
// Per-session counters. Observability only.

use super::event_bus::DesireEvent;

#[derive(Debug, Default)]
pub struct DesireMetrics {
    total_cycles: u64,
    lateral_active_cycles: u64,
    lane_changes_armed: u64,
    lane_changes_started: u64,
    nudgeless_triggers: u64,
    lane_changes_completed: u64,
    lane_changes_chained: u64,
    lane_changes_aborted: u64,
    blindspot_blocked_cycles: u64,
    lane_unavailable_cycles: u64,
}

impl DesireMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&mut self, lateral_active: bool) {
        self.total_cycles += 1;
        if lateral_active {
            self.lateral_active_cycles += 1;
        }
    }

    pub fn record_blindspot_block(&mut self) {
        self.blindspot_blocked_cycles += 1;
    }

    pub fn record_lane_unavailable(&mut self) {
        self.lane_unavailable_cycles += 1;
    }

    pub fn record_event(&mut self, event: &DesireEvent) {
        match event {
            DesireEvent::Armed { .. } => self.lane_changes_armed += 1,
            DesireEvent::Started { nudgeless, .. } => {
                self.lane_changes_started += 1;
                if *nudgeless {
                    self.nudgeless_triggers += 1;
                }
            }
            DesireEvent::Finishing { .. } => {}
            DesireEvent::Completed { chained, .. } => {
                self.lane_changes_completed += 1;
                if *chained {
                    self.lane_changes_chained += 1;
                }
            }
            DesireEvent::Aborted { .. } => self.lane_changes_aborted += 1,
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_cycles: self.total_cycles,
            lateral_active_cycles: self.lateral_active_cycles,
            lane_changes_armed: self.lane_changes_armed,
            lane_changes_started: self.lane_changes_started,
            nudgeless_triggers: self.nudgeless_triggers,
            lane_changes_completed: self.lane_changes_completed,
            lane_changes_chained: self.lane_changes_chained,
            lane_changes_aborted: self.lane_changes_aborted,
            blindspot_blocked_cycles: self.blindspot_blocked_cycles,
            lane_unavailable_cycles: self.lane_unavailable_cycles,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSummary {
    pub total_cycles: u64,
    pub lateral_active_cycles: u64,
    pub lane_changes_armed: u64,
    pub lane_changes_started: u64,
    pub nudgeless_triggers: u64,
    pub lane_changes_completed: u64,
    pub lane_changes_chained: u64,
    pub lane_changes_aborted: u64,
    pub blindspot_blocked_cycles: u64,
    pub lane_unavailable_cycles: u64,
}
