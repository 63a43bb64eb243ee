// src/pipeline/event_bus.rs
//
// Transition events published by the desire helper. Consumers drain them
// after each cycle; they never feed back into the state machine.

use crate::types::LaneChangeDirection;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    LateralInactive,
    Timeout,
    BlinkerReleased,
    BelowMinSpeed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DesireEvent {
    /// Blinker edge at speed: waiting for torque or the nudgeless delay
    Armed { direction: LaneChangeDirection },

    Started {
        direction: LaneChangeDirection,
        nudgeless: bool,
    },

    Finishing { direction: LaneChangeDirection },

    Completed {
        direction: LaneChangeDirection,
        /// Blinker still on, re-armed for another change
        chained: bool,
    },

    Aborted {
        reason: AbortReason,
        cycle: u64,
    },
}

pub struct EventBus {
    events: VecDeque<DesireEvent>,
    max_pending: usize,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
        }
    }

    pub fn publish(&mut self, event: DesireEvent) {
        if self.max_pending == 0 {
            return;
        }
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<DesireEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_returns_in_order() {
        let mut bus = EventBus::new(8);
        bus.publish(DesireEvent::Armed {
            direction: LaneChangeDirection::Left,
        });
        bus.publish(DesireEvent::Started {
            direction: LaneChangeDirection::Left,
            nudgeless: false,
        });

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], DesireEvent::Armed { .. }));
        assert!(matches!(events[1], DesireEvent::Started { .. }));
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops_oldest() {
        let mut bus = EventBus::new(2);
        for cycle in 0..3 {
            bus.publish(DesireEvent::Aborted {
                reason: AbortReason::Timeout,
                cycle,
            });
        }

        let events = bus.drain();
        assert_eq!(
            events,
            vec![
                DesireEvent::Aborted {
                    reason: AbortReason::Timeout,
                    cycle: 1
                },
                DesireEvent::Aborted {
                    reason: AbortReason::Timeout,
                    cycle: 2
                },
            ]
        );
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_string(&DesireEvent::Completed {
            direction: LaneChangeDirection::Right,
            chained: true,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"event":"completed","direction":"right","chained":true}"#
        );
    }
}
