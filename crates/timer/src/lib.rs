//! Single-run race timer.
//!
//! Consumes pose/velocity samples in arrival order and reports when the car
//! leaves its resting position and when it comes back to it. The first sample
//! fixes the origin; leaving it by more than [`START_DETECTION_M`] starts the
//! clock; after [`GRACE_PERIOD_S`] the peak speed is tracked and coming back
//! within [`GOAL_DETECTION_M`] of the origin ends the run.
//!
//! The timer is inert once the goal is reached. Build a new one to time again.

use log::debug;
use model::{Event, Phase, Position, Sample};

/// Distance from the origin the car must exceed to start the clock (m).
pub const START_DETECTION_M: f64 = 0.1;
/// Distance from the origin the car must get under to stop the clock (m).
pub const GOAL_DETECTION_M: f64 = 0.3;
/// Time after start during which neither goal nor peak speed are evaluated (s).
pub const GRACE_PERIOD_S: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    CapturingOrigin,
    AwaitingStart {
        origin: Position,
    },
    Running {
        origin: Position,
        start_time: f64,
        max_speed: f64,
    },
    GoalReached {
        origin: Position,
        start_time: f64,
        max_speed: f64,
    },
}

#[derive(Clone, Debug)]
pub struct RaceTimer {
    state: State,
}

impl Default for RaceTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl RaceTimer {
    pub fn new() -> Self {
        Self { state: State::CapturingOrigin }
    }

    /// Advance the state machine by one sample and return what happened.
    pub fn on_sample(&mut self, sample: &Sample) -> Vec<Event> {
        let (next, events) = match self.state {
            State::CapturingOrigin => {
                debug!(
                    "origin captured at ({:.3}, {:.3})",
                    sample.position.x, sample.position.y
                );
                (
                    State::AwaitingStart { origin: sample.position },
                    vec![Event::WaitingForStart],
                )
            }
            State::AwaitingStart { origin } => {
                let distance = sample.position.planar_distance(&origin);
                if distance > START_DETECTION_M {
                    debug!("start detected {:.3} m from origin at t={:.3}", distance, sample.timestamp_s);
                    (
                        State::Running { origin, start_time: sample.timestamp_s, max_speed: 0.0 },
                        vec![Event::Started { timestamp_s: sample.timestamp_s }],
                    )
                } else {
                    return Vec::new();
                }
            }
            State::Running { origin, start_time, max_speed } => {
                let race_duration = sample.timestamp_s - start_time;
                if race_duration > GRACE_PERIOD_S {
                    let max_speed = max_speed.max(sample.velocity.speed());
                    let distance = sample.position.planar_distance(&origin);
                    if distance < GOAL_DETECTION_M {
                        debug!("goal detected {:.3} m from origin after {:.3} s", distance, race_duration);
                        (
                            State::GoalReached { origin, start_time, max_speed },
                            vec![
                                Event::GoalReached {
                                    race_duration_s: race_duration,
                                    max_speed_mps: max_speed,
                                },
                                Event::AwaitingRestart,
                            ],
                        )
                    } else {
                        (State::Running { origin, start_time, max_speed }, Vec::new())
                    }
                } else {
                    // grace period
                    return Vec::new();
                }
            }
            State::GoalReached { .. } => return Vec::new(),
        };

        self.state = next;
        events
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::CapturingOrigin => Phase::CapturingOrigin,
            State::AwaitingStart { .. } => Phase::AwaitingStart,
            State::Running { .. } => Phase::Running,
            State::GoalReached { .. } => Phase::GoalReached,
        }
    }

    pub fn origin(&self) -> Option<Position> {
        match self.state {
            State::CapturingOrigin => None,
            State::AwaitingStart { origin }
            | State::Running { origin, .. }
            | State::GoalReached { origin, .. } => Some(origin),
        }
    }

    /// Peak speed seen after the grace period; zero before the run starts.
    pub fn max_speed(&self) -> f64 {
        match self.state {
            State::Running { max_speed, .. } | State::GoalReached { max_speed, .. } => max_speed,
            State::CapturingOrigin | State::AwaitingStart { .. } => 0.0,
        }
    }

    pub fn start_time(&self) -> Option<f64> {
        match self.state {
            State::Running { start_time, .. } | State::GoalReached { start_time, .. } => {
                Some(start_time)
            }
            State::CapturingOrigin | State::AwaitingStart { .. } => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::GoalReached { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::Velocity;

    fn sample(x: f64, y: f64, vx: f64, t: f64) -> Sample {
        Sample::new(Position::new(x, y), Velocity::new(vx, 0.0, 0.0), t)
    }

    /// Timer with origin at (0,0) that has just started at t=0.
    fn running_timer() -> RaceTimer {
        let mut timer = RaceTimer::new();
        timer.on_sample(&sample(0.0, 0.0, 0.0, -1.0));
        let events = timer.on_sample(&sample(0.15, 0.0, 0.0, 0.0));
        assert_eq!(events, vec![Event::Started { timestamp_s: 0.0 }]);
        timer
    }

    #[test]
    fn first_sample_captures_origin() {
        let mut timer = RaceTimer::new();
        assert_eq!(timer.phase(), Phase::CapturingOrigin);
        assert_eq!(timer.origin(), None);

        let events = timer.on_sample(&sample(3.0, -2.0, 9.0, 10.0));
        assert_eq!(events, vec![Event::WaitingForStart]);
        assert_eq!(timer.phase(), Phase::AwaitingStart);
        assert_eq!(timer.origin(), Some(Position::new(3.0, -2.0)));
        assert_eq!(timer.max_speed(), 0.0);
        assert_eq!(timer.start_time(), None);
    }

    #[test]
    fn small_moves_do_not_start() {
        let mut timer = RaceTimer::new();
        timer.on_sample(&sample(1.0, 1.0, 0.0, 0.0));
        for (i, (x, y)) in [(1.05, 1.0), (1.0, 0.95), (1.07, 1.07), (1.0, 1.0)].iter().enumerate() {
            assert!(timer.on_sample(&sample(*x, *y, 5.0, i as f64)).is_empty());
            assert_eq!(timer.phase(), Phase::AwaitingStart);
        }
        assert_eq!(timer.origin(), Some(Position::new(1.0, 1.0)));
    }

    #[test]
    fn start_boundary_is_exclusive() {
        let mut timer = RaceTimer::new();
        timer.on_sample(&sample(0.0, 0.0, 0.0, 0.0));
        // 0.06/0.08 triangle is exactly 0.1 away
        assert!(timer.on_sample(&sample(0.06, 0.08, 0.0, 1.0)).is_empty());
        assert_eq!(timer.phase(), Phase::AwaitingStart);

        let events = timer.on_sample(&sample(0.0, 0.11, 0.0, 2.5));
        assert_eq!(events, vec![Event::Started { timestamp_s: 2.5 }]);
        assert_eq!(timer.phase(), Phase::Running);
        assert_eq!(timer.start_time(), Some(2.5));
    }

    #[test]
    fn grace_period_ignores_speed_and_goal() {
        let mut timer = running_timer();
        for t in [0.5, 1.0, 2.0, 4.99, 5.0] {
            // back at the origin and fast, still nothing
            assert!(timer.on_sample(&sample(0.0, 0.0, 10.0, t)).is_empty());
            assert_eq!(timer.max_speed(), 0.0);
            assert_eq!(timer.phase(), Phase::Running);
        }
    }

    #[test]
    fn max_speed_is_monotonic_after_grace() {
        let mut timer = running_timer();
        let speeds = [2.0, 7.5, 3.0, 7.5, 1.0, 9.0];
        let mut expected: f64 = 0.0;
        for (i, v) in speeds.iter().enumerate() {
            let t = 6.0 + i as f64;
            assert!(timer.on_sample(&sample(5.0, 5.0, *v, t)).is_empty());
            expected = expected.max(*v);
            assert_eq!(timer.max_speed(), expected);
        }
    }

    #[test]
    fn speed_is_three_dimensional() {
        let mut timer = running_timer();
        let s = Sample::new(Position::new(4.0, 0.0), Velocity::new(0.0, 0.0, 3.0), 6.0);
        timer.on_sample(&s);
        assert_eq!(timer.max_speed(), 3.0);
    }

    #[test]
    fn goal_boundary_is_exclusive() {
        let mut timer = running_timer();
        // exactly 0.3 away
        assert!(timer.on_sample(&sample(0.18, 0.24, 1.0, 6.0)).is_empty());
        assert_eq!(timer.phase(), Phase::Running);

        let events = timer.on_sample(&sample(0.29, 0.0, 1.0, 7.0));
        assert_eq!(
            events,
            vec![
                Event::GoalReached { race_duration_s: 7.0, max_speed_mps: 1.0 },
                Event::AwaitingRestart,
            ]
        );
        assert!(timer.is_finished());
    }

    #[test]
    fn goal_includes_triggering_sample_speed() {
        let mut timer = running_timer();
        timer.on_sample(&sample(3.0, 0.0, 2.0, 5.5));
        let events = timer.on_sample(&sample(0.0, 0.0, 4.0, 8.0));
        assert_eq!(events[0], Event::GoalReached { race_duration_s: 8.0, max_speed_mps: 4.0 });
    }

    #[test]
    fn full_run_scenario() {
        let mut timer = RaceTimer::new();
        assert_eq!(timer.on_sample(&sample(0.0, 0.0, 0.0, -0.5)), vec![Event::WaitingForStart]);
        assert_eq!(
            timer.on_sample(&sample(0.15, 0.0, 0.0, 0.0)),
            vec![Event::Started { timestamp_s: 0.0 }]
        );

        for t in [1.0, 2.0, 3.0, 4.0, 5.0] {
            assert!(timer.on_sample(&sample(10.0, t, 10.0, t)).is_empty());
        }
        assert_eq!(timer.max_speed(), 0.0);

        assert!(timer.on_sample(&sample(0.35, 0.0, 2.0, 5.01)).is_empty());
        assert_eq!(timer.max_speed(), 2.0);

        let events = timer.on_sample(&sample(0.2, 0.0, 1.0, 6.0));
        assert_eq!(
            events,
            vec![
                Event::GoalReached { race_duration_s: 6.0, max_speed_mps: 2.0 },
                Event::AwaitingRestart,
            ]
        );
        assert_eq!(timer.phase(), Phase::GoalReached);
    }

    #[test]
    fn goal_reached_is_terminal() {
        let mut timer = running_timer();
        timer.on_sample(&sample(0.0, 0.0, 3.0, 6.0));
        assert!(timer.is_finished());

        for t in [7.0, 8.0, 100.0] {
            assert!(timer.on_sample(&sample(5.0, 5.0, 50.0, t)).is_empty());
            assert!(timer.on_sample(&sample(0.0, 0.0, 50.0, t + 0.5)).is_empty());
        }
        assert_eq!(timer.phase(), Phase::GoalReached);
        assert_eq!(timer.max_speed(), 3.0);
        assert_eq!(timer.start_time(), Some(0.0));
        assert_eq!(timer.origin(), Some(Position::new(0.0, 0.0)));
    }

    #[test]
    fn instances_are_independent() {
        let mut a = running_timer();
        let b = RaceTimer::new();
        a.on_sample(&sample(0.0, 0.0, 1.0, 6.0));
        assert!(a.is_finished());
        assert_eq!(b.phase(), Phase::CapturingOrigin);
    }
}
