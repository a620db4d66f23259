use serde::{Deserialize, Serialize};

/// Planar position in the pose frame (meters). Altitude is not carried.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance using only x and y.
    pub fn planar_distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Linear velocity (m/s).
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Velocity {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Full 3D magnitude, z included.
    pub fn speed(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Sample {
    pub position: Position,
    pub velocity: Velocity,
    /// Monotonic time in seconds.
    pub timestamp_s: f64,
}

impl Sample {
    pub fn new(position: Position, velocity: Velocity, timestamp_s: f64) -> Self {
        Self { position, velocity, timestamp_s }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    CapturingOrigin,
    AwaitingStart,
    Running,
    GoalReached,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    WaitingForStart,
    Started { timestamp_s: f64 },
    GoalReached { race_duration_s: f64, max_speed_mps: f64 },
    AwaitingRestart,
}
