//! Per-axis movement intents
//!
//! Each axis carries a discrete intent that is turned into a desired velocity
//! once per simulation step. The transition table is a pure function so it
//! can be exercised without a physics world; `DynamicBody::apply_impulses`
//! feeds its result into the world.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::STOP_THRESHOLD;

/// Discrete movement intent for one axis.
///
/// "Negative" is leftward on the horizontal axis and downward on the vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Movement {
    /// Keep whatever velocity the body has
    #[default]
    Coast,
    /// Brake until nearly still, then coast
    Stop,
    NegativeCruise,
    PositiveCruise,
    /// One-shot velocity change, consumed by the next step
    NegativeBurst,
    PositiveBurst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Outcome of advancing one axis by one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisStep {
    /// Velocity the axis should have after this step (m/s)
    pub desired: f32,
    /// Intent to carry into the next step
    pub next: Movement,
}

/// Advance a single axis.
///
/// `speed` is the cruising speed and `burst` the burst speed for this axis,
/// both non-negative magnitudes in m/s.
pub fn step_axis(movement: Movement, current: f32, speed: f32, burst: f32) -> AxisStep {
    match movement {
        Movement::Coast => AxisStep {
            desired: current,
            next: Movement::Coast,
        },
        Movement::Stop => {
            let desired = -(current / 4.0);
            let next = if desired.abs() < STOP_THRESHOLD {
                Movement::Coast
            } else {
                Movement::Stop
            };
            AxisStep { desired, next }
        }
        Movement::NegativeCruise => AxisStep {
            desired: -speed,
            next: movement,
        },
        Movement::PositiveCruise => AxisStep {
            desired: speed,
            next: movement,
        },
        Movement::NegativeBurst => AxisStep {
            desired: -burst,
            next: Movement::Coast,
        },
        Movement::PositiveBurst => AxisStep {
            desired: burst,
            next: Movement::Coast,
        },
    }
}

/// Speeds used to resolve cruise and burst intents, per axis (m/s)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementProfile {
    pub cruise: Vec2,
    pub burst: Vec2,
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self {
            cruise: Vec2::new(2.0, 2.0),
            burst: Vec2::new(2.0, 10.0),
        }
    }
}

/// Intent for both axes of one body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementIntent {
    pub horizontal: Movement,
    pub vertical: Movement,
}

impl MovementIntent {
    /// Overwrite the intent for one axis
    pub fn set(&mut self, axis: Axis, movement: Movement) {
        match axis {
            Axis::Horizontal => self.horizontal = movement,
            Axis::Vertical => self.vertical = movement,
        }
    }

    pub fn get(&self, axis: Axis) -> Movement {
        match axis {
            Axis::Horizontal => self.horizontal,
            Axis::Vertical => self.vertical,
        }
    }

    /// Advance both axes against the current velocity, returning the desired
    /// velocity and storing the follow-up intents.
    pub fn advance(&mut self, current: Vec2, profile: &MovementProfile) -> Vec2 {
        let x = step_axis(self.horizontal, current.x, profile.cruise.x, profile.burst.x);
        let y = step_axis(self.vertical, current.y, profile.cruise.y, profile.burst.y);
        self.horizontal = x.next;
        self.vertical = y.next;
        Vec2::new(x.desired, y.desired)
    }
}

/// Impulse that moves a body of `mass` from `current` to `desired` velocity.
///
/// Returns `None` when no impulse is needed.
pub fn impulse_for(mass: f32, current: Vec2, desired: Vec2) -> Option<Vec2> {
    let impulse = (desired - current) * mass;
    (impulse.length_squared() > 0.0).then_some(impulse)
}
