//! Game-side handles to simulated bodies
//!
//! A `SimBody` ties a world body to the sprite footprint it is drawn with and
//! converts between presentation units (pixels) and meters. A `DynamicBody`
//! adds movement intents that are turned into impulses every step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::movement::{Axis, Movement, MovementIntent, MovementProfile, impulse_for};
use super::world::{BodyDef, BodyHandle, BoxFixture, Dynamics, PhysicsError, PhysicsWorld, Transform};
use crate::consts::FIXTURE_MARGIN;
use crate::{pix_to_m, to_meters, to_pixels};

/// Visual footprint in presentation units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: f32,
    pub height: f32,
}

impl Footprint {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Collision half extents in meters, or `None` when the shaved footprint
    /// would be empty
    pub fn fixture_half_extents(&self) -> Option<Vec2> {
        let size = Vec2::new(
            pix_to_m(self.width - FIXTURE_MARGIN),
            pix_to_m(self.height - FIXTURE_MARGIN),
        );
        (size.x > 0.0 && size.y > 0.0).then(|| size / 2.0)
    }
}

/// A world body bound to a sprite footprint
#[derive(Debug, Clone)]
pub struct SimBody {
    footprint: Footprint,
    handle: Option<BodyHandle>,
}

impl SimBody {
    /// The footprint is fixed for the lifetime of the wrapper
    pub fn new(footprint: Footprint) -> Self {
        Self {
            footprint,
            handle: None,
        }
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    pub fn width(&self) -> f32 {
        self.footprint.width
    }

    pub fn height(&self) -> f32 {
        self.footprint.height
    }

    pub fn handle(&self) -> Option<BodyHandle> {
        self.handle
    }

    /// Create the world body at `position` (presentation units), replacing
    /// any body this wrapper already owns.
    pub fn create_body(
        &mut self,
        world: &mut dyn PhysicsWorld,
        position: Vec2,
        dynamics: Dynamics,
    ) -> BodyHandle {
        self.destroy_body(world);
        let handle = world.create_body(BodyDef::new(dynamics, to_meters(position)));
        self.handle = Some(handle);
        handle
    }

    /// Release the world body. Safe to call when no body exists.
    pub fn destroy_body(&mut self, world: &mut dyn PhysicsWorld) {
        if let Some(handle) = self.handle.take()
            && let Err(e) = world.destroy_body(handle)
        {
            log::warn!("Body already gone from the world: {}", e);
        }
    }

    /// Attach a box fixture derived from the footprint.
    ///
    /// Returns `Ok(false)` without touching the world when there is no body
    /// or the footprint is too small to yield a fixture.
    pub fn create_fixture_from_sprite(
        &mut self,
        world: &mut dyn PhysicsWorld,
    ) -> Result<bool, PhysicsError> {
        let Some(handle) = self.handle else {
            log::warn!("Fixture requested before the body was created");
            return Ok(false);
        };
        let Some(half_extents) = self.footprint.fixture_half_extents() else {
            return Ok(false);
        };
        world.attach_box(handle, BoxFixture::new(half_extents))?;
        Ok(true)
    }

    /// Position and rotation in presentation units
    pub fn transform(&self, world: &dyn PhysicsWorld) -> Option<Transform> {
        let handle = self.handle?;
        let t = world.transform(handle).ok()?;
        Some(Transform {
            position: to_pixels(t.position),
            angle: t.angle,
        })
    }
}

/// A dynamic body steered by per-axis movement intents
#[derive(Debug, Clone)]
pub struct DynamicBody {
    body: SimBody,
    intent: MovementIntent,
    profile: MovementProfile,
}

impl DynamicBody {
    pub fn new(footprint: Footprint, profile: MovementProfile) -> Self {
        Self {
            body: SimBody::new(footprint),
            intent: MovementIntent::default(),
            profile,
        }
    }

    pub fn body(&self) -> &SimBody {
        &self.body
    }

    pub fn intent(&self) -> MovementIntent {
        self.intent
    }

    /// Destroy any previous body and create a fresh dynamic body with its
    /// fixture at `position` (presentation units). Intents are cleared.
    pub fn spawn(
        &mut self,
        world: &mut dyn PhysicsWorld,
        position: Vec2,
    ) -> Result<BodyHandle, PhysicsError> {
        let handle = self.body.create_body(world, position, Dynamics::Dynamic);
        self.body.create_fixture_from_sprite(world)?;
        self.intent = MovementIntent::default();
        Ok(handle)
    }

    /// Record the intent for one axis, replacing the previous one
    pub fn set_axis_movement(&mut self, axis: Axis, movement: Movement) {
        self.intent.set(axis, movement);
    }

    /// Turn the current intents into one impulse at the center of mass.
    ///
    /// Called once per simulation step. Returns whether an impulse was
    /// applied; bursts are consumed either way.
    pub fn apply_impulses(&mut self, world: &mut dyn PhysicsWorld) -> Result<bool, PhysicsError> {
        let Some(handle) = self.body.handle() else {
            return Ok(false);
        };
        let current = world.linear_velocity(handle)?;
        let desired = self.intent.advance(current, &self.profile);
        let mass = world.mass(handle)?;

        match impulse_for(mass, current, desired) {
            Some(impulse) => {
                let center = world.world_center(handle)?;
                world.apply_linear_impulse(handle, impulse, center, true)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Linear velocity in m/s
    pub fn linear_velocity(&self, world: &dyn PhysicsWorld) -> Option<Vec2> {
        world.linear_velocity(self.body.handle()?).ok()
    }

    pub fn transform(&self, world: &dyn PhysicsWorld) -> Option<Transform> {
        self.body.transform(world)
    }
}
