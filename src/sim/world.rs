//! Rigid-body world
//!
//! `PhysicsWorld` is the narrow surface the game needs from a rigid-body
//! simulator: body lifecycle, box fixtures, fixed stepping, impulses and a
//! begin-contact observer. `BoxWorld` implements it for non-rotating boxes
//! under constant gravity.
//!
//! All quantities are SI (meters, seconds, kilograms). Iteration is by body
//! handle, so two worlds fed the same calls stay identical.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::{Aabb, box_box_collision, box_box_contact, contact_impulse, mix_friction};
use super::contact::{Contact, ContactListener};
use crate::consts::{FIXTURE_DENSITY, FIXTURE_FRICTION};

/// Allowed overlap kept between resting bodies (m)
pub const LINEAR_SLOP: f32 = 0.005;
/// Bodies slower than this accumulate sleep time (m/s)
pub const SLEEP_SPEED: f32 = 0.01;
/// Seconds of rest before a body sleeps
pub const TIME_TO_SLEEP: f32 = 0.5;
/// Share of the remaining penetration removed per position iteration
const POSITION_CORRECTION: f32 = 0.8;

/// Handle to a body owned by a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dynamics {
    Static,
    Dynamic,
}

/// Creation parameters for a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDef {
    pub dynamics: Dynamics,
    /// Position in meters
    pub position: Vec2,
}

impl BodyDef {
    pub fn new(dynamics: Dynamics, position: Vec2) -> Self {
        Self { dynamics, position }
    }
}

/// Box collision footprint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxFixture {
    pub half_extents: Vec2,
    pub density: f32,
    pub friction: f32,
}

impl BoxFixture {
    /// Box with the default block material
    pub fn new(half_extents: Vec2) -> Self {
        Self {
            half_extents,
            density: FIXTURE_DENSITY,
            friction: FIXTURE_FRICTION,
        }
    }
}

/// Position (m) and orientation (radians) of a body
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vec2,
    pub angle: f32,
}

#[derive(Debug, Error, PartialEq)]
pub enum PhysicsError {
    #[error("no body with handle {0:?}")]
    UnknownBody(BodyHandle),
    #[error("body {0:?} already has a fixture")]
    FixtureExists(BodyHandle),
    #[error("fixture extents must be positive, got {0}")]
    InvalidFixture(Vec2),
}

/// Rigid-body simulator collaborator
pub trait PhysicsWorld {
    fn create_body(&mut self, def: BodyDef) -> BodyHandle;
    fn destroy_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError>;
    /// Attach the body's one and only fixture
    fn attach_box(&mut self, handle: BodyHandle, fixture: BoxFixture) -> Result<(), PhysicsError>;
    fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32);
    fn apply_linear_impulse(
        &mut self,
        handle: BodyHandle,
        impulse: Vec2,
        point: Vec2,
        wake: bool,
    ) -> Result<(), PhysicsError>;
    fn transform(&self, handle: BodyHandle) -> Result<Transform, PhysicsError>;
    fn linear_velocity(&self, handle: BodyHandle) -> Result<Vec2, PhysicsError>;
    fn mass(&self, handle: BodyHandle) -> Result<f32, PhysicsError>;
    fn world_center(&self, handle: BodyHandle) -> Result<Vec2, PhysicsError>;
    fn is_awake(&self, handle: BodyHandle) -> Result<bool, PhysicsError>;
    /// Replace the contact observer
    fn set_contact_listener(&mut self, listener: Box<dyn ContactListener>);
    fn body_count(&self) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct Body {
    dynamics: Dynamics,
    position: Vec2,
    velocity: Vec2,
    fixture: Option<BoxFixture>,
    awake: bool,
    sleep_time: f32,
}

impl Body {
    fn mass(&self) -> f32 {
        match (self.dynamics, self.fixture) {
            (Dynamics::Static, _) => 0.0,
            (Dynamics::Dynamic, Some(f)) => f.density * 4.0 * f.half_extents.x * f.half_extents.y,
            // Box2D convention: a dynamic body without fixtures weighs 1 kg
            (Dynamics::Dynamic, None) => 1.0,
        }
    }

    fn inv_mass(&self) -> f32 {
        let mass = self.mass();
        if mass > 0.0 { 1.0 / mass } else { 0.0 }
    }

    fn is_active(&self) -> bool {
        self.dynamics == Dynamics::Dynamic && self.awake
    }

    fn aabb(&self) -> Option<Aabb> {
        self.fixture.map(|f| Aabb::new(self.position, f.half_extents))
    }

    fn wake(&mut self) {
        if self.dynamics == Dynamics::Dynamic {
            self.awake = true;
            self.sleep_time = 0.0;
        }
    }
}

/// Box-only rigid-body world
pub struct BoxWorld {
    gravity: Vec2,
    bodies: BTreeMap<BodyHandle, Body>,
    next_id: u32,
    /// Pairs touching at the end of the last step
    contacts: BTreeSet<(BodyHandle, BodyHandle)>,
    listener: Option<Box<dyn ContactListener>>,
}

impl Default for BoxWorld {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, -10.0))
    }
}

impl BoxWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            bodies: BTreeMap::new(),
            next_id: 1,
            contacts: BTreeSet::new(),
            listener: None,
        }
    }

    fn body(&self, handle: BodyHandle) -> Result<&Body, PhysicsError> {
        self.bodies
            .get(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut Body, PhysicsError> {
        self.bodies
            .get_mut(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    /// Pairs of body indices that need solving: at least one awake dynamic
    /// body, both with fixtures.
    fn candidate_pairs(bodies: &[(BodyHandle, Body)]) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let (a, b) = (&bodies[i].1, &bodies[j].1);
                if a.fixture.is_none() || b.fixture.is_none() {
                    continue;
                }
                if a.is_active() || b.is_active() {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    fn solve_velocities(bodies: &mut [(BodyHandle, Body)], pairs: &[(usize, usize)]) {
        for &(i, j) in pairs {
            let (a, b) = pair_mut(bodies, i, j);
            let (Some(box_a), Some(box_b)) = (a.aabb(), b.aabb()) else {
                continue;
            };
            let contact = box_box_contact(&box_a, &box_b, LINEAR_SLOP);
            if !contact.hit {
                continue;
            }
            let (inv_a, inv_b) = (a.inv_mass(), b.inv_mass());
            let friction = match (a.fixture, b.fixture) {
                (Some(fa), Some(fb)) => mix_friction(fa.friction, fb.friction),
                _ => 0.0,
            };
            let impulse = contact_impulse(
                a.velocity - b.velocity,
                contact.normal,
                inv_a + inv_b,
                friction,
            );
            if impulse == Vec2::ZERO {
                continue;
            }
            // A moving body pushing a sleeping one wakes it
            if a.is_active() {
                b.wake();
            }
            if b.is_active() {
                a.wake();
            }
            a.velocity += impulse * inv_a;
            b.velocity -= impulse * inv_b;
        }
    }

    fn solve_positions(bodies: &mut [(BodyHandle, Body)], pairs: &[(usize, usize)]) {
        for &(i, j) in pairs {
            let (a, b) = pair_mut(bodies, i, j);
            let (Some(box_a), Some(box_b)) = (a.aabb(), b.aabb()) else {
                continue;
            };
            let hit = box_box_collision(&box_a, &box_b);
            if !hit.hit || hit.penetration <= LINEAR_SLOP {
                continue;
            }
            let (inv_a, inv_b) = (a.inv_mass(), b.inv_mass());
            let inv_sum = inv_a + inv_b;
            if inv_sum <= 0.0 {
                continue;
            }
            let correction = (hit.penetration - LINEAR_SLOP) * POSITION_CORRECTION;
            a.position += hit.normal * correction * (inv_a / inv_sum);
            b.position -= hit.normal * correction * (inv_b / inv_sum);
        }
    }

    fn touching_pairs(&self) -> BTreeSet<(BodyHandle, BodyHandle)> {
        let boxes: Vec<(BodyHandle, Aabb)> = self
            .bodies
            .iter()
            .filter_map(|(h, b)| b.aabb().map(|aabb| (*h, aabb)))
            .collect();

        let mut touching = BTreeSet::new();
        for i in 0..boxes.len() {
            for j in (i + 1)..boxes.len() {
                let static_pair = self.bodies[&boxes[i].0].dynamics == Dynamics::Static
                    && self.bodies[&boxes[j].0].dynamics == Dynamics::Static;
                if static_pair {
                    continue;
                }
                if boxes[i].1.touches(&boxes[j].1, 2.0 * LINEAR_SLOP) {
                    touching.insert((boxes[i].0, boxes[j].0));
                }
            }
        }
        touching
    }
}

/// Two distinct bodies borrowed mutably, `i < j`
fn pair_mut(bodies: &mut [(BodyHandle, Body)], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert!(i < j);
    let (left, right) = bodies.split_at_mut(j);
    (&mut left[i].1, &mut right[0].1)
}

impl PhysicsWorld for BoxWorld {
    fn create_body(&mut self, def: BodyDef) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        self.bodies.insert(
            handle,
            Body {
                dynamics: def.dynamics,
                position: def.position,
                velocity: Vec2::ZERO,
                fixture: None,
                awake: def.dynamics == Dynamics::Dynamic,
                sleep_time: 0.0,
            },
        );
        log::debug!("Created {:?} body {:?} at {}", def.dynamics, handle, def.position);
        handle
    }

    fn destroy_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        self.bodies
            .remove(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        self.contacts.retain(|(a, b)| *a != handle && *b != handle);
        log::debug!("Destroyed body {:?}", handle);
        Ok(())
    }

    fn attach_box(&mut self, handle: BodyHandle, fixture: BoxFixture) -> Result<(), PhysicsError> {
        if fixture.half_extents.x <= 0.0 || fixture.half_extents.y <= 0.0 {
            return Err(PhysicsError::InvalidFixture(fixture.half_extents));
        }
        let body = self.body_mut(handle)?;
        if body.fixture.is_some() {
            return Err(PhysicsError::FixtureExists(handle));
        }
        body.fixture = Some(fixture);
        Ok(())
    }

    fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32) {
        let mut bodies: Vec<(BodyHandle, Body)> =
            self.bodies.iter().map(|(h, b)| (*h, *b)).collect();

        for (_, body) in bodies.iter_mut() {
            if body.is_active() {
                body.velocity += self.gravity * dt;
            }
        }

        let pairs = Self::candidate_pairs(&bodies);
        for _ in 0..velocity_iterations {
            Self::solve_velocities(&mut bodies, &pairs);
        }

        for (_, body) in bodies.iter_mut() {
            if body.is_active() {
                body.position += body.velocity * dt;
            }
        }

        for _ in 0..position_iterations {
            Self::solve_positions(&mut bodies, &pairs);
        }

        for (_, body) in bodies.iter_mut() {
            if !body.is_active() {
                continue;
            }
            if body.velocity.length() < SLEEP_SPEED {
                body.sleep_time += dt;
                if body.sleep_time >= TIME_TO_SLEEP {
                    body.awake = false;
                    body.velocity = Vec2::ZERO;
                }
            } else {
                body.sleep_time = 0.0;
            }
        }

        for (handle, body) in bodies {
            self.bodies.insert(handle, body);
        }

        let touching = self.touching_pairs();
        let began: Vec<Contact> = touching
            .difference(&self.contacts)
            .map(|&(a, b)| Contact { a, b })
            .collect();
        self.contacts = touching;

        if let Some(listener) = self.listener.as_mut() {
            for contact in &began {
                listener.begin_contact(contact);
            }
        }
    }

    fn apply_linear_impulse(
        &mut self,
        handle: BodyHandle,
        impulse: Vec2,
        _point: Vec2,
        wake: bool,
    ) -> Result<(), PhysicsError> {
        // Boxes never rotate, so the application point carries no torque
        let body = self.body_mut(handle)?;
        if body.dynamics != Dynamics::Dynamic {
            return Ok(());
        }
        if wake {
            body.wake();
        }
        if !body.awake {
            return Ok(());
        }
        let inv_mass = body.inv_mass();
        body.velocity += impulse * inv_mass;
        Ok(())
    }

    fn transform(&self, handle: BodyHandle) -> Result<Transform, PhysicsError> {
        let body = self.body(handle)?;
        Ok(Transform {
            position: body.position,
            angle: 0.0,
        })
    }

    fn linear_velocity(&self, handle: BodyHandle) -> Result<Vec2, PhysicsError> {
        Ok(self.body(handle)?.velocity)
    }

    fn mass(&self, handle: BodyHandle) -> Result<f32, PhysicsError> {
        Ok(self.body(handle)?.mass())
    }

    fn world_center(&self, handle: BodyHandle) -> Result<Vec2, PhysicsError> {
        Ok(self.body(handle)?.position)
    }

    fn is_awake(&self, handle: BodyHandle) -> Result<bool, PhysicsError> {
        Ok(self.body(handle)?.awake)
    }

    fn set_contact_listener(&mut self, listener: Box<dyn ContactListener>) {
        self.listener = Some(listener);
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{POSITION_ITERATIONS, SIM_DT, VELOCITY_ITERATIONS};
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingListener(Rc<Cell<u32>>);

    impl ContactListener for CountingListener {
        fn begin_contact(&mut self, _contact: &Contact) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn step_n(world: &mut BoxWorld, n: usize) {
        for _ in 0..n {
            world.step(SIM_DT, VELOCITY_ITERATIONS, POSITION_ITERATIONS);
        }
    }

    fn ground_and_block(world: &mut BoxWorld) -> (BodyHandle, BodyHandle) {
        let ground = world.create_body(BodyDef::new(Dynamics::Static, Vec2::new(5.0, 0.2)));
        world
            .attach_box(ground, BoxFixture::new(Vec2::new(2.5, 0.2)))
            .unwrap();
        let block = world.create_body(BodyDef::new(Dynamics::Dynamic, Vec2::new(5.0, 2.0)));
        world
            .attach_box(block, BoxFixture::new(Vec2::splat(0.3)))
            .unwrap();
        (ground, block)
    }

    #[test]
    fn test_free_fall_matches_gravity() {
        let mut world = BoxWorld::default();
        let body = world.create_body(BodyDef::new(Dynamics::Dynamic, Vec2::new(0.0, 100.0)));
        world.attach_box(body, BoxFixture::new(Vec2::splat(0.5))).unwrap();

        step_n(&mut world, 60);

        let v = world.linear_velocity(body).unwrap();
        assert!((v.y + 10.0).abs() < 1e-3, "vy = {}", v.y);
        assert!(world.transform(body).unwrap().position.y < 100.0);
    }

    #[test]
    fn test_block_comes_to_rest_on_ground() {
        let mut world = BoxWorld::default();
        let (_ground, block) = ground_and_block(&mut world);

        step_n(&mut world, 240);

        let pos = world.transform(block).unwrap().position;
        // Ground top at 0.4, block half height 0.3
        assert!((pos.y - 0.7).abs() < 0.02, "resting y = {}", pos.y);
        assert!(world.linear_velocity(block).unwrap().length() < 0.05);
        assert!(!world.is_awake(block).unwrap());
    }

    #[test]
    fn test_begin_contact_fires_once_per_touch() {
        let count = Rc::new(Cell::new(0));
        let mut world = BoxWorld::default();
        world.set_contact_listener(Box::new(CountingListener(count.clone())));
        let (_ground, block) = ground_and_block(&mut world);

        step_n(&mut world, 120);
        assert_eq!(count.get(), 1);

        // Hop off the ground and land again
        let mass = world.mass(block).unwrap();
        world
            .apply_linear_impulse(block, Vec2::new(0.0, 5.0 * mass), Vec2::ZERO, true)
            .unwrap();
        step_n(&mut world, 180);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_impulse_changes_velocity_by_inverse_mass() {
        let mut world = BoxWorld::new(Vec2::ZERO);
        let body = world.create_body(BodyDef::new(Dynamics::Dynamic, Vec2::ZERO));
        world.attach_box(body, BoxFixture::new(Vec2::splat(0.5))).unwrap();

        // density 5 * area 1
        assert!((world.mass(body).unwrap() - 5.0).abs() < 1e-6);

        world
            .apply_linear_impulse(body, Vec2::new(5.0, 10.0), Vec2::ZERO, true)
            .unwrap();
        assert_eq!(world.linear_velocity(body).unwrap(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_static_bodies_ignore_gravity_and_impulses() {
        let mut world = BoxWorld::default();
        let ground = world.create_body(BodyDef::new(Dynamics::Static, Vec2::new(1.0, 1.0)));
        world.attach_box(ground, BoxFixture::new(Vec2::ONE)).unwrap();

        world
            .apply_linear_impulse(ground, Vec2::new(100.0, 0.0), Vec2::ZERO, true)
            .unwrap();
        step_n(&mut world, 30);

        assert_eq!(world.transform(ground).unwrap().position, Vec2::new(1.0, 1.0));
        assert_eq!(world.mass(ground).unwrap(), 0.0);
    }

    #[test]
    fn test_sleeping_body_wakes_on_impulse() {
        let mut world = BoxWorld::default();
        let (_ground, block) = ground_and_block(&mut world);
        step_n(&mut world, 240);
        assert!(!world.is_awake(block).unwrap());

        // Without wake the impulse is dropped, like a sleeping Box2D body
        world
            .apply_linear_impulse(block, Vec2::new(3.0, 0.0), Vec2::ZERO, false)
            .unwrap();
        assert_eq!(world.linear_velocity(block).unwrap(), Vec2::ZERO);

        world
            .apply_linear_impulse(block, Vec2::new(3.0, 0.0), Vec2::ZERO, true)
            .unwrap();
        assert!(world.is_awake(block).unwrap());
        assert!(world.linear_velocity(block).unwrap().x > 0.0);
    }

    #[test]
    fn test_unknown_and_duplicate_fixture_errors() {
        let mut world = BoxWorld::default();
        let body = world.create_body(BodyDef::new(Dynamics::Dynamic, Vec2::ZERO));
        world.attach_box(body, BoxFixture::new(Vec2::ONE)).unwrap();

        assert_eq!(
            world.attach_box(body, BoxFixture::new(Vec2::ONE)),
            Err(PhysicsError::FixtureExists(body))
        );
        assert!(matches!(
            world.attach_box(body, BoxFixture::new(Vec2::new(0.0, 1.0))),
            Err(PhysicsError::InvalidFixture(_))
        ));

        world.destroy_body(body).unwrap();
        assert_eq!(world.destroy_body(body), Err(PhysicsError::UnknownBody(body)));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_determinism() {
        let mut w1 = BoxWorld::default();
        let mut w2 = BoxWorld::default();
        let (_, b1) = ground_and_block(&mut w1);
        let (_, b2) = ground_and_block(&mut w2);

        for i in 0..90 {
            if i == 30 {
                w1.apply_linear_impulse(b1, Vec2::new(2.0, 4.0), Vec2::ZERO, true).unwrap();
                w2.apply_linear_impulse(b2, Vec2::new(2.0, 4.0), Vec2::ZERO, true).unwrap();
            }
            w1.step(SIM_DT, VELOCITY_ITERATIONS, POSITION_ITERATIONS);
            w2.step(SIM_DT, VELOCITY_ITERATIONS, POSITION_ITERATIONS);
        }

        assert_eq!(w1.transform(b1).unwrap(), w2.transform(b2).unwrap());
    }
}
