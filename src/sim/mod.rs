//! Fixed-step simulation module
//!
//! Everything that touches rigid bodies lives here:
//! - Fixed timestep only (`consts::SIM_DT`)
//! - Stable iteration order (by body handle)
//! - No rendering, session or platform dependencies

pub mod body;
pub mod collision;
pub mod contact;
pub mod movement;
pub mod world;

pub use body::{DynamicBody, Footprint, SimBody};
pub use collision::{Aabb, CollisionResult, box_box_collision, box_box_contact};
pub use contact::{Contact, ContactListener, ImpactSignal};
pub use movement::{Axis, Movement, MovementIntent, MovementProfile, step_axis};
pub use world::{BodyDef, BodyHandle, BoxFixture, BoxWorld, Dynamics, PhysicsError, PhysicsWorld, Transform};
