//! Collision detection for axis-aligned box fixtures
//!
//! Bodies are boxes that never rotate, so every test reduces to interval
//! overlap on the two axes. Separation happens along the axis of least
//! penetration.

use glam::Vec2;

/// Axis-aligned box in meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Largest per-axis separation between the two boxes.
    ///
    /// Negative when the boxes overlap, zero when they touch exactly.
    pub fn gap(&self, other: &Aabb) -> f32 {
        let d = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        (d.x - reach.x).max(d.y - reach.y)
    }

    /// Whether the boxes overlap or sit within `slop` of each other
    pub fn touches(&self, other: &Aabb, slop: f32) -> bool {
        self.gap(other) <= slop
    }
}

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the boxes overlap
    pub hit: bool,
    /// Unit normal pointing from the second box toward the first
    pub normal: Vec2,
    /// Overlap along `normal` (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Contact between box `a` and box `b`, reported while they overlap or sit
/// within `slop` of each other.
///
/// The normal points from `b` to `a` along the axis of least penetration.
/// `penetration` is negative while the boxes are apart but within slop.
pub fn box_box_contact(a: &Aabb, b: &Aabb, slop: f32) -> CollisionResult {
    let delta = a.center - b.center;
    let separation = delta.abs() - (a.half_extents + b.half_extents);
    let gap = separation.x.max(separation.y);

    if gap > slop {
        return CollisionResult::miss();
    }

    let normal = if separation.x > separation.y {
        Vec2::new(delta.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, delta.y.signum())
    };
    CollisionResult {
        hit: true,
        normal,
        penetration: -gap,
    }
}

/// Check overlap between box `a` and box `b`.
///
/// Moving `a` by `normal * penetration` separates them.
pub fn box_box_collision(a: &Aabb, b: &Aabb) -> CollisionResult {
    let contact = box_box_contact(a, b, 0.0);
    if contact.hit && contact.penetration > 0.0 {
        contact
    } else {
        CollisionResult::miss()
    }
}

/// Impulse to apply to body `a` (and its negation to `b`) so the pair stops
/// approaching along `normal`, with Coulomb friction on the tangent.
///
/// `relative` is `velocity_a - velocity_b`, `inv_mass_sum` the sum of both
/// inverse masses. Returns zero for separating pairs.
pub fn contact_impulse(relative: Vec2, normal: Vec2, inv_mass_sum: f32, friction: f32) -> Vec2 {
    let vn = relative.dot(normal);
    if vn >= 0.0 || inv_mass_sum <= 0.0 {
        return Vec2::ZERO;
    }
    let jn = -vn / inv_mass_sum;

    let tangent = normal.perp();
    let vt = relative.dot(tangent);
    let max_jt = friction * jn;
    let jt = (-vt / inv_mass_sum).clamp(-max_jt, max_jt);

    normal * jn + tangent * jt
}

/// Combined friction of two fixtures
#[inline]
pub fn mix_friction(a: f32, b: f32) -> f32 {
    (a * b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_overlap_vertical() {
        // Box resting slightly inside a floor
        let body = Aabb::new(Vec2::new(0.0, 0.95), Vec2::splat(0.5));
        let floor = Aabb::new(Vec2::new(0.0, 0.25), Vec2::new(5.0, 0.25));

        let result = box_box_collision(&body, &floor);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::Y);
        assert!((result.penetration - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_box_overlap_horizontal() {
        let a = Aabb::new(Vec2::new(0.9, 0.0), Vec2::splat(0.5));
        let b = Aabb::new(Vec2::ZERO, Vec2::splat(0.5));

        let result = box_box_collision(&a, &b);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::X);
        assert!((result.penetration - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_box_miss() {
        let a = Aabb::new(Vec2::new(2.0, 0.0), Vec2::splat(0.5));
        let b = Aabb::new(Vec2::ZERO, Vec2::splat(0.5));

        assert!(!box_box_collision(&a, &b).hit);
        assert!((a.gap(&b) - 1.0).abs() < 1e-6);
        assert!(!a.touches(&b, 0.01));
    }

    #[test]
    fn test_touching_within_slop() {
        let a = Aabb::new(Vec2::new(0.0, 1.005), Vec2::splat(0.5));
        let b = Aabb::new(Vec2::ZERO, Vec2::splat(0.5));

        assert!(!box_box_collision(&a, &b).hit);
        assert!(a.touches(&b, 0.01));
    }

    #[test]
    fn test_contact_impulse_against_static() {
        // Unit mass falling onto static ground with a small sideways drift
        let impulse = contact_impulse(Vec2::new(0.2, -3.0), Vec2::Y, 1.0, 0.7);
        let v = Vec2::new(0.2, -3.0) + impulse;
        assert!(v.y.abs() < 1e-6);
        // Friction bound (0.7 * 3.0) exceeds the drift, so it stops
        assert!(v.x.abs() < 1e-6);

        // Fast slide keeps some tangent speed
        let impulse = contact_impulse(Vec2::new(5.0, -1.0), Vec2::Y, 1.0, 0.7);
        let v = Vec2::new(5.0, -1.0) + impulse;
        assert!((v.x - 4.3).abs() < 1e-5);

        // Separating pairs are untouched
        assert_eq!(contact_impulse(Vec2::new(1.0, 2.0), Vec2::Y, 1.0, 0.7), Vec2::ZERO);
    }

    #[test]
    fn test_contact_impulse_splits_between_dynamic_bodies() {
        // Equal masses closing head-on: both stop along the normal
        let va = Vec2::new(-1.0, 0.0);
        let vb = Vec2::new(1.0, 0.0);
        let impulse = contact_impulse(va - vb, Vec2::X, 2.0, 0.0);
        assert!(((va + impulse).x).abs() < 1e-6);
        assert!(((vb - impulse).x).abs() < 1e-6);
    }
}
