//! Circle-versus-rectangle contact on the ground plane.
//!
//! Walls are axis-aligned boxes; only their XZ footprint takes part in
//! collision. The ball is a circle of the configured radius.

use serde::{Deserialize, Serialize};

use minigolf_core::Vec3;

/// How close to touching counts as touching when a step starts.
const TOUCH_EPSILON: f32 = 1e-5;

/// An axis-aligned rectangular wall segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Collider {
    pub center_x: f32,
    pub center_z: f32,
    pub half_width: f32,
    pub half_depth: f32,
    /// Visual height only.
    pub height: f32,
}

/// Overlap between the ball and a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the wall toward the ball, along X or Z.
    pub normal: Vec3,
    /// How far the ball must move along `normal` to clear the wall.
    pub depth: f32,
    /// Ball position after being pushed out to the wall face.
    pub resolved: Vec3,
}

/// First hit of a moving ball against a collider within one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    /// Fraction of the step (0..=1) at which the ball reaches the wall.
    pub t: f32,
    /// Outward normal at the hit: along X or Z on a face, radial on a corner.
    pub normal: Vec3,
}

/// What happened to the ball's velocity at a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bounce {
    /// Normal component reflected and scaled by restitution.
    Reflected,
    /// Approach too slow to bounce; normal component removed.
    Settled,
    /// Ball already moving away from the wall.
    Separating,
}

impl Collider {
    /// Collider from a centre and full width/depth, as levels describe walls.
    pub fn new(x: f32, z: f32, width: f32, depth: f32, height: f32) -> Self {
        Self {
            center_x: x,
            center_z: z,
            half_width: width.abs() / 2.0,
            half_depth: depth.abs() / 2.0,
            height,
        }
    }

    /// Closest point of the rectangle footprint to `p`, on the XZ plane.
    pub fn closest_point(&self, p: Vec3) -> (f32, f32) {
        (
            p.x.clamp(
                self.center_x - self.half_width,
                self.center_x + self.half_width,
            ),
            p.z.clamp(
                self.center_z - self.half_depth,
                self.center_z + self.half_depth,
            ),
        )
    }

    /// Signed overlap of a ball at `p`: positive means the ball penetrates
    /// the wall by that much, zero or negative means it is clear.
    pub fn penetration(&self, p: Vec3, radius: f32) -> f32 {
        let (cx, cz) = self.closest_point(p);
        let dx = p.x - cx;
        let dz = p.z - cz;
        radius - (dx * dx + dz * dz).sqrt()
    }

    /// Contact for a ball centred at `p`, if it overlaps this wall.
    ///
    /// Detection uses the closest point on the rectangle; resolution pushes
    /// along whichever axis of the radius-expanded rectangle needs the
    /// smaller correction.
    pub fn contact(&self, p: Vec3, radius: f32) -> Option<Contact> {
        self.contact_from(p, radius, p)
    }

    /// Like [`Collider::contact`], but pushes the ball back toward the side
    /// `prev` (its position before the step) was on, so a ball driven past
    /// the wall's centre line is never ejected out of the far face.
    pub fn contact_from(&self, p: Vec3, radius: f32, prev: Vec3) -> Option<Contact> {
        if self.penetration(p, radius) <= 0.0 {
            return None;
        }

        let dx = p.x - self.center_x;
        let dz = p.z - self.center_z;
        let sign_x = if prev.x >= self.center_x { 1.0 } else { -1.0 };
        let sign_z = if prev.z >= self.center_z { 1.0 } else { -1.0 };
        let reach_x = self.half_width + radius;
        let reach_z = self.half_depth + radius;
        let depth_x = reach_x - sign_x * dx;
        let depth_z = reach_z - sign_z * dz;

        let contact = if depth_x <= depth_z {
            Contact {
                normal: Vec3::new(sign_x, 0.0, 0.0),
                depth: depth_x,
                resolved: Vec3::new(self.center_x + sign_x * reach_x, p.y, p.z),
            }
        } else {
            Contact {
                normal: Vec3::new(0.0, 0.0, sign_z),
                depth: depth_z,
                resolved: Vec3::new(p.x, p.y, self.center_z + sign_z * reach_z),
            }
        };
        Some(contact)
    }

    /// Outward normal for a ball touching or overlapping the wall at `p`:
    /// radial off a corner, along X or Z off a face.
    fn touch_normal(&self, p: Vec3, radius: f32) -> Vec3 {
        let (cx, cz) = self.closest_point(p);
        match Vec3::new(p.x - cx, 0.0, p.z - cz).try_normalize_xz() {
            Some(n) => n,
            // Centre inside the footprint
            None => self.contact(p, radius).map_or(Vec3::ZERO, |c| c.normal),
        }
    }

    /// Earliest time a ball moving from `from` to `to` touches this wall.
    ///
    /// Tests the segment against the rectangle grown by `radius` with
    /// rounded corners, so passing a corner farther than `radius` away is
    /// not a hit. A ball already touching the wall and moving into it hits
    /// at `t = 0`; one moving along or away from it does not hit.
    pub fn sweep(&self, from: Vec3, to: Vec3, radius: f32) -> Option<Sweep> {
        let delta = (to - from).flatten();

        if self.penetration(from, radius) >= -TOUCH_EPSILON {
            let normal = self.touch_normal(from, radius);
            return (delta.dot(normal) < 0.0).then_some(Sweep { t: 0.0, normal });
        }

        let min_x = self.center_x - self.half_width - radius;
        let max_x = self.center_x + self.half_width + radius;
        let min_z = self.center_z - self.half_depth - radius;
        let max_z = self.center_z + self.half_depth + radius;
        let axes = [
            (from.x, delta.x, min_x, max_x, Vec3::X),
            (from.z, delta.z, min_z, max_z, Vec3::Z),
        ];

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = Vec3::ZERO;
        for (origin, d, lo, hi, axis) in axes {
            if d.abs() < 1e-9 {
                if origin <= lo || origin >= hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            let mut face = -axis;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
                face = axis;
            }
            if t0 > t_enter {
                t_enter = t0;
                normal = face;
            }
            t_exit = t_exit.min(t1);
        }
        if t_enter > t_exit || t_exit < 0.0 || t_enter > 1.0 {
            return None;
        }

        // Entry point of the square-cornered box. Inside a corner square the
        // real boundary is the quarter circle around that corner.
        let t = t_enter.max(0.0);
        let at = from + delta * t;
        let x_lo = self.center_x - self.half_width;
        let x_hi = self.center_x + self.half_width;
        let z_lo = self.center_z - self.half_depth;
        let z_hi = self.center_z + self.half_depth;
        let outside_x = at.x < x_lo || at.x > x_hi;
        let outside_z = at.z < z_lo || at.z > z_hi;
        if !(outside_x && outside_z) {
            return (t_enter >= 0.0 && normal != Vec3::ZERO).then_some(Sweep { t, normal });
        }

        let corner = Vec3::new(
            if at.x < x_lo { x_lo } else { x_hi },
            from.y,
            if at.z < z_lo { z_lo } else { z_hi },
        );
        sweep_circle(from, delta, corner, radius)
    }
}

/// First time in `0..=1` at which a point moving `from + delta * t` comes
/// within `radius` of `center` on the ground plane.
fn sweep_circle(from: Vec3, delta: Vec3, center: Vec3, radius: f32) -> Option<Sweep> {
    let m = (from - center).flatten();
    let a = delta.dot(delta);
    let b = 2.0 * m.dot(delta);
    let c = m.dot(m) - radius * radius;
    if a < 1e-12 {
        return None;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / (2.0 * a);
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let normal = (m + delta * t).try_normalize_xz()?;
    Some(Sweep { t, normal })
}

/// Push the ball out of a contact and respond to the impact.
///
/// The tangential velocity is untouched. The normal component is reflected
/// and scaled by `restitution` unless the approach speed is below
/// `bounce_threshold`, in which case it is zeroed so a ball pressed
/// against a wall stops jittering.
pub fn resolve_contact(
    position: &mut Vec3,
    velocity: &mut Vec3,
    contact: &Contact,
    restitution: f32,
    bounce_threshold: f32,
) -> Bounce {
    *position = contact.resolved;

    let approach = velocity.dot(contact.normal);
    if approach >= 0.0 {
        return Bounce::Separating;
    }
    if -approach < bounce_threshold {
        *velocity = *velocity - contact.normal * approach;
        return Bounce::Settled;
    }
    *velocity = *velocity - contact.normal * ((1.0 + restitution) * approach);
    Bounce::Reflected
}
