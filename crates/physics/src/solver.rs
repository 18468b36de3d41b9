//! Sequential-impulse contact resolution (normal + Coulomb friction) with
//! Baumgarte position correction. Impulses act at the contact point, so
//! off-centre hits spin bodies through their inverse inertia.

use framecore_scene::PhysicsMaterial;
use glam::{Mat3, Vec3};

use crate::narrowphase::Contact;

/// Penetration tolerated without correction.
pub const SLOP: f32 = 0.01;
/// Fraction of the remaining penetration removed per sub-step.
pub const BETA: f32 = 0.2;
/// Approach speed below which contacts do not bounce.
pub const BOUNCE_THRESHOLD: f32 = 1.0;

/// Per-body view the solver works on.
#[derive(Debug, Clone, Copy)]
pub struct SolverBody {
    /// Centre of mass, world space.
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Zero for static, kinematic, and sleeping bodies.
    pub inverse_mass: f32,
    /// World-space inverse inertia tensor. Zero wherever `inverse_mass` is.
    pub inverse_inertia: Mat3,
    pub material: PhysicsMaterial,
    /// Positional correction accumulated for this sub-step.
    pub correction: Vec3,
}

/// Combined restitution and friction for a contact (product rule).
pub fn combine(a: &PhysicsMaterial, b: &PhysicsMaterial) -> PhysicsMaterial {
    PhysicsMaterial {
        restitution: (a.restitution * b.restitution).clamp(0.0, 1.0),
        friction: (a.friction * b.friction).clamp(0.0, 10.0),
    }
}

/// Resolve `contacts` in order for `iterations` passes, then apply one
/// position correction per contact.
pub fn solve(bodies: &mut [SolverBody], contacts: &[Contact], iterations: u32) {
    for _ in 0..iterations {
        for c in contacts {
            solve_velocity(bodies, c);
        }
    }
    for c in contacts {
        let (inv_a, inv_b) = (bodies[c.a].inverse_mass, bodies[c.b].inverse_mass);
        let denom = inv_a + inv_b;
        if denom <= 0.0 {
            continue;
        }
        let corr = (c.depth - SLOP).max(0.0) * BETA;
        if corr > 0.0 {
            let push = c.normal * (corr / denom);
            bodies[c.a].correction -= push * inv_a;
            bodies[c.b].correction += push * inv_b;
        }
    }
}

impl SolverBody {
    fn velocity_at(&self, r: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(r)
    }

    /// Inverse effective mass along `dir` for an impulse applied at `r`.
    fn resistance(&self, r: Vec3, dir: Vec3) -> f32 {
        self.inverse_mass + (self.inverse_inertia * r.cross(dir)).cross(r).dot(dir)
    }

    fn apply(&mut self, impulse: Vec3, r: Vec3) {
        self.velocity += impulse * self.inverse_mass;
        self.angular_velocity += self.inverse_inertia * r.cross(impulse);
    }
}

fn solve_velocity(bodies: &mut [SolverBody], c: &Contact) {
    let (a, b) = (bodies[c.a], bodies[c.b]);
    if a.inverse_mass + b.inverse_mass <= 0.0 {
        return;
    }
    let pair = combine(&a.material, &b.material);
    let n = c.normal;
    let (ra, rb) = (c.point - a.position, c.point - b.position);
    let rel = b.velocity_at(rb) - a.velocity_at(ra);
    let rel_n = rel.dot(n);
    if rel_n >= 0.0 {
        return;
    }

    let restitution = if -rel_n > BOUNCE_THRESHOLD {
        pair.restitution
    } else {
        0.0
    };
    let jn = -(1.0 + restitution) * rel_n / (a.resistance(ra, n) + b.resistance(rb, n));
    let impulse_n = n * jn;
    bodies[c.a].apply(-impulse_n, ra);
    bodies[c.b].apply(impulse_n, rb);

    // Friction against the post-normal tangential velocity, clamped to the cone.
    let (a, b) = (bodies[c.a], bodies[c.b]);
    let rel = b.velocity_at(rb) - a.velocity_at(ra);
    let tangential = rel - n * rel.dot(n);
    let speed = tangential.length();
    if speed <= 1.0e-9 {
        return;
    }
    let t = tangential / speed;
    let jt = (speed / (a.resistance(ra, t) + b.resistance(rb, t))).min(pair.friction * jn);
    let impulse_t = t * jt;
    bodies[c.a].apply(impulse_t, ra);
    bodies[c.b].apply(-impulse_t, rb);
}
