use std::collections::BTreeSet;

use framecore_common::{EngineConfig, Fault, SleepConfig, Transform};
use framecore_scene::{BodyKind, Entity, PhysicsSnapshotPair, RigidBodyState, SceneStore};
use glam::{Mat3, Quat, Vec3};

use crate::broadphase::SpatialHash;
use crate::narrowphase::{Contact, WorldShape, collide};
use crate::solver::{SolverBody, solve};

/// Tuning parameters for the integrator, taken from [`EngineConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsSettings {
    /// Fixed step `h`, in seconds.
    pub step: f32,
    pub gravity: Vec3,
    pub sleep: SleepConfig,
    pub solver_iterations: u32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub cell_size: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl PhysicsSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            step: config.step_f32(),
            gravity: config.gravity,
            sleep: config.sleep,
            solver_iterations: config.solver_iterations,
            linear_damping: config.linear_damping,
            angular_damping: config.angular_damping,
            cell_size: config.broadphase_cell_size,
        }
    }
}

/// What one sub-step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Dynamic bodies integrated this sub-step.
    pub integrated: usize,
    /// Bodies asleep at the end of the sub-step.
    pub sleeping: usize,
    /// Bodies disabled this sub-step after degenerate state.
    pub disabled: usize,
    pub contacts: usize,
    /// Sleeping bodies woken by contact.
    pub woken: usize,
}

/// Working copy of one physics-driven entity for the duration of a sub-step.
#[derive(Debug, Clone, Copy)]
struct WorkBody {
    entity: Entity,
    transform: Transform,
    body: RigidBodyState,
    /// Transform at the start of the sub-step.
    previous: Transform,
    /// Last transform physics wrote, if finite.
    last_good: Option<Transform>,
    moved: bool,
}

/// Fixed-step rigid-body integrator.
///
/// Each call to [`PhysicsIntegrator::step`] advances every physics-driven
/// entity by exactly one step `h`. Bodies are visited in slot order and
/// contact pairs in sorted order, so identical inputs give bit-identical
/// results.
#[derive(Debug)]
pub struct PhysicsIntegrator {
    settings: PhysicsSettings,
    grid: SpatialHash,
    work: Vec<WorkBody>,
    contacts: Vec<Contact>,
    /// Entity pairs in contact at the end of the last sub-step.
    touching: BTreeSet<(Entity, Entity)>,
    steps: u64,
    last_report: StepReport,
}

impl PhysicsIntegrator {
    pub fn new(settings: PhysicsSettings) -> Self {
        let grid = SpatialHash::new(settings.cell_size);
        Self {
            settings,
            grid,
            work: Vec::new(),
            contacts: Vec::new(),
            touching: BTreeSet::new(),
            steps: 0,
            last_report: StepReport::default(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(PhysicsSettings::from_config(config))
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.settings.gravity = gravity;
    }

    /// Sub-steps taken since construction.
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn last_report(&self) -> StepReport {
        self.last_report
    }

    /// Contacts found by the last sub-step.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Advance the scene by one fixed step.
    pub fn step(&mut self, scene: &mut SceneStore) -> StepReport {
        let _span = tracing::info_span!("physics_substep", step = self.steps).entered();
        let mut report = StepReport::default();

        self.gather(scene);
        let h = self.settings.step;
        for w in &mut self.work {
            if !guard(w) {
                report.disabled += 1;
                continue;
            }
            if integrate(w, &self.settings, h) {
                report.integrated += 1;
            }
        }

        self.detect(&mut report);
        self.resolve();

        let sleep = self.settings.sleep;
        for w in &mut self.work {
            if w.body.is_disabled() {
                continue;
            }
            if !guard(w) {
                report.disabled += 1;
                continue;
            }
            update_sleep(&mut w.body, &sleep);
            if w.body.is_sleeping() {
                report.sleeping += 1;
            }
        }

        self.scatter(scene);
        self.steps += 1;
        self.last_report = report;
        tracing::trace!(
            integrated = report.integrated,
            sleeping = report.sleeping,
            contacts = report.contacts,
            "sub-step complete"
        );
        report
    }

    fn gather(&mut self, scene: &SceneStore) {
        self.work.clear();
        for (entity, body) in scene.iter::<RigidBodyState>() {
            let Some(transform) = scene.get::<Transform>(entity).copied() else {
                continue;
            };
            let last_good = scene
                .snapshot(entity)
                .map(|pair| pair.current)
                .filter(|t| t.is_finite());
            self.work.push(WorkBody {
                entity,
                transform,
                body: *body,
                previous: transform,
                last_good,
                moved: false,
            });
        }
    }

    /// Broad phase, then narrow phase on candidate pairs. A sleeping body is
    /// woken by a new contact with an awake body, or by any contact with a
    /// body moving faster than the sleep threshold.
    fn detect(&mut self, report: &mut StepReport) {
        self.grid.clear();
        self.contacts.clear();
        for (i, w) in self.work.iter().enumerate() {
            if !w.body.is_disabled() {
                self.grid.insert(i, w.body.shape.world_aabb(&w.transform));
            }
        }
        let threshold = self.settings.sleep.linear_threshold;
        let mut touching = BTreeSet::new();
        for (i, j) in self.grid.pairs() {
            let (a, b) = (&self.work[i], &self.work[j]);
            if !(participates(a, threshold) || participates(b, threshold)) {
                continue;
            }
            let shape_a = WorldShape::new(&a.body.shape, &a.transform);
            let shape_b = WorldShape::new(&b.body.shape, &b.transform);
            let Some(hit) = collide(&shape_a, &shape_b) else {
                continue;
            };
            let key = (a.entity, b.entity);
            let fresh = !self.touching.contains(&key);
            touching.insert(key);
            let wake = [(j, wakes(a, fresh, threshold)), (i, wakes(b, fresh, threshold))];
            for (target, woken_by) in wake {
                let body = &mut self.work[target].body;
                if woken_by && body.is_sleeping() {
                    body.wake();
                    report.woken += 1;
                    tracing::debug!(entity = %self.work[target].entity, "body woken by contact");
                }
            }
            self.contacts.push(Contact {
                a: i,
                b: j,
                normal: hit.normal,
                depth: hit.depth,
                point: hit.point,
            });
        }
        self.touching = touching;
        report.contacts = self.contacts.len();
    }

    fn resolve(&mut self) {
        if self.contacts.is_empty() {
            return;
        }
        let mut bodies: Vec<SolverBody> = self
            .work
            .iter()
            .map(|w| {
                let responds = w.body.is_dynamic() && w.body.is_active();
                let pushes = responds || w.body.kind == BodyKind::Kinematic;
                SolverBody {
                    position: w.transform.position,
                    velocity: if pushes { w.body.linear_velocity } else { Vec3::ZERO },
                    angular_velocity: if pushes { w.body.angular_velocity } else { Vec3::ZERO },
                    inverse_mass: if responds { w.body.mass.inverse_mass } else { 0.0 },
                    inverse_inertia: if responds {
                        world_inverse_inertia(w.body.mass.inverse_inertia, w.transform.rotation)
                    } else {
                        Mat3::ZERO
                    },
                    material: w.body.material,
                    correction: Vec3::ZERO,
                }
            })
            .collect();
        solve(&mut bodies, &self.contacts, self.settings.solver_iterations);
        for (w, s) in self.work.iter_mut().zip(&bodies) {
            if s.inverse_mass > 0.0 {
                w.body.linear_velocity = s.velocity;
                w.body.angular_velocity = s.angular_velocity;
                if s.correction != Vec3::ZERO {
                    w.transform.position += s.correction;
                    w.moved = true;
                }
            }
        }
    }

    fn scatter(&mut self, scene: &mut SceneStore) {
        for w in &self.work {
            if w.moved {
                if let Some(t) = scene.get_mut::<Transform>(w.entity) {
                    *t = w.transform;
                }
            }
            if let Some(b) = scene.get_mut::<RigidBodyState>(w.entity) {
                *b = w.body;
            }
            scene.set_snapshot(
                w.entity,
                PhysicsSnapshotPair {
                    previous: w.previous,
                    current: w.transform,
                },
            );
        }
    }
}

fn is_awake_dynamic(w: &WorkBody) -> bool {
    w.body.is_dynamic() && w.body.is_active()
}

/// Pairs where neither side qualifies are left alone, so resting and
/// sleeping bodies stay untouched.
fn participates(w: &WorkBody, threshold: f32) -> bool {
    is_awake_dynamic(w) || is_mover(w, threshold)
}

/// A body whose motion can wake a sleeper it touches.
fn is_mover(w: &WorkBody, threshold: f32) -> bool {
    let moving_kind = is_awake_dynamic(w) || w.body.kind == BodyKind::Kinematic;
    moving_kind && w.body.linear_velocity.length() > threshold
}

/// Whether `w` wakes a sleeper it touches. Resting neighbours only wake it
/// on first contact, so a settled stack can still fall asleep.
fn wakes(w: &WorkBody, fresh: bool, threshold: f32) -> bool {
    if is_mover(w, threshold) {
        return true;
    }
    let kinematic_moving = w.body.kind == BodyKind::Kinematic && w.body.linear_velocity != Vec3::ZERO;
    fresh && (is_awake_dynamic(w) || kinematic_moving)
}

/// Reject non-finite state. A failing body is put back at its last finite
/// transform and disabled. Returns false when that happened.
fn guard(w: &mut WorkBody) -> bool {
    if w.body.is_disabled() {
        return true;
    }
    if w.transform.is_finite() && w.body.has_finite_state() {
        return true;
    }
    let restored = w
        .last_good
        .or(Some(w.previous).filter(|t| t.is_finite()))
        .unwrap_or_default();
    tracing::warn!(entity = %w.entity, fault = %Fault::DegenerateState, "rigid body disabled");
    w.transform = restored;
    w.previous = restored;
    w.body.disable();
    w.body.force = Vec3::ZERO;
    w.moved = true;
    false
}

/// Forces, then velocity, then position and orientation. Returns whether
/// the body was integrated.
fn integrate(w: &mut WorkBody, settings: &PhysicsSettings, h: f32) -> bool {
    let body = &mut w.body;
    if !(body.is_dynamic() && body.is_active()) {
        // Kinematic and static bodies ignore queued input.
        if !body.is_dynamic() {
            body.force = Vec3::ZERO;
            body.impulse = Vec3::ZERO;
        }
        return false;
    }

    let inv_mass = body.mass.inverse_mass;
    body.linear_velocity += body.impulse * inv_mass;
    let accel = settings.gravity + body.force * inv_mass;
    let v0 = body.linear_velocity;
    let v1 = v0 + accel * h;
    // Trapezoidal position update: exact under constant acceleration.
    w.transform.position += (v0 + v1) * (0.5 * h);
    body.linear_velocity = v1 * damping_factor(settings.linear_damping, h);

    let omega = body.angular_velocity;
    if omega != Vec3::ZERO {
        let spin = Quat::from_scaled_axis(omega * h);
        w.transform.rotation = (spin * w.transform.rotation).normalize();
        body.angular_velocity = omega * damping_factor(settings.angular_damping, h);
    }

    body.force = Vec3::ZERO;
    body.impulse = Vec3::ZERO;
    w.moved = true;
    true
}

/// Body-frame diagonal inverse inertia rotated into world space.
fn world_inverse_inertia(diagonal: Vec3, rotation: Quat) -> Mat3 {
    let r = Mat3::from_quat(rotation);
    r * Mat3::from_diagonal(diagonal) * r.transpose()
}

fn damping_factor(damping: f32, h: f32) -> f32 {
    if damping <= 0.0 {
        1.0
    } else {
        1.0 / (1.0 + h * damping)
    }
}

fn update_sleep(body: &mut RigidBodyState, sleep: &SleepConfig) {
    if !(body.is_dynamic() && body.is_active()) || sleep.steps == 0 {
        return;
    }
    let resting = body.linear_velocity.length() < sleep.linear_threshold
        && body.angular_velocity.length() < sleep.angular_threshold;
    if !resting {
        body.rest_steps = 0;
        return;
    }
    body.rest_steps = body.rest_steps.saturating_add(1);
    if body.rest_steps >= sleep.steps {
        body.sleep();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecore_scene::{Activation, CollisionShape, PhysicsMaterial};

    const H: f32 = 1.0 / 60.0;

    fn settings(gravity: Vec3) -> PhysicsSettings {
        PhysicsSettings {
            step: H,
            gravity,
            ..PhysicsSettings::default()
        }
    }

    fn ball(scene: &mut SceneStore, at: Vec3) -> Entity {
        let e = scene.spawn(Transform::from_position(at)).unwrap();
        scene
            .attach(e, RigidBodyState::dynamic(CollisionShape::Sphere { radius: 0.5 }, 1.0))
            .unwrap();
        e
    }

    fn ground(scene: &mut SceneStore) -> Entity {
        let e = scene.spawn(Transform::from_position(Vec3::new(0.0, -0.5, 0.0))).unwrap();
        scene
            .attach(
                e,
                RigidBodyState::fixed(CollisionShape::Box {
                    half_extents: Vec3::new(20.0, 0.5, 20.0),
                }),
            )
            .unwrap();
        e
    }

    fn position(scene: &SceneStore, e: Entity) -> Vec3 {
        scene.get::<Transform>(e).unwrap().position
    }

    #[test]
    fn free_fall_matches_analytic_height() {
        let mut scene = SceneStore::new();
        let e = ball(&mut scene, Vec3::new(0.0, 10.0, 0.0));
        let mut physics = PhysicsIntegrator::new(settings(Vec3::new(0.0, -9.8, 0.0)));
        for _ in 0..120 {
            physics.step(&mut scene);
        }
        let expected = 10.0 - 0.5 * 9.8 * 2.0 * 2.0;
        assert!((position(&scene, e).y - expected).abs() < 1e-2);
        assert_eq!(physics.step_count(), 120);
    }

    #[test]
    fn snapshot_pair_tracks_previous_and_current() {
        let mut scene = SceneStore::new();
        let e = ball(&mut scene, Vec3::new(0.0, 10.0, 0.0));
        let mut physics = PhysicsIntegrator::new(settings(Vec3::new(0.0, -10.0, 0.0)));
        physics.step(&mut scene);
        let after_one = position(&scene, e);
        physics.step(&mut scene);
        let pair = scene.snapshot(e).unwrap();
        assert_eq!(pair.previous.position, after_one);
        assert_eq!(pair.current.position, position(&scene, e));
    }

    #[test]
    fn ball_comes_to_rest_on_ground_and_sleeps() {
        let mut scene = SceneStore::new();
        ground(&mut scene);
        let e = ball(&mut scene, Vec3::new(0.0, 2.0, 0.0));
        let mut physics = PhysicsIntegrator::new(settings(Vec3::new(0.0, -10.0, 0.0)));
        for _ in 0..600 {
            physics.step(&mut scene);
        }
        let y = position(&scene, e).y;
        assert!((y - 0.5).abs() < 0.05, "resting height {y}");
        assert!(scene.get::<RigidBodyState>(e).unwrap().is_sleeping());
    }

    #[test]
    fn sleeping_body_is_bit_identical_until_woken() {
        let mut scene = SceneStore::new();
        ground(&mut scene);
        let e = ball(&mut scene, Vec3::new(0.0, 0.5, 0.0));
        scene.get_mut::<RigidBodyState>(e).unwrap().sleep();
        let mut physics = PhysicsIntegrator::new(settings(Vec3::new(0.0, -10.0, 0.0)));

        let before = *scene.get::<Transform>(e).unwrap();
        let body_before = *scene.get::<RigidBodyState>(e).unwrap();
        for _ in 0..50 {
            let report = physics.step(&mut scene);
            assert_eq!(report.sleeping, 1);
        }
        let after = *scene.get::<Transform>(e).unwrap();
        assert_eq!(after.position.to_array().map(f32::to_bits), before.position.to_array().map(f32::to_bits));
        assert_eq!(after.rotation.to_array().map(f32::to_bits), before.rotation.to_array().map(f32::to_bits));
        assert_eq!(*scene.get::<RigidBodyState>(e).unwrap(), body_before);

        scene
            .get_mut::<RigidBodyState>(e)
            .unwrap()
            .apply_impulse(Vec3::new(0.0, 5.0, 0.0));
        physics.step(&mut scene);
        assert!(position(&scene, e).y > before.position.y);
    }

    #[test]
    fn moving_body_wakes_sleeper() {
        let mut scene = SceneStore::new();
        let sleeper = ball(&mut scene, Vec3::ZERO);
        scene.get_mut::<RigidBodyState>(sleeper).unwrap().sleep();
        let bullet = scene.spawn(Transform::from_position(Vec3::new(-1.2, 0.0, 0.0))).unwrap();
        scene
            .attach(
                bullet,
                RigidBodyState::dynamic(CollisionShape::Sphere { radius: 0.5 }, 1.0)
                    .with_velocity(Vec3::new(10.0, 0.0, 0.0)),
            )
            .unwrap();
        let mut physics = PhysicsIntegrator::new(settings(Vec3::ZERO));
        let mut woken = 0;
        for _ in 0..5 {
            woken += physics.step(&mut scene).woken;
        }
        assert_eq!(woken, 1);
        let body = scene.get::<RigidBodyState>(sleeper).unwrap();
        assert_eq!(body.activation, Activation::Active);
        assert!(body.linear_velocity.x > 0.0);
    }

    #[test]
    fn slow_body_wakes_sleeper_on_first_contact() {
        let mut scene = SceneStore::new();
        let sleeper = ball(&mut scene, Vec3::ZERO);
        scene.get_mut::<RigidBodyState>(sleeper).unwrap().sleep();
        let pusher = scene.spawn(Transform::from_position(Vec3::new(-1.05, 0.0, 0.0))).unwrap();
        scene
            .attach(
                pusher,
                RigidBodyState::dynamic(CollisionShape::Sphere { radius: 0.5 }, 1.0)
                    .with_velocity(Vec3::new(0.5, 0.0, 0.0)),
            )
            .unwrap();
        let mut physics = PhysicsIntegrator::new(settings(Vec3::ZERO));
        assert!(0.5 < physics.settings().sleep.linear_threshold);
        let mut woken = 0;
        for _ in 0..30 {
            woken += physics.step(&mut scene).woken;
        }
        assert_eq!(woken, 1);
        let body = scene.get::<RigidBodyState>(sleeper).unwrap();
        assert!(body.is_active());
        assert!(position(&scene, sleeper).x > 0.0);
        let pusher_body = scene.get::<RigidBodyState>(pusher).unwrap();
        assert!(pusher_body.linear_velocity.x > 0.0);
    }

    #[test]
    fn nan_velocity_disables_body_and_keeps_last_transform() {
        let mut scene = SceneStore::new();
        let e = ball(&mut scene, Vec3::new(0.0, 5.0, 0.0));
        let mut physics = PhysicsIntegrator::new(settings(Vec3::new(0.0, -10.0, 0.0)));
        physics.step(&mut scene);
        let good = *scene.get::<Transform>(e).unwrap();

        scene.get_mut::<RigidBodyState>(e).unwrap().linear_velocity = Vec3::new(f32::NAN, 0.0, 0.0);
        let report = physics.step(&mut scene);
        assert_eq!(report.disabled, 1);
        let body = scene.get::<RigidBodyState>(e).unwrap();
        assert!(body.is_disabled());
        assert!(body.has_finite_state());
        assert_eq!(*scene.get::<Transform>(e).unwrap(), good);

        // Disabled bodies stay put.
        physics.step(&mut scene);
        assert_eq!(*scene.get::<Transform>(e).unwrap(), good);
    }

    #[test]
    fn nan_position_written_externally_is_rolled_back() {
        let mut scene = SceneStore::new();
        let e = ball(&mut scene, Vec3::new(0.0, 5.0, 0.0));
        let mut physics = PhysicsIntegrator::new(settings(Vec3::ZERO));
        physics.step(&mut scene);
        scene.get_mut::<Transform>(e).unwrap().position.y = f32::INFINITY;
        physics.step(&mut scene);
        let t = scene.get::<Transform>(e).unwrap();
        assert!(t.is_finite());
        assert_eq!(t.position.y, 5.0);
    }

    #[test]
    fn static_and_kinematic_bodies_do_not_integrate() {
        let mut scene = SceneStore::new();
        let floor = ground(&mut scene);
        let mover = scene.spawn(Transform::from_position(Vec3::new(5.0, 3.0, 0.0))).unwrap();
        scene
            .attach(
                mover,
                RigidBodyState::kinematic(CollisionShape::Sphere { radius: 0.5 })
                    .with_velocity(Vec3::X),
            )
            .unwrap();
        let mut physics = PhysicsIntegrator::new(settings(Vec3::new(0.0, -10.0, 0.0)));
        for _ in 0..30 {
            let report = physics.step(&mut scene);
            assert_eq!(report.integrated, 0);
        }
        assert_eq!(position(&scene, floor), Vec3::new(0.0, -0.5, 0.0));
        assert_eq!(position(&scene, mover), Vec3::new(5.0, 3.0, 0.0));
    }

    #[test]
    fn bouncy_ball_rebounds() {
        let mut scene = SceneStore::new();
        let floor = ground(&mut scene);
        let bouncy = PhysicsMaterial {
            restitution: 0.9,
            friction: 0.5,
        };
        scene.get_mut::<RigidBodyState>(floor).unwrap().material = bouncy;
        let e = ball(&mut scene, Vec3::new(0.0, 3.0, 0.0));
        scene.get_mut::<RigidBodyState>(e).unwrap().material = bouncy;
        let mut physics = PhysicsIntegrator::new(settings(Vec3::new(0.0, -10.0, 0.0)));
        let mut went_up = false;
        for _ in 0..120 {
            physics.step(&mut scene);
            if scene.get::<RigidBodyState>(e).unwrap().linear_velocity.y > 1.0 {
                went_up = true;
            }
        }
        assert!(went_up);
    }

    #[test]
    fn glancing_hit_sets_struck_ball_spinning() {
        let mut scene = SceneStore::new();
        let target = ball(&mut scene, Vec3::ZERO);
        let striker = scene.spawn(Transform::from_position(Vec3::new(-1.5, 0.6, 0.0))).unwrap();
        scene
            .attach(
                striker,
                RigidBodyState::dynamic(CollisionShape::Sphere { radius: 0.5 }, 1.0)
                    .with_velocity(Vec3::new(6.0, 0.0, 0.0)),
            )
            .unwrap();
        let mut physics = PhysicsIntegrator::new(settings(Vec3::ZERO));
        for _ in 0..20 {
            physics.step(&mut scene);
        }
        let struck = scene.get::<RigidBodyState>(target).unwrap();
        assert!(struck.linear_velocity.x > 0.0);
        assert!(struck.angular_velocity.length() > 0.0);
    }

    #[test]
    fn identical_runs_are_bit_identical() {
        fn run() -> Vec<[u32; 3]> {
            let mut scene = SceneStore::new();
            ground(&mut scene);
            let balls: Vec<Entity> = (0..6)
                .map(|i| ball(&mut scene, Vec3::new(i as f32 * 0.3, 1.0 + i as f32 * 1.1, 0.0)))
                .collect();
            let mut physics = PhysicsIntegrator::new(settings(Vec3::new(0.0, -10.0, 0.0)));
            for _ in 0..240 {
                physics.step(&mut scene);
            }
            balls
                .iter()
                .map(|e| position(&scene, *e).to_array().map(f32::to_bits))
                .collect()
        }
        assert_eq!(run(), run());
    }

    #[test]
    fn spin_keeps_rotation_normalized() {
        let mut scene = SceneStore::new();
        let e = ball(&mut scene, Vec3::ZERO);
        scene.get_mut::<RigidBodyState>(e).unwrap().angular_velocity = Vec3::new(3.0, 7.0, -2.0);
        let mut physics = PhysicsIntegrator::new(settings(Vec3::ZERO));
        for _ in 0..500 {
            physics.step(&mut scene);
        }
        let r = scene.get::<Transform>(e).unwrap().rotation;
        assert!((r.length() - 1.0).abs() < 1e-5);
    }
}
