use serde::{Deserialize, Serialize};

use minigolf_core::{SimEvent, SimListener, Vec3};

use crate::collision::{Bounce, Collider, Contact, resolve_contact};
use crate::config::PhysicsConfig;
use crate::level::Level;

/// The cup: a point on the ground plane plus capture radius.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HoleTarget {
    pub position: Vec3,
    pub radius: f32,
}

impl HoleTarget {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self { position, radius }
    }

    /// Whether a ball centred at `p` is over the cup.
    pub fn contains(&self, p: Vec3) -> bool {
        p.distance_xz(self.position) < self.radius
    }
}

/// Where the ball is in the shot cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimState {
    /// At rest, waiting for a shot.
    #[default]
    Idle,
    /// Moving under physics.
    Rolling,
    /// Captured by the hole. Frozen until reset or a new level.
    Sunk,
}

/// Kinematic state of the ball.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Ball {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Serializable view of the simulation for replays and tooling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BallSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
    pub state: SimState,
    pub strokes: u32,
}

/// Ball motion, wall collision and hole capture for a single hole.
///
/// One instance is owned by the application and driven by one loop:
/// `apply_shot` from input handling, `update` once per frame. Every command
/// takes `&mut self`, so collider and hole replacement can never interleave
/// with a tick. Events go to the listener `L` synchronously.
#[derive(Debug)]
pub struct BallSimulation<L = ()> {
    config: PhysicsConfig,
    ball: Ball,
    state: SimState,
    colliders: Vec<Collider>,
    hole: HoleTarget,
    start: Vec3,
    strokes: u32,
    listener: L,
}

impl<L: SimListener> BallSimulation<L> {
    pub fn new(
        config: PhysicsConfig,
        colliders: Vec<Collider>,
        hole: HoleTarget,
        listener: L,
    ) -> Self {
        let start = Vec3::new(0.0, config.rest_height(), 0.0);
        Self {
            config,
            ball: Ball {
                position: start,
                velocity: Vec3::ZERO,
            },
            state: SimState::Idle,
            colliders,
            hole,
            start,
            strokes: 0,
            listener,
        }
    }

    /// Simulation set up for `level`, ball on the tee.
    pub fn for_level(config: PhysicsConfig, level: &Level, listener: L) -> Self {
        let mut sim = Self::new(config, Vec::new(), level.hole_target(), listener);
        sim.load_level(level);
        sim
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SimState::Idle
    }

    pub fn is_sunk(&self) -> bool {
        self.state == SimState::Sunk
    }

    pub fn position(&self) -> Vec3 {
        self.ball.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.ball.velocity
    }

    /// Planar speed of the ball.
    pub fn speed(&self) -> f32 {
        self.ball.velocity.length_xz()
    }

    pub fn radius(&self) -> f32 {
        self.config.ball_radius
    }

    /// Strokes taken on the current attempt.
    pub fn strokes(&self) -> u32 {
        self.strokes
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn hole(&self) -> &HoleTarget {
        &self.hole
    }

    /// Tee position used by `reset_to_start`.
    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    pub fn snapshot(&self) -> BallSnapshot {
        BallSnapshot {
            position: self.ball.position,
            velocity: self.ball.velocity,
            state: self.state,
            strokes: self.strokes,
        }
    }

    /// Swap tuning between shots. The ball and tee are re-seated on the
    /// new ground plane; an in-flight roll keeps its velocity.
    pub fn set_config(&mut self, config: PhysicsConfig) {
        self.config = config;
        self.ball.position = self.pin_to_ground(self.ball.position);
        self.start = self.pin_to_ground(self.start);
    }

    /// Replace every collider at once.
    pub fn set_colliders(&mut self, colliders: Vec<Collider>) {
        tracing::debug!(count = colliders.len(), "colliders replaced");
        self.colliders = colliders;
    }

    pub fn set_hole(&mut self, hole: HoleTarget) {
        self.hole = hole;
    }

    /// Set the tee used by `reset_to_start`. Does not move the ball.
    pub fn set_start(&mut self, position: Vec3) {
        self.start = self.pin_to_ground(position);
    }

    /// Swap in a level's geometry, place the ball on its tee and clear strokes.
    pub fn load_level(&mut self, level: &Level) {
        self.colliders = level.colliders();
        self.hole = level.hole_target();
        self.set_start(level.start_position());
        self.reset_to_start();
        tracing::info!(
            level = level.id,
            name = %level.name,
            walls = self.colliders.len(),
            "level loaded"
        );
    }

    /// Put the ball at `position` at rest, ready for a shot.
    pub fn teleport(&mut self, position: Vec3) {
        if !position.is_finite() {
            tracing::warn!(?position, "teleport to non-finite position ignored");
            return;
        }
        self.ball.position = self.pin_to_ground(position);
        self.ball.velocity = Vec3::ZERO;
        self.state = SimState::Idle;
    }

    /// Back to the tee with a fresh stroke count.
    pub fn reset_to_start(&mut self) {
        self.teleport(self.start);
        self.strokes = 0;
    }

    /// Strike the ball along `direction` with `power`.
    ///
    /// Ignored unless the ball is idle, so a roll can never be double
    /// counted. `direction` is projected onto the ground plane and
    /// normalised; degenerate directions and non-finite power are dropped.
    /// Power is clamped to `0..=max_shot_speed`.
    pub fn apply_shot(&mut self, direction: Vec3, power: f32) {
        if self.state != SimState::Idle {
            tracing::debug!(state = ?self.state, "shot ignored while ball is not idle");
            return;
        }
        let Some(dir) = direction.try_normalize_xz() else {
            tracing::warn!(?direction, "shot with degenerate direction ignored");
            return;
        };
        if !power.is_finite() {
            tracing::warn!(power, "shot with non-finite power ignored");
            return;
        }

        let speed = power.clamp(0.0, self.config.max_shot_speed);
        self.ball.velocity = dir * speed;
        self.state = SimState::Rolling;
        self.strokes += 1;
        tracing::debug!(strokes = self.strokes, speed, "shot taken");
        self.emit(SimEvent::StrokeTaken {
            count: self.strokes,
        });
    }

    /// Advance the roll by `dt` seconds. No-op unless rolling.
    ///
    /// Steps larger than `max_step` are clamped; non-finite or
    /// non-positive steps are ignored.
    pub fn update(&mut self, dt: f32) {
        if self.state != SimState::Rolling || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let dt = dt.min(self.config.max_step);

        let decay = (-self.config.friction * dt).exp();
        self.ball.velocity = (self.ball.velocity * decay).flatten();

        let prev = self.integrate(dt);
        self.resolve_overlaps(prev);

        let speed = self.speed();
        if self.hole.contains(self.ball.position) && speed < self.config.capture_speed {
            self.sink();
            return;
        }

        if speed < self.config.min_speed {
            self.ball.velocity = Vec3::ZERO;
            self.state = SimState::Idle;
            tracing::debug!(position = ?self.ball.position, "ball came to rest");
        }
    }

    /// Move along the velocity, stopping at the first wall the ball would
    /// touch within this step. Returns the position the step started from.
    fn integrate(&mut self, dt: f32) -> Vec3 {
        let radius = self.config.ball_radius;
        let from = self.ball.position;
        let to = self.pin_to_ground(from + self.ball.velocity * dt);

        let first_hit = self
            .colliders
            .iter()
            .filter_map(|c| c.sweep(from, to, radius))
            .min_by(|a, b| a.t.total_cmp(&b.t));

        match first_hit {
            Some(hit) => {
                let at = self.pin_to_ground(from + (to - from) * hit.t);
                let contact = Contact {
                    normal: hit.normal,
                    depth: 0.0,
                    resolved: at,
                };
                self.bounce(&contact);
            },
            None => self.ball.position = to,
        }
        from
    }

    /// Push the ball out of every wall it overlaps, bouncing as it goes.
    /// Each push heads back toward the side `prev` was on.
    fn resolve_overlaps(&mut self, prev: Vec3) {
        let radius = self.config.ball_radius;
        let restitution = self.config.restitution;
        let threshold = self.config.bounce_threshold;
        for _ in 0..self.config.resolve_iterations {
            let mut touched = false;
            for collider in &self.colliders {
                if let Some(contact) = collider.contact_from(self.ball.position, radius, prev) {
                    touched = true;
                    resolve_contact(
                        &mut self.ball.position,
                        &mut self.ball.velocity,
                        &contact,
                        restitution,
                        threshold,
                    );
                }
            }
            if !touched {
                break;
            }
        }
    }

    fn bounce(&mut self, contact: &Contact) {
        let outcome = resolve_contact(
            &mut self.ball.position,
            &mut self.ball.velocity,
            contact,
            self.config.restitution,
            self.config.bounce_threshold,
        );
        if outcome == Bounce::Settled {
            tracing::trace!(normal = ?contact.normal, "settled against wall");
        }
    }

    fn sink(&mut self) {
        self.ball.velocity = Vec3::ZERO;
        self.state = SimState::Sunk;
        tracing::info!(strokes = self.strokes, "hole sunk");
        self.emit(SimEvent::SinkEffectTriggered);
        self.emit(SimEvent::HoleSunk {
            strokes: self.strokes,
        });
    }

    fn pin_to_ground(&self, p: Vec3) -> Vec3 {
        Vec3::new(p.x, self.config.rest_height(), p.z)
    }

    fn emit(&mut self, event: SimEvent) {
        self.listener.on_event(&event);
    }
}

#[cfg(test)]
mod tests {
    use minigolf_core::EventLog;
    use minigolf_core::test_helpers::{assert_close, assert_vec_close, sink_events};

    use super::*;
    use crate::level::all_levels;

    const R: f32 = 0.12;

    /// Frictionless, single-step-per-update config for exact kinematics.
    fn exact_config() -> PhysicsConfig {
        PhysicsConfig {
            friction: 0.0,
            max_step: 1.0,
            ..PhysicsConfig::default()
        }
    }

    fn far_hole() -> HoleTarget {
        HoleTarget::new(Vec3::new(-100.0, 0.0, -100.0), 0.25)
    }

    fn sim_with(
        config: PhysicsConfig,
        colliders: Vec<Collider>,
        hole: HoleTarget,
    ) -> BallSimulation<EventLog> {
        BallSimulation::new(config, colliders, hole, EventLog::new())
    }

    #[test]
    fn new_sim_is_idle_at_origin() {
        let sim = sim_with(PhysicsConfig::default(), Vec::new(), far_hole());
        assert_eq!(sim.state(), SimState::Idle);
        assert_eq!(sim.position(), Vec3::new(0.0, R, 0.0));
        assert_eq!(sim.velocity(), Vec3::ZERO);
        assert_eq!(sim.strokes(), 0);
    }

    #[test]
    fn shot_sets_velocity_and_counts_stroke() {
        let mut sim = sim_with(PhysicsConfig::default(), Vec::new(), far_hole());
        sim.apply_shot(Vec3::new(0.0, 0.0, 2.0), 5.0);

        assert_eq!(sim.state(), SimState::Rolling);
        assert_vec_close(sim.velocity(), Vec3::new(0.0, 0.0, 5.0), 1e-6);
        assert_eq!(sim.strokes(), 1);
        assert_eq!(
            sim.listener().events(),
            &[SimEvent::StrokeTaken { count: 1 }]
        );
    }

    #[test]
    fn shot_power_clamped() {
        let mut sim = sim_with(PhysicsConfig::default(), Vec::new(), far_hole());
        sim.apply_shot(Vec3::X, 1000.0);
        assert_close(sim.speed(), 18.0, 1e-5);
    }

    #[test]
    fn shot_direction_is_flattened() {
        let mut sim = sim_with(PhysicsConfig::default(), Vec::new(), far_hole());
        sim.apply_shot(Vec3::new(1.0, 5.0, 0.0), 2.0);
        assert_eq!(sim.velocity().y, 0.0);
        assert_close(sim.speed(), 2.0, 1e-6);
    }

    #[test]
    fn degenerate_shots_are_ignored() {
        let mut sim = sim_with(PhysicsConfig::default(), Vec::new(), far_hole());
        sim.apply_shot(Vec3::ZERO, 5.0);
        sim.apply_shot(Vec3::new(0.0, 1.0, 0.0), 5.0);
        sim.apply_shot(Vec3::X, f32::NAN);
        sim.apply_shot(Vec3::X, f32::INFINITY);
        sim.apply_shot(Vec3::new(f32::NAN, 0.0, 1.0), 5.0);

        assert_eq!(sim.strokes(), 0);
        assert_eq!(sim.state(), SimState::Idle);
        assert!(sim.listener().is_empty());
    }

    #[test]
    fn stroke_rejected_while_rolling() {
        let mut sim = sim_with(PhysicsConfig::default(), Vec::new(), far_hole());
        sim.apply_shot(Vec3::X, 5.0);
        sim.update(0.016);
        let velocity = sim.velocity();

        sim.apply_shot(Vec3::Z, 10.0);
        assert_eq!(sim.strokes(), 1);
        assert_eq!(sim.velocity(), velocity);
        assert_eq!(sim.listener().len(), 1);
    }

    #[test]
    fn ball_stops_with_friction_and_accepts_next_shot() {
        let mut sim = sim_with(PhysicsConfig::default(), Vec::new(), far_hole());
        sim.apply_shot(Vec3::X, 5.0);

        for _ in 0..1000 {
            sim.update(1.0 / 60.0);
            if sim.is_idle() {
                break;
            }
        }
        assert!(sim.is_idle(), "ball should settle, speed = {}", sim.speed());
        assert_eq!(sim.velocity(), Vec3::ZERO);

        sim.apply_shot(Vec3::X, 5.0);
        assert_eq!(sim.strokes(), 2);
        assert_eq!(sim.state(), SimState::Rolling);
    }

    #[test]
    fn friction_decays_speed_exponentially() {
        let config = PhysicsConfig {
            friction: 2.0,
            max_step: 1.0,
            ..PhysicsConfig::default()
        };
        let mut sim = sim_with(config, Vec::new(), far_hole());
        sim.apply_shot(Vec3::X, 10.0);
        sim.update(0.1);
        assert_close(sim.speed(), 10.0 * (-0.2_f32).exp(), 1e-4);
        assert_eq!(sim.velocity().z, 0.0);
    }

    #[test]
    fn higher_friction_stops_sooner() {
        let ticks_to_stop = |friction: f32| {
            let config = PhysicsConfig {
                friction,
                ..PhysicsConfig::default()
            };
            let mut sim = sim_with(config, Vec::new(), far_hole());
            sim.apply_shot(Vec3::X, 8.0);
            let mut ticks = 0;
            while !sim.is_idle() && ticks < 10_000 {
                sim.update(1.0 / 60.0);
                ticks += 1;
            }
            ticks
        };
        assert!(ticks_to_stop(3.0) < ticks_to_stop(1.0));
    }

    #[test]
    fn update_is_noop_when_idle_or_bad_dt() {
        let mut sim = sim_with(PhysicsConfig::default(), Vec::new(), far_hole());
        sim.update(0.1);
        assert_eq!(sim.position(), Vec3::new(0.0, R, 0.0));

        sim.apply_shot(Vec3::X, 5.0);
        let before = sim.snapshot();
        sim.update(0.0);
        sim.update(-1.0);
        sim.update(f32::NAN);
        assert_eq!(sim.snapshot(), before);
    }

    #[test]
    fn large_dt_is_clamped_to_max_step() {
        let config = PhysicsConfig {
            friction: 0.0,
            max_step: 0.05,
            ..PhysicsConfig::default()
        };
        let mut sim = sim_with(config, Vec::new(), far_hole());
        sim.apply_shot(Vec3::X, 10.0);
        sim.update(2.0);
        assert_close(sim.position().x, 0.5, 1e-5);
    }

    #[test]
    fn wall_bounce_clamps_to_face_and_reflects() {
        // Wall spanning x 1.5..2.5; the shot would carry the ball centre to
        // x = 1.5 in a single tick.
        let wall = Collider::new(2.0, 0.0, 1.0, 10.0, 0.5);
        let mut sim = sim_with(exact_config(), vec![wall], far_hole());
        sim.apply_shot(Vec3::X, 15.0);
        sim.update(0.1);

        assert_close(sim.position().x, 1.5 - R, 1e-5);
        assert_close(sim.velocity().x, -15.0 * 0.55, 1e-4);
        assert_eq!(sim.state(), SimState::Rolling);
    }

    #[test]
    fn resting_contact_leaves_no_overlap() {
        let wall = Collider::new(2.0, 0.0, 1.0, 10.0, 0.5);
        let mut sim = sim_with(exact_config(), vec![wall], far_hole());
        sim.teleport(Vec3::new(1.5 - R, 0.0, 0.0));
        sim.apply_shot(Vec3::X, 0.5);
        sim.update(0.05);

        assert!(wall.penetration(sim.position(), R) <= 1e-5);
        assert_close(sim.position().x, 1.5 - R, 1e-5);
    }

    #[test]
    fn slow_wall_contact_settles_without_bounce() {
        let wall = Collider::new(2.0, 0.0, 1.0, 10.0, 0.5);
        let config = PhysicsConfig {
            min_speed: 0.0,
            ..exact_config()
        };
        let mut sim = sim_with(config, vec![wall], far_hole());
        sim.teleport(Vec3::new(1.5 - R, 0.0, 0.0));
        // Mostly along the wall, barely into it
        sim.apply_shot(Vec3::new(0.02, 0.0, 1.0), 1.0);
        sim.update(0.05);

        assert_eq!(sim.velocity().x, 0.0);
        assert!(sim.velocity().z > 0.9);
    }

    #[test]
    fn glancing_bounce_keeps_tangential_speed() {
        let wall = Collider::new(2.0, 0.0, 1.0, 10.0, 0.5);
        let mut sim = sim_with(exact_config(), vec![wall], far_hole());
        sim.teleport(Vec3::new(1.3, 0.0, 0.0));
        sim.apply_shot(Vec3::new(1.0, 0.0, 1.0), 2.0);
        let vz = sim.velocity().z;
        sim.update(0.1);

        assert!(sim.velocity().x < 0.0);
        assert_close(sim.velocity().z, vz, 1e-5);
    }

    #[test]
    fn fast_ball_does_not_tunnel_through_thin_wall() {
        let wall = Collider::new(1.0, 0.0, 0.2, 4.0, 0.5);
        let mut sim = sim_with(exact_config(), vec![wall], far_hole());
        sim.apply_shot(Vec3::X, 18.0);
        sim.update(0.2);

        assert!(sim.position().x <= 0.9 - R + 1e-5);
        assert!(sim.velocity().x < 0.0);
    }

    #[test]
    fn hard_shot_from_resting_contact_stays_on_near_side() {
        let wall = Collider::new(1.0, 0.0, 0.2, 4.0, 0.5);
        let flush = Vec3::new(0.9 - R, 0.0, 0.0);

        let mut sim = sim_with(exact_config(), vec![wall], far_hole());
        sim.teleport(flush);
        sim.apply_shot(Vec3::X, 18.0);
        sim.update(0.05);
        assert!(sim.position().x <= 0.9 - R + 1e-5, "ball at {:?}", sim.position());
        assert_close(sim.velocity().x, -18.0 * 0.55, 1e-3);

        let mut sim = sim_with(PhysicsConfig::default(), vec![wall], far_hole());
        sim.teleport(flush);
        sim.apply_shot(Vec3::X, 18.0);
        for _ in 0..30 {
            sim.update(1.0 / 60.0);
            assert!(sim.position().x < 1.0, "ball crossed to {:?}", sim.position());
        }
    }

    #[test]
    fn fast_ball_passes_a_corner_it_does_not_touch() {
        // Corner at (1.5, 5); the path clears it by about 0.156
        let wall = Collider::new(2.0, 0.0, 1.0, 10.0, 0.5);
        let mut sim = sim_with(exact_config(), vec![wall], far_hole());
        sim.teleport(Vec3::new(0.5, 0.0, 4.22));
        sim.apply_shot(Vec3::new(1.0, 0.0, 1.0), 10.0);
        let before = sim.velocity();
        sim.update(0.3);

        assert_vec_close(sim.velocity(), before, 1e-5);
        assert_vec_close(sim.position(), Vec3::new(0.5, R, 4.22) + before * 0.3, 1e-4);
    }

    #[test]
    fn fast_ball_clipping_a_corner_deflects() {
        let wall = Collider::new(2.0, 0.0, 1.0, 10.0, 0.5);
        let mut sim = sim_with(exact_config(), vec![wall], far_hole());
        sim.teleport(Vec3::new(0.5, 0.0, 4.15));
        sim.apply_shot(Vec3::new(1.0, 0.0, 1.0), 10.0);
        let before = sim.velocity();
        sim.update(0.3);

        assert!(sim.velocity().x < before.x);
        assert!(wall.penetration(sim.position(), R) <= 1e-4);
    }

    #[test]
    fn ball_sinks_below_capture_speed() {
        let hole = HoleTarget::new(Vec3::new(1.0, 0.0, 0.0), 0.25);
        let mut sim = sim_with(exact_config(), Vec::new(), hole);
        sim.teleport(Vec3::new(0.9, 0.0, 0.0));
        sim.apply_shot(Vec3::X, 3.95);
        sim.update(0.01);

        assert!(sim.is_sunk());
        assert_eq!(sim.velocity(), Vec3::ZERO);
        let events = sim.listener().events();
        assert_eq!(events[0], SimEvent::StrokeTaken { count: 1 });
        assert_eq!(&events[1..], &sink_events(1));
    }

    #[test]
    fn ball_lips_out_above_capture_speed() {
        let hole = HoleTarget::new(Vec3::new(1.0, 0.0, 0.0), 0.25);
        let mut sim = sim_with(exact_config(), Vec::new(), hole);
        sim.teleport(Vec3::new(0.9, 0.0, 0.0));
        sim.apply_shot(Vec3::X, 4.05);

        for _ in 0..100 {
            sim.update(0.01);
        }
        assert!(!sim.is_sunk());
        assert_eq!(sim.listener().holes_sunk(), 0);
        assert!(sim.position().x > 1.25, "ball should roll past the cup");
    }

    #[test]
    fn sunk_fires_once_and_freezes() {
        let hole = HoleTarget::new(Vec3::new(0.5, 0.0, 0.0), 0.25);
        let mut sim = sim_with(PhysicsConfig::default(), Vec::new(), hole);
        sim.apply_shot(Vec3::X, 2.0);
        for _ in 0..200 {
            sim.update(1.0 / 60.0);
        }
        assert!(sim.is_sunk());
        assert_eq!(sim.listener().holes_sunk(), 1);

        let frozen = sim.position();
        sim.update(0.05);
        sim.apply_shot(Vec3::X, 5.0);
        assert_eq!(sim.position(), frozen);
        assert_eq!(sim.strokes(), 1);
        assert_eq!(sim.listener().holes_sunk(), 1);
    }

    #[test]
    fn frictionless_ball_travels_straight() {
        let config = PhysicsConfig {
            friction: 0.0,
            restitution: 0.0,
            ..PhysicsConfig::default()
        };
        // Hole sits behind the ball
        let hole = HoleTarget::new(Vec3::new(-2.0, 0.0, 0.0), 0.25);
        let mut sim = sim_with(config, Vec::new(), hole);
        let dir = Vec3::new(3.0, 0.0, 4.0) * 0.2;
        sim.apply_shot(dir, 6.0);

        for _ in 0..100 {
            sim.update(0.02);
        }
        assert_eq!(sim.state(), SimState::Rolling);
        assert_vec_close(sim.position(), Vec3::new(7.2, R, 9.6), 1e-3);
        assert_vec_close(sim.velocity(), Vec3::new(3.6, 0.0, 4.8), 1e-5);
        assert_eq!(sim.listener().holes_sunk(), 0);
    }

    #[test]
    fn reset_then_tick_stays_on_tee() {
        let level = &all_levels()[0];
        let mut sim = BallSimulation::for_level(PhysicsConfig::default(), level, EventLog::new());
        sim.apply_shot(Vec3::X, 10.0);
        for _ in 0..10 {
            sim.update(1.0 / 60.0);
        }
        sim.reset_to_start();
        sim.update(0.5);

        assert_eq!(sim.position(), level.start_position());
        assert_eq!(sim.velocity(), Vec3::ZERO);
        assert_eq!(sim.state(), SimState::Idle);
        assert_eq!(sim.strokes(), 0);
    }

    #[test]
    fn reset_recovers_from_sunk() {
        let hole = HoleTarget::new(Vec3::new(0.3, 0.0, 0.0), 0.25);
        let mut sim = sim_with(PhysicsConfig::default(), Vec::new(), hole);
        sim.set_start(Vec3::new(0.0, 0.0, 0.0));
        sim.apply_shot(Vec3::X, 1.0);
        for _ in 0..60 {
            sim.update(1.0 / 60.0);
        }
        assert!(sim.is_sunk());

        sim.reset_to_start();
        assert!(sim.is_idle());
        sim.apply_shot(Vec3::X, 1.0);
        assert_eq!(sim.strokes(), 1);
    }

    #[test]
    fn teleport_pins_to_ground_and_stops() {
        let mut sim = sim_with(PhysicsConfig::default(), Vec::new(), far_hole());
        sim.apply_shot(Vec3::X, 5.0);
        sim.teleport(Vec3::new(2.0, 9.0, -1.0));
        assert_eq!(sim.position(), Vec3::new(2.0, R, -1.0));
        assert_eq!(sim.velocity(), Vec3::ZERO);
        assert!(sim.is_idle());
        assert_eq!(sim.strokes(), 1);

        sim.teleport(Vec3::new(f32::NAN, 0.0, 0.0));
        assert_eq!(sim.position(), Vec3::new(2.0, R, -1.0));
    }

    #[test]
    fn colliders_replaced_between_ticks() {
        let mut sim = sim_with(exact_config(), Vec::new(), far_hole());
        sim.apply_shot(Vec3::X, 10.0);
        sim.update(0.05);
        assert!(sim.velocity().x > 0.0);

        sim.set_colliders(vec![Collider::new(1.0, 0.0, 0.4, 4.0, 0.5)]);
        sim.update(0.05);
        assert!(sim.velocity().x < 0.0, "new wall should be hit on the next tick");
        assert_eq!(sim.colliders().len(), 1);
    }

    #[test]
    fn load_level_resets_strokes_and_geometry() {
        let levels = all_levels();
        let mut sim =
            BallSimulation::for_level(PhysicsConfig::default(), &levels[0], EventLog::new());
        sim.apply_shot(Vec3::X, 3.0);
        assert_eq!(sim.strokes(), 1);

        sim.load_level(&levels[2]);
        assert_eq!(sim.strokes(), 0);
        assert!(sim.is_idle());
        assert_eq!(sim.colliders().len(), levels[2].walls.len());
        assert_eq!(sim.hole(), &levels[2].hole_target());
        assert_eq!(sim.position(), levels[2].start_position());
    }

    #[test]
    fn straight_putt_sinks_on_warm_up() {
        let level = &all_levels()[0];
        let mut sim = BallSimulation::for_level(PhysicsConfig::default(), level, EventLog::new());
        // Exactly enough to stop near x = 6 with friction 1.5: v0 = 1.5 * 6
        sim.apply_shot(Vec3::X, 9.0);
        for _ in 0..2000 {
            sim.update(1.0 / 60.0);
            if !matches!(sim.state(), SimState::Rolling) {
                break;
            }
        }
        assert!(sim.is_sunk(), "ended {:?} at {:?}", sim.state(), sim.position());
        assert_eq!(sim.listener().holes_sunk(), 1);
    }

    #[test]
    fn snapshot_serializes() {
        let mut sim = sim_with(PhysicsConfig::default(), Vec::new(), far_hole());
        sim.apply_shot(Vec3::Z, 3.0);
        let text = serde_json::to_string(&sim.snapshot()).unwrap();
        let back: BallSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, sim.snapshot());
        assert!(text.contains(r#""state":"Rolling""#));
    }

    // ================================================================
    // Property-based tests (proptest)
    // ================================================================

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn no_residual_penetration(
                level_idx in 0usize..10,
                shots in proptest::collection::vec((0.0f32..std::f32::consts::TAU, 0.0f32..25.0), 1..6),
                dt in 0.005f32..0.08,
            ) {
                let level = &all_levels()[level_idx];
                let mut sim = BallSimulation::for_level(PhysicsConfig::default(), level, ());
                let colliders = level.colliders();

                for (angle, power) in shots {
                    sim.apply_shot(Vec3::from_angle(angle), power);
                    for _ in 0..120 {
                        sim.update(dt);
                        for c in &colliders {
                            prop_assert!(
                                c.penetration(sim.position(), R) <= 1e-4,
                                "ball at {:?} overlaps {:?}",
                                sim.position(),
                                c
                            );
                        }
                        if !matches!(sim.state(), SimState::Rolling) {
                            break;
                        }
                    }
                    if sim.is_sunk() {
                        break;
                    }
                }
            }

            #[test]
            fn ball_stays_inside_boxed_arena(
                angle in 0.0f32..std::f32::consts::TAU,
                power in 0.0f32..18.0,
            ) {
                // The Arena: closed box, inner faces at |x| = 6.8, |z| = 3.3
                let level = &all_levels()[3];
                let mut sim = BallSimulation::for_level(PhysicsConfig::default(), level, ());
                sim.apply_shot(Vec3::from_angle(angle), power);
                for _ in 0..600 {
                    sim.update(1.0 / 60.0);
                    let p = sim.position();
                    prop_assert!(p.x.abs() <= 6.8 - R + 1e-3 && p.z.abs() <= 3.3 - R + 1e-3,
                        "ball escaped to {:?}", p);
                }
            }

            #[test]
            fn shot_from_resting_contact_never_crosses_wall(
                level_idx in 0usize..10,
                wall_pick in any::<prop::sample::Index>(),
                side in 0usize..4,
                along in -0.95f32..0.95,
                tilt in -1.2f32..1.2,
                power in 0.5f32..18.0,
                dt in 0.005f32..0.05,
            ) {
                let level = &all_levels()[level_idx];
                let colliders = level.colliders();
                let c = colliders[wall_pick.index(colliders.len())];

                // Flush against one face, aimed into it within +/- tilt
                let (reach_x, reach_z) = (c.half_width + R, c.half_depth + R);
                let (slide_x, slide_z) = (along * c.half_width, along * c.half_depth);
                let (offset, inward) = match side {
                    0 => (Vec3::new(-reach_x, 0.0, slide_z), Vec3::X),
                    1 => (Vec3::new(reach_x, 0.0, slide_z), -Vec3::X),
                    2 => (Vec3::new(slide_x, 0.0, -reach_z), Vec3::Z),
                    _ => (Vec3::new(slide_x, 0.0, reach_z), -Vec3::Z),
                };
                let pos = Vec3::new(c.center_x, 0.0, c.center_z) + offset;
                prop_assume!(colliders.iter().all(|o| o.penetration(pos, R) <= 1e-5));

                let angle = inward.z.atan2(inward.x) + tilt;
                let mut sim = BallSimulation::for_level(PhysicsConfig::default(), level, ());
                sim.teleport(pos);
                sim.apply_shot(Vec3::from_angle(angle), power);
                sim.update(dt);

                // Signed distance from the wall centre along the outward normal
                let p = sim.position();
                let reach = if side < 2 { reach_x } else { reach_z };
                let out = (Vec3::new(c.center_x, 0.0, c.center_z) - p).dot(inward);
                prop_assert!(
                    out >= reach - 1e-3,
                    "ball went from {:?} to {:?} through {:?}", pos, p, c
                );
            }

            #[test]
            fn strokes_count_accepted_shots_only(
                attempts in proptest::collection::vec(0.5f32..10.0, 1..10)
            ) {
                let mut sim = sim_with(PhysicsConfig::default(), Vec::new(), far_hole());
                let mut accepted = 0;
                for power in attempts {
                    let was_idle = sim.is_idle();
                    sim.apply_shot(Vec3::X, power);
                    if was_idle {
                        accepted += 1;
                    }
                    sim.update(1.0 / 60.0);
                }
                prop_assert_eq!(sim.strokes(), accepted);
                prop_assert_eq!(sim.listener().last_stroke(), Some(accepted));
            }

            #[test]
            fn idle_implies_zero_velocity(
                angle in 0.0f32..std::f32::consts::TAU,
                power in 0.0f32..18.0,
                ticks in 1usize..400,
            ) {
                let level = &all_levels()[1];
                let mut sim = BallSimulation::for_level(PhysicsConfig::default(), level, ());
                sim.apply_shot(Vec3::from_angle(angle), power);
                for _ in 0..ticks {
                    sim.update(1.0 / 60.0);
                    if !matches!(sim.state(), SimState::Rolling) {
                        prop_assert_eq!(sim.velocity(), Vec3::ZERO);
                    }
                    prop_assert_eq!(sim.position().y, R);
                }
            }
        }
    }
}
