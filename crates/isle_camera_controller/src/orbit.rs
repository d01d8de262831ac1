use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Orbits `target` at `distance`, easing rotation toward pending input.
#[derive(Debug, Clone, Component)]
pub struct OrbitController {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,

    pending_yaw: f32,
    pending_pitch: f32,

    /// Share of pending rotation applied per 60 Hz frame.
    pub damping: f32,
    /// Zoom factor per wheel line.
    pub zoom_step: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        OrbitController {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            distance: 100.0,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            damping: 0.1,
            zoom_step: 0.95,
            min_distance: 1.0,
            max_distance: 8000.0,
        }
    }
}

impl OrbitController {
    pub fn looking_from(eye: Vec3, target: Vec3) -> OrbitController {
        let mut controller = OrbitController::default();
        controller.retarget(eye, target);
        controller
    }

    /// Keeps the eye in place and orbits around a new target from now on.
    pub fn retarget(&mut self, eye: Vec3, target: Vec3) {
        let offset = eye - target;
        self.target = target;
        self.distance = offset
            .length()
            .clamp(self.min_distance, self.max_distance);
        self.yaw = offset.x.atan2(offset.z);
        self.pitch = (offset.y / offset.length().max(f32::EPSILON))
            .clamp(-1.0, 1.0)
            .asin()
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;
    }

    /// Queues a rotation in radians; positive `delta.y` raises the eye.
    pub fn rotate(&mut self, delta: Vec2) {
        self.pending_yaw += delta.x;
        self.pending_pitch += delta.y;
    }

    /// Moves closer for positive `lines`.
    pub fn zoom(&mut self, lines: f32) {
        self.distance = (self.distance * self.zoom_step.powf(lines))
            .clamp(self.min_distance, self.max_distance);
    }

    pub fn step(&mut self, dt: f32) {
        let alpha = 1.0 - (1.0 - self.damping).powf(dt * 60.0);

        let yaw = self.pending_yaw * alpha;
        let pitch = self.pending_pitch * alpha;
        self.pending_yaw -= yaw;
        self.pending_pitch -= pitch;

        self.yaw += yaw;
        self.pitch = (self.pitch + pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn eye(&self) -> Vec3 {
        let dir = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target + dir * self.distance
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye()).looking_at(self.target, Vec3::Y)
    }
}
