use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkSettings {
    pub move_speed: f32,
    pub sprint_multiplier: f32,
    pub jump_velocity: f32,
    pub gravity: f32,
    /// Horizontal velocity lost per second without input.
    pub friction: f32,
    pub eye_height: f32,
    /// Radians per pixel of mouse motion.
    pub mouse_sensitivity: f32,
}

impl Default for WalkSettings {
    fn default() -> Self {
        WalkSettings {
            move_speed: 45.0,
            sprint_multiplier: 2.0,
            jump_velocity: 10.0,
            gravity: 30.0,
            friction: 10.0,
            eye_height: 2.0,
            mouse_sensitivity: 0.002,
        }
    }
}

/// Keys held this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub sprint: bool,
}

impl WalkInput {
    pub fn from_keys(keys: &Input<KeyCode>) -> WalkInput {
        WalkInput {
            forward: keys.pressed(KeyCode::W),
            backward: keys.pressed(KeyCode::S),
            left: keys.pressed(KeyCode::A),
            right: keys.pressed(KeyCode::D),
            jump: keys.pressed(KeyCode::Space),
            sprint: keys.pressed(KeyCode::ShiftLeft),
        }
    }

    /// Desired direction in the walker's yaw frame, forward being `-Z`.
    fn direction(&self) -> Vec3 {
        let axis = |pos: bool, neg: bool| pos as i32 as f32 - neg as i32 as f32;
        Vec3::new(
            axis(self.right, self.left),
            0.0,
            axis(self.backward, self.forward),
        )
        .normalize_or_zero()
    }
}

/// Walks the eye over the terrain surface.
#[derive(Debug, Clone, Component)]
pub struct FirstPersonController {
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub velocity: Vec3,
    pub on_ground: bool,
    pub settings: WalkSettings,
}

impl FirstPersonController {
    pub fn from_transform(transform: &Transform) -> FirstPersonController {
        let (yaw, pitch, _) = transform.rotation.to_euler(EulerRot::YXZ);
        FirstPersonController {
            eye: transform.translation,
            yaw,
            pitch: pitch.clamp(-FRAC_PI_2, FRAC_PI_2),
            velocity: Vec3::ZERO,
            on_ground: false,
            settings: WalkSettings::default(),
        }
    }

    pub fn look(&mut self, mouse_delta: Vec2) {
        let sensitivity = self.settings.mouse_sensitivity;
        self.yaw -= mouse_delta.x * sensitivity;
        self.pitch = (self.pitch - mouse_delta.y * sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye).with_rotation(self.rotation())
    }

    /// Advances one frame; `ground` is the terrain height at `(x, z)`.
    pub fn step(&mut self, input: &WalkInput, dt: f32, ground: impl Fn(f32, f32) -> f32) {
        let s = self.settings;

        self.velocity.y -= s.gravity * dt;

        let direction = input.direction();
        if direction != Vec3::ZERO {
            let speed = s.move_speed * if input.sprint { s.sprint_multiplier } else { 1.0 };
            let world = Quat::from_rotation_y(self.yaw) * direction * speed;
            self.velocity.x = world.x;
            self.velocity.z = world.z;
        } else {
            let keep = (1.0 - dt * s.friction).max(0.0);
            self.velocity.x *= keep;
            self.velocity.z *= keep;
        }

        if input.jump && self.on_ground {
            self.velocity.y = s.jump_velocity;
        }

        self.eye += self.velocity * dt;

        let floor = ground(self.eye.x, self.eye.z) + s.eye_height;
        if self.eye.y < floor {
            self.eye.y = floor;
            self.velocity.y = 0.0;
            self.on_ground = true;
        } else {
            self.on_ground = false;
        }
    }
}
