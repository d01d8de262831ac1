mod first_person;
mod orbit;

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};
use isle_terrain::SharedHeightField;

pub use self::first_person::{FirstPersonController, WalkInput, WalkSettings};
pub use self::orbit::OrbitController;

/// Frame steps longer than this are clamped.
const MAX_STEP: f32 = 0.1;
/// How far ahead of the eye the orbit target lands when leaving walk mode.
const HANDOFF_DISTANCE: f32 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, States)]
pub enum CameraMode {
    #[default]
    Orbit,
    FirstPerson,
}

pub struct CameraControllerPlugin;

impl Plugin for CameraControllerPlugin {
    fn build(&self, app: &mut App) {
        app.add_state::<CameraMode>()
            .add_systems(
                Update,
                (
                    enter_first_person.run_if(resource_exists::<SharedHeightField>()),
                    leave_first_person,
                )
                    .before(orbit_input)
                    .before(walk),
            )
            .add_systems(
                Update,
                (orbit_input, update_orbit)
                    .chain()
                    .run_if(in_state(CameraMode::Orbit)),
            )
            .add_systems(
                Update,
                walk.run_if(in_state(CameraMode::FirstPerson))
                    .run_if(resource_exists::<SharedHeightField>()),
            )
            .add_systems(OnEnter(CameraMode::FirstPerson), grab_cursor)
            .add_systems(OnExit(CameraMode::FirstPerson), release_cursor);
    }
}

fn enter_first_person(
    mode: Res<State<CameraMode>>,
    keys: Res<Input<KeyCode>>,
    mut next_mode: ResMut<NextState<CameraMode>>,
    q_camera: Query<(Entity, &Transform), With<OrbitController>>,
    mut commands: Commands,
) {
    if *mode.get() != CameraMode::Orbit || !keys.just_pressed(KeyCode::Return) {
        return;
    }

    let Ok((camera, transform)) = q_camera.get_single() else {
        return;
    };

    commands
        .entity(camera)
        .insert(FirstPersonController::from_transform(transform));
    next_mode.set(CameraMode::FirstPerson);
}

fn leave_first_person(
    mode: Res<State<CameraMode>>,
    keys: Res<Input<KeyCode>>,
    mut next_mode: ResMut<NextState<CameraMode>>,
    mut q_camera: Query<(Entity, &FirstPersonController, &mut OrbitController)>,
    mut commands: Commands,
) {
    if *mode.get() != CameraMode::FirstPerson
        || !keys.any_just_pressed([KeyCode::Tab, KeyCode::Escape])
    {
        return;
    }

    let Ok((camera, walker, mut orbit)) = q_camera.get_single_mut() else {
        return;
    };

    orbit.retarget(walker.eye, walker.eye + walker.forward() * HANDOFF_DISTANCE);
    commands.entity(camera).remove::<FirstPersonController>();
    next_mode.set(CameraMode::Orbit);
}

fn orbit_input(
    q_window: Query<&Window, With<PrimaryWindow>>,
    buttons: Res<Input<MouseButton>>,
    mut motion_events: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    mut q_orbit: Query<&mut OrbitController>,
) {
    let Ok(mut orbit) = q_orbit.get_single_mut() else { return };

    // a full window height of drag turns the view once around
    let height = q_window
        .get_single()
        .map(|w| w.height())
        .unwrap_or(720.0)
        .max(1.0);

    let motion: Vec2 = motion_events.iter().map(|e| e.delta).sum();
    if buttons.pressed(MouseButton::Left) && motion != Vec2::ZERO {
        let turn = std::f32::consts::TAU / height;
        orbit.rotate(Vec2::new(-motion.x, motion.y) * turn);
    }

    for scroll_event in scroll_events.iter() {
        let lines = match scroll_event.unit {
            MouseScrollUnit::Line => scroll_event.y,
            MouseScrollUnit::Pixel => scroll_event.y / 16.0,
        };
        orbit.zoom(lines);
    }
}

fn update_orbit(time: Res<Time>, mut q_camera: Query<(&mut OrbitController, &mut Transform)>) {
    let dt = time.delta_seconds().min(MAX_STEP);
    for (mut orbit, mut transform) in &mut q_camera {
        orbit.step(dt);
        *transform = orbit.transform();
    }
}

fn walk(
    time: Res<Time>,
    keys: Res<Input<KeyCode>>,
    height_field: Res<SharedHeightField>,
    mut motion_events: EventReader<MouseMotion>,
    mut q_camera: Query<(&mut FirstPersonController, &mut Transform)>,
) {
    let dt = time.delta_seconds().min(MAX_STEP);
    let motion: Vec2 = motion_events.iter().map(|e| e.delta).sum();
    let input = WalkInput::from_keys(&keys);

    for (mut walker, mut transform) in &mut q_camera {
        walker.look(motion);
        walker.step(&input, dt, |x, z| height_field.elevation(x, z));
        *transform = walker.transform();
    }
}

fn set_cursor_grab(q_window: &mut Query<&mut Window, With<PrimaryWindow>>, grab: bool) {
    let Ok(mut window) = q_window.get_single_mut() else { return };
    window.cursor.grab_mode = if grab {
        CursorGrabMode::Locked
    } else {
        CursorGrabMode::None
    };
    window.cursor.visible = !grab;
}

fn grab_cursor(mut q_window: Query<&mut Window, With<PrimaryWindow>>) {
    set_cursor_grab(&mut q_window, true);
}

fn release_cursor(mut q_window: Query<&mut Window, With<PrimaryWindow>>) {
    set_cursor_grab(&mut q_window, false);
}
