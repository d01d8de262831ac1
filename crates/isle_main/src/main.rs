use std::env;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use bevy::asset::FileAssetIo;
use bevy::pbr::{CascadeShadowConfigBuilder, DirectionalLightShadowMap};
use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_egui::EguiPlugin;
use isle_camera_controller::{CameraControllerPlugin, OrbitController};
use isle_dev_overlay::DevOverlayPlugin;
use isle_terrain::TerrainPlugin;
use isle_worldgen::{hex_color, WorldSeed, WorldgenSettings};

const SETTINGS_FILE: &str = "default.worldgen.ron";
const SUN_POSITION: Vec3 = Vec3::new(-2500.0, 2000.0, 2500.0);

fn main() -> Result<()> {
    let seed = seed_from_env()?;
    let settings_path = settings_path();
    let settings = WorldgenSettings::load(&settings_path)?;
    settings
        .validate()
        .with_context(|| format!("invalid settings in {}", settings_path.display()))?;

    let sky = hex_color(0x87ceeb);
    let world_size = settings.world_size();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "isle".into(),
                resolution: WindowResolution::new(1280., 720.),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin)
        .add_plugins((TerrainPlugin, CameraControllerPlugin, DevOverlayPlugin))
        .insert_resource(WorldSeed(seed))
        .insert_resource(settings)
        .insert_resource(ClearColor(Color::rgb_linear(sky.x, sky.y, sky.z)))
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 0.9,
        })
        .insert_resource(DirectionalLightShadowMap { size: 4096 })
        .insert_resource(ShadowReach(world_size * 1.5))
        .add_systems(Startup, setup)
        .run();

    Ok(())
}

/// Seed from the first argument, then `ISLE_SEED`, then the clock.
fn seed_from_env() -> Result<u64> {
    let arg = env::args().nth(1);
    let var = env::var("ISLE_SEED").ok();

    match arg.or(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("seed {raw:?} is not an unsigned integer")),
        None => Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()),
    }
}

fn settings_path() -> PathBuf {
    match env::var_os("ISLE_SETTINGS") {
        Some(path) => PathBuf::from(path),
        None => FileAssetIo::get_base_path()
            .join("assets")
            .join(SETTINGS_FILE),
    }
}

#[derive(Resource)]
struct ShadowReach(f32);

fn setup(
    settings: Res<WorldgenSettings>,
    shadow_reach: Res<ShadowReach>,
    mut commands: Commands,
) {
    let eye = Vec3::new(250.0, 100.0, 250.0);
    let target = Vec3::new(0.0, settings.grid.water_level + 20.0, 0.0);
    let orbit = OrbitController::looking_from(eye, target);

    commands.spawn((
        Camera3dBundle {
            transform: orbit.transform(),
            projection: Projection::Perspective(PerspectiveProjection {
                fov: 60f32.to_radians(),
                near: 0.1,
                far: 15000.0,
                ..default()
            }),
            ..default()
        },
        orbit,
        Name::new("Camera"),
    ));

    commands.spawn((
        DirectionalLightBundle {
            directional_light: DirectionalLight {
                color: Color::WHITE,
                illuminance: 15_000.0,
                shadows_enabled: true,
                ..default()
            },
            transform: Transform::from_translation(SUN_POSITION).looking_at(Vec3::ZERO, Vec3::Y),
            cascade_shadow_config: CascadeShadowConfigBuilder {
                first_cascade_far_bound: 300.0,
                maximum_distance: shadow_reach.0,
                ..default()
            }
            .into(),
            ..default()
        },
        Name::new("Sun"),
    ));
}
