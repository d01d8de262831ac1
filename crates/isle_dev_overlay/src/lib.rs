use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::egui::plot::{Line, Plot};
use bevy_egui::egui::{self, pos2, Align2, Color32, Frame, Rounding};
use bevy_egui::EguiContext;
use isle_camera_controller::CameraMode;
use isle_terrain::{SharedHeightField, SwayPhase, TerrainChunk, WorldStats, WorldgenState};
use isle_worldgen::WorldgenSettings;

const CONTROLS: &str = "\
Orbit: drag to rotate, scroll to zoom
Enter: walk the island
WASD move, Space jump, Shift sprint
Tab / Esc: back to orbit
F3: dev overlay";

pub struct DevOverlayPlugin;

impl Plugin for DevOverlayPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DevOverlaySettings::default())
            .insert_resource(GizmoConfig {
                enabled: false,
                ..default()
            })
            .insert_resource(FrameTimePoints::default())
            .add_systems(
                Update,
                (
                    handle_input,
                    record_frame_time.before(ui_left_side),
                    ui_left_side.run_if(is_enabled),
                    ui_controls.run_if(in_state(WorldgenState::Done)),
                    draw_chunk_grid
                        .run_if(is_enabled)
                        .run_if(in_state(WorldgenState::Done)),
                ),
            );
    }
}

#[derive(Default, Resource)]
pub struct DevOverlaySettings {
    pub enabled: bool,
}

pub fn is_enabled(settings: Res<DevOverlaySettings>) -> bool {
    settings.enabled
}

fn handle_input(
    input: Res<Input<KeyCode>>,
    mut settings: ResMut<DevOverlaySettings>,
    mut gizmo_config: ResMut<GizmoConfig>,
) {
    if input.just_pressed(KeyCode::F3) {
        settings.enabled = !settings.enabled;
    }

    gizmo_config.enabled = settings.enabled;
}

/// Recent `[elapsed, frame time]` samples in seconds.
#[derive(Default, Resource)]
struct FrameTimePoints(Vec<[f64; 2]>);

impl FrameTimePoints {
    const CAPACITY: usize = 100;

    fn push(&mut self, point: [f64; 2]) {
        self.0.push(point);
        if self.0.len() > Self::CAPACITY {
            let excess = self.0.len() - Self::CAPACITY;
            self.0.drain(..excess);
        }
    }

    fn avg_frame_time(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }

        let sum = self.0.iter().map(|v| v[1]).sum::<f64>();
        sum / (self.0.len() as f64)
    }

    fn fps(&self) -> f64 {
        let frame_time = self.avg_frame_time();
        if frame_time > 0.0 {
            1.0 / frame_time
        } else {
            0.0
        }
    }
}

fn record_frame_time(time: Res<Time>, mut points: ResMut<FrameTimePoints>) {
    let instant = time.raw_elapsed_seconds_f64();
    let frame_time = time.raw_delta_seconds_f64();
    points.push([instant, frame_time]);
}

#[allow(clippy::too_many_arguments)]
fn ui_left_side(
    mut ctx: Query<&mut EguiContext, With<PrimaryWindow>>,
    frame_time_points: Res<FrameTimePoints>,
    stats: Option<Res<WorldStats>>,
    height_field: Option<Res<SharedHeightField>>,
    settings: Res<WorldgenSettings>,
    mode: Res<State<CameraMode>>,
    sway: Res<SwayPhase>,
    q_camera: Query<&Transform, With<Camera3d>>,
) {
    let Ok(mut ctx) = ctx.get_single_mut() else { return };

    let window = egui::Window::new("dev_overlay_left")
        .title_bar(false)
        .resizable(false)
        .fixed_pos(pos2(0.0, 0.0))
        .frame(Frame {
            rounding: Rounding::none(),
            fill: Color32::from_black_alpha(220),
            ..default()
        });

    window.show(ctx.get_mut(), |ui| {
        let avg_frame_time = frame_time_points.avg_frame_time();

        ui.label(format!(
            "FPS: {:.1} ({:.1} ms)",
            frame_time_points.fps(),
            avg_frame_time * 1000.0
        ));

        let line = Line::new(frame_time_points.0.clone()).fill(0.0);
        Plot::new("fps_plot")
            .width(200.0)
            .height(40.0)
            .allow_boxed_zoom(false)
            .allow_double_click_reset(false)
            .allow_drag(false)
            .allow_scroll(false)
            .allow_zoom(false)
            .include_y(0.0)
            .include_y(1.0 / 40.0)
            .set_margin_fraction(egui::vec2(0.0, 0.0))
            .show_background(false)
            .show(ui, |plot| plot.line(line));

        ui.separator();

        if let Ok(transform) = q_camera.get_single() {
            let pos = transform.translation;
            ui.label(format!("Camera: {:?}", mode.get()));
            ui.label(format!("Position: {:.1} {:.1} {:.1}", pos.x, pos.y, pos.z));
            if let Some(height_field) = &height_field {
                let ground = height_field.elevation(pos.x, pos.z);
                ui.label(format!(
                    "Ground: {:.1} (water {:.1})",
                    ground, settings.grid.water_level
                ));
            }
        }

        let Some(stats) = stats else {
            ui.label("Generating...");
            return;
        };

        ui.separator();
        ui.label(format!("Seed: {}", stats.seed));
        ui.label(format!(
            "Terrain: {} chunks, {} vertices, {} triangles",
            stats.chunks, stats.vertices, stats.triangles
        ));
        ui.label(format!("Clouds: {}", stats.clouds));
        ui.label(format!("Generated in {:.2?}", stats.elapsed));
        ui.label(format!("Sway phase: {:.1}s", sway.0));

        ui.separator();
        ui.label(format!("Props: {}", stats.instances()));
        for (part, count) in &stats.props {
            ui.label(format!("  {part:?}: {count}"));
        }
    });
}

fn ui_controls(mut ctx: Query<&mut EguiContext, With<PrimaryWindow>>, mode: Res<State<CameraMode>>) {
    let Ok(mut ctx) = ctx.get_single_mut() else { return };

    let alpha = match mode.get() {
        CameraMode::Orbit => 200,
        CameraMode::FirstPerson => 120,
    };

    egui::Window::new("controls")
        .title_bar(false)
        .resizable(false)
        .anchor(Align2::LEFT_BOTTOM, egui::vec2(0.0, 0.0))
        .frame(Frame {
            rounding: Rounding::none(),
            fill: Color32::from_black_alpha(alpha),
            inner_margin: egui::style::Margin::same(6.0),
            ..default()
        })
        .show(ctx.get_mut(), |ui| {
            ui.label(CONTROLS);
        });
}

fn draw_chunk_grid(
    mut gizmos: Gizmos,
    settings: Res<WorldgenSettings>,
    q_chunks: Query<&TerrainChunk>,
) {
    let grid = settings.grid;
    let half = grid.chunk_size / 2.0;
    let y = grid.water_level;

    for chunk in &q_chunks {
        let center = grid.chunk_offset(chunk.coord);
        let corners = [
            Vec2::new(-half, -half),
            Vec2::new(half, -half),
            Vec2::new(half, half),
            Vec2::new(-half, half),
            Vec2::new(-half, -half),
        ]
        .map(|c| {
            let p = center + c;
            Vec3::new(p.x, y, p.y)
        });
        gizmos.linestrip(corners, Color::YELLOW);
    }
}
