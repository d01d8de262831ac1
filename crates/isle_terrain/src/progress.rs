use bevy::prelude::*;
use isle_worldgen::WorldgenProgress;

use crate::WorldgenState;

/// Full-screen loading screen shown until the world is spawned.
pub struct WorldgenProgressUiPlugin;

impl Plugin for WorldgenProgressUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(WorldgenState::InProgress), spawn_loading_screen)
            .add_systems(
                Update,
                track_progress
                    .run_if(in_state(WorldgenState::InProgress))
                    .run_if(resource_exists::<WorldgenProgress>()),
            )
            .add_systems(OnEnter(WorldgenState::Failed), report_failure)
            .add_systems(OnEnter(WorldgenState::Done), despawn_loading_screen);
    }
}

const FILL_COLOR: Color = Color::rgb(0.33, 0.56, 0.3);
const FAILED_COLOR: Color = Color::rgb(0.7, 0.15, 0.15);

#[derive(Resource)]
struct LoadingScreen(Entity);

#[derive(Component, Clone, Copy, PartialEq, Eq)]
enum LoadingLine {
    Stage,
    Detail,
}

/// Inner node of the progress bar, sized to the overall percentage.
#[derive(Component)]
struct ProgressFill;

fn spawn_line(parent: &mut ChildBuilder, line: LoadingLine, font_size: f32) {
    let style = TextStyle {
        font_size,
        color: Color::WHITE,
        ..default()
    };
    parent.spawn((TextBundle::from_section("", style), line));
}

fn spawn_bar(parent: &mut ChildBuilder) {
    let track = NodeBundle {
        style: Style {
            width: Val::Percent(40.0),
            height: Val::Px(12.0),
            margin: UiRect::vertical(Val::Px(16.0)),
            ..default()
        },
        background_color: Color::DARK_GRAY.into(),
        ..default()
    };

    parent.spawn(track).with_children(|track| {
        let fill = NodeBundle {
            style: Style {
                width: Val::Percent(0.0),
                height: Val::Percent(100.0),
                ..default()
            },
            background_color: FILL_COLOR.into(),
            ..default()
        };
        track.spawn((fill, ProgressFill));
    });
}

fn spawn_loading_screen(mut commands: Commands) {
    let screen = NodeBundle {
        style: Style {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            flex_direction: FlexDirection::Column,
            align_items: AlignItems::Center,
            justify_content: JustifyContent::Center,
            ..default()
        },
        background_color: Color::BLACK.into(),
        ..default()
    };

    let entity = commands
        .spawn(screen)
        .with_children(|screen| {
            spawn_line(screen, LoadingLine::Stage, 48.0);
            spawn_bar(screen);
            spawn_line(screen, LoadingLine::Detail, 32.0);
        })
        .id();

    commands.insert_resource(LoadingScreen(entity));
}

fn set_lines(lines: &mut Query<(&LoadingLine, &mut Text)>, stage: &str, detail: String) {
    for (line, mut text) in lines.iter_mut() {
        text.sections[0].value = match line {
            LoadingLine::Stage => stage.to_owned(),
            LoadingLine::Detail => detail.clone(),
        };
    }
}

fn track_progress(
    progress: Res<WorldgenProgress>,
    mut lines: Query<(&LoadingLine, &mut Text)>,
    mut fill: Query<&mut Style, With<ProgressFill>>,
) {
    let (stage, stage_percent, total) = progress.get();
    set_lines(
        &mut lines,
        stage.message(),
        format!("{total:.0}% ({stage_percent}% of this step)"),
    );

    for mut style in &mut fill {
        style.width = Val::Percent(total);
    }
}

fn report_failure(
    mut lines: Query<(&LoadingLine, &mut Text)>,
    mut fill: Query<(&mut Style, &mut BackgroundColor), With<ProgressFill>>,
) {
    set_lines(
        &mut lines,
        "World generation failed",
        "See the log for details".into(),
    );

    for (mut style, mut color) in &mut fill {
        style.width = Val::Percent(100.0);
        *color = FAILED_COLOR.into();
    }
}

fn despawn_loading_screen(screen: Option<Res<LoadingScreen>>, mut commands: Commands) {
    if let Some(screen) = screen {
        commands.entity(screen.0).despawn_recursive();
        commands.remove_resource::<LoadingScreen>();
    }
}
