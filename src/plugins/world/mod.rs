//! World plugin: arena walls, cover pillars, the floor grid and the wave spawner.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy_firefly::prelude::Occluder2d;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::enemies::EnemyTemplate;
use crate::plugins::waves::{WaveConfig, WaveSpawner};

const TILE: i32 = 64;
const HALF_W: i32 = TILE * 16;
const HALF_H: i32 = TILE * 9;

const PILLAR_SIZE: f32 = 64.0;
const PILLARS: [Vec2; 4] = [
    Vec2::new(-400.0, 200.0),
    Vec2::new(400.0, 200.0),
    Vec2::new(-400.0, -200.0),
    Vec2::new(400.0, -200.0),
];

/// Corners and edge midpoints, all within the default activation radius of the
/// player's start position.
const SPAWN_POINTS: [Vec2; 6] = [
    Vec2::new(-700.0, 400.0),
    Vec2::new(700.0, 400.0),
    Vec2::new(-700.0, -400.0),
    Vec2::new(700.0, -400.0),
    Vec2::new(0.0, 450.0),
    Vec2::new(0.0, -450.0),
];

pub fn plugin(app: &mut App) {
    app.add_systems(
        OnEnter(GameState::InGame),
        (spawn_arena, spawn_floor, spawn_wave_spawner),
    );
}

#[inline]
fn world_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::World,
        [
            Layer::Player,
            Layer::Enemy,
            Layer::PlayerBullet,
            Layer::EnemyBullet,
        ],
    )
}

fn spawn_arena(mut commands: Commands) {
    let wall_color = Color::srgb(0.25, 0.27, 0.33);
    let thickness = 30.0;

    let mut spawn_block = |name: String, pos: Vec3, size: Vec2| {
        commands.spawn((
            Name::new(name),
            Sprite {
                color: wall_color,
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(pos),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            world_layers(),
            Occluder2d::rectangle(size.x, size.y),
            DespawnOnExit(GameState::InGame),
        ));
    };

    spawn_block(
        "WallTop".into(),
        Vec3::new(0.0, HALF_H as f32 + thickness * 0.5, 0.0),
        Vec2::new(HALF_W as f32 * 2.0 + thickness * 2.0, thickness),
    );
    spawn_block(
        "WallBottom".into(),
        Vec3::new(0.0, -HALF_H as f32 - thickness * 0.5, 0.0),
        Vec2::new(HALF_W as f32 * 2.0 + thickness * 2.0, thickness),
    );
    spawn_block(
        "WallLeft".into(),
        Vec3::new(-HALF_W as f32 - thickness * 0.5, 0.0, 0.0),
        Vec2::new(thickness, HALF_H as f32 * 2.0),
    );
    spawn_block(
        "WallRight".into(),
        Vec3::new(HALF_W as f32 + thickness * 0.5, 0.0, 0.0),
        Vec2::new(thickness, HALF_H as f32 * 2.0),
    );

    for (i, p) in PILLARS.iter().enumerate() {
        spawn_block(
            format!("Pillar{i}"),
            p.extend(0.5),
            Vec2::splat(PILLAR_SIZE),
        );
    }
}

/// Checkerboard of solid-color sprites; the project ships no assets.
fn spawn_floor(mut commands: Commands) {
    (-(HALF_H / TILE)..=HALF_H / TILE)
        .flat_map(|y| (-(HALF_W / TILE)..=HALF_W / TILE).map(move |x| (x, y)))
        .for_each(|(x, y)| {
            let world_pos = Vec3::new(x as f32 * TILE as f32, y as f32 * TILE as f32, 0.0);
            let color = if (x + y) % 2 == 0 {
                Color::srgb(0.14, 0.14, 0.16)
            } else {
                Color::srgb(0.12, 0.12, 0.14)
            };

            commands.spawn((
                Sprite::from_color(color, Vec2::splat(TILE as f32)),
                Transform::from_translation(world_pos),
                DespawnOnExit(GameState::InGame),
            ));
        });
}

fn spawn_wave_spawner(mut commands: Commands) {
    let mut spawner = WaveSpawner::new(
        WaveConfig::default(),
        Some(EnemyTemplate::default()),
        SPAWN_POINTS.to_vec(),
    );
    spawner.start();

    let e = commands
        .spawn((
            Name::new("WaveSpawner"),
            spawner,
            DespawnOnExit(GameState::InGame),
        ))
        .id();
    debug!("wave spawner {e:?} started with {} points", SPAWN_POINTS.len());
}
