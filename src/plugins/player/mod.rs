//! Player plugin.
//!
//! Pipeline:
//! - OnEnter(InGame): spawn the player with its capabilities (health, mover, weapon holder)
//! - Update: sample movement input, aim at the cursor, read fire/switch input
//! - FixedUpdate: apply velocity to the kinematic rigid body
//! - PostUpdate: once health reports Defeated, movement and weapons go inert
//!
//! API note (Bevy >= 0.18):
//! - Prefer the `Single` SystemParam (and `Option<Single<...>>`) for single-entity access.
//!   `Single` fails validation if 0 or >1 entities match, and `Option<Single>` lets you
//!   explicitly handle the "missing" case without panics.
//! - Input resources are read through `Option<Res<...>>` so headless apps without an
//!   input plugin simply skip these systems' work.

use avian2d::prelude::*;
use bevy::input::mouse::AccumulatedMouseScroll;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::difficulty::Difficulty;
use crate::common::{layers::Layer, state::GameState, tunables::Tunables};
use crate::plugins::camera::MainCamera;
use crate::plugins::health::{self, HealthState, PlayerHealth};
use crate::plugins::ui::debug_hud::HudUpdate;
use crate::plugins::weapons::{PlayerLoadout, WeaponHolder};

pub const PLAYER_RADIUS: f32 = 13.0;

/// Cursor movements shorter than this leave the aim unchanged.
const AIM_MIN_DISTANCE: f32 = 0.01;

#[derive(Component, Debug, Clone, Copy)]
pub struct Player;

/// Movement capability. Disabled for good once the player is defeated.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mover {
    pub enabled: bool,
}

impl Default for Mover {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Normalized aim. Starts along +X.
#[derive(Component, Debug, Clone, Copy, PartialEq, Deref)]
pub struct AimDirection(pub Vec2);

impl Default for AimDirection {
    fn default() -> Self {
        Self(Vec2::X)
    }
}

#[derive(Resource, Default, Debug)]
struct PlayerInput {
    move_axis: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponSwitch {
    Next,
    Prev,
    Slot(usize),
}

const SLOT_KEYS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

pub fn plugin(app: &mut App) {
    app.insert_resource(PlayerInput::default())
        .add_systems(OnEnter(GameState::InGame), spawn)
        .add_systems(
            Update,
            (gather_input, update_aim, read_weapon_input).run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedUpdate,
            apply_movement.run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            PostUpdate,
            disable_on_defeat
                .after(health::apply_damage_requests)
                .run_if(in_state(GameState::InGame)),
        );
}

/// Player factory. Starting lives and HP come from the session's difficulty.
pub fn spawn_player(
    commands: &mut Commands,
    difficulty: &Difficulty,
    holder: WeaponHolder,
    pos: Vec2,
) -> Entity {
    let layers = CollisionLayers::new(
        Layer::Player,
        [Layer::World, Layer::Enemy, Layer::EnemyBullet],
    );

    commands
        .spawn((
            Name::new("Player"),
            Player,
            PlayerHealth(HealthState::new(
                difficulty.starting_hp,
                difficulty.effective_lives(),
                HealthState::DEFAULT_INVULNERABLE_SECS,
            )),
            Mover::default(),
            AimDirection::default(),
            holder,
            Sprite {
                color: Color::srgb(0.2, 0.75, 0.9),
                custom_size: Some(Vec2::splat(PLAYER_RADIUS * 2.0)),
                ..default()
            },
            Transform::from_translation(pos.extend(1.0)),
            RigidBody::Kinematic,
            Collider::circle(PLAYER_RADIUS),
            layers,
            LinearVelocity::ZERO,
            DespawnOnExit(GameState::InGame),
        ))
        .id()
}

fn spawn(
    mut commands: Commands,
    difficulty: Res<Difficulty>,
    loadout: Res<PlayerLoadout>,
    mut hud: MessageWriter<HudUpdate>,
) {
    let holder = WeaponHolder::new(loadout.0.clone());
    let weapon = holder.current().map(|w| w.name.clone());

    let e = spawn_player(&mut commands, &difficulty, holder, Vec2::ZERO);
    info!(
        "player {e:?} spawned: {} HP, {} lives",
        difficulty.starting_hp,
        difficulty.effective_lives()
    );

    hud.write(HudUpdate::Health {
        lives: difficulty.effective_lives(),
        hp: difficulty.starting_hp.max(1),
        max_hp: difficulty.starting_hp.max(1),
    });
    if let Some(name) = weapon {
        hud.write(HudUpdate::Weapon { name });
    }
}

fn gather_input(keys: Option<Res<ButtonInput<KeyCode>>>, mut input: ResMut<PlayerInput>) {
    let Some(keys) = keys else {
        return;
    };
    let mut axis = Vec2::ZERO;

    if keys.pressed(KeyCode::KeyW) {
        axis.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        axis.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        axis.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        axis.x += 1.0;
    }

    input.move_axis = axis.normalize_or_zero();
}

/// New aim from the player towards `target`, or `None` when they nearly coincide.
pub fn aim_towards(from: Vec2, target: Vec2) -> Option<Vec2> {
    let v = target - from;
    (v.length() > AIM_MIN_DISTANCE).then(|| v.normalize())
}

fn update_aim(
    windows: Query<&Window>,
    q_camera: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    player: Option<Single<(&Transform, &mut AimDirection), With<Player>>>,
) {
    let Some(mut player) = player else {
        return;
    };
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_tf)) = q_camera.single() else {
        return;
    };
    let Ok(world_cursor) = camera.viewport_to_world_2d(camera_tf, cursor) else {
        return;
    };

    let (tf, aim) = &mut *player;
    if let Some(dir) = aim_towards(tf.translation.truncate(), world_cursor) {
        aim.0 = dir;
    }
}

/// E / wheel up = next, Q / wheel down = previous, 1..9 = direct slot.
pub fn weapon_switch(keys: &ButtonInput<KeyCode>, scroll_y: f32) -> Option<WeaponSwitch> {
    if let Some(slot) = SLOT_KEYS.iter().position(|k| keys.just_pressed(*k)) {
        return Some(WeaponSwitch::Slot(slot));
    }
    if keys.just_pressed(KeyCode::KeyE) || scroll_y > 0.0 {
        return Some(WeaponSwitch::Next);
    }
    if keys.just_pressed(KeyCode::KeyQ) || scroll_y < 0.0 {
        return Some(WeaponSwitch::Prev);
    }
    None
}

/// Held fire button plus slot switching. Every switch pushes the new weapon name.
pub fn read_weapon_input(
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    keys: Option<Res<ButtonInput<KeyCode>>>,
    scroll: Option<Res<AccumulatedMouseScroll>>,
    holder: Option<Single<&mut WeaponHolder, With<Player>>>,
    mut hud: MessageWriter<HudUpdate>,
) {
    let Some(mut holder) = holder else {
        return;
    };
    if !holder.enabled {
        return;
    }

    holder.firing = buttons.is_some_and(|b| b.pressed(MouseButton::Left));

    let Some(keys) = keys else {
        return;
    };
    let scroll_y = scroll.map_or(0.0, |s| s.delta.y);
    let Some(switch) = weapon_switch(&keys, scroll_y) else {
        return;
    };

    match switch {
        WeaponSwitch::Next => holder.next(),
        WeaponSwitch::Prev => holder.prev(),
        WeaponSwitch::Slot(i) => holder.select(i),
    }
    if let Some(name) = holder.current().map(|w| w.name.clone()) {
        info!("weapon: {name}");
        hud.write(HudUpdate::Weapon { name });
    }
}

fn apply_movement(
    tunables: Res<Tunables>,
    input: Res<PlayerInput>,
    player: Option<Single<(&Mover, &mut LinearVelocity), With<Player>>>,
) {
    let Some(mut player) = player else {
        return;
    };
    let (mover, vel) = &mut *player;
    vel.0 = if mover.enabled {
        input.move_axis * tunables.player_speed
    } else {
        Vec2::ZERO
    };
}

/// Defeated is terminal: movement and weapons stop for good.
pub fn disable_on_defeat(
    mut q: Query<
        (&PlayerHealth, &mut Mover, &mut WeaponHolder, &mut LinearVelocity),
        Changed<PlayerHealth>,
    >,
) {
    for (health, mut mover, mut holder, mut vel) in &mut q {
        if !health.is_defeated() || !mover.enabled {
            continue;
        }
        mover.enabled = false;
        holder.disable();
        vel.0 = Vec2::ZERO;
        info!("player defeated: movement and weapons disabled");
    }
}
