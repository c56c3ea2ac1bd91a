//! Waves plugin: a per-spawner wave loop with an alive cap, proximity-gated spawn
//! points and a collision-clear placement search.
//!
//! ---------------------------
//! STATE MACHINE
//! ---------------------------
//! ```text
//!   Idle ──start──▶ InitialDelay ──elapsed──▶ Spawning ──spawned == count──▶ Pause ──elapsed──┐
//!                                                ▲                          (looping)         │
//!                                                └──────── counters reset to 0 ◀──────────────┘
//!                                             Spawning ──spawned == count, !looping──▶ Finished
//! ```
//! Each phase stores the time left in it; `WaveSpawner::tick` advances it once per
//! fixed step. `stop()` is valid between any two ticks and leaves the counters alone.
//!
//! ---------------------------
//! ALIVE BOOKKEEPING
//! ---------------------------
//! Every spawned enemy carries a `SpawnTicket`. The ticket reports to its owner
//! exactly once, through whichever path sees the enemy go first:
//!    - deactivation: `EnemyLifeState` leaves Alive (`report_deactivated_enemies`)
//!    - destruction: the ticket is removed with its entity (`report_destroyed_enemy`)

use avian2d::prelude::*;
use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::difficulty::Difficulty;
use crate::common::layers::{mask_of, Layer};
use crate::common::rng::SimRng;
use crate::common::spatial::SpatialProbe;
use crate::common::state::GameState;
use crate::plugins::enemies::{self, EnemyLifeState, EnemyTemplate};
use crate::plugins::player::Player;
use crate::plugins::ui::debug_hud::HudUpdate;

// -----------------------------------------------------------------------------
// Config
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub initial_delay: f32,
    pub spawn_delay: f32,
    pub spawn_count: u32,
    pub max_alive: u32,
    pub looping: bool,
    pub loop_pause: f32,

    /// A spawn point is active when the player is within this distance.
    pub activation_radius: f32,

    pub clear_radius: f32,
    pub max_placement_tries: u32,
    pub jitter_radius: f32,
    /// What a placement must not overlap.
    pub blocking_layers: Vec<Layer>,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            initial_delay: 0.25,
            spawn_delay: 0.15,
            spawn_count: 10,
            max_alive: 6,
            looping: true,
            loop_pause: 3.0,
            activation_radius: 900.0,
            clear_radius: 16.0,
            max_placement_tries: 8,
            jitter_radius: 40.0,
            blocking_layers: vec![Layer::Enemy, Layer::World],
        }
    }
}

// -----------------------------------------------------------------------------
// Spawner state machine
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WavePhase {
    Idle,
    InitialDelay { remaining: f32 },
    Spawning { cooldown: f32 },
    Pause { remaining: f32 },
    Finished,
}

/// What the spawner wants this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaveStep {
    /// Not running.
    Idle,
    /// Inside a timed wait.
    Waiting,
    /// Alive cap reached; try again next tick.
    Blocked,
    /// Try to spawn one enemy now.
    Attempt,
    /// Between waves.
    Paused { remaining: f32 },
    /// The pause just ended and the counters were reset.
    WaveStarted,
    /// The last wave just completed and the loop is over.
    Finished,
}

#[derive(Component, Debug, Clone)]
pub struct WaveSpawner {
    pub config: WaveConfig,
    pub template: Option<EnemyTemplate>,
    pub points: Vec<Vec2>,
    phase: WavePhase,
    spawned: u32,
    alive: u32,
}

impl WaveSpawner {
    pub fn new(config: WaveConfig, template: Option<EnemyTemplate>, points: Vec<Vec2>) -> Self {
        Self {
            config,
            template,
            points,
            phase: WavePhase::Idle,
            spawned: 0,
            alive: 0,
        }
    }

    #[inline]
    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    #[inline]
    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    #[inline]
    pub fn alive(&self) -> u32 {
        self.alive
    }

    #[inline]
    pub fn left_in_wave(&self) -> u32 {
        self.config.spawn_count.saturating_sub(self.spawned)
    }

    /// Begin the loop from the initial delay. No-op while already running.
    pub fn start(&mut self) {
        if matches!(self.phase, WavePhase::Idle | WavePhase::Finished) {
            self.spawned = 0;
            self.phase = WavePhase::InitialDelay {
                remaining: self.config.initial_delay,
            };
        }
    }

    /// Cancel the loop. Enemies already out keep reporting through their tickets.
    pub fn stop(&mut self) {
        self.phase = WavePhase::Idle;
    }

    pub fn tick(&mut self, dt: f32) -> WaveStep {
        match &mut self.phase {
            WavePhase::Idle | WavePhase::Finished => WaveStep::Idle,
            WavePhase::InitialDelay { remaining } => {
                *remaining -= dt;
                if *remaining > 0.0 {
                    return WaveStep::Waiting;
                }
                self.phase = WavePhase::Spawning { cooldown: 0.0 };
                self.spawn_step()
            }
            WavePhase::Spawning { cooldown } => {
                if *cooldown > 0.0 {
                    *cooldown -= dt;
                    if *cooldown > 0.0 {
                        return WaveStep::Waiting;
                    }
                }
                self.spawn_step()
            }
            WavePhase::Pause { remaining } => {
                *remaining -= dt;
                if *remaining > 0.0 {
                    return WaveStep::Paused {
                        remaining: *remaining,
                    };
                }
                self.spawned = 0;
                self.alive = 0;
                self.phase = WavePhase::Spawning { cooldown: 0.0 };
                WaveStep::WaveStarted
            }
        }
    }

    fn spawn_step(&mut self) -> WaveStep {
        if self.spawned >= self.config.spawn_count {
            return if self.config.looping {
                self.phase = WavePhase::Pause {
                    remaining: self.config.loop_pause,
                };
                WaveStep::Paused {
                    remaining: self.config.loop_pause,
                }
            } else {
                self.phase = WavePhase::Finished;
                WaveStep::Finished
            };
        }
        if self.alive >= self.config.max_alive {
            return WaveStep::Blocked;
        }
        WaveStep::Attempt
    }

    /// A spawn succeeded: count it and start the inter-spawn delay.
    pub fn record_spawn(&mut self) {
        self.spawned += 1;
        self.alive += 1;
        if let WavePhase::Spawning { cooldown } = &mut self.phase {
            *cooldown = self.config.spawn_delay;
        }
    }

    /// One spawned enemy is gone. Floors at zero.
    pub fn notify_enemy_gone(&mut self) {
        self.alive = self.alive.saturating_sub(1);
    }
}

// -----------------------------------------------------------------------------
// Spawn ticket
// -----------------------------------------------------------------------------

/// Binds a spawned enemy to the spawner that owns its alive slot.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnTicket {
    owner: Entity,
    reported: bool,
}

impl SpawnTicket {
    pub fn new(owner: Entity) -> Self {
        Self {
            owner,
            reported: false,
        }
    }

    #[inline]
    pub fn owner(&self) -> Entity {
        self.owner
    }

    #[inline]
    pub fn is_reported(&self) -> bool {
        self.reported
    }

    /// Returns the owner the first time only.
    pub fn report_gone(&mut self) -> Option<Entity> {
        if self.reported {
            return None;
        }
        self.reported = true;
        Some(self.owner)
    }
}

// -----------------------------------------------------------------------------
// Placement
// -----------------------------------------------------------------------------

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SpawnFailure {
    #[error("no enemy template configured")]
    NoTemplate,
    #[error("no spawn points configured")]
    NoSpawnPoints,
    #[error("no spawn point within activation radius")]
    NoActivePoint,
    #[error("no clear placement found")]
    NoClearPlacement,
}

/// Where and what to spawn.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub template: &'a EnemyTemplate,
    pub pos: Vec2,
}

/// Random start, then one round-robin pass for a point near the player.
/// Without a player every point is active and one is picked uniformly.
pub fn select_spawn_point(
    points: &[Vec2],
    player: Option<Vec2>,
    activation_radius: f32,
    rng: &mut impl Rng,
) -> Option<Vec2> {
    if points.is_empty() {
        return None;
    }

    let Some(player) = player else {
        return Some(points[rng.random_range(0..points.len())]);
    };

    let start = rng.random_range(0..points.len());
    let r2 = activation_radius * activation_radius;
    (0..points.len())
        .map(|i| points[(start + i) % points.len()])
        .find(|p| p.distance_squared(player) <= r2)
}

#[inline]
pub fn is_clear(probe: &impl SpatialProbe, pos: Vec2, clear_radius: f32, blocking: LayerMask) -> bool {
    blocking == LayerMask::NONE || probe.overlap_circle(pos, clear_radius, blocking).is_empty()
}

/// The point itself first, then up to `max_tries` jittered candidates around it.
pub fn find_clear_placement(
    probe: &impl SpatialProbe,
    center: Vec2,
    cfg: &WaveConfig,
    rng: &mut impl Rng,
) -> Option<Vec2> {
    let blocking = mask_of(&cfg.blocking_layers);
    if is_clear(probe, center, cfg.clear_radius, blocking) {
        return Some(center);
    }

    let jitter = cfg.jitter_radius.max(0.0);
    (0..cfg.max_placement_tries).find_map(|_| {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let r = rng.random_range(jitter * 0.3..=jitter);
        let candidate = center + Vec2::from_angle(angle) * r;
        is_clear(probe, candidate, cfg.clear_radius, blocking).then_some(candidate)
    })
}

/// One spawn attempt. Failures are not fatal; the wave loop retries next tick.
pub fn try_spawn_one<'a>(
    spawner: &'a WaveSpawner,
    probe: &impl SpatialProbe,
    player: Option<Vec2>,
    rng: &mut impl Rng,
) -> Result<Placement<'a>, SpawnFailure> {
    let template = spawner.template.as_ref().ok_or(SpawnFailure::NoTemplate)?;
    if spawner.points.is_empty() {
        return Err(SpawnFailure::NoSpawnPoints);
    }

    let point = select_spawn_point(
        &spawner.points,
        player,
        spawner.config.activation_radius,
        rng,
    )
    .ok_or(SpawnFailure::NoActivePoint)?;

    let pos = find_clear_placement(probe, point, &spawner.config, rng)
        .ok_or(SpawnFailure::NoClearPlacement)?;

    Ok(Placement { template, pos })
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

pub fn plugin(app: &mut App) {
    app.add_systems(
        FixedUpdate,
        run_wave_spawners.run_if(in_state(GameState::InGame)),
    )
    .add_systems(
        PostUpdate,
        report_deactivated_enemies
            .after(enemies::enemy_death_trigger)
            .run_if(in_state(GameState::InGame)),
    )
    .add_observer(report_destroyed_enemy);
}

#[inline]
fn wave_readout(spawner: &WaveSpawner) -> HudUpdate {
    HudUpdate::Wave {
        alive: spawner.alive(),
        left_in_wave: spawner.left_in_wave(),
    }
}

/// Advance every spawner one fixed step and spawn at most one enemy each.
pub fn run_wave_spawners(
    mut commands: Commands,
    time: Res<Time>,
    difficulty: Res<Difficulty>,
    mut rng: ResMut<SimRng>,
    spatial: SpatialQuery,
    player: Option<Single<&Transform, With<Player>>>,
    mut q: Query<(Entity, &mut WaveSpawner)>,
    mut hud: MessageWriter<HudUpdate>,
) {
    let dt = time.delta_secs();
    let player_pos = player.map(|tf| tf.translation.truncate());

    for (owner, mut spawner) in &mut q {
        match spawner.tick(dt) {
            WaveStep::Attempt => {}
            WaveStep::Paused { remaining } => {
                hud.write(HudUpdate::Countdown(Some(remaining)));
                continue;
            }
            WaveStep::WaveStarted => {
                info!("spawner {owner:?}: next wave");
                hud.write(HudUpdate::Countdown(None));
                hud.write(wave_readout(&spawner));
                continue;
            }
            WaveStep::Finished => {
                info!("spawner {owner:?}: finished");
                continue;
            }
            WaveStep::Idle | WaveStep::Waiting | WaveStep::Blocked => continue,
        }

        let enemy = match try_spawn_one(&spawner, &spatial, player_pos, &mut rng.0) {
            Ok(placement) => {
                enemies::spawn_enemy(&mut commands, placement.template, &difficulty, placement.pos)
            }
            Err(failure) => {
                debug!("spawner {owner:?}: {failure}, retrying next tick");
                continue;
            }
        };

        commands.entity(enemy).insert(SpawnTicket::new(owner));
        spawner.record_spawn();
        hud.write(wave_readout(&spawner));
        debug!(
            "spawner {owner:?}: spawned {enemy:?} ({} alive, {} left)",
            spawner.alive(),
            spawner.left_in_wave()
        );
    }
}

fn notify_owner(
    owner: Entity,
    spawners: &mut Query<&mut WaveSpawner>,
    hud: &mut MessageWriter<HudUpdate>,
) {
    // Owner may already be gone during scene teardown.
    let Ok(mut spawner) = spawners.get_mut(owner) else {
        return;
    };
    spawner.notify_enemy_gone();
    hud.write(wave_readout(&spawner));
}

/// Deactivation path: the enemy left Alive this frame.
pub fn report_deactivated_enemies(
    mut q: Query<(&EnemyLifeState, &mut SpawnTicket), Changed<EnemyLifeState>>,
    mut spawners: Query<&mut WaveSpawner>,
    mut hud: MessageWriter<HudUpdate>,
) {
    for (life, mut ticket) in &mut q {
        if life.is_alive() {
            continue;
        }
        if let Some(owner) = ticket.report_gone() {
            notify_owner(owner, &mut spawners, &mut hud);
        }
    }
}

/// Destruction path: the ticket is going away with its entity.
pub fn report_destroyed_enemy(
    remove: On<Remove, SpawnTicket>,
    q: Query<&SpawnTicket>,
    mut spawners: Query<&mut WaveSpawner>,
    mut hud: MessageWriter<HudUpdate>,
) {
    let Ok(ticket) = q.get(remove.entity) else {
        return;
    };
    if ticket.is_reported() {
        return;
    }
    notify_owner(ticket.owner(), &mut spawners, &mut hud);
}
