//! Health plugin: HP/lives bookkeeping, I-frames and the terminal Defeated state.
//!
//! Damage is intent, not a direct write. Weapons, projectiles and enemy contact
//! attacks write `DamageRequest` messages; `apply_damage_requests` is the single
//! writer of `PlayerHealth` / `EnemyHealth`.
//!
//! ```text
//!   Alive ──damage, hp>0──────────────▶ Invulnerable ──timer elapsed──▶ Alive
//!     │                                     ▲
//!     └──damage, hp==0, lives>0 (Depleted)──┘   lives -= 1, hp = max
//!     └──damage, hp==0, lives==0──────────▶ Defeated (terminal)
//! ```

use bevy::prelude::*;
use bevy::time::Virtual;

use crate::common::state::GameState;
use crate::plugins::ui::debug_hud::HudUpdate;

// -----------------------------------------------------------------------------
// Pure model
// -----------------------------------------------------------------------------

/// Observable phase of a `HealthState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthPhase {
    Alive,
    Invulnerable,
    Defeated,
}

/// What a single `apply_damage` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Invalid amount, I-frames active, or already defeated.
    Ignored,
    /// HP dropped but stayed above zero.
    Hurt,
    /// HP hit zero and a life was spent to refill it.
    LifeLost,
    /// HP hit zero with no lives left. Returned once per state.
    Defeated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthState {
    hp: i32,
    max_hp: i32,
    lives: u32,
    invulnerable_remaining: f32,
    invulnerable_secs: f32,
    defeated: bool,
}

impl HealthState {
    pub const DEFAULT_INVULNERABLE_SECS: f32 = 0.75;

    pub fn new(max_hp: i32, lives: u32, invulnerable_secs: f32) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            hp: max_hp,
            max_hp,
            lives,
            invulnerable_remaining: 0.0,
            invulnerable_secs: invulnerable_secs.max(0.0),
            defeated: false,
        }
    }

    #[inline]
    pub fn hp(&self) -> i32 {
        self.hp
    }

    #[inline]
    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    #[inline]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_remaining > 0.0
    }

    #[inline]
    pub fn invulnerable_remaining(&self) -> f32 {
        self.invulnerable_remaining
    }

    #[inline]
    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    pub fn phase(&self) -> HealthPhase {
        if self.defeated {
            HealthPhase::Defeated
        } else if self.is_invulnerable() {
            HealthPhase::Invulnerable
        } else {
            HealthPhase::Alive
        }
    }

    pub fn apply_damage(&mut self, amount: i32) -> DamageOutcome {
        if self.defeated || self.is_invulnerable() || amount <= 0 {
            return DamageOutcome::Ignored;
        }

        self.hp = (self.hp - amount).max(0);

        if self.hp > 0 {
            self.start_invulnerability();
            return DamageOutcome::Hurt;
        }

        if self.lives > 0 {
            self.lives -= 1;
            self.hp = self.max_hp;
            self.start_invulnerability();
            DamageOutcome::LifeLost
        } else {
            self.defeated = true;
            self.invulnerable_remaining = 0.0;
            DamageOutcome::Defeated
        }
    }

    /// Count I-frames down. Back to Alive once the window has elapsed.
    pub fn tick(&mut self, dt: f32) {
        if self.invulnerable_remaining > 0.0 {
            self.invulnerable_remaining = (self.invulnerable_remaining - dt).max(0.0);
        }
    }

    fn start_invulnerability(&mut self) {
        self.invulnerable_remaining = self.invulnerable_secs;
    }
}

// -----------------------------------------------------------------------------
// Components / resources / messages
// -----------------------------------------------------------------------------

/// Player-style health: HP per life, lives, I-frames.
#[derive(Component, Debug, Clone, Deref, DerefMut)]
pub struct PlayerHealth(pub HealthState);

/// Enemy health: a single HP pool, no lives, no I-frames.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyHealth {
    pub hp: i32,
}

impl EnemyHealth {
    /// Returns true when this hit took the pool from positive to empty.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        if amount <= 0 || self.hp <= 0 {
            return false;
        }
        self.hp = (self.hp - amount).max(0);
        self.hp == 0
    }

    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.hp <= 0
    }
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRequest {
    pub target: Entity,
    pub amount: i32,
}

/// Fired once, when the player reaches the Defeated state.
#[derive(Message, Debug, Clone, Copy)]
pub struct GameOver {
    pub player: Entity,
}

/// Session controller.
#[derive(Resource, Debug, Default)]
pub struct Session {
    game_over: bool,
}

impl Session {
    /// Returns true only for the first call.
    pub fn trigger_game_over(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        self.game_over = true;
        true
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

/// Damage runs in PostUpdate so it sees requests from both Update producers
/// (weapons) and fixed-step producers (contact attacks, projectiles).
pub fn plugin(app: &mut App) {
    app.init_resource::<Session>()
        .add_message::<DamageRequest>()
        .add_message::<GameOver>()
        .add_systems(
            Update,
            tick_invulnerability.run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            PostUpdate,
            apply_damage_requests.run_if(in_state(GameState::InGame)),
        );
}

pub fn tick_invulnerability(time: Res<Time>, mut q: Query<&mut PlayerHealth>) {
    let dt = time.delta_secs();
    for mut health in &mut q {
        if health.is_invulnerable() {
            health.tick(dt);
        }
    }
}

/// Single writer of health. Unknown targets (already despawned, no health
/// component) are skipped.
pub fn apply_damage_requests(
    mut requests: MessageReader<DamageRequest>,
    mut q_player: Query<&mut PlayerHealth>,
    mut q_enemy: Query<&mut EnemyHealth>,
    mut session: ResMut<Session>,
    mut virtual_time: ResMut<Time<Virtual>>,
    mut hud: MessageWriter<HudUpdate>,
    mut game_over: MessageWriter<GameOver>,
) {
    for req in requests.read() {
        if let Ok(mut health) = q_player.get_mut(req.target) {
            let outcome = health.apply_damage(req.amount);
            if outcome == DamageOutcome::Ignored {
                continue;
            }

            hud.write(HudUpdate::Health {
                lives: health.lives(),
                hp: health.hp(),
                max_hp: health.max_hp(),
            });

            match outcome {
                DamageOutcome::LifeLost => {
                    info!("player lost a life, {} left", health.lives());
                }
                DamageOutcome::Defeated => {
                    if session.trigger_game_over() {
                        info!("player defeated: game over");
                        virtual_time.pause();
                        game_over.write(GameOver { player: req.target });
                    }
                }
                _ => {}
            }
            continue;
        }

        if let Ok(mut health) = q_enemy.get_mut(req.target) {
            if health.apply_damage(req.amount) {
                debug!("enemy {:?} depleted", req.target);
            }
        }
    }
}
