//! Debug HUD: the display sink for player and wave readouts.
//!
//! Producers push `HudUpdate` messages (pure push, no acknowledgment). This
//! plugin folds them into `HudReadout`, which a text overlay or a test can read.

use bevy::prelude::*;

#[derive(Message, Debug, Clone, PartialEq)]
pub enum HudUpdate {
    Health { lives: u32, hp: i32, max_hp: i32 },
    Wave { alive: u32, left_in_wave: u32 },
    /// Seconds until the next wave; `None` hides the countdown.
    Countdown(Option<f32>),
    Weapon { name: String },
}

#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct HudReadout {
    pub lives: Option<u32>,
    pub hp: Option<(i32, i32)>,
    pub alive: Option<u32>,
    pub left_in_wave: Option<u32>,
    pub countdown: Option<f32>,
    pub weapon: Option<String>,
}

impl HudReadout {
    pub fn apply(&mut self, update: HudUpdate) {
        match update {
            HudUpdate::Health { lives, hp, max_hp } => {
                self.lives = Some(lives);
                self.hp = Some((hp, max_hp));
            }
            HudUpdate::Wave { alive, left_in_wave } => {
                self.alive = Some(alive);
                self.left_in_wave = Some(left_in_wave);
            }
            HudUpdate::Countdown(secs) => self.countdown = secs,
            HudUpdate::Weapon { name } => self.weapon = Some(name),
        }
    }

    /// "Lives: 2  HP: 3/3  Alive: 4  Left: 6".
    pub fn status_line(&self) -> String {
        let lives = self.lives.map_or("--".to_string(), |l| l.to_string());
        let hp = self
            .hp
            .map_or("--/--".to_string(), |(now, max)| format!("{now}/{max}"));
        let alive = self.alive.map_or("--".to_string(), |a| a.to_string());
        let left = self.left_in_wave.map_or("--".to_string(), |l| l.to_string());
        let mut line = format!("Lives: {lives}  HP: {hp}  Alive: {alive}  Left: {left}");
        if let Some(weapon) = &self.weapon {
            line.push_str(&format!("  Weapon: {weapon}"));
        }
        if let Some(secs) = self.countdown {
            line.push_str(&format!("  Next wave: {:.0}", secs.ceil()));
        }
        line
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<HudReadout>()
        .add_message::<HudUpdate>()
        .add_systems(Last, collect_hud_updates);
}

fn collect_hud_updates(mut reader: MessageReader<HudUpdate>, mut readout: ResMut<HudReadout>) {
    let mut changed = false;
    for update in reader.read() {
        readout.apply(update.clone());
        changed = true;
    }
    if changed {
        debug!("hud: {}", readout.status_line());
    }
}
