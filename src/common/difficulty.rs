//! Session difficulty.
//!
//! Chosen once before the session starts and read by the player and enemy
//! factories at creation time. Nothing in the simulation writes to it.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyPreset {
    Easy,
    Normal,
    Hard,
    Nightmare,
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    /// Extra lives on top of the first one.
    pub starting_lives: u32,
    /// HP per life.
    pub starting_hp: i32,
    pub enemy_speed_mul: f32,
    pub enemy_attack_range_mul: f32,
    /// No extra lives.
    pub hardcore: bool,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::preset(DifficultyPreset::Normal)
    }
}

impl Difficulty {
    pub fn preset(preset: DifficultyPreset) -> Self {
        match preset {
            DifficultyPreset::Easy => Self {
                starting_lives: 3,
                starting_hp: 5,
                enemy_speed_mul: 0.8,
                enemy_attack_range_mul: 1.0,
                hardcore: false,
            },
            DifficultyPreset::Normal => Self {
                starting_lives: 2,
                starting_hp: 3,
                enemy_speed_mul: 1.0,
                enemy_attack_range_mul: 1.0,
                hardcore: false,
            },
            DifficultyPreset::Hard => Self {
                starting_lives: 1,
                starting_hp: 3,
                enemy_speed_mul: 1.25,
                enemy_attack_range_mul: 1.0,
                hardcore: false,
            },
            DifficultyPreset::Nightmare => Self {
                starting_lives: 0,
                starting_hp: 3,
                enemy_speed_mul: 1.4,
                enemy_attack_range_mul: 1.5,
                hardcore: true,
            },
        }
    }

    /// Lives the player actually starts with.
    #[inline]
    pub fn effective_lives(&self) -> u32 {
        if self.hardcore { 0 } else { self.starting_lives }
    }
}
