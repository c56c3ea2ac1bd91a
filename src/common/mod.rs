//! Common, shared types.

pub mod difficulty;
pub mod layers;
pub mod rng;
pub mod spatial;
pub mod state;
pub mod tunables;

#[cfg(test)]
pub mod test_utils;
