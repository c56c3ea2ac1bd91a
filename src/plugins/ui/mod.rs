//! UI sinks. Rendering of the HUD is owned by the host; the core only pushes values.

pub mod debug_hud;
