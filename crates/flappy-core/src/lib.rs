//! # flappy-core
//!
//! Game logic for Flappy Mona, the badge's flappy-bird clone:
//!
//! - **Mona**: player physics (gravity, jump impulse), collision, scoring
//! - **Obstacles**: timed spawning, scrolling, off-screen removal
//! - **Autopilot**: the rule-based pilot that plays demo mode
//! - **Leaderboard**: top-10 score table over a pluggable byte store
//! - **Session**: the INTRO → PLAYING → GAME_OVER state machine
//!
//! Everything here is hardware-free and runs one update per tick against a
//! monotonic millisecond clock supplied by the caller. The firmware crate
//! owns the display, buttons, and flash; this crate owns the rules.

#![no_std]

extern crate alloc;

pub mod autopilot;
pub mod leaderboard;
pub mod mona;
pub mod obstacle;
pub mod rng;
pub mod session;

pub use autopilot::Autopilot;
pub use leaderboard::{Entry, Leaderboard, PlayerKind, ScoreStore};
pub use mona::Mona;
pub use obstacle::{Obstacle, ObstacleField};
pub use session::{Controls, Phase, Session};

/// Playfield width in pixels (the full display width).
pub const PLAYFIELD_W: f32 = 320.0;

/// Bottom of the playable area (the grass line). Mona dies on contact.
pub const GROUND_Y: f32 = 150.0;
