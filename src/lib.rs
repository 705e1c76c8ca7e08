//! Tumble - runtime core of a physics-driven block arcade game
//!
//! Core modules:
//! - `sim`: Fixed-step rigid-body simulation, movement intents, contact signal
//! - `game`: Top-level game flow (identity fetch -> play -> leaderboard)
//! - `session`: Asynchronous session service plumbing and the callback bridge
//! - `input`: Pointer/control normalization into game commands
//! - `platform`: Platform events and clocks
//! - `highscores`: Local ranked-score fallback store
//! - `config`: Data-driven game configuration
//! - `audio`: Audio cue collaborator

pub mod audio;
pub mod config;
pub mod game;
pub mod highscores;
pub mod input;
pub mod platform;
pub mod session;
pub mod sim;
pub mod ui;

pub use config::GameConfig;
pub use game::{Game, PlayPhase};
pub use highscores::{LocalScoreStore, ScoreRecord};

use glam::Vec2;

/// Engine constants
pub mod consts {
    /// Fixed simulation timestep (one step per frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Solver iterations per step
    pub const VELOCITY_ITERATIONS: u32 = 6;
    pub const POSITION_ITERATIONS: u32 = 2;

    /// Presentation units (pixels) per physics meter
    pub const PIXELS_PER_METER: f32 = 100.0;
    /// Shaved off each sprite dimension before building a fixture, so resting
    /// bodies do not show a visible gap between them
    pub const FIXTURE_MARGIN: f32 = 2.0;
    /// Fixture material
    pub const FIXTURE_DENSITY: f32 = 5.0;
    pub const FIXTURE_FRICTION: f32 = 0.7;

    /// Stop intent hands over to Coast once the requested velocity is below this
    pub const STOP_THRESHOLD: f32 = 0.01;

    /// Rows shown on the leaderboard and kept by the local store
    pub const LEADERBOARD_SIZE: usize = 5;

    /// Score numerator for the decaying time score
    pub const SCORE_BASE: u64 = 1000;
}

/// Convert presentation units to meters
#[inline]
pub fn pix_to_m(pixels: f32) -> f32 {
    pixels / consts::PIXELS_PER_METER
}

/// Convert meters to presentation units
#[inline]
pub fn m_to_pix(meters: f32) -> f32 {
    meters * consts::PIXELS_PER_METER
}

/// Convert a point from presentation units to meters
#[inline]
pub fn to_meters(point: Vec2) -> Vec2 {
    point / consts::PIXELS_PER_METER
}

/// Convert a point from meters to presentation units
#[inline]
pub fn to_pixels(point: Vec2) -> Vec2 {
    point * consts::PIXELS_PER_METER
}
