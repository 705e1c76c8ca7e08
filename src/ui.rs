//! Presentation state
//!
//! The renderer is an external collaborator. This module holds the text,
//! the play-again button and the `Presentation` snapshot it draws from.

use glam::Vec2;
use serde::Serialize;

use crate::game::PlayPhase;
use crate::highscores::ScoreRecord;
use crate::sim::Footprint;

pub const LOADING: &str = "Loading...";
pub const PAUSED: &str = "Game paused, tap screen to start";
pub const WON: &str = "Congratulations, you won!";
pub const LOST: &str = "Sorry, you lost. Another try maybe?";
pub const PLAY_AGAIN: &str = "Play Again";

/// Text for the name prompt, prefixed with the reason a previous attempt failed
pub fn name_prompt(error: Option<&str>) -> String {
    match error {
        Some(error) if !error.is_empty() => format!("{}, please enter your name", error),
        _ => "Please enter your name".to_string(),
    }
}

/// The results screen's play-again button, in world coordinates (y up)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayButton {
    pub center: Vec2,
    pub size: Footprint,
    pub label: &'static str,
    pub pressed: bool,
}

impl PlayButton {
    /// Centre the button on the bottom edge of a panel centred at `panel_center`
    pub fn below_panel(panel_center: Vec2, panel: Footprint, size: Footprint) -> Self {
        Self {
            center: Vec2::new(panel_center.x, panel_center.y - panel.height / 2.0),
            size,
            label: PLAY_AGAIN,
            pressed: false,
        }
    }

    /// Inclusive rectangle test
    pub fn contains(&self, point: Vec2) -> bool {
        let half = Vec2::new(self.size.width, self.size.height) / 2.0;
        let d = (point - self.center).abs();
        d.x <= half.x && d.y <= half.y
    }

    /// Press at `point`; returns whether this press landed on the button
    pub fn press(&mut self, point: Vec2) -> bool {
        let hit = self.contains(point);
        if hit {
            self.pressed = true;
        }
        hit
    }

    /// Release at `point`. Fires only when the press started on the button
    /// and ends on it.
    pub fn release(&mut self, point: Vec2) -> bool {
        let fired = self.pressed && self.contains(point);
        self.pressed = false;
        fired
    }
}

/// A body as the renderer needs it, in presentation units
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyView {
    pub position: Vec2,
    /// Radians
    pub angle: f32,
    pub footprint: Footprint,
}

/// Everything the renderer draws for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub phase: PlayPhase,
    pub paused: bool,
    pub finished: bool,
    /// Centred message, when one is showing
    pub message: Option<String>,
    /// Open name prompt
    pub prompt: Option<String>,
    pub score: i64,
    /// "Time left N" while the countdown is running
    pub clock: Option<String>,
    pub ground: Option<BodyView>,
    pub player: Option<BodyView>,
    /// Ranked rows, once a leaderboard has arrived
    pub leaderboard: Option<Vec<ScoreRecord>>,
    /// Interactive only once the leaderboard is ready
    pub play_button: Option<PlayButton>,
}
