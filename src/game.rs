//! Top-level game flow
//!
//! ```text
//! FetchingIdentity --named--> Playing (paused) <--> running
//!        ^  |                     |
//!        |  anonymous: prompt     | fell off / countdown over
//!        +--submit name           v
//!                          ShowingResults --play again--> Playing (running)
//! ```
//!
//! One `frame` drains platform events, then session replies, then advances
//! physics by a single fixed step. Nothing else mutates the world.

use std::rc::Rc;
use std::time::Duration;

use glam::Vec2;
use serde::Serialize;
use thiserror::Error;

use crate::audio::{AudioSink, SoundEffect};
use crate::config::GameConfig;
use crate::consts::{POSITION_ITERATIONS, SCORE_BASE, SIM_DT, VELOCITY_ITERATIONS};
use crate::highscores::ScoreRecord;
use crate::input::{self, Command};
use crate::platform::{Clock, PlatformEvent};
use crate::session::{IdentityOutcome, SessionBridge, SessionError, SessionUpdate};
use crate::sim::{
    Axis, DynamicBody, Dynamics, ImpactSignal, Movement, PhysicsError, PhysicsWorld, SimBody,
    Transform,
};
use crate::ui::{self, BodyView, PlayButton, Presentation};

#[derive(Debug, Error)]
pub enum GameError {
    #[error("physics world rejected a request: {0}")]
    Physics(#[from] PhysicsError),
}

/// Top-level phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayPhase {
    FetchingIdentity,
    Playing,
    ShowingResults,
}

/// Decaying score: faster rounds score higher
pub fn score_for(elapsed_secs: u64) -> i64 {
    (SCORE_BASE / (elapsed_secs + 1)) as i64
}

/// Log a broken session contract; fatal in debug builds
fn contract_violation(what: &dyn std::fmt::Display) {
    log::error!("Contract violation: {}", what);
    debug_assert!(false, "contract violation: {}", what);
}

fn check_session(result: Result<(), SessionError>) {
    if let Err(e) = result {
        contract_violation(&e);
    }
}

pub struct Game {
    config: GameConfig,
    world: Box<dyn PhysicsWorld>,
    session: SessionBridge,
    audio: Rc<dyn AudioSink>,
    clock: Box<dyn Clock>,

    ground: SimBody,
    player: DynamicBody,
    player_name: Option<String>,

    phase: PlayPhase,
    paused: bool,
    finished: bool,
    running: bool,

    message: String,
    prompt: Option<String>,

    score: i64,
    /// Play time counted so far, excluding pauses
    elapsed: Duration,
    /// Clock reading the next update counts from
    resumed_at: Duration,
    show_clock: bool,

    leaderboard: Vec<ScoreRecord>,
    leaderboard_ready: bool,
    play_button: PlayButton,
}

impl Game {
    /// Build the scene and start fetching the user's identity
    pub fn new(
        config: GameConfig,
        mut world: Box<dyn PhysicsWorld>,
        session: SessionBridge,
        audio: Rc<dyn AudioSink>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, GameError> {
        world.set_contact_listener(Box::new(ImpactSignal::new(audio.clone())));

        let ground_footprint = config.ground();
        let mut ground = SimBody::new(ground_footprint);
        ground.create_body(
            world.as_mut(),
            Vec2::new(config.scene_width / 2.0, ground_footprint.height / 2.0),
            Dynamics::Static,
        );
        ground.create_fixture_from_sprite(world.as_mut())?;

        let mut player = DynamicBody::new(config.player, config.movement);
        player.spawn(world.as_mut(), config.spawn_point())?;

        let scene_center = Vec2::new(config.scene_width / 2.0, config.scene_height / 2.0);
        let play_button =
            PlayButton::below_panel(scene_center, config.leaderboard_panel, config.play_button);
        let resumed_at = clock.now();

        let mut game = Self {
            config,
            world,
            session,
            audio,
            clock,
            ground,
            player,
            player_name: None,
            phase: PlayPhase::FetchingIdentity,
            paused: false,
            finished: false,
            running: true,
            message: ui::LOADING.to_string(),
            prompt: None,
            score: score_for(0),
            elapsed: Duration::ZERO,
            resumed_at,
            show_clock: false,
            leaderboard: Vec::new(),
            leaderboard_ready: false,
            play_button,
        };

        game.audio.play(SoundEffect::MusicStart);
        check_session(game.session.fetch_identity());
        Ok(game)
    }

    pub fn phase(&self) -> PlayPhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// False once the platform asked to exit
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    pub fn leaderboard(&self) -> Option<&[ScoreRecord]> {
        self.leaderboard_ready.then_some(self.leaderboard.as_slice())
    }

    pub fn play_button(&self) -> &PlayButton {
        &self.play_button
    }

    pub fn movement(&self, axis: Axis) -> Movement {
        self.player.intent().get(axis)
    }

    pub fn player_transform(&self) -> Option<Transform> {
        self.player.transform(self.world.as_ref())
    }

    pub fn player_velocity(&self) -> Option<Vec2> {
        self.player.linear_velocity(self.world.as_ref())
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Run one frame: platform events, then session replies, then one step
    pub fn frame(
        &mut self,
        events: impl IntoIterator<Item = PlatformEvent>,
    ) -> Result<(), GameError> {
        for event in events {
            self.handle_event(event)?;
        }

        for update in self.session.drain() {
            match update {
                Ok(update) => self.apply_session(update),
                Err(e) => contract_violation(&e),
            }
        }

        self.update()
    }

    pub fn handle_event(&mut self, event: PlatformEvent) -> Result<(), GameError> {
        match event {
            PlatformEvent::Input(event) => {
                if let Some(command) = input::translate(event, self.config.scene_height) {
                    self.handle_command(command)?;
                }
            }
            PlatformEvent::Suspend => self.suspend(),
            PlatformEvent::Resume => self.resume(),
            PlatformEvent::Exit => {
                log::info!("Exit requested");
                self.running = false;
            }
            PlatformEvent::PromptSubmitted(name) => self.submit_name(&name),
        }
        Ok(())
    }

    fn handle_command(&mut self, command: Command) -> Result<(), GameError> {
        let results_ready = self.phase == PlayPhase::ShowingResults && self.leaderboard_ready;

        match command {
            Command::Press(point) if results_ready => {
                if self.play_button.press(point) {
                    self.audio.play(SoundEffect::Click);
                }
            }
            Command::Release(point) if results_ready => {
                if self.play_button.release(point) {
                    self.reset()?;
                }
            }
            Command::Primary { pressed: true } if results_ready => {
                self.play_button.pressed = true;
                self.audio.play(SoundEffect::Click);
            }
            Command::Primary { pressed: false } if results_ready => {
                if std::mem::take(&mut self.play_button.pressed) {
                    self.reset()?;
                }
            }
            _ if self.phase != PlayPhase::Playing => {}

            Command::Release(_) if self.paused => self.unpause(),
            Command::TogglePause => {
                if self.paused {
                    self.unpause();
                } else {
                    self.pause();
                }
            }
            Command::Steer { axis, movement } => self.player.set_axis_movement(axis, movement),
            Command::Primary { pressed: true } if !self.paused => {
                self.player
                    .set_axis_movement(Axis::Vertical, Movement::PositiveBurst);
            }
            _ => {}
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.phase == PlayPhase::Playing && !self.paused {
            log::info!("Paused");
            self.paused = true;
            self.message = ui::PAUSED.to_string();
        }
    }

    fn unpause(&mut self) {
        if self.paused {
            log::info!("Unpaused");
            self.paused = false;
            // Time spent paused does not count against the player
            self.resumed_at = self.clock.now();
            self.audio.play(SoundEffect::Click);
        }
    }

    /// App lost focus
    pub fn suspend(&mut self) {
        self.pause();
        self.audio.play(SoundEffect::MusicPause);
    }

    /// App is visible again
    pub fn resume(&mut self) {
        self.unpause();
        self.audio.play(SoundEffect::MusicStart);
    }

    fn submit_name(&mut self, name: &str) {
        if self.prompt.take().is_none() {
            contract_violation(&"name submitted with no prompt open");
            return;
        }
        check_session(self.session.submit_user_name(name));
    }

    fn apply_session(&mut self, update: SessionUpdate) {
        match update {
            SessionUpdate::IdentityResolved(outcome) => self.on_identity(outcome),
            SessionUpdate::ScoreSubmitted => check_session(self.session.fetch_leaderboard()),
            SessionUpdate::LeaderboardLoaded(rows) => {
                log::info!("Leaderboard ready ({} rows)", rows.len());
                self.leaderboard = rows;
                self.leaderboard_ready = true;
            }
        }
    }

    fn on_identity(&mut self, outcome: IdentityOutcome) {
        if self.phase != PlayPhase::FetchingIdentity {
            log::warn!("Ignoring identity outside of the identity phase");
            return;
        }

        if outcome.anonymous {
            self.prompt = Some(ui::name_prompt(outcome.error.as_deref()));
            return;
        }

        log::info!("Playing as '{}'", outcome.name);
        self.player_name = Some(outcome.name);
        self.phase = PlayPhase::Playing;
        self.paused = true;
        self.finished = false;
        self.message = ui::PAUSED.to_string();
        self.start_round_clock();
    }

    fn start_round_clock(&mut self) {
        self.show_clock = self.config.countdown_secs.is_some();
        self.elapsed = Duration::ZERO;
        self.resumed_at = self.clock.now();
        self.score = score_for(0);
    }

    /// One simulation step while playing and running
    fn update(&mut self) -> Result<(), GameError> {
        if self.phase != PlayPhase::Playing || self.paused || self.finished {
            return Ok(());
        }

        self.player.apply_impulses(self.world.as_mut())?;
        self.world
            .step(SIM_DT, VELOCITY_ITERATIONS, POSITION_ITERATIONS);

        let now = self.clock.now();
        self.elapsed += now.saturating_sub(self.resumed_at);
        self.resumed_at = now;
        let secs = self.elapsed.as_secs();

        match self.config.countdown_secs {
            Some(limit) if secs >= limit => {
                self.end_play(true);
                return Ok(());
            }
            Some(_) => {}
            None => self.score = score_for(secs),
        }

        if let Some(t) = self.player.transform(self.world.as_ref())
            && t.position.y < -self.player.body().height()
        {
            self.end_play(false);
        }
        Ok(())
    }

    fn end_play(&mut self, win: bool) {
        self.finished = true;
        self.phase = PlayPhase::ShowingResults;
        self.leaderboard_ready = false;
        self.play_button.pressed = false;

        if win {
            log::info!("Round won with score {}", self.score);
            self.message = ui::WON.to_string();
            check_session(self.session.submit_score(self.score));
        } else {
            log::info!("Round lost after {}s", self.elapsed.as_secs());
            self.message = ui::LOST.to_string();
            check_session(self.session.fetch_leaderboard());
        }
    }

    /// Start a fresh round: new player body, running, clock cleared
    pub fn reset(&mut self) -> Result<(), GameError> {
        self.player.spawn(self.world.as_mut(), self.config.spawn_point())?;

        self.phase = PlayPhase::Playing;
        self.paused = false;
        self.finished = false;
        self.leaderboard_ready = false;
        self.play_button.pressed = false;
        self.start_round_clock();

        log::info!("Round reset");
        Ok(())
    }

    fn clock_text(&self) -> Option<String> {
        let limit = self.config.countdown_secs?;
        self.show_clock.then(|| {
            let left = limit.saturating_sub(self.elapsed.as_secs() + 1);
            format!("Time left {}", left)
        })
    }

    pub fn presentation(&self) -> Presentation {
        let view = |body: &SimBody| {
            body.transform(self.world.as_ref()).map(|t| BodyView {
                position: t.position,
                angle: t.angle,
                footprint: body.footprint(),
            })
        };
        let running = self.phase == PlayPhase::Playing && !self.paused;

        Presentation {
            phase: self.phase,
            paused: self.paused,
            finished: self.finished,
            message: (!running).then(|| self.message.clone()),
            prompt: self.prompt.clone(),
            score: self.score,
            clock: self.clock_text(),
            ground: view(&self.ground),
            player: view(self.player.body()),
            leaderboard: self.leaderboard().map(<[ScoreRecord]>::to_vec),
            play_button: self
                .leaderboard_ready
                .then(|| self.play_button.clone()),
        }
    }
}
