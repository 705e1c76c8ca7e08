//! Tumble headless runner
//!
//! Plays a few scripted rounds against the offline session service and logs
//! what a renderer would show. Set `RUST_LOG=debug` to see audio cues.
//!
//! Usage: `tumble [--realtime] [config.json]`

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};

use tumble::audio::{AudioSink, LogAudio, SilentAudio};
use tumble::consts::SIM_DT;
use tumble::input::{Control, InputEvent};
use tumble::platform::{Clock, ManualClock, PlatformEvent, SystemClock};
use tumble::session::{OfflineSession, SessionBridge};
use tumble::sim::BoxWorld;
use tumble::ui::Presentation;
use tumble::{Game, GameConfig, LocalScoreStore, PlayPhase};

/// Rounds the autopilot plays before asking to exit
const ROUNDS: u32 = 3;
/// Give up after ten minutes of frames
const MAX_FRAMES: u64 = 60 * 60 * 10;
/// Config read when no path is given
const DEFAULT_CONFIG: &str = "tumble.json";

/// Names tried at the prompt, in order; the first two get rejected
static NAMES: [&str; 3] = ["ab", "hawk", "Ava"];

struct Autopilot {
    names: std::slice::Iter<'static, &'static str>,
    rounds: u32,
    /// Frames since the current round started running
    round_frame: u64,
}

impl Autopilot {
    fn new() -> Self {
        Self {
            names: NAMES.iter(),
            rounds: 0,
            round_frame: 0,
        }
    }

    fn tap(x: f32, y: f32) -> Vec<PlatformEvent> {
        vec![
            InputEvent::PointerDown { x, y }.into(),
            InputEvent::PointerUp { x, y }.into(),
        ]
    }

    /// Decide this frame's input from what is on screen
    fn events(&mut self, view: &Presentation, config: &GameConfig) -> Vec<PlatformEvent> {
        if view.prompt.is_some() {
            let name = self.names.next().copied().unwrap_or("Ava_2");
            log::info!("Autopilot enters name '{}'", name);
            return vec![PlatformEvent::PromptSubmitted(name.to_string())];
        }

        match view.phase {
            PlayPhase::FetchingIdentity => Vec::new(),
            PlayPhase::Playing if view.paused => {
                self.round_frame = 0;
                Self::tap(config.scene_width / 2.0, config.scene_height / 2.0)
            }
            PlayPhase::Playing => self.steer(),
            PlayPhase::ShowingResults => {
                let Some(button) = &view.play_button else {
                    return Vec::new();
                };
                self.rounds += 1;
                if self.rounds >= ROUNDS {
                    return vec![PlatformEvent::Exit];
                }
                self.round_frame = 0;
                // Button is in world space; pointers arrive with y down
                Self::tap(button.center.x, config.scene_height - button.center.y)
            }
        }
    }

    /// Drift left, hop a few times, then run off the right edge
    fn steer(&mut self) -> Vec<PlatformEvent> {
        let frame = self.round_frame;
        self.round_frame += 1;

        let started = |c: Control| -> PlatformEvent { InputEvent::ControlStarted(c).into() };
        let stopped = |c: Control| -> PlatformEvent { InputEvent::ControlStopped(c).into() };
        match frame {
            60 => vec![started(Control::MoveLeft)],
            90 | 150 | 210 => vec![started(Control::ActionA)],
            91 | 151 | 211 => vec![stopped(Control::ActionA)],
            240 => vec![stopped(Control::MoveLeft), started(Control::MoveRight)],
            _ => Vec::new(),
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<GameConfig> {
    match path {
        Some(path) => GameConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(GameConfig::load_or_default(Path::new(DEFAULT_CONFIG))),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Tumble (headless) starting...");

    let mut realtime = false;
    let mut config_path = None;
    for arg in std::env::args_os().skip(1) {
        if arg == "--realtime" {
            realtime = true;
        } else {
            config_path = Some(PathBuf::from(arg));
        }
    }
    let config = load_config(config_path)?;

    let audio: Rc<dyn AudioSink> = if config.audio.muted {
        Rc::new(SilentAudio)
    } else {
        Rc::new(LogAudio::new(config.audio.master_volume, config.audio.sfx_volume))
    };

    let store = match &config.scores_path {
        Some(path) => LocalScoreStore::open(path),
        None => LocalScoreStore::new(),
    };
    let session = SessionBridge::new(
        Box::new(OfflineSession::new(&config.offline_session)),
        store,
    );

    // Headless runs advance a manual clock one step per frame so they finish
    // as fast as the CPU allows and replay identically
    let manual = ManualClock::new();
    let clock: Box<dyn Clock> = if realtime {
        Box::new(SystemClock::default())
    } else {
        Box::new(manual.clone())
    };

    let world = Box::new(BoxWorld::new(config.gravity));
    let mut game = Game::new(config, world, session, audio, clock)
        .context("failed to build the scene")?;
    let mut pilot = Autopilot::new();
    let frame_time = Duration::from_secs_f32(SIM_DT);

    let mut last_phase = None;
    let mut frames = 0u64;
    while game.is_running() {
        if frames >= MAX_FRAMES {
            log::warn!("Frame budget exhausted, stopping");
            break;
        }

        let view = game.presentation();
        if last_phase != Some(view.phase) {
            log::info!(
                "Phase {:?}: {}",
                view.phase,
                view.message.as_deref().unwrap_or("")
            );
            last_phase = Some(view.phase);
        }

        let events = pilot.events(&view, game.config());
        game.frame(events)?;
        frames += 1;

        if realtime {
            std::thread::sleep(frame_time);
        } else {
            manual.advance(frame_time);
        }
    }

    let view = game.presentation();
    log::info!("Stopped after {} frames, last score {}", frames, view.score);
    if let Some(rows) = &view.leaderboard {
        println!("{}", serde_json::to_string_pretty(rows)?);
    }
    Ok(())
}
