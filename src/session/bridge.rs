//! Session callback bridge
//!
//! Owns the session service and the reply channel. Tracks one in-flight flag
//! per operation kind, turns raw replies into the results the game acts on,
//! and falls back to the local score store while the server is unreachable.

use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;

use super::{
    Completion, IdentityReply, LeaderboardReply, OperationKind, RemoteScore, ScoreReply,
    ServiceStatus, SessionEvent, SessionService, UserRecord,
};
use crate::consts::LEADERBOARD_SIZE;
use crate::highscores::{LocalScoreStore, ScoreRecord};

/// Shown in place of a login the service no longer knows
const UNKNOWN_LOGIN: &str = "Unknown";
const IDENTITY_FETCH_FAILED: &str = "Error fetching user result.";

/// Caller contract violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{0} request already in flight")]
    AlreadyInFlight(OperationKind),
    #[error("{0} completion arrived with nothing in flight")]
    Unrequested(OperationKind),
}

/// Identity after normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityOutcome {
    /// Empty when anonymous
    pub name: String,
    pub anonymous: bool,
    /// Human-readable reason the identity could not be resolved
    pub error: Option<String>,
}

impl IdentityOutcome {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            anonymous: false,
            error: None,
        }
    }

    fn anonymous(error: Option<&str>) -> Self {
        Self {
            name: String::new(),
            anonymous: true,
            error: error.map(str::to_string),
        }
    }

    fn from_user(user: Option<UserRecord>, error: Option<&str>) -> Self {
        match user {
            Some(UserRecord {
                login: Some(login),
                anonymous: false,
            }) => Self {
                name: login,
                anonymous: false,
                error: error.map(str::to_string),
            },
            _ => Self::anonymous(error),
        }
    }
}

/// A completed operation, ready for the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    IdentityResolved(IdentityOutcome),
    /// The score went somewhere (remote, local, or nowhere after logging)
    ScoreSubmitted,
    LeaderboardLoaded(Vec<ScoreRecord>),
}

#[derive(Debug, Default, Clone, Copy)]
struct InFlight {
    identity: bool,
    score: bool,
    leaderboard: bool,
}

impl InFlight {
    fn get(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Identity => self.identity,
            OperationKind::ScoreSubmit => self.score,
            OperationKind::Leaderboard => self.leaderboard,
        }
    }

    fn flag(&mut self, kind: OperationKind) -> &mut bool {
        match kind {
            OperationKind::Identity => &mut self.identity,
            OperationKind::ScoreSubmit => &mut self.score,
            OperationKind::Leaderboard => &mut self.leaderboard,
        }
    }
}

pub struct SessionBridge {
    service: Box<dyn SessionService>,
    tx: Sender<SessionEvent>,
    rx: Receiver<SessionEvent>,
    in_flight: InFlight,
    store: LocalScoreStore,
    /// Last login the service confirmed
    login: Option<String>,
    /// Score waiting on its submit reply
    pending_score: Option<i64>,
}

impl SessionBridge {
    pub fn new(service: Box<dyn SessionService>, store: LocalScoreStore) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            service,
            tx,
            rx,
            in_flight: InFlight::default(),
            store,
            login: None,
            pending_score: None,
        }
    }

    pub fn is_in_flight(&self, kind: OperationKind) -> bool {
        self.in_flight.get(kind)
    }

    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    pub fn local_scores(&self) -> &LocalScoreStore {
        &self.store
    }

    fn begin(&mut self, kind: OperationKind) -> Result<(), SessionError> {
        let flag = self.in_flight.flag(kind);
        if *flag {
            return Err(SessionError::AlreadyInFlight(kind));
        }
        *flag = true;
        Ok(())
    }

    fn finish(&mut self, kind: OperationKind) -> Result<(), SessionError> {
        let flag = self.in_flight.flag(kind);
        if !*flag {
            return Err(SessionError::Unrequested(kind));
        }
        *flag = false;
        Ok(())
    }

    fn completion<T: super::Reply>(&self) -> Completion<T> {
        Completion::new(self.tx.clone())
    }

    pub fn fetch_identity(&mut self) -> Result<(), SessionError> {
        self.begin(OperationKind::Identity)?;
        log::info!("Fetching user identity");
        let done = self.completion();
        self.service.fetch_identity(done);
        Ok(())
    }

    /// Ask the service to name the user; answered as an identity fetch
    pub fn submit_user_name(&mut self, name: &str) -> Result<(), SessionError> {
        self.begin(OperationKind::Identity)?;
        log::info!("Submitting user name '{}'", name);
        let done = self.completion();
        self.service.submit_user_name(name, done);
        Ok(())
    }

    pub fn submit_score(&mut self, value: i64) -> Result<(), SessionError> {
        self.begin(OperationKind::ScoreSubmit)?;
        log::info!("Submitting score {}", value);
        self.pending_score = Some(value);
        let done = self.completion();
        self.service.submit_score(value, done);
        Ok(())
    }

    pub fn fetch_leaderboard(&mut self) -> Result<(), SessionError> {
        self.begin(OperationKind::Leaderboard)?;
        log::info!("Fetching leaderboard");
        let done = self.completion();
        self.service.fetch_leaderboard(0..LEADERBOARD_SIZE, done);
        Ok(())
    }

    /// Let the service deliver, then take every reply queued so far
    pub fn drain(&mut self) -> Vec<Result<SessionUpdate, SessionError>> {
        self.service.poll();

        let mut updates = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            log::debug!("Session {} reply arrived", event.kind());
            updates.push(self.complete(event));
        }
        updates
    }

    pub fn complete(&mut self, event: SessionEvent) -> Result<SessionUpdate, SessionError> {
        match event {
            SessionEvent::Identity(reply) => self.complete_identity_fetch(reply),
            SessionEvent::Score(reply) => self.complete_score_submit(reply),
            SessionEvent::Leaderboard(reply) => self.complete_leaderboard_fetch(reply),
        }
    }

    pub fn complete_identity_fetch(
        &mut self,
        reply: IdentityReply,
    ) -> Result<SessionUpdate, SessionError> {
        self.finish(OperationKind::Identity)?;

        let outcome = match reply.status {
            ServiceStatus::Ok => IdentityOutcome::from_user(reply.user, None),
            ServiceStatus::InvalidUserData(err) => {
                log::warn!("User data rejected: {:?}", err);
                IdentityOutcome::from_user(reply.user, Some(err.message()))
            }
            ServiceStatus::ServerUnreachable => {
                let cached = reply
                    .user
                    .and_then(|u| u.login)
                    .or_else(|| self.login.clone());
                match cached {
                    Some(login) => {
                        log::warn!("Server unreachable, continuing as '{}'", login);
                        IdentityOutcome::named(login)
                    }
                    None => {
                        log::warn!("Server unreachable and no cached login");
                        IdentityOutcome::anonymous(None)
                    }
                }
            }
            status => {
                log::error!("Identity fetch failed: {:?}", status);
                IdentityOutcome::anonymous(Some(IDENTITY_FETCH_FAILED))
            }
        };

        if !outcome.anonymous {
            self.login = Some(outcome.name.clone());
        }
        Ok(SessionUpdate::IdentityResolved(outcome))
    }

    pub fn complete_score_submit(
        &mut self,
        reply: ScoreReply,
    ) -> Result<SessionUpdate, SessionError> {
        self.finish(OperationKind::ScoreSubmit)?;
        let value = self.pending_score.take();

        match (reply.status, value) {
            (ServiceStatus::Ok, _) => log::info!("Score submitted"),
            (ServiceStatus::ServerUnreachable, Some(value)) => {
                let name = self.login.as_deref().unwrap_or(UNKNOWN_LOGIN);
                match self.store.insert(name, value) {
                    Some(rank) => {
                        log::info!("Server unreachable, score stored locally at rank {}", rank)
                    }
                    None => log::info!("Server unreachable, score too low for the local board"),
                }
            }
            (status, _) => log::warn!("Score submit failed: {:?}", status),
        }
        Ok(SessionUpdate::ScoreSubmitted)
    }

    pub fn complete_leaderboard_fetch(
        &mut self,
        reply: LeaderboardReply,
    ) -> Result<SessionUpdate, SessionError> {
        self.finish(OperationKind::Leaderboard)?;

        let rows = match reply.status {
            ServiceStatus::Ok => ranked_rows(reply.scores),
            ServiceStatus::ServerUnreachable => {
                log::info!("Server unreachable, showing local scores");
                self.store.top()
            }
            status => {
                log::warn!("Leaderboard fetch failed: {:?}", status);
                Vec::new()
            }
        };
        Ok(SessionUpdate::LeaderboardLoaded(rows))
    }
}

fn ranked_rows(scores: Vec<RemoteScore>) -> Vec<ScoreRecord> {
    let mut rows: Vec<ScoreRecord> = scores
        .into_iter()
        .map(|s| ScoreRecord {
            rank: s.rank,
            name: s.login.unwrap_or_else(|| UNKNOWN_LOGIN.to_string()),
            value: s.result as i64,
        })
        .collect();
    rows.sort_by_key(|r| r.rank);
    rows
}
