//! In-process stand-in for the remote session service
//!
//! Keeps a user and a leaderboard in memory and answers each request after a
//! random number of frames. Some requests fail as if the server were
//! unreachable, so the fallback paths get exercised in headless runs. All
//! randomness comes from a seeded `Pcg32`, so a run is reproducible.

use std::ops::Range;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{
    Completion, IdentityReply, LeaderboardReply, RemoteScore, ScoreReply, ServiceStatus,
    SessionService, UserRecord, ValidationError,
};
use crate::config::OfflineSessionConfig;

const MIN_NAME_LEN: usize = 3;

/// Scores already on the board when the service starts
const HOUSE_SCORES: [(&str, f64); 3] = [("hawk", 500.0), ("blocks", 250.0), ("tumble", 100.0)];

enum Request {
    Identity(Completion<IdentityReply>),
    UserName(String, Completion<IdentityReply>),
    Score(i64, Completion<ScoreReply>),
    Leaderboard(Range<usize>, Completion<LeaderboardReply>),
}

struct Pending {
    due: u64,
    request: Request,
}

pub struct OfflineSession {
    rng: Pcg32,
    min_latency: u32,
    max_latency: u32,
    failure_rate: f64,
    frame: u64,
    pending: Vec<Pending>,
    user: UserRecord,
    /// Sorted by result, highest first
    board: Vec<(Option<String>, f64)>,
}

impl OfflineSession {
    pub fn new(config: &OfflineSessionConfig) -> Self {
        let user = match &config.known_user {
            Some(name) => UserRecord {
                login: Some(name.clone()),
                anonymous: false,
            },
            None => UserRecord {
                login: None,
                anonymous: true,
            },
        };
        let min_latency = config.min_latency_frames;
        Self {
            rng: Pcg32::seed_from_u64(config.seed),
            min_latency,
            max_latency: config.max_latency_frames.max(min_latency),
            failure_rate: config.failure_rate.clamp(0.0, 1.0),
            frame: 0,
            pending: Vec::new(),
            user,
            board: HOUSE_SCORES
                .iter()
                .map(|(name, result)| (Some(name.to_string()), *result))
                .collect(),
        }
    }

    /// Requests still waiting on their latency
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn enqueue(&mut self, request: Request) {
        let latency = self.rng.random_range(self.min_latency..=self.max_latency);
        self.pending.push(Pending {
            due: self.frame + u64::from(latency),
            request,
        });
    }

    fn resolve(&mut self, request: Request) {
        let unreachable = self.rng.random_bool(self.failure_rate);
        if unreachable {
            log::debug!("Offline session: simulating unreachable server");
        }

        match request {
            Request::Identity(done) => {
                let status = if unreachable {
                    ServiceStatus::ServerUnreachable
                } else {
                    ServiceStatus::Ok
                };
                done.complete(IdentityReply {
                    status,
                    user: Some(self.user.clone()),
                });
            }
            Request::UserName(name, done) => {
                let status = if unreachable {
                    ServiceStatus::ServerUnreachable
                } else {
                    self.rename(&name)
                };
                done.complete(IdentityReply {
                    status,
                    user: Some(self.user.clone()),
                });
            }
            Request::Score(value, done) => {
                let status = if unreachable {
                    ServiceStatus::ServerUnreachable
                } else {
                    self.record(value);
                    ServiceStatus::Ok
                };
                done.complete(ScoreReply { status });
            }
            Request::Leaderboard(range, done) => {
                let reply = if unreachable {
                    LeaderboardReply {
                        status: ServiceStatus::ServerUnreachable,
                        scores: Vec::new(),
                    }
                } else {
                    LeaderboardReply {
                        status: ServiceStatus::Ok,
                        scores: self.scores(range),
                    }
                };
                done.complete(reply);
            }
        }
    }

    fn validate(&self, name: &str) -> Result<(), ValidationError> {
        if name.chars().count() < MIN_NAME_LEN {
            return Err(ValidationError::NameTooShort);
        }
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(ValidationError::NameFormatInvalid);
        }
        let taken = self
            .board
            .iter()
            .filter_map(|(login, _)| login.as_deref())
            .any(|login| login.eq_ignore_ascii_case(name));
        if taken && self.user.login.as_deref() != Some(name) {
            return Err(ValidationError::NameTaken);
        }
        Ok(())
    }

    fn rename(&mut self, name: &str) -> ServiceStatus {
        let name = name.trim();
        match self.validate(name) {
            Ok(()) => {
                self.user = UserRecord {
                    login: Some(name.to_string()),
                    anonymous: false,
                };
                ServiceStatus::Ok
            }
            Err(e) => ServiceStatus::InvalidUserData(e),
        }
    }

    fn record(&mut self, value: i64) {
        let result = value as f64;
        let pos = self
            .board
            .iter()
            .position(|(_, r)| result > *r)
            .unwrap_or(self.board.len());
        self.board.insert(pos, (self.user.login.clone(), result));
    }

    fn scores(&self, range: Range<usize>) -> Vec<RemoteScore> {
        self.board
            .iter()
            .enumerate()
            .skip(range.start)
            .take(range.len())
            .map(|(i, (login, result))| RemoteScore {
                rank: i as u32 + 1,
                login: login.clone(),
                result: *result,
            })
            .collect()
    }
}

impl SessionService for OfflineSession {
    fn fetch_identity(&mut self, done: Completion<IdentityReply>) {
        self.enqueue(Request::Identity(done));
    }

    fn submit_user_name(&mut self, name: &str, done: Completion<IdentityReply>) {
        self.enqueue(Request::UserName(name.to_string(), done));
    }

    fn submit_score(&mut self, value: i64, done: Completion<ScoreReply>) {
        self.enqueue(Request::Score(value, done));
    }

    fn fetch_leaderboard(&mut self, range: Range<usize>, done: Completion<LeaderboardReply>) {
        self.enqueue(Request::Leaderboard(range, done));
    }

    fn poll(&mut self) {
        self.frame += 1;
        let frame = self.frame;
        let (ready, waiting): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|p| p.due <= frame);
        self.pending = waiting;

        for pending in ready {
            self.resolve(pending.request);
        }
    }
}
