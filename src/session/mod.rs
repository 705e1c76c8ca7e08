//! Session service plumbing
//!
//! The session service (user identity, score submission, leaderboard) is an
//! external collaborator that answers asynchronously. Every request hands the
//! service a one-shot `Completion`; replies are queued on a channel that the
//! `SessionBridge` drains once per frame, before the simulation steps.

pub mod bridge;
pub mod offline;

pub use bridge::{IdentityOutcome, SessionBridge, SessionError, SessionUpdate};
pub use offline::OfflineSession;

use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;
use std::sync::mpsc::Sender;

/// The three kinds of asynchronous operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Identity,
    ScoreSubmit,
    Leaderboard,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Identity => write!(f, "identity"),
            OperationKind::ScoreSubmit => write!(f, "score submit"),
            OperationKind::Leaderboard => write!(f, "leaderboard"),
        }
    }
}

/// Why the service rejected a user name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    NameTaken,
    NameFormatInvalid,
    NameTooShort,
    Other,
}

impl ValidationError {
    /// Text shown in the name prompt
    pub fn message(self) -> &'static str {
        match self {
            ValidationError::NameTaken => "Username already taken",
            ValidationError::NameFormatInvalid | ValidationError::NameTooShort => {
                "Username format is invalid"
            }
            ValidationError::Other => "Something bad happened",
        }
    }
}

/// Result code carried by every reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Ok,
    /// Network or server unavailable; worth falling back to local data
    ServerUnreachable,
    InvalidUserData(ValidationError),
    /// Any other service error code
    Failed(i32),
    /// The request never produced a reply (failed to start, service gone)
    Abandoned,
}

/// User as the service knows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub login: Option<String>,
    pub anonymous: bool,
}

/// A leaderboard row as the service reports it
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteScore {
    pub rank: u32,
    /// Missing when the scoring user no longer exists
    pub login: Option<String>,
    pub result: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityReply {
    pub status: ServiceStatus,
    pub user: Option<UserRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReply {
    pub status: ServiceStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardReply {
    pub status: ServiceStatus,
    pub scores: Vec<RemoteScore>,
}

/// A reply queued for the bridge
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Identity(IdentityReply),
    Score(ScoreReply),
    Leaderboard(LeaderboardReply),
}

impl SessionEvent {
    pub fn kind(&self) -> OperationKind {
        match self {
            SessionEvent::Identity(_) => OperationKind::Identity,
            SessionEvent::Score(_) => OperationKind::ScoreSubmit,
            SessionEvent::Leaderboard(_) => OperationKind::Leaderboard,
        }
    }
}

/// A reply type with a stand-in for "no answer"
pub trait Reply: Into<SessionEvent> {
    fn abandoned() -> Self;
}

impl From<IdentityReply> for SessionEvent {
    fn from(reply: IdentityReply) -> Self {
        SessionEvent::Identity(reply)
    }
}

impl From<ScoreReply> for SessionEvent {
    fn from(reply: ScoreReply) -> Self {
        SessionEvent::Score(reply)
    }
}

impl From<LeaderboardReply> for SessionEvent {
    fn from(reply: LeaderboardReply) -> Self {
        SessionEvent::Leaderboard(reply)
    }
}

impl Reply for IdentityReply {
    fn abandoned() -> Self {
        Self {
            status: ServiceStatus::Abandoned,
            user: None,
        }
    }
}

impl Reply for ScoreReply {
    fn abandoned() -> Self {
        Self {
            status: ServiceStatus::Abandoned,
        }
    }
}

impl Reply for LeaderboardReply {
    fn abandoned() -> Self {
        Self {
            status: ServiceStatus::Abandoned,
            scores: Vec::new(),
        }
    }
}

/// One-shot reply slot for a single request.
///
/// `complete` consumes it, so a request can be answered at most once. A
/// completion dropped unanswered queues an `Abandoned` reply, so every
/// request is answered exactly once.
pub struct Completion<T: Reply> {
    tx: Option<Sender<SessionEvent>>,
    _reply: PhantomData<fn(T)>,
}

impl<T: Reply> Completion<T> {
    pub(crate) fn new(tx: Sender<SessionEvent>) -> Self {
        Self {
            tx: Some(tx),
            _reply: PhantomData,
        }
    }

    pub fn complete(mut self, reply: T) {
        if let Some(tx) = self.tx.take()
            && tx.send(reply.into()).is_err()
        {
            log::warn!("Session bridge is gone, dropping reply");
        }
    }
}

impl<T: Reply> Drop for Completion<T> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            log::warn!("Session request dropped without a reply");
            let _ = tx.send(T::abandoned().into());
        }
    }
}

/// Asynchronous session collaborator.
///
/// Requests return immediately; each answers later through its completion.
pub trait SessionService {
    fn fetch_identity(&mut self, done: Completion<IdentityReply>);
    /// Set the user's name; answers like an identity fetch
    fn submit_user_name(&mut self, name: &str, done: Completion<IdentityReply>);
    fn submit_score(&mut self, value: i64, done: Completion<ScoreReply>);
    fn fetch_leaderboard(&mut self, range: Range<usize>, done: Completion<LeaderboardReply>);
    /// Deliver whatever replies are ready. Called once per frame.
    fn poll(&mut self) {}
}

/// Scripted service for tests: holds every completion until the test answers
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    pub(crate) struct Script {
        pub(crate) identity: VecDeque<Completion<IdentityReply>>,
        pub(crate) names: Vec<String>,
        pub(crate) scores: VecDeque<(i64, Completion<ScoreReply>)>,
        pub(crate) leaderboards: VecDeque<Completion<LeaderboardReply>>,
    }

    #[derive(Clone, Default)]
    pub(crate) struct ScriptedSession {
        pub(crate) script: Rc<RefCell<Script>>,
    }

    impl ScriptedSession {
        pub(crate) fn reply_identity(&self, reply: IdentityReply) {
            let done = self.script.borrow_mut().identity.pop_front();
            done.expect("no identity request pending").complete(reply);
        }

        pub(crate) fn reply_score(&self, reply: ScoreReply) -> i64 {
            let (value, done) = self
                .script
                .borrow_mut()
                .scores
                .pop_front()
                .expect("no score submit pending");
            done.complete(reply);
            value
        }

        pub(crate) fn reply_leaderboard(&self, reply: LeaderboardReply) {
            let done = self.script.borrow_mut().leaderboards.pop_front();
            done.expect("no leaderboard request pending").complete(reply);
        }

        pub(crate) fn pending(&self) -> (usize, usize, usize) {
            let s = self.script.borrow();
            (s.identity.len(), s.scores.len(), s.leaderboards.len())
        }

        pub(crate) fn submitted_names(&self) -> Vec<String> {
            self.script.borrow().names.clone()
        }
    }

    impl SessionService for ScriptedSession {
        fn fetch_identity(&mut self, done: Completion<IdentityReply>) {
            self.script.borrow_mut().identity.push_back(done);
        }

        fn submit_user_name(&mut self, name: &str, done: Completion<IdentityReply>) {
            let mut s = self.script.borrow_mut();
            s.names.push(name.to_string());
            s.identity.push_back(done);
        }

        fn submit_score(&mut self, value: i64, done: Completion<ScoreReply>) {
            self.script.borrow_mut().scores.push_back((value, done));
        }

        fn fetch_leaderboard(&mut self, _range: Range<usize>, done: Completion<LeaderboardReply>) {
            self.script.borrow_mut().leaderboards.push_back(done);
        }
    }

    pub(crate) fn named(login: &str) -> IdentityReply {
        IdentityReply {
            status: ServiceStatus::Ok,
            user: Some(UserRecord {
                login: Some(login.to_string()),
                anonymous: false,
            }),
        }
    }

    pub(crate) fn anonymous() -> IdentityReply {
        IdentityReply {
            status: ServiceStatus::Ok,
            user: Some(UserRecord {
                login: None,
                anonymous: true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_completion_sends_reply_once() {
        let (tx, rx) = mpsc::channel();
        let done: Completion<ScoreReply> = Completion::new(tx);
        done.complete(ScoreReply {
            status: ServiceStatus::Ok,
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Score(ScoreReply {
                status: ServiceStatus::Ok
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_completion_reports_abandoned() {
        let (tx, rx) = mpsc::channel();
        {
            let _done: Completion<LeaderboardReply> = Completion::new(tx);
        }
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Leaderboard(LeaderboardReply::abandoned())
        );
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(ValidationError::NameTaken.message(), "Username already taken");
        assert_eq!(ValidationError::NameTooShort.message(), "Username format is invalid");
        assert_eq!(ValidationError::Other.message(), "Something bad happened");
    }
}
