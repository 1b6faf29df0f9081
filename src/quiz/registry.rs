use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::quiz::session::SessionState;
use crate::quiz::{Completion, QuestionSet};

/// A running quiz: progress plus the question set it was started with.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub state: SessionState,
    pub questions: Arc<QuestionSet>,
}

impl ActiveSession {
    pub fn new(questions: Arc<QuestionSet>) -> Self {
        Self {
            state: SessionState::new(),
            questions,
        }
    }
}

/// What to do with a session after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    Keep,
    /// Remove the session and remember how it ended.
    Finish(Completion),
}

/// Per-user session storage. Every method is atomic for its user.
pub trait SessionRegistry: Send + Sync {
    /// Installs a fresh session, replacing any previous one for `user`.
    fn begin(&self, user: u64, session: ActiveSession);

    /// Runs `update` on the session of `user`. Returns `false` if there is none.
    fn update(&self, user: u64, update: &mut dyn FnMut(&mut ActiveSession) -> Retention) -> bool;

    /// How the last finished session of `user` ended, if it was not superseded.
    fn last_completion(&self, user: u64) -> Option<Completion>;

    fn is_active(&self, user: u64) -> bool;
}

#[derive(Default)]
struct Sessions {
    active: HashMap<u64, ActiveSession>,
    finished: HashMap<u64, Completion>,
}

/// Process-local registry; everything is lost on restart.
#[derive(Default)]
pub struct InMemoryRegistry {
    sessions: Mutex<Sessions>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRegistry for InMemoryRegistry {
    fn begin(&self, user: u64, session: ActiveSession) {
        let mut sessions = self.sessions.lock();
        sessions.finished.remove(&user);
        sessions.active.insert(user, session);
    }

    fn update(&self, user: u64, update: &mut dyn FnMut(&mut ActiveSession) -> Retention) -> bool {
        let mut sessions = self.sessions.lock();
        let retention = match sessions.active.get_mut(&user) {
            Some(session) => update(session),
            None => return false,
        };
        if let Retention::Finish(completion) = retention {
            sessions.active.remove(&user);
            sessions.finished.insert(user, completion);
        }
        true
    }

    fn last_completion(&self, user: u64) -> Option<Completion> {
        self.sessions.lock().finished.get(&user).copied()
    }

    fn is_active(&self, user: u64) -> bool {
        self.sessions.lock().active.contains_key(&user)
    }
}
