use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::quiz::error::QuizError;
use crate::quiz::loader::QuestionLoader;
use crate::quiz::registry::{ActiveSession, Retention, SessionRegistry};
use crate::quiz::store::QuestionStore;
use crate::quiz::{Prompt, QuestionSet, Verdict};

/// When the question set is read from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReloadPolicy {
    /// Fetch a fresh set for every new quiz.
    #[default]
    EveryStart,
    /// Fetch once and reuse the set for every quiz.
    AtStartup,
}

impl FromStr for ReloadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "every_start" => Ok(ReloadPolicy::EveryStart),
            "at_startup" => Ok(ReloadPolicy::AtStartup),
            other => Err(format!(
                "unknown reload policy '{}', expected 'every_start' or 'at_startup'",
                other
            )),
        }
    }
}

/// Entry point of the quiz core: loads questions and drives user sessions.
pub struct QuizEngine {
    store: Arc<dyn QuestionStore>,
    registry: Arc<dyn SessionRegistry>,
    policy: ReloadPolicy,
    cached: RwLock<Option<Arc<QuestionSet>>>,
}

impl QuizEngine {
    pub fn new(
        store: Arc<dyn QuestionStore>,
        registry: Arc<dyn SessionRegistry>,
        policy: ReloadPolicy,
    ) -> Self {
        Self {
            store,
            registry,
            policy,
            cached: RwLock::new(None),
        }
    }

    pub fn policy(&self) -> ReloadPolicy {
        self.policy
    }

    /// The question set a new quiz would use, honouring the reload policy.
    pub async fn load_questions(&self) -> Arc<QuestionSet> {
        if self.policy == ReloadPolicy::AtStartup {
            let cached = self.cached.read().clone();
            if let Some(questions) = cached {
                return questions;
            }
        }

        let questions = Arc::new(QuestionLoader::new(self.store.as_ref()).load().await);
        // An empty set is not cached so a store outage at startup is not permanent
        if self.policy == ReloadPolicy::AtStartup && !questions.is_empty() {
            *self.cached.write() = Some(questions.clone());
        }
        questions
    }

    /// Starts a quiz from scratch for `user`, dropping any quiz in progress.
    ///
    /// # Errors
    ///
    /// `NoQuestions` if the set is empty; no session is created then.
    pub async fn start_session(&self, user: u64) -> Result<Prompt, QuizError> {
        let questions = self.load_questions().await;
        if questions.is_empty() {
            log::warn!("User {} asked for a quiz but no questions are available", user);
            return Err(QuizError::NoQuestions);
        }

        self.registry.begin(user, ActiveSession::new(questions));
        log::info!("User {} started a quiz", user);
        self.current_prompt(user)
    }

    /// The question `user` has to answer now, or how their quiz ended.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` if `user` has neither a running nor a finished quiz.
    pub fn current_prompt(&self, user: u64) -> Result<Prompt, QuizError> {
        let mut prompt = None;
        let found = self.registry.update(user, &mut |session| {
            let current = session.state.current(&session.questions);
            let retention = match &current {
                Prompt::Question(view) => {
                    log::info!("Question {} shown to user {}", view.number, user);
                    Retention::Keep
                }
                Prompt::Completed(completion) => Retention::Finish(*completion),
            };
            prompt = Some(current);
            retention
        });

        match prompt {
            Some(Prompt::Completed(completion)) => {
                log::info!(
                    "Quiz of user {} finished with score {} of {}",
                    user,
                    completion.final_score,
                    completion.total
                );
                Ok(Prompt::Completed(completion))
            }
            Some(prompt) => Ok(prompt),
            None if !found => self
                .registry
                .last_completion(user)
                .map(Prompt::Completed)
                .ok_or(QuizError::SessionNotFound),
            None => Err(QuizError::SessionNotFound),
        }
    }

    /// Grades `selected` for the current question of `user`. Call
    /// `current_prompt` afterwards to reveal what comes next.
    ///
    /// # Errors
    ///
    /// `SessionNotFound`, `AlreadyFinished` or `MalformedAnswer`.
    pub fn answer(&self, user: u64, selected: usize) -> Result<Verdict, QuizError> {
        let mut outcome = Err(QuizError::SessionNotFound);
        self.registry.update(user, &mut |session| {
            outcome = session.state.submit_answer(&session.questions, selected);
            Retention::Keep
        });

        match &outcome {
            Ok(verdict) => log::info!(
                "User {} answered {}: score {} of {}",
                user,
                if verdict.correct { "correctly" } else { "incorrectly" },
                verdict.score_after,
                verdict.total
            ),
            Err(e) => log::info!("Answer of user {} rejected: {}", user, e),
        }
        outcome
    }

    pub fn has_session(&self, user: u64) -> bool {
        self.registry.is_active(user)
    }
}
