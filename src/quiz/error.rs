use thiserror::Error;

/// Failures of a question store adapter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("question store unreachable: {0}")]
    Connection(String),

    #[error("question store query failed: {0}")]
    Query(String),

    #[error("could not read questions file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed questions document: {0}")]
    Format(String),
}

/// A stored record that did not pass validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid question record (id: {id}): {}", .reasons.join(" | "))]
pub struct RecordError {
    pub id: String,
    pub reasons: Vec<String>,
}

/// Outcomes of a quiz intent that are not a regular prompt or verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("no questions available")]
    NoQuestions,

    #[error("no active quiz session")]
    SessionNotFound,

    #[error("quiz already finished with score {score} of {total}")]
    AlreadyFinished { score: usize, total: usize },

    #[error("answer {0:?} is not a valid option")]
    MalformedAnswer(String),
}
