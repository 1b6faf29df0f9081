pub mod engine;
pub mod error;
pub mod loader;
pub mod registry;
pub mod session;
pub mod store;

use std::ops::Index;

/// A validated quiz question. Only the loader builds these from stored records.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub correct_text: String,
}

impl Question {
    pub fn new(
        text: String,
        options: Vec<String>,
        correct_index: usize,
        correct_text: String,
    ) -> Self {
        Self {
            text,
            options,
            correct_index,
            correct_text,
        }
    }

    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_index
    }
}

/// Ordered questions of one quiz run. Never changes once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Question> {
        self.questions.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

impl From<Vec<Question>> for QuestionSet {
    fn from(questions: Vec<Question>) -> Self {
        Self::new(questions)
    }
}

impl Index<usize> for QuestionSet {
    type Output = Question;

    fn index(&self, position: usize) -> &Question {
        &self.questions[position]
    }
}

/// What the user sees when a question is put in front of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    /// One-based number of the question inside its set.
    pub number: usize,
    pub text: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub final_score: usize,
    pub total: usize,
}

/// Result of grading one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    pub correct_text: String,
    pub score_after: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Question(QuestionView),
    Completed(Completion),
}

/// Outbound instruction for the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ShowQuestion { text: String, options: Vec<String> },
    ReportVerdict(Verdict),
    ReportCompletion { final_score: usize, total: usize },
}

impl From<Prompt> for Action {
    fn from(prompt: Prompt) -> Self {
        match prompt {
            Prompt::Question(view) => Action::ShowQuestion {
                text: view.text,
                options: view.options,
            },
            Prompt::Completed(completion) => Action::ReportCompletion {
                final_score: completion.final_score,
                total: completion.total,
            },
        }
    }
}

impl From<Verdict> for Action {
    fn from(verdict: Verdict) -> Self {
        Action::ReportVerdict(verdict)
    }
}
