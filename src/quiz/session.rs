use crate::quiz::error::QuizError;
use crate::quiz::{Completion, Prompt, QuestionSet, QuestionView, Verdict};

/// Progress of one user through a question set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    pub score: usize,
    pub position: usize,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The question at the current position, or the completion once the set
    /// is exhausted. Questions without options are skipped unscored.
    pub fn current(&mut self, questions: &QuestionSet) -> Prompt {
        match self.skip_unanswerable(questions) {
            Some(position) => {
                let question = &questions[position];
                Prompt::Question(QuestionView {
                    number: position + 1,
                    text: question.text.clone(),
                    options: question.options.clone(),
                })
            }
            None => Prompt::Completed(self.completion(questions)),
        }
    }

    /// Grades `selected` against the current question and moves past it.
    ///
    /// # Errors
    ///
    /// `AlreadyFinished` when no question is left, `MalformedAnswer` when
    /// `selected` is not one of the question's options. Neither mutates state.
    pub fn submit_answer(
        &mut self,
        questions: &QuestionSet,
        selected: usize,
    ) -> Result<Verdict, QuizError> {
        let position = match self.skip_unanswerable(questions) {
            Some(position) => position,
            None => {
                return Err(QuizError::AlreadyFinished {
                    score: self.score,
                    total: questions.len(),
                })
            }
        };
        let question = &questions[position];
        if selected >= question.options.len() {
            return Err(QuizError::MalformedAnswer(selected.to_string()));
        }

        let correct = question.is_correct(selected);
        if correct {
            self.score += 1;
        }
        self.position += 1;

        Ok(Verdict {
            correct,
            correct_text: question.correct_text.clone(),
            score_after: self.score,
            total: questions.len(),
        })
    }

    pub fn completion(&self, questions: &QuestionSet) -> Completion {
        Completion {
            final_score: self.score,
            total: questions.len(),
        }
    }

    pub fn is_exhausted(&self, questions: &QuestionSet) -> bool {
        self.position >= questions.len()
    }

    fn skip_unanswerable(&mut self, questions: &QuestionSet) -> Option<usize> {
        while let Some(question) = questions.get(self.position) {
            if !question.options.is_empty() {
                return Some(self.position);
            }
            log::error!(
                "Question {} has no options, skipping: {}",
                self.position + 1,
                question.text
            );
            self.position += 1;
        }
        None
    }
}

/// Parses the raw choice a user sent back into an option index.
pub fn parse_choice(raw: &str) -> Result<usize, QuizError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| QuizError::MalformedAnswer(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Question;

    fn question(text: &str, options: &[&str], correct_index: usize) -> Question {
        Question::new(
            text.to_string(),
            options.iter().map(|o| o.to_string()).collect(),
            correct_index,
            options
                .get(correct_index)
                .map(|o| o.to_string())
                .unwrap_or_default(),
        )
    }

    fn two_questions() -> QuestionSet {
        QuestionSet::new(vec![
            question("Q1", &["A", "B"], 1),
            question("Q2", &["X", "Y", "Z"], 0),
        ])
    }

    #[test]
    fn current_does_not_consume_the_question() {
        let questions = two_questions();
        let mut state = SessionState::new();

        let first = state.current(&questions);
        let again = state.current(&questions);
        assert_eq!(first, again);
        assert_eq!(state.position, 0);
        match first {
            Prompt::Question(view) => {
                assert_eq!(view.number, 1);
                assert_eq!(view.text, "Q1");
            }
            other => panic!("unexpected prompt: {:?}", other),
        }
    }

    #[test]
    fn correct_answer_scores_and_advances() {
        let questions = two_questions();
        let mut state = SessionState::new();

        let verdict = state.submit_answer(&questions, 1).unwrap();
        assert!(verdict.correct);
        assert_eq!(verdict.score_after, 1);
        assert_eq!(verdict.total, 2);
        assert_eq!(state, SessionState { score: 1, position: 1 });
    }

    #[test]
    fn wrong_answer_advances_without_scoring() {
        let questions = two_questions();
        let mut state = SessionState { score: 1, position: 1 };

        let verdict = state.submit_answer(&questions, 2).unwrap();
        assert!(!verdict.correct);
        assert_eq!(verdict.correct_text, "X");
        assert_eq!(verdict.score_after, 1);
        assert_eq!(state, SessionState { score: 1, position: 2 });
    }

    #[test]
    fn answer_after_last_question_reports_finished() {
        let questions = two_questions();
        let mut state = SessionState { score: 2, position: 2 };

        let err = state.submit_answer(&questions, 0).unwrap_err();
        assert_eq!(err, QuizError::AlreadyFinished { score: 2, total: 2 });
        assert_eq!(state, SessionState { score: 2, position: 2 });
    }

    #[test]
    fn out_of_range_choice_is_rejected_without_mutation() {
        let questions = two_questions();
        let mut state = SessionState::new();

        let err = state.submit_answer(&questions, 2).unwrap_err();
        assert_eq!(err, QuizError::MalformedAnswer("2".to_string()));
        assert_eq!(state, SessionState::new());
    }

    #[test]
    fn questions_without_options_are_skipped() {
        let questions = QuestionSet::new(vec![
            question("empty", &[], 0),
            question("also empty", &[], 0),
            question("Q3", &["A"], 0),
        ]);
        let mut state = SessionState::new();

        match state.current(&questions) {
            Prompt::Question(view) => assert_eq!(view.text, "Q3"),
            other => panic!("unexpected prompt: {:?}", other),
        }
        assert_eq!(state, SessionState { score: 0, position: 2 });
    }

    #[test]
    fn set_of_only_unanswerable_questions_completes() {
        let questions = QuestionSet::new(vec![question("empty", &[], 0); 1000]);
        let mut state = SessionState::new();

        assert_eq!(
            state.current(&questions),
            Prompt::Completed(Completion {
                final_score: 0,
                total: 1000
            })
        );
        assert!(state.is_exhausted(&questions));
    }

    #[test]
    fn score_never_decreases_and_position_steps_by_one() {
        let questions = QuestionSet::new(
            (0..6)
                .map(|i| question(&format!("Q{}", i), &["A", "B", "C"], i % 3))
                .collect(),
        );
        let mut state = SessionState::new();
        let choices = [0, 0, 2, 1, 1, 2];

        for (i, choice) in choices.iter().enumerate() {
            let before = state;
            state.submit_answer(&questions, *choice).unwrap();
            assert!(state.score >= before.score);
            assert_eq!(state.position, i + 1);
        }
        assert_eq!(state.score, 4);
    }

    #[test]
    fn parse_choice_accepts_indices_only() {
        assert_eq!(parse_choice("2"), Ok(2));
        assert_eq!(parse_choice(" 0 "), Ok(0));
        assert!(matches!(parse_choice("-1"), Err(QuizError::MalformedAnswer(_))));
        assert!(matches!(parse_choice("B"), Err(QuizError::MalformedAnswer(_))));
        assert!(matches!(parse_choice(""), Err(QuizError::MalformedAnswer(_))));
    }
}
