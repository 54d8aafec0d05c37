use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::services::quiz_generator::QuizQuestion;
use crate::utils::xp::Difficulty;

/// A running quiz. One per channel; answer buttons are session-scoped and
/// die with the process.
#[derive(Clone, Debug)]
pub struct ActiveQuiz {
    pub host_id: u64,
    pub host_name: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub questions: Vec<QuizQuestion>,
    pub current: usize,
    pub correct: u32,
    pub wrong: u32,
    pub started_at: DateTime<Utc>,
}

impl ActiveQuiz {
    pub fn new(
        host_id: u64,
        host_name: String,
        topic: String,
        difficulty: Difficulty,
        questions: Vec<QuizQuestion>,
    ) -> Self {
        ActiveQuiz {
            host_id,
            host_name,
            topic,
            difficulty,
            questions,
            current: 0,
            correct: 0,
            wrong: 0,
            started_at: Utc::now(),
        }
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current)
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AnswerError {
    NoSession,
    NotYourQuiz,
    InvalidOption,
}

/// What happened when the host picked an option.
#[derive(Debug)]
pub struct AnswerOutcome {
    pub was_correct: bool,
    pub correct_answer: String,
    pub explanation: Option<String>,
    /// Set when this was the last question; the session has been removed.
    pub finished_quiz: Option<ActiveQuiz>,
}

/// Process-wide table of active quizzes, keyed by channel.
#[derive(Default)]
pub struct QuizSessions {
    sessions: DashMap<u64, ActiveQuiz>,
}

impl QuizSessions {
    pub fn new() -> Self {
        QuizSessions {
            sessions: DashMap::new(),
        }
    }

    /// Register a quiz for a channel. Fails if one is already running there.
    pub fn start(&self, channel_id: u64, quiz: ActiveQuiz) -> Result<(), ActiveQuiz> {
        if self.sessions.contains_key(&channel_id) {
            return Err(quiz);
        }
        self.sessions.insert(channel_id, quiz);
        Ok(())
    }

    pub fn stop(&self, channel_id: u64) -> Option<ActiveQuiz> {
        self.sessions.remove(&channel_id).map(|(_, quiz)| quiz)
    }

    pub fn get(&self, channel_id: u64) -> Option<ActiveQuiz> {
        self.sessions.get(&channel_id).map(|e| e.value().clone())
    }

    /// Record the host's answer to the current question and advance.
    pub fn answer(
        &self,
        channel_id: u64,
        user_id: u64,
        option_index: usize,
    ) -> Result<AnswerOutcome, AnswerError> {
        let finished;
        let outcome = {
            let mut entry = self
                .sessions
                .get_mut(&channel_id)
                .ok_or(AnswerError::NoSession)?;
            let quiz = entry.value_mut();

            if quiz.host_id != user_id {
                return Err(AnswerError::NotYourQuiz);
            }
            let question = quiz
                .current_question()
                .ok_or(AnswerError::InvalidOption)?
                .clone();
            let chosen = question
                .options
                .get(option_index)
                .ok_or(AnswerError::InvalidOption)?;

            let was_correct = *chosen == question.correct_answer;
            if was_correct {
                quiz.correct += 1;
            } else {
                quiz.wrong += 1;
            }
            quiz.current += 1;
            finished = quiz.current >= quiz.questions.len();

            AnswerOutcome {
                was_correct,
                correct_answer: question.correct_answer.clone(),
                explanation: question.explanation.clone(),
                finished_quiz: None,
            }
        };

        if finished {
            let finished_quiz = self.sessions.remove(&channel_id).map(|(_, quiz)| quiz);
            return Ok(AnswerOutcome {
                finished_quiz,
                ..outcome
            });
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, correct: &str) -> QuizQuestion {
        QuizQuestion {
            text: text.to_string(),
            options: vec![
                correct.to_string(),
                "wrong one".to_string(),
                "wrong two".to_string(),
                "wrong three".to_string(),
            ],
            correct_answer: correct.to_string(),
            explanation: None,
            difficulty: Difficulty::Medium,
            category: "general".to_string(),
        }
    }

    fn quiz() -> ActiveQuiz {
        ActiveQuiz::new(
            42,
            "tester".to_string(),
            "rust".to_string(),
            Difficulty::Medium,
            vec![question("q1", "a1"), question("q2", "a2")],
        )
    }

    #[test]
    fn test_one_session_per_channel() {
        let sessions = QuizSessions::new();
        assert!(sessions.start(1, quiz()).is_ok());
        assert!(sessions.start(1, quiz()).is_err());
        assert!(sessions.start(2, quiz()).is_ok());
    }

    #[test]
    fn test_only_host_may_answer() {
        let sessions = QuizSessions::new();
        sessions.start(1, quiz()).unwrap();
        assert_eq!(
            sessions.answer(1, 99, 0).unwrap_err(),
            AnswerError::NotYourQuiz
        );
    }

    #[test]
    fn test_quiz_runs_to_completion() {
        let sessions = QuizSessions::new();
        sessions.start(1, quiz()).unwrap();

        let first = sessions.answer(1, 42, 0).unwrap();
        assert!(first.was_correct);
        assert!(first.finished_quiz.is_none());

        let second = sessions.answer(1, 42, 1).unwrap();
        assert!(!second.was_correct);
        let finished = second.finished_quiz.expect("quiz should be finished");
        assert_eq!(finished.correct, 1);
        assert_eq!(finished.wrong, 1);

        // Session is gone once finished.
        assert_eq!(sessions.answer(1, 42, 0).unwrap_err(), AnswerError::NoSession);
    }
}
