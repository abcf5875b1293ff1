use serde::Serialize;

use crate::models::{option_text, AnswerKey, ParsedQuestion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grade {
    pub score: usize,
    pub total: usize,
}

impl Grade {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.score as f64 * 100.0 / self.total as f64
        }
    }
}

/// Whether `submitted` names the correct option of `question`.
///
/// Accepts the answer letter, the 0-based option index, or the option text
/// without its label. All comparisons ignore case and surrounding spaces.
pub fn question_matches(question: &ParsedQuestion, submitted: &str) -> bool {
    let submitted = submitted.trim();
    if submitted.is_empty() {
        return false;
    }

    if AnswerKey::from_letter(submitted) == Some(question.answer) {
        return true;
    }

    if submitted.parse::<usize>().ok() == Some(question.answer.index()) {
        return true;
    }

    question
        .correct_option()
        .map(option_text)
        .filter(|text| !text.is_empty())
        .is_some_and(|text| text.to_lowercase() == submitted.to_lowercase())
}

/// Scores `answers` against `questions` pairwise. `None` stands for a
/// missing or non-text answer and never counts; `total` is always the
/// number of questions.
pub fn grade(questions: &[ParsedQuestion], answers: &[Option<String>]) -> Grade {
    let score = questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| {
            answer
                .as_deref()
                .is_some_and(|answer| question_matches(question, answer))
        })
        .count();

    Grade {
        score,
        total: questions.len(),
    }
}
