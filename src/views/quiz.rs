use maud::{html, Markup};

use crate::db::models::{QuizHeader, ScoreEntry};
use crate::grading::Grade;
use crate::models::{option_label, option_text, ParsedQuestion, OPTION_LETTERS};
use crate::names;

pub fn quiz_summary(quiz: &QuizHeader) -> String {
    format!(
        "{} · {} · {} · {} questions",
        quiz.quiz_date.format("%B %-d, %Y"),
        quiz.genres.replace(',', ", "),
        quiz.difficulty,
        quiz.num_questions
    )
}

/// Letter to submit for the option at `idx`, preferring its own label.
fn option_value(option: &str, idx: usize) -> char {
    option_label(option).unwrap_or(OPTION_LETTERS[idx.min(OPTION_LETTERS.len() - 1)])
}

fn question_card(number: usize, question: &ParsedQuestion) -> Markup {
    let field = names::answer_field(number);
    html! {
        article.question {
            header { strong { (number) ". " } (question.question) }
            fieldset {
                @for (idx, option) in question.options.iter().enumerate() {
                    label {
                        input type="radio" name=(field) value=(option_value(option, idx));
                        (option_value(option, idx)) ") " (option_text(option))
                    }
                }
            }
        }
    }
}

pub fn take_quiz(quiz: &QuizHeader, questions: &[ParsedQuestion]) -> Markup {
    html! {
        h1 { "Today's quiz" }
        p.quiz-meta { (quiz_summary(quiz)) }

        form hx-post=(names::QUIZ_URL) hx-target="main" {
            input type="hidden" name=(names::QUIZ_ID_FIELD) value=(quiz.id);
            @for (idx, question) in questions.iter().enumerate() {
                (question_card(idx + 1, question))
            }
            button type="submit" { "Submit answers" }
        }
    }
}

pub fn no_active_quiz() -> Markup {
    html! {
        h1 { "Today's quiz" }
        p { "There is no active quiz right now. Check back later." }
        a href=(names::HISTORY_URL) { "See your past results" }
    }
}

pub fn already_submitted(quiz: &QuizHeader) -> Markup {
    html! {
        h1 { "Today's quiz" }
        p.quiz-meta { (quiz_summary(quiz)) }
        p { "You have already submitted this quiz." }
        a href=(names::HISTORY_URL) { "See your results" }
    }
}

pub fn result(grade: Grade) -> Markup {
    html! {
        h1 { "Your result" }
        article {
            p.score { (grade.score) " / " (grade.total) }
            p { (format!("{:.0}%", grade.percent())) " correct" }
        }
        a href=(names::HISTORY_URL) { "See all your results" }
    }
}

pub fn history_table(history: &[ScoreEntry]) -> Markup {
    html! {
        @if history.is_empty() {
            p { "You have not taken any quiz yet." }
        } @else {
            table {
                thead { tr {
                    th { "Date" }
                    th { "Genres" }
                    th { "Score" }
                } }
                tbody {
                    @for entry in history {
                        tr {
                            td { (entry.quiz_date) }
                            td { (entry.genres.replace(',', ", ")) }
                            td { (entry.score) " / " (entry.total) }
                        }
                    }
                }
            }
        }
    }
}

pub fn history(history: &[ScoreEntry]) -> Markup {
    html! {
        h1 { "History" }
        (history_table(history))
    }
}
