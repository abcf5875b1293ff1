use maud::{html, Markup};

use crate::db::models::QuizHeader;
use crate::models::{option_text, ParsedQuestion};
use crate::names;
use crate::services::quiz::{QuizPreview, DEFAULT_DIFFICULTY, MAX_QUESTIONS};
use crate::views::quiz as quiz_views;

pub enum ScheduleState<'a> {
    NoError,
    Error(&'a str),
    Notice(String),
}

fn schedule_form(state: ScheduleState<'_>) -> Markup {
    html! {
        article {
            header { "Schedule a quiz" }
            @match state {
                ScheduleState::NoError => {}
                ScheduleState::Error(msg) => {
                    p.error role="alert" { (msg) }
                }
                ScheduleState::Notice(msg) => {
                    p.notice { (msg) }
                }
            }
            form hx-post=(names::SCHEDULE_QUIZ_URL) hx-target="main" {
                div.grid {
                    label {
                        "Date"
                        input name="quiz_date" type="date" required="true";
                    }
                    label {
                        "Questions"
                        input name="num_questions" type="number" min="1" max=(MAX_QUESTIONS)
                              value="10" required="true";
                    }
                    label {
                        "Difficulty"
                        select name="difficulty" {
                            option value="easy" { "Easy" }
                            option value=(DEFAULT_DIFFICULTY) selected { "Medium" }
                            option value="hard" { "Hard" }
                        }
                    }
                }
                label {
                    "Genres"
                    input name="genres" type="text" required="true"
                          placeholder="History, Science, Geography";
                    small { "Comma-separated." }
                }
                button type="submit" { "Schedule" }
            }
        }
    }
}

fn grant_form() -> Markup {
    html! {
        article {
            header { "Grant admin rights" }
            form hx-post=(names::GRANT_ADMIN_URL) hx-target="main" {
                fieldset role="group" {
                    input name="email" type="email" required="true" placeholder="user@example.com";
                    button type="submit" { "Grant" }
                }
            }
        }
    }
}

fn quiz_row(quiz: &QuizHeader) -> Markup {
    html! {
        tr {
            td { a href=(names::quiz_url(quiz.id)) { (quiz.quiz_date) } }
            td { (quiz.genres.replace(',', ", ")) }
            td { (quiz.difficulty) }
            td { (quiz.question_count) " / " (quiz.num_questions) }
            td {
                @if quiz.is_active { mark { "active" } }
            }
            td {
                div.inline-actions {
                    button.outline hx-post=(names::generate_quiz_url(quiz.id)) hx-target="main"
                           hx-disabled-elt="this" {
                        @if quiz.question_count > 0 { "Regenerate" } @else { "Generate" }
                    }
                    @if !quiz.is_active && quiz.question_count > 0 {
                        button hx-post=(names::activate_quiz_url(quiz.id)) hx-target="main" {
                            "Activate"
                        }
                    }
                    button.secondary hx-delete=(names::quiz_url(quiz.id)) hx-target="main"
                           hx-confirm="Delete this quiz and all its results?" {
                        "Delete"
                    }
                }
            }
        }
    }
}

pub fn dashboard(quizzes: &[QuizHeader], admins: &[String], state: ScheduleState<'_>) -> Markup {
    html! {
        h1 { "Admin" }

        (schedule_form(state))

        h2 { "Quizzes" }
        @if quizzes.is_empty() {
            p { "No quiz scheduled yet." }
        } @else {
            table {
                thead { tr {
                    th { "Date" }
                    th { "Genres" }
                    th { "Difficulty" }
                    th { "Questions" }
                    th {}
                    th {}
                } }
                tbody {
                    @for quiz in quizzes {
                        (quiz_row(quiz))
                    }
                }
            }
        }

        h2 { "Admins" }
        ul {
            @for email in admins {
                li { (email) }
            }
        }
        (grant_form())
    }
}

fn preview_question(number: usize, question: &ParsedQuestion) -> Markup {
    let correct = question.correct_option();
    html! {
        article {
            header {
                @if question.is_placeholder() {
                    span.placeholder-question { (number) ". " (question.question) }
                } @else {
                    strong { (number) ". " } (question.question)
                }
            }
            ul {
                @for option in &question.options {
                    @if Some(option.as_str()) == correct {
                        li.correct { strong { (option) } }
                    } @else {
                        li { (option) }
                    }
                }
            }
            @if let Some(option) = correct {
                small { "Answer: " (question.answer) " (" (option_text(option)) ")" }
            } @else {
                small { "Answer: " (question.answer) " (no option with this label)" }
            }
        }
    }
}

pub fn preview(preview: &QuizPreview) -> Markup {
    html! {
        h1 { "Quiz preview" }
        p.quiz-meta { (quiz_views::quiz_summary(&preview.header)) }
        p { a href=(names::ADMIN_URL) { "Back to admin" } }

        @if preview.questions.is_empty() {
            p { "No questions generated yet." }
        }
        @for (idx, question) in preview.questions.iter().enumerate() {
            (preview_question(idx + 1, question))
        }

        h2 { "Leaderboard" }
        @if preview.leaderboard.is_empty() {
            p { "Nobody has taken this quiz yet." }
        } @else {
            table {
                thead { tr {
                    th { "#" }
                    th { "Name" }
                    th { "Score" }
                } }
                tbody {
                    @for (rank, entry) in preview.leaderboard.iter().enumerate() {
                        tr {
                            td { (rank + 1) }
                            td { (entry.first_name) " " (entry.last_name) }
                            td { (entry.score) " / " (entry.total) }
                        }
                    }
                }
            }
        }
    }
}
