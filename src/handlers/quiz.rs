use std::collections::HashMap;

use axum::{
    extract::{Form, State},
    routing::get,
    Router,
};
use maud::Markup;

use crate::{
    extractors::{AuthGuard, IsHtmx},
    names,
    rejections::{AppError, ResultExt},
    services::quiz::{SubmitOutcome, MAX_QUESTIONS},
    views,
    views::quiz as quiz_views,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quiz", get(take_quiz).post(submit_quiz))
        .route("/history", get(history))
}

async fn take_quiz(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
) -> Result<Markup, AppError> {
    let active = state
        .quizzes
        .active_quiz(user.id)
        .await
        .reject("could not get active quiz")?;

    let body = match active {
        None => quiz_views::no_active_quiz(),
        Some(active) if active.already_submitted => quiz_views::already_submitted(&active.header),
        Some(active) => quiz_views::take_quiz(&active.header, &active.questions),
    };

    Ok(views::render(is_htmx, "Today's quiz", body, Some(&user)))
}

/// Collects `answer_N` fields into a list indexed by question.
fn answers_from_form(form: &HashMap<String, String>) -> Vec<Option<String>> {
    let numbered: Vec<(usize, &String)> = form
        .iter()
        .filter_map(|(key, value)| {
            let number = key
                .strip_prefix(names::ANSWER_FIELD_PREFIX)?
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_QUESTIONS as usize).contains(n))?;
            Some((number, value))
        })
        .collect();

    let len = numbered.iter().map(|(n, _)| *n).max().unwrap_or(0);
    let mut answers = vec![None; len];
    for (number, value) in numbered {
        answers[number - 1] = Some(value.clone());
    }
    answers
}

async fn submit_quiz(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Markup, AppError> {
    let quiz_id = form
        .get(names::QUIZ_ID_FIELD)
        .and_then(|id| id.trim().parse::<i64>().ok())
        .ok_or(AppError::Input("missing quiz id"))?;
    let answers = answers_from_form(&form);

    let outcome = state
        .quizzes
        .submit(user.id, quiz_id, &answers)
        .await
        .reject("could not submit answers")?;

    match outcome {
        SubmitOutcome::Graded(grade) => Ok(views::titled("Your result", quiz_views::result(grade))),
        SubmitOutcome::NoActiveQuiz => Err(AppError::Input("there is no active quiz")),
        SubmitOutcome::QuizChanged => Err(AppError::Input("this quiz is no longer active")),
        SubmitOutcome::AlreadySubmitted => Err(AppError::Input("quiz already submitted")),
    }
}

async fn history(
    AuthGuard(user): AuthGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
) -> Result<Markup, AppError> {
    let history = state
        .quizzes
        .history(user.id)
        .await
        .reject("could not get history")?;

    Ok(views::render(
        is_htmx,
        "History",
        quiz_views::history(&history),
        Some(&user),
    ))
}
