use axum::{
    extract::{Form, Path, State},
    routing::{get, post},
    Router,
};
use maud::Markup;
use serde::Deserialize;

use crate::{
    extractors::{AdminGuard, IsHtmx},
    rejections::{AppError, ResultExt},
    services::{
        auth::normalize_email,
        quiz::{ActivateOutcome, GenerateOutcome, ScheduleOutcome},
    },
    views,
    views::admin::{self as admin_views, ScheduleState},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_dashboard))
        .route("/admin/schedule", post(schedule_quiz))
        .route("/admin/quiz/{id}", get(preview_quiz).delete(delete_quiz))
        .route("/admin/quiz/{id}/generate", post(generate_quiz))
        .route("/admin/quiz/{id}/activate", post(activate_quiz))
        .route("/admin/grant", post(grant_admin))
}

async fn dashboard(state: &AppState, schedule_state: ScheduleState<'_>) -> Result<Markup, AppError> {
    let quizzes = state
        .quizzes
        .quizzes()
        .await
        .reject("could not get quizzes")?;
    let admins = state
        .db
        .admin_emails()
        .await
        .reject("could not get admins")?;

    Ok(admin_views::dashboard(&quizzes, &admins, schedule_state))
}

async fn admin_dashboard(
    AdminGuard(user): AdminGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
) -> Result<Markup, AppError> {
    let body = dashboard(&state, ScheduleState::NoError).await?;
    Ok(views::render(is_htmx, "Admin", body, Some(&user)))
}

#[derive(Deserialize)]
struct SchedulePost {
    quiz_date: String,
    genres: String,
    #[serde(default)]
    difficulty: String,
    num_questions: String,
}

async fn schedule_quiz(
    AdminGuard(user): AdminGuard,
    State(state): State<AppState>,
    Form(body): Form<SchedulePost>,
) -> Result<Markup, AppError> {
    let Ok(num_questions) = body.num_questions.trim().parse::<i64>() else {
        let page = dashboard(&state, ScheduleState::Error("Question count must be a number.")).await?;
        return Ok(views::titled("Admin", page));
    };

    let outcome = state
        .quizzes
        .schedule(
            &body.quiz_date,
            &body.genres,
            &body.difficulty,
            num_questions,
            &user.email,
        )
        .await
        .reject("could not schedule quiz")?;

    let schedule_state = match outcome {
        ScheduleOutcome::Scheduled(id) => ScheduleState::Notice(format!("Quiz {id} scheduled.")),
        ScheduleOutcome::InvalidDate => ScheduleState::Error("Date must be in YYYY-MM-DD format."),
        ScheduleOutcome::NoGenres => ScheduleState::Error("Enter at least one genre."),
        ScheduleOutcome::InvalidCount => {
            ScheduleState::Error("Question count must be between 1 and 20.")
        }
    };

    Ok(views::titled("Admin", dashboard(&state, schedule_state).await?))
}

async fn generate_quiz(
    AdminGuard(_): AdminGuard,
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<Markup, AppError> {
    let outcome = state
        .quizzes
        .generate(quiz_id)
        .await
        .reject("could not generate questions")?;

    let notice = match outcome {
        GenerateOutcome::Generated { total, placeholders: 0 } => {
            format!("Generated {total} questions.")
        }
        GenerateOutcome::Generated { total, placeholders } => {
            format!("Generated {total} questions, {placeholders} of them placeholders.")
        }
        GenerateOutcome::NotFound => return Err(AppError::NotFound),
    };

    Ok(views::titled("Admin", dashboard(&state, ScheduleState::Notice(notice)).await?))
}

async fn activate_quiz(
    AdminGuard(_): AdminGuard,
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<Markup, AppError> {
    let outcome = state
        .quizzes
        .activate(quiz_id)
        .await
        .reject("could not activate quiz")?;

    let schedule_state = match outcome {
        ActivateOutcome::Activated => ScheduleState::Notice(format!("Quiz {quiz_id} is now active.")),
        ActivateOutcome::NoQuestions => {
            ScheduleState::Error("Generate questions before activating the quiz.")
        }
        ActivateOutcome::NotFound => return Err(AppError::NotFound),
    };

    Ok(views::titled("Admin", dashboard(&state, schedule_state).await?))
}

async fn delete_quiz(
    AdminGuard(_): AdminGuard,
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<Markup, AppError> {
    let deleted = state
        .quizzes
        .delete(quiz_id)
        .await
        .reject("could not delete quiz")?;

    if !deleted {
        return Err(AppError::NotFound);
    }

    let notice = ScheduleState::Notice(format!("Quiz {quiz_id} deleted."));
    Ok(views::titled("Admin", dashboard(&state, notice).await?))
}

async fn preview_quiz(
    AdminGuard(user): AdminGuard,
    IsHtmx(is_htmx): IsHtmx,
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<Markup, AppError> {
    let preview = state
        .quizzes
        .preview(quiz_id)
        .await
        .reject("could not load quiz")?
        .ok_or(AppError::NotFound)?;

    Ok(views::render(
        is_htmx,
        "Quiz preview",
        admin_views::preview(&preview),
        Some(&user),
    ))
}

#[derive(Deserialize)]
struct GrantPost {
    email: String,
}

async fn grant_admin(
    AdminGuard(_): AdminGuard,
    State(state): State<AppState>,
    Form(body): Form<GrantPost>,
) -> Result<Markup, AppError> {
    let email = normalize_email(&body.email);

    let exists = state
        .db
        .email_exists(&email)
        .await
        .reject("could not look up user")?;

    let schedule_state = if exists {
        state
            .db
            .grant_admin(&email)
            .await
            .reject("could not grant admin")?;
        ScheduleState::Notice(format!("{email} is now an admin."))
    } else {
        ScheduleState::Error("No user with this email.")
    };

    Ok(views::titled("Admin", dashboard(&state, schedule_state).await?))
}
