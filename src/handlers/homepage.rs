use axum::{
    extract::{Form, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::CookieJar;
use maud::Markup;
use serde::Deserialize;

use crate::{
    extractors::{IsHtmx, MaybeUser},
    names,
    rejections::{AppError, ResultExt},
    services::auth::{CheckOtpOutcome, LoginOutcome, RegisterOutcome},
    utils, views, AppState,
};

use crate::views::homepage as homepage_views;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(homepage))
        .route("/signup", get(signup_page).post(signup_post))
        .route("/login", get(login_page).post(login_post))
        .route("/logout", post(logout_post))
        .route(
            "/forgot-password",
            get(forgot_password_page).post(forgot_password_post),
        )
        .route("/check-otp", post(check_otp_post))
}

async fn homepage(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    IsHtmx(is_htmx): IsHtmx,
) -> Result<Markup, AppError> {
    let Some(user) = user else {
        return Ok(views::render(is_htmx, "Welcome", homepage_views::landing(), None));
    };

    let active = state
        .db
        .active_quiz()
        .await
        .reject("could not get active quiz")?;
    let history = state
        .quizzes
        .history(user.id)
        .await
        .reject("could not get history")?;

    Ok(views::render(
        is_htmx,
        "Home",
        homepage_views::home(&user, active.as_ref(), &history),
        Some(&user),
    ))
}

/// Sets the session cookie and sends htmx to `location`.
fn logged_in_response(
    state: &AppState,
    session_token: &str,
    location: &'static str,
) -> Result<Response, AppError> {
    let cookie = utils::cookie(
        names::USER_SESSION_COOKIE_NAME,
        session_token,
        state.secure_cookies,
    )
    .reject("could not build session cookie")?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    headers.insert("HX-Redirect", HeaderValue::from_static(location));
    Ok((headers, "").into_response())
}

async fn login_page(MaybeUser(user): MaybeUser, IsHtmx(is_htmx): IsHtmx) -> Response {
    if user.is_some() {
        return Redirect::to(names::HOME_URL).into_response();
    }
    views::render(
        is_htmx,
        "Log in",
        homepage_views::login(homepage_views::LoginState::NoError),
        None,
    )
    .into_response()
}

#[derive(Deserialize)]
struct LoginPost {
    email: String,
    password: String,
}

async fn login_post(
    State(state): State<AppState>,
    Form(body): Form<LoginPost>,
) -> Result<Response, AppError> {
    let outcome = state
        .auth
        .login(&body.email, &body.password)
        .await
        .reject("login failed")?;

    match outcome {
        LoginOutcome::Success(session_token) => {
            logged_in_response(&state, &session_token, names::HOME_URL)
        }
        LoginOutcome::InvalidCredentials => Ok(views::titled(
            "Log in",
            homepage_views::login(homepage_views::LoginState::InvalidCredentials),
        )
        .into_response()),
    }
}

async fn signup_page(IsHtmx(is_htmx): IsHtmx) -> Markup {
    views::render(
        is_htmx,
        "Sign up",
        homepage_views::signup(homepage_views::SignupState::NoError),
        None,
    )
}

#[derive(Deserialize)]
struct SignupPost {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
}

async fn signup_post(
    State(state): State<AppState>,
    Form(body): Form<SignupPost>,
) -> Result<Response, AppError> {
    use homepage_views::SignupState;

    let outcome = state
        .auth
        .register(&body.first_name, &body.last_name, &body.email, &body.password)
        .await
        .reject("registration failed")?;

    let signup_state = match outcome {
        RegisterOutcome::Registered => {
            let mut headers = HeaderMap::new();
            headers.insert("HX-Redirect", HeaderValue::from_static(names::LOGIN_URL));
            return Ok((headers, "").into_response());
        }
        RegisterOutcome::EmptyFields => SignupState::EmptyFields,
        RegisterOutcome::EmailTaken => SignupState::EmailTaken,
        RegisterOutcome::WeakPassword(reason) => SignupState::WeakPassword(reason),
    };

    Ok(views::titled("Sign up", homepage_views::signup(signup_state)).into_response())
}

async fn logout_post(
    jar: CookieJar,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(session_id) = jar
        .get(names::USER_SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
    {
        state
            .auth
            .logout(&session_id)
            .await
            .reject("could not delete session")?;
    }

    let clear = utils::clear_cookie(names::USER_SESSION_COOKIE_NAME, state.secure_cookies)
        .reject("could not build clear cookie")?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, clear);
    headers.insert("HX-Redirect", HeaderValue::from_static(names::LOGIN_URL));

    Ok((headers, ""))
}

async fn forgot_password_page(IsHtmx(is_htmx): IsHtmx) -> Markup {
    views::render(
        is_htmx,
        "Forgot password",
        homepage_views::forgot_password(),
        None,
    )
}

#[derive(Deserialize)]
struct ForgotPasswordPost {
    email: String,
}

async fn forgot_password_post(
    State(state): State<AppState>,
    Form(body): Form<ForgotPasswordPost>,
) -> Result<Markup, AppError> {
    state
        .auth
        .forgot_password(&body.email)
        .await
        .reject("could not issue one-time code")?;

    // Same page whether or not the account exists
    Ok(views::titled(
        "Reset password",
        homepage_views::check_otp(body.email.trim(), homepage_views::CheckOtpState::CodeSent),
    ))
}

#[derive(Deserialize)]
struct CheckOtpPost {
    email: String,
    code: String,
    new_password: String,
}

async fn check_otp_post(
    State(state): State<AppState>,
    Form(body): Form<CheckOtpPost>,
) -> Result<Response, AppError> {
    use homepage_views::CheckOtpState;

    let outcome = state
        .auth
        .check_otp(&body.email, &body.code, &body.new_password)
        .await
        .reject("could not check one-time code")?;

    let otp_state = match outcome {
        CheckOtpOutcome::Success(session_token) => {
            return logged_in_response(&state, &session_token, names::HOME_URL);
        }
        CheckOtpOutcome::InvalidCode => CheckOtpState::InvalidCode,
        CheckOtpOutcome::EmptyFields => CheckOtpState::EmptyFields,
        CheckOtpOutcome::WeakPassword(reason) => CheckOtpState::WeakPassword(reason),
    };

    Ok(views::titled(
        "Reset password",
        homepage_views::check_otp(body.email.trim(), otp_state),
    )
    .into_response())
}
