use maud::{html, Markup};

use crate::db::models::{AuthUser, QuizHeader, ScoreEntry};
use crate::names;
use crate::views::quiz as quiz_views;

pub fn home(user: &AuthUser, active: Option<&QuizHeader>, history: &[ScoreEntry]) -> Markup {
    html! {
        h1 { "Welcome, " (user.first_name) "!" }

        article {
            @if let Some(quiz) = active {
                header { "Today's quiz" }
                p.quiz-meta { (quiz_views::quiz_summary(quiz)) }
                a role="button" href=(names::QUIZ_URL) { "Take the quiz" }
            } @else {
                p { "There is no active quiz right now. Check back later." }
            }
        }

        h2 { "Recent results" }
        (quiz_views::history_table(history))
    }
}

pub fn landing() -> Markup {
    html! {
        h1 { "Daily Quiz" }
        p { "A fresh multiple-choice quiz every day. Sign up to take part and track your scores." }
        div.inline-actions {
            a role="button" href=(names::SIGNUP_URL) { "Sign up" }
            a role="button" class="outline" href=(names::LOGIN_URL) { "Log in" }
        }
    }
}

fn error_line(message: Option<&str>) -> Markup {
    html! {
        @if let Some(msg) = message {
            p.error role="alert" { (msg) }
        }
    }
}

pub enum LoginState {
    NoError,
    InvalidCredentials,
}

pub fn login(state: LoginState) -> Markup {
    let error = match state {
        LoginState::NoError => None,
        LoginState::InvalidCredentials => Some("Incorrect email or password."),
    };

    html! {
        h1 { "Log in" }
        article style="width: fit-content;" {
            (error_line(error))
            form hx-post=(names::LOGIN_URL) hx-target="main" {
                label {
                    "Email"
                    input name="email" type="email" autocomplete="email" required="true"
                          placeholder="Email" aria-label="Email";
                }
                label {
                    "Password"
                    @if error.is_some() {
                        input name="password" type="password" autocomplete="current-password"
                              required="true" placeholder="Password" aria-invalid="true"
                              aria-label="Password";
                    } @else {
                        input name="password" type="password" autocomplete="current-password"
                              required="true" placeholder="Password" aria-label="Password";
                    }
                }
                button type="submit" { "Log in" }
            }
            p {
                a href=(names::FORGOT_PASSWORD_URL) { "Forgot your password?" }
            }
            p {
                "No account yet? "
                a href=(names::SIGNUP_URL) { "Sign up" }
            }
        }
    }
}

pub enum SignupState<'a> {
    NoError,
    EmptyFields,
    EmailTaken,
    WeakPassword(&'a str),
}

pub fn signup(state: SignupState<'_>) -> Markup {
    let error = match state {
        SignupState::NoError => None,
        SignupState::EmptyFields => Some("Please fill in every field."),
        SignupState::EmailTaken => Some("An account with this email already exists."),
        SignupState::WeakPassword(reason) => Some(reason),
    };

    html! {
        h1 { "Sign up" }
        article style="width: fit-content;" {
            (error_line(error))
            form hx-post=(names::SIGNUP_URL) hx-target="main" {
                div.grid {
                    label {
                        "First name"
                        input name="first_name" type="text" autocomplete="given-name"
                              required="true" placeholder="First name";
                    }
                    label {
                        "Last name"
                        input name="last_name" type="text" autocomplete="family-name"
                              required="true" placeholder="Last name";
                    }
                }
                label {
                    "Email"
                    input name="email" type="email" autocomplete="email" required="true"
                          placeholder="Email";
                }
                label {
                    "Password"
                    input name="password" type="password" autocomplete="new-password"
                          required="true" placeholder="Password";
                    small { "At least 8 characters, with a letter and a digit." }
                }
                button type="submit" { "Create account" }
            }
            p {
                "Already have an account? "
                a href=(names::LOGIN_URL) { "Log in" }
            }
        }
    }
}

pub fn forgot_password() -> Markup {
    html! {
        h1 { "Forgot password" }
        article style="width: fit-content;" {
            p { "Enter your email and we will send you a one-time code." }
            form hx-post=(names::FORGOT_PASSWORD_URL) hx-target="main" {
                label {
                    "Email"
                    input name="email" type="email" autocomplete="email" required="true"
                          placeholder="Email";
                }
                button type="submit" { "Send code" }
            }
        }
    }
}

pub enum CheckOtpState<'a> {
    CodeSent,
    InvalidCode,
    EmptyFields,
    WeakPassword(&'a str),
}

pub fn check_otp(email: &str, state: CheckOtpState<'_>) -> Markup {
    let (error, notice) = match state {
        CheckOtpState::CodeSent => (
            None,
            Some("If an account exists for this email, a code is on its way. It is valid for 10 minutes."),
        ),
        CheckOtpState::InvalidCode => (Some("The code is invalid or has expired."), None),
        CheckOtpState::EmptyFields => (Some("Please fill in every field."), None),
        CheckOtpState::WeakPassword(reason) => (Some(reason), None),
    };

    html! {
        h1 { "Reset password" }
        article style="width: fit-content;" {
            @if let Some(msg) = notice {
                p.notice { (msg) }
            }
            (error_line(error))
            form hx-post=(names::CHECK_OTP_URL) hx-target="main" {
                input type="hidden" name="email" value=(email);
                label {
                    "One-time code"
                    input name="code" type="text" inputmode="numeric" autocomplete="one-time-code"
                          maxlength="6" required="true" placeholder="123456";
                }
                label {
                    "New password"
                    input name="new_password" type="password" autocomplete="new-password"
                          required="true" placeholder="New password";
                }
                button type="submit" { "Reset password" }
            }
        }
    }
}
