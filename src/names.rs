pub const HOME_URL: &str = "/";
pub const LOGIN_URL: &str = "/login";
pub const SIGNUP_URL: &str = "/signup";
pub const LOGOUT_URL: &str = "/logout";
pub const FORGOT_PASSWORD_URL: &str = "/forgot-password";
pub const CHECK_OTP_URL: &str = "/check-otp";
pub const QUIZ_URL: &str = "/quiz";
pub const HISTORY_URL: &str = "/history";

pub const ADMIN_URL: &str = "/admin";
pub const SCHEDULE_QUIZ_URL: &str = "/admin/schedule";
pub const GRANT_ADMIN_URL: &str = "/admin/grant";

pub const USER_SESSION_COOKIE_NAME: &str = "user_session";

/// Prefix of the form fields carrying answers, e.g. `answer_3` for question 3.
pub const ANSWER_FIELD_PREFIX: &str = "answer_";
/// Hidden field naming the quiz the answers belong to.
pub const QUIZ_ID_FIELD: &str = "quiz_id";

pub fn quiz_url(quiz_id: i64) -> String {
    format!("/admin/quiz/{quiz_id}")
}

pub fn generate_quiz_url(quiz_id: i64) -> String {
    format!("/admin/quiz/{quiz_id}/generate")
}

pub fn activate_quiz_url(quiz_id: i64) -> String {
    format!("/admin/quiz/{quiz_id}/activate")
}

pub fn answer_field(question_number: usize) -> String {
    format!("{ANSWER_FIELD_PREFIX}{question_number}")
}
