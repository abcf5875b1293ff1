use axum::http::HeaderValue;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const SESSION_MAX_AGE_SECS: u32 = 60 * 60 * 24 * 7;

pub fn cookie(
    name: &str,
    value: &str,
    secure: bool,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let secure = if secure { " Secure;" } else { "" };
    HeaderValue::from_str(&format!(
        "{name}={value}; HttpOnly; Max-Age={SESSION_MAX_AGE_SECS};{secure} Path=/; SameSite=Strict"
    ))
}

pub fn clear_cookie(
    name: &str,
    secure: bool,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let secure = if secure { " Secure;" } else { "" };
    HeaderValue::from_str(&format!(
        "{name}=; HttpOnly; Max-Age=0;{secure} Path=/; SameSite=Strict"
    ))
}
