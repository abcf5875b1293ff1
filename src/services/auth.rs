use color_eyre::Result;
use rand::Rng;

use crate::db::Db;
use crate::email::ResendEmailSender;

// ---------------------------------------------------------------------------
// AuthRepository trait (DIP: service defines the abstraction it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AuthRepository: Send + Sync {
    fn email_exists(&self, email: &str) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<i64>> + Send;

    /// Returns the user id when the password matches.
    fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Option<i64>>> + Send;

    fn create_user_session(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn delete_user_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn replace_otp(
        &self,
        email: &str,
        code: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Consumes the code if it is current for `email`.
    fn take_otp(
        &self,
        email: &str,
        code: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Returns the user id, or `None` when no account uses `email`.
    fn set_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> impl std::future::Future<Output = Result<Option<i64>>> + Send;
}

// ---------------------------------------------------------------------------
// EmailSender trait (DIP: service defines the abstraction it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait EmailSender: Send + Sync {
    /// Whether email sending is configured (false in dev mode).
    fn is_enabled(&self) -> bool;

    fn send_otp_email(
        &self,
        to_email: &str,
        code: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum RegisterOutcome {
    Registered,
    EmptyFields,
    EmailTaken,
    WeakPassword(&'static str),
}

#[derive(Debug)]
pub enum LoginOutcome {
    /// Contains the session token.
    Success(String),
    /// Unknown email or wrong password.
    InvalidCredentials,
}

#[derive(Debug)]
pub enum CheckOtpOutcome {
    /// Password replaced and a session started. Contains the session token.
    Success(String),
    InvalidCode,
    EmptyFields,
    WeakPassword(&'static str),
}

const MIN_PASSWORD_LENGTH: usize = 8;

/// Returns the reason a password is rejected, if any.
pub fn password_weakness(password: &str) -> Option<&'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Some("Password must be at least 8 characters long.");
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Some("Password must contain at least one letter.");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("Password must contain at least one digit.");
    }
    None
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

pub struct AuthService<R: AuthRepository = Db, E: EmailSender = ResendEmailSender> {
    repo: R,
    email: E,
}

impl<R: AuthRepository + Clone, E: EmailSender + Clone> Clone for AuthService<R, E> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            email: self.email.clone(),
        }
    }
}

impl<R: AuthRepository, E: EmailSender> AuthService<R, E> {
    pub fn new(repo: R, email: E) -> Self {
        Self { repo, email }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let Some(user_id) = self.repo.verify_user_password(&email, password).await? else {
            tracing::warn!("Failed login attempt for {email}");
            return Ok(LoginOutcome::InvalidCredentials);
        };

        let session_token = self.repo.create_user_session(user_id).await?;
        tracing::info!("{email} logged in successfully");
        Ok(LoginOutcome::Success(session_token))
    }

    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterOutcome> {
        let (first_name, last_name) = (first_name.trim(), last_name.trim());
        let email = normalize_email(email);

        if first_name.is_empty() || last_name.is_empty() || email.is_empty() || password.is_empty()
        {
            return Ok(RegisterOutcome::EmptyFields);
        }

        if let Some(reason) = password_weakness(password) {
            return Ok(RegisterOutcome::WeakPassword(reason));
        }

        if self.repo.email_exists(&email).await? {
            return Ok(RegisterOutcome::EmailTaken);
        }

        let user_id = self
            .repo
            .create_user(first_name, last_name, &email, password)
            .await?;
        tracing::info!("New user registered: id={user_id}, email={email}");
        Ok(RegisterOutcome::Registered)
    }

    pub async fn logout(&self, session_id: &str) -> Result<()> {
        self.repo.delete_user_session(session_id).await
    }

    /// Issues a fresh code for `email`. The caller sees the same result
    /// whether or not an account exists.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        if email.is_empty() || !self.repo.email_exists(&email).await? {
            return Ok(());
        }

        let code = generate_otp();
        self.repo.replace_otp(&email, &code).await?;

        if !self.email.is_enabled() {
            tracing::info!("email disabled, OTP for {email} is {code}");
            return Ok(());
        }

        match self.email.send_otp_email(&email, &code).await {
            Ok(()) => tracing::info!("OTP issued for {email}"),
            Err(e) => tracing::error!("failed to send OTP email to {email}: {e}"),
        }
        Ok(())
    }

    pub async fn check_otp(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<CheckOtpOutcome> {
        let email = normalize_email(email);
        let code = code.trim();

        if email.is_empty() || code.is_empty() || new_password.is_empty() {
            return Ok(CheckOtpOutcome::EmptyFields);
        }

        if let Some(reason) = password_weakness(new_password) {
            return Ok(CheckOtpOutcome::WeakPassword(reason));
        }

        if !self.repo.take_otp(&email, code).await? {
            tracing::warn!("invalid OTP submitted for {email}");
            return Ok(CheckOtpOutcome::InvalidCode);
        }

        let Some(user_id) = self.repo.set_password(&email, new_password).await? else {
            return Ok(CheckOtpOutcome::InvalidCode);
        };

        let session_token = self.repo.create_user_session(user_id).await?;
        tracing::info!("password reset for {email}");
        Ok(CheckOtpOutcome::Success(session_token))
    }
}

// ---------------------------------------------------------------------------
// Db implementation
// ---------------------------------------------------------------------------

impl AuthRepository for Db {
    async fn email_exists(&self, email: &str) -> Result<bool> {
        Db::email_exists(self, email).await
    }

    async fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64> {
        Db::create_user(self, first_name, last_name, email, password).await
    }

    async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<i64>> {
        Db::verify_user_password(self, email, password).await
    }

    async fn create_user_session(&self, user_id: i64) -> Result<String> {
        Db::create_user_session(self, user_id).await
    }

    async fn delete_user_session(&self, session_id: &str) -> Result<()> {
        Db::delete_user_session(self, session_id).await
    }

    async fn replace_otp(&self, email: &str, code: &str) -> Result<()> {
        Db::replace_otp(self, email, code).await
    }

    async fn take_otp(&self, email: &str, code: &str) -> Result<bool> {
        Db::take_otp(self, email, code).await
    }

    async fn set_password(&self, email: &str, new_password: &str) -> Result<Option<i64>> {
        Db::set_password(self, email, new_password).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
