use color_eyre::Result;

use super::Db;

/// Wrong guesses allowed before a pending code is discarded.
pub const MAX_OTP_ATTEMPTS: i64 = 5;

impl Db {
    /// Stores `code` as the only pending code for `email`, valid for ten minutes.
    pub async fn replace_otp(&self, email: &str, code: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_otps (email, code, expires_at, failed_attempts)
            VALUES (?, ?, datetime('now', '+10 minutes'), 0)
            ON CONFLICT(email) DO UPDATE SET
                code = excluded.code,
                expires_at = excluded.expires_at,
                failed_attempts = 0
            "#,
        )
        .bind(email)
        .bind(code)
        .execute(&self.pool)
        .await?;

        tracing::debug!("OTP stored for {email}");
        Ok(())
    }

    /// Deletes and reports a matching, unexpired code. Expired rows for
    /// `email` are cleared as a side effect. A wrong guess counts against the
    /// pending code, which is dropped once [`MAX_OTP_ATTEMPTS`] is reached.
    pub async fn take_otp(&self, email: &str, code: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_otps WHERE email = ? AND expires_at <= datetime('now')")
            .bind(email)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM user_otps WHERE email = ? AND code = ?")
            .bind(email)
            .bind(code)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            sqlx::query("UPDATE user_otps SET failed_attempts = failed_attempts + 1 WHERE email = ?")
                .bind(email)
                .execute(&mut *tx)
                .await?;

            let dropped = sqlx::query("DELETE FROM user_otps WHERE email = ? AND failed_attempts >= ?")
                .bind(email)
                .bind(MAX_OTP_ATTEMPTS)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            if dropped > 0 {
                tracing::warn!("OTP for {email} discarded after {MAX_OTP_ATTEMPTS} wrong guesses");
            }
        }

        tx.commit().await?;
        Ok(deleted > 0)
    }
}
