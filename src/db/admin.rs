use color_eyre::Result;

use super::Db;

impl Db {
    /// Grants admin rights to `email`. Granting twice is a no-op.
    pub async fn grant_admin(&self, email: &str) -> Result<()> {
        sqlx::query("INSERT INTO admins (email) VALUES (?) ON CONFLICT(email) DO NOTHING")
            .bind(email)
            .execute(&self.pool)
            .await?;

        tracing::info!("admin rights granted to {email}");
        Ok(())
    }

    pub async fn is_admin(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admins WHERE email = ?)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn admin_emails(&self) -> Result<Vec<String>> {
        let emails = sqlx::query_scalar("SELECT email FROM admins ORDER BY granted_at, email")
            .fetch_all(&self.pool)
            .await?;
        Ok(emails)
    }
}
