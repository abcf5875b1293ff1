use color_eyre::Result;

use super::models::{LeaderboardEntry, ScoreEntry, Submission};
use super::Db;

impl Db {
    pub async fn has_submitted(&self, user_id: i64, quiz_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM score_rollups WHERE user_id = ? AND quiz_id = ?)",
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Stores the user's rollup and per-question results for the quiz in one
    /// transaction. Returns `false` without writing anything when the user
    /// already has a submission for this quiz.
    pub async fn save_submission(&self, submission: &Submission) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO score_rollups (user_id, quiz_id, score, total)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, quiz_id) DO NOTHING
            "#,
        )
        .bind(submission.user_id)
        .bind(submission.quiz_id)
        .bind(submission.score)
        .bind(submission.total)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            tracing::warn!(
                user_id = submission.user_id,
                quiz_id = submission.quiz_id,
                "duplicate quiz submission ignored"
            );
            return Ok(false);
        }

        for result in &submission.results {
            sqlx::query(
                r#"
                INSERT INTO user_results (user_id, quiz_id, question_number, selected, is_correct)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(submission.user_id)
            .bind(submission.quiz_id)
            .bind(result.question_number)
            .bind(&result.selected)
            .bind(result.is_correct)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            user_id = submission.user_id,
            quiz_id = submission.quiz_id,
            score = submission.score,
            total = submission.total,
            "quiz submission graded"
        );
        Ok(true)
    }

    pub async fn user_history(&self, user_id: i64) -> Result<Vec<ScoreEntry>> {
        let entries = sqlx::query_as::<_, ScoreEntry>(
            r#"
            SELECT r.quiz_id, h.quiz_date, h.genres, r.score, r.total, r.submitted_at
            FROM score_rollups r
            JOIN quiz_headers h ON h.id = r.quiz_id
            WHERE r.user_id = ?
            ORDER BY r.submitted_at DESC, r.quiz_id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn leaderboard(&self, quiz_id: i64) -> Result<Vec<LeaderboardEntry>> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT u.first_name, u.last_name, r.score, r.total
            FROM score_rollups r
            JOIN users u ON u.id = r.user_id
            WHERE r.quiz_id = ?
            ORDER BY r.score DESC, r.submitted_at ASC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
