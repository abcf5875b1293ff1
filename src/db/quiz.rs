use color_eyre::Result;

use super::models::{NewQuiz, QuizHeader};
use super::Db;

const HEADER_COLUMNS: &str = r#"
    h.id, h.quiz_date, h.genres, h.difficulty, h.num_questions, h.created_by, h.is_active,
    (SELECT COUNT(*) FROM quiz_questions q WHERE q.quiz_id = h.id) AS question_count
"#;

impl Db {
    pub async fn create_quiz_header(&self, quiz: &NewQuiz) -> Result<i64> {
        let quiz_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO quiz_headers (quiz_date, genres, difficulty, num_questions, created_by)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(quiz.quiz_date)
        .bind(quiz.genres.join(","))
        .bind(&quiz.difficulty)
        .bind(quiz.num_questions)
        .bind(&quiz.created_by)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("quiz {quiz_id} scheduled for {}", quiz.quiz_date);
        Ok(quiz_id)
    }

    pub async fn quiz_header(&self, quiz_id: i64) -> Result<Option<QuizHeader>> {
        let header = sqlx::query_as::<_, QuizHeader>(&format!(
            "SELECT {HEADER_COLUMNS} FROM quiz_headers h WHERE h.id = ?"
        ))
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(header)
    }

    pub async fn quiz_headers(&self) -> Result<Vec<QuizHeader>> {
        let headers = sqlx::query_as::<_, QuizHeader>(&format!(
            "SELECT {HEADER_COLUMNS} FROM quiz_headers h ORDER BY h.quiz_date DESC, h.id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(headers)
    }

    pub async fn active_quiz(&self) -> Result<Option<QuizHeader>> {
        let header = sqlx::query_as::<_, QuizHeader>(&format!(
            "SELECT {HEADER_COLUMNS} FROM quiz_headers h WHERE h.is_active = 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(header)
    }

    /// Makes `quiz_id` the only active quiz. Returns false if it does not exist.
    pub async fn activate_quiz(&self, quiz_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE quiz_headers SET is_active = 0 WHERE is_active = 1")
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query("UPDATE quiz_headers SET is_active = 1 WHERE id = ?")
            .bind(quiz_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        tracing::info!("quiz {quiz_id} activated");
        Ok(true)
    }

    /// Deletes a quiz with its questions and results.
    pub async fn delete_quiz(&self, quiz_id: i64) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM quiz_headers WHERE id = ?")
            .bind(quiz_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted > 0 {
            tracing::info!("quiz {quiz_id} deleted");
        }
        Ok(deleted > 0)
    }
}
