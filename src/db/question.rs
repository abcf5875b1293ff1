use color_eyre::Result;

use crate::models::{AnswerKey, ParsedQuestion};

use super::Db;

#[derive(sqlx::FromRow)]
struct QuestionRow {
    question: String,
    option_a: Option<String>,
    option_b: Option<String>,
    option_c: Option<String>,
    option_d: Option<String>,
    answer_idx: i64,
    raw: String,
}

impl From<QuestionRow> for ParsedQuestion {
    fn from(row: QuestionRow) -> Self {
        let answer = usize::try_from(row.answer_idx)
            .ok()
            .and_then(AnswerKey::from_index)
            .unwrap_or_default();

        ParsedQuestion {
            question: row.question,
            options: [row.option_a, row.option_b, row.option_c, row.option_d]
                .into_iter()
                .flatten()
                .collect(),
            answer,
            raw: row.raw,
        }
    }
}

impl Db {
    /// Replaces every stored question of `quiz_id` with `questions`.
    pub async fn replace_questions(&self, quiz_id: i64, questions: &[ParsedQuestion]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM quiz_questions WHERE quiz_id = ?")
            .bind(quiz_id)
            .execute(&mut *tx)
            .await?;

        for (idx, question) in questions.iter().enumerate() {
            let option = |i: usize| question.options.get(i).cloned();

            sqlx::query(
                r#"
                INSERT INTO quiz_questions
                    (quiz_id, question_number, question, option_a, option_b, option_c, option_d, answer_idx, raw)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(quiz_id)
            .bind(idx as i64 + 1)
            .bind(&question.question)
            .bind(option(0))
            .bind(option(1))
            .bind(option(2))
            .bind(option(3))
            .bind(question.answer.index() as i64)
            .bind(&question.raw)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!("stored {} questions for quiz {quiz_id}", questions.len());
        Ok(())
    }

    /// Questions of `quiz_id` in question order.
    pub async fn questions(&self, quiz_id: i64) -> Result<Vec<ParsedQuestion>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT question, option_a, option_b, option_c, option_d, answer_idx, raw
            FROM quiz_questions
            WHERE quiz_id = ?
            ORDER BY question_number
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ParsedQuestion::from).collect())
    }
}
