// Database model structs

use chrono::NaiveDate;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

impl AuthUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct QuizHeader {
    pub id: i64,
    pub quiz_date: NaiveDate,
    /// Comma-separated genre list.
    pub genres: String,
    pub difficulty: String,
    pub num_questions: i64,
    pub created_by: String,
    pub is_active: bool,
    /// Questions currently stored for this quiz.
    pub question_count: i64,
}

impl QuizHeader {
    pub fn genre_list(&self) -> Vec<String> {
        self.genres
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub struct NewQuiz {
    pub quiz_date: NaiveDate,
    pub genres: Vec<String>,
    pub difficulty: String,
    pub num_questions: i64,
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionResult {
    pub question_number: i64,
    pub selected: Option<String>,
    pub is_correct: bool,
}

pub struct Submission {
    pub user_id: i64,
    pub quiz_id: i64,
    pub results: Vec<QuestionResult>,
    pub score: i64,
    pub total: i64,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ScoreEntry {
    pub quiz_id: i64,
    pub quiz_date: NaiveDate,
    pub genres: String,
    pub score: i64,
    pub total: i64,
    pub submitted_at: String,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub first_name: String,
    pub last_name: String,
    pub score: i64,
    pub total: i64,
}
