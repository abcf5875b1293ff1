use chrono::NaiveDate;
use color_eyre::Result;

use crate::db::models::{LeaderboardEntry, NewQuiz, QuestionResult, QuizHeader, ScoreEntry, Submission};
use crate::db::Db;
use crate::generator::{GenerationRequest, OpenAiGenerator, QuizGenerator, TextGenerator};
use crate::grading::{self, Grade};
use crate::models::ParsedQuestion;

pub const MAX_QUESTIONS: i64 = 20;
pub const DEFAULT_DIFFICULTY: &str = "medium";

// ---------------------------------------------------------------------------
// QuizRepository trait
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait QuizRepository: Send + Sync {
    fn create_quiz_header(
        &self,
        quiz: &NewQuiz,
    ) -> impl std::future::Future<Output = Result<i64>> + Send;

    fn quiz_header(
        &self,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<QuizHeader>>> + Send;

    fn quiz_headers(&self) -> impl std::future::Future<Output = Result<Vec<QuizHeader>>> + Send;

    fn replace_questions(
        &self,
        quiz_id: i64,
        questions: &[ParsedQuestion],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn questions(
        &self,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<ParsedQuestion>>> + Send;

    fn activate_quiz(&self, quiz_id: i64) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn delete_quiz(&self, quiz_id: i64) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn active_quiz(&self) -> impl std::future::Future<Output = Result<Option<QuizHeader>>> + Send;

    fn has_submitted(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn save_submission(
        &self,
        submission: &Submission,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn user_history(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<ScoreEntry>>> + Send;

    fn leaderboard(
        &self,
        quiz_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<LeaderboardEntry>>> + Send;
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ScheduleOutcome {
    Scheduled(i64),
    InvalidDate,
    NoGenres,
    InvalidCount,
}

#[derive(Debug)]
pub enum GenerateOutcome {
    /// Number of stored questions and how many of them are placeholders.
    Generated { total: usize, placeholders: usize },
    NotFound,
}

#[derive(Debug)]
pub enum ActivateOutcome {
    Activated,
    NotFound,
    NoQuestions,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Graded(Grade),
    NoActiveQuiz,
    /// The answered quiz is no longer the active one.
    QuizChanged,
    AlreadySubmitted,
}

pub struct ActiveQuiz {
    pub header: QuizHeader,
    pub questions: Vec<ParsedQuestion>,
    pub already_submitted: bool,
}

pub struct QuizPreview {
    pub header: QuizHeader,
    pub questions: Vec<ParsedQuestion>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

pub fn parse_genres(genres: &str) -> Vec<String> {
    genres
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// QuizService
// ---------------------------------------------------------------------------

pub struct QuizService<R: QuizRepository = Db, G: TextGenerator = OpenAiGenerator> {
    repo: R,
    generator: QuizGenerator<G>,
}

impl<R: QuizRepository + Clone, G: TextGenerator + Clone> Clone for QuizService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            generator: self.generator.clone(),
        }
    }
}

impl<R: QuizRepository, G: TextGenerator> QuizService<R, G> {
    pub fn new(repo: R, generator: QuizGenerator<G>) -> Self {
        Self { repo, generator }
    }

    pub async fn schedule(
        &self,
        quiz_date: &str,
        genres: &str,
        difficulty: &str,
        num_questions: i64,
        created_by: &str,
    ) -> Result<ScheduleOutcome> {
        let Ok(quiz_date) = NaiveDate::parse_from_str(quiz_date.trim(), "%Y-%m-%d") else {
            return Ok(ScheduleOutcome::InvalidDate);
        };

        let genres = parse_genres(genres);
        if genres.is_empty() {
            return Ok(ScheduleOutcome::NoGenres);
        }

        if !(1..=MAX_QUESTIONS).contains(&num_questions) {
            return Ok(ScheduleOutcome::InvalidCount);
        }

        let difficulty = match difficulty.trim() {
            "" => DEFAULT_DIFFICULTY.to_string(),
            d => d.to_lowercase(),
        };

        let quiz_id = self
            .repo
            .create_quiz_header(&NewQuiz {
                quiz_date,
                genres,
                difficulty,
                num_questions,
                created_by: created_by.to_string(),
            })
            .await?;

        Ok(ScheduleOutcome::Scheduled(quiz_id))
    }

    /// Generates and stores questions for a scheduled quiz, replacing any
    /// previously stored ones.
    pub async fn generate(&self, quiz_id: i64) -> Result<GenerateOutcome> {
        let Some(header) = self.repo.quiz_header(quiz_id).await? else {
            return Ok(GenerateOutcome::NotFound);
        };

        let genres = header.genre_list();
        let request = GenerationRequest {
            genres: &genres,
            difficulty: &header.difficulty,
            count: usize::try_from(header.num_questions).unwrap_or(1),
        };

        let questions = self.generator.generate(&request).await;
        self.repo.replace_questions(quiz_id, &questions).await?;

        Ok(GenerateOutcome::Generated {
            total: questions.len(),
            placeholders: questions.iter().filter(|q| q.is_placeholder()).count(),
        })
    }

    pub async fn activate(&self, quiz_id: i64) -> Result<ActivateOutcome> {
        let Some(header) = self.repo.quiz_header(quiz_id).await? else {
            return Ok(ActivateOutcome::NotFound);
        };

        if header.question_count == 0 {
            return Ok(ActivateOutcome::NoQuestions);
        }

        if self.repo.activate_quiz(quiz_id).await? {
            Ok(ActivateOutcome::Activated)
        } else {
            Ok(ActivateOutcome::NotFound)
        }
    }

    pub async fn delete(&self, quiz_id: i64) -> Result<bool> {
        self.repo.delete_quiz(quiz_id).await
    }

    pub async fn quizzes(&self) -> Result<Vec<QuizHeader>> {
        self.repo.quiz_headers().await
    }

    pub async fn active_quiz(&self, user_id: i64) -> Result<Option<ActiveQuiz>> {
        let Some(header) = self.repo.active_quiz().await? else {
            return Ok(None);
        };

        let questions = self.repo.questions(header.id).await?;
        let already_submitted = self.repo.has_submitted(user_id, header.id).await?;

        Ok(Some(ActiveQuiz {
            header,
            questions,
            already_submitted,
        }))
    }

    /// Grades `answers` for `quiz_id`, which must still be the active quiz,
    /// and records the result. A user gets one submission per quiz.
    pub async fn submit(
        &self,
        user_id: i64,
        quiz_id: i64,
        answers: &[Option<String>],
    ) -> Result<SubmitOutcome> {
        let Some(header) = self.repo.active_quiz().await? else {
            return Ok(SubmitOutcome::NoActiveQuiz);
        };

        if header.id != quiz_id {
            return Ok(SubmitOutcome::QuizChanged);
        }

        if self.repo.has_submitted(user_id, header.id).await? {
            return Ok(SubmitOutcome::AlreadySubmitted);
        }

        let questions = self.repo.questions(header.id).await?;
        let grade = grading::grade(&questions, answers);

        let results = questions
            .iter()
            .enumerate()
            .map(|(idx, question)| {
                let selected = answers
                    .get(idx)
                    .cloned()
                    .flatten()
                    .filter(|a| !a.trim().is_empty());
                QuestionResult {
                    question_number: idx as i64 + 1,
                    is_correct: selected
                        .as_deref()
                        .is_some_and(|a| grading::question_matches(question, a)),
                    selected,
                }
            })
            .collect();

        let saved = self
            .repo
            .save_submission(&Submission {
                user_id,
                quiz_id: header.id,
                results,
                score: grade.score as i64,
                total: grade.total as i64,
            })
            .await?;

        if !saved {
            return Ok(SubmitOutcome::AlreadySubmitted);
        }

        Ok(SubmitOutcome::Graded(grade))
    }

    pub async fn history(&self, user_id: i64) -> Result<Vec<ScoreEntry>> {
        self.repo.user_history(user_id).await
    }

    pub async fn preview(&self, quiz_id: i64) -> Result<Option<QuizPreview>> {
        let Some(header) = self.repo.quiz_header(quiz_id).await? else {
            return Ok(None);
        };

        let questions = self.repo.questions(quiz_id).await?;
        let leaderboard = self.repo.leaderboard(quiz_id).await?;

        Ok(Some(QuizPreview {
            header,
            questions,
            leaderboard,
        }))
    }
}

// ---------------------------------------------------------------------------
// Db implementation
// ---------------------------------------------------------------------------

impl QuizRepository for Db {
    async fn create_quiz_header(&self, quiz: &NewQuiz) -> Result<i64> {
        Db::create_quiz_header(self, quiz).await
    }

    async fn quiz_header(&self, quiz_id: i64) -> Result<Option<QuizHeader>> {
        Db::quiz_header(self, quiz_id).await
    }

    async fn quiz_headers(&self) -> Result<Vec<QuizHeader>> {
        Db::quiz_headers(self).await
    }

    async fn replace_questions(&self, quiz_id: i64, questions: &[ParsedQuestion]) -> Result<()> {
        Db::replace_questions(self, quiz_id, questions).await
    }

    async fn questions(&self, quiz_id: i64) -> Result<Vec<ParsedQuestion>> {
        Db::questions(self, quiz_id).await
    }

    async fn activate_quiz(&self, quiz_id: i64) -> Result<bool> {
        Db::activate_quiz(self, quiz_id).await
    }

    async fn delete_quiz(&self, quiz_id: i64) -> Result<bool> {
        Db::delete_quiz(self, quiz_id).await
    }

    async fn active_quiz(&self) -> Result<Option<QuizHeader>> {
        Db::active_quiz(self).await
    }

    async fn has_submitted(&self, user_id: i64, quiz_id: i64) -> Result<bool> {
        Db::has_submitted(self, user_id, quiz_id).await
    }

    async fn save_submission(&self, submission: &Submission) -> Result<bool> {
        Db::save_submission(self, submission).await
    }

    async fn user_history(&self, user_id: i64) -> Result<Vec<ScoreEntry>> {
        Db::user_history(self, user_id).await
    }

    async fn leaderboard(&self, quiz_id: i64) -> Result<Vec<LeaderboardEntry>> {
        Db::leaderboard(self, quiz_id).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::generator::MockTextGenerator;
    use crate::models::AnswerKey;

    fn header(id: i64, question_count: i64) -> QuizHeader {
        QuizHeader {
            id,
            quiz_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            genres: "History, Science".to_string(),
            difficulty: "easy".to_string(),
            num_questions: 2,
            created_by: "admin@example.com".to_string(),
            is_active: true,
            question_count,
        }
    }

    fn question(answer: &str) -> ParsedQuestion {
        ParsedQuestion {
            question: "Pick".to_string(),
            options: vec!["A) x".into(), "B) y".into(), "C) z".into(), "D) w".into()],
            answer: AnswerKey::from_letter(answer).unwrap(),
            raw: "Pick".to_string(),
        }
    }

    fn service(repo: MockQuizRepository) -> QuizService<MockQuizRepository, MockTextGenerator> {
        service_with_generator(repo, MockTextGenerator::new())
    }

    fn service_with_generator(
        repo: MockQuizRepository,
        backend: MockTextGenerator,
    ) -> QuizService<MockQuizRepository, MockTextGenerator> {
        QuizService::new(repo, QuizGenerator::new(backend).with_retry(1, Duration::ZERO))
    }

    // ----- schedule tests -----

    #[tokio::test]
    async fn schedule_validates_input() {
        let svc = service(MockQuizRepository::new());

        let outcome = svc.schedule("2024-13-01", "Art", "", 5, "a").await.unwrap();
        assert!(matches!(outcome, ScheduleOutcome::InvalidDate));

        let outcome = svc.schedule("2024-05-01", " , ", "", 5, "a").await.unwrap();
        assert!(matches!(outcome, ScheduleOutcome::NoGenres));

        let outcome = svc.schedule("2024-05-01", "Art", "", 0, "a").await.unwrap();
        assert!(matches!(outcome, ScheduleOutcome::InvalidCount));

        let outcome = svc.schedule("2024-05-01", "Art", "", 21, "a").await.unwrap();
        assert!(matches!(outcome, ScheduleOutcome::InvalidCount));
    }

    #[tokio::test]
    async fn schedule_stores_trimmed_genres_and_default_difficulty() {
        let mut repo = MockQuizRepository::new();
        repo.expect_create_quiz_header()
            .withf(|quiz| {
                quiz.genres == vec!["History".to_string(), "Art".to_string()]
                    && quiz.difficulty == DEFAULT_DIFFICULTY
                    && quiz.num_questions == 5
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(9) }));

        let svc = service(repo);
        let outcome = svc
            .schedule("2024-05-01", " History ,Art,", "  ", 5, "admin@example.com")
            .await
            .unwrap();

        assert!(matches!(outcome, ScheduleOutcome::Scheduled(9)));
    }

    // ----- generate tests -----

    #[tokio::test]
    async fn generate_stores_exactly_requested_count() {
        let mut repo = MockQuizRepository::new();
        repo.expect_quiz_header()
            .returning(|id| Box::pin(async move { Ok(Some(header(id, 0))) }));
        repo.expect_replace_questions()
            .withf(|id, questions| *id == 4 && questions.len() == 2)
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let mut backend = MockTextGenerator::new();
        backend
            .expect_generate()
            .withf(|prompt| prompt.contains("JSON array"))
            .returning(|_| {
                Box::pin(async {
                    Ok(r#"[{"question":"Q1?","options":["A) a","B) b"],"answer":"B"}]"#.to_string())
                })
            });
        backend
            .expect_generate()
            .withf(|prompt| prompt.contains("Answer:"))
            .returning(|_| Box::pin(async { Err(color_eyre::eyre::eyre!("backend down")) }));

        let svc = service_with_generator(repo, backend);
        let outcome = svc.generate(4).await.unwrap();

        assert!(matches!(
            outcome,
            GenerateOutcome::Generated { total: 2, placeholders: 1 }
        ));
    }

    #[tokio::test]
    async fn generate_unknown_quiz_is_not_found() {
        let mut repo = MockQuizRepository::new();
        repo.expect_quiz_header()
            .returning(|_| Box::pin(async { Ok(None) }));

        let svc = service(repo);
        assert!(matches!(svc.generate(1).await.unwrap(), GenerateOutcome::NotFound));
    }

    // ----- activate tests -----

    #[tokio::test]
    async fn activate_requires_questions() {
        let mut repo = MockQuizRepository::new();
        repo.expect_quiz_header()
            .returning(|id| Box::pin(async move { Ok(Some(header(id, 0))) }));
        repo.expect_activate_quiz().never();

        let svc = service(repo);
        assert!(matches!(svc.activate(1).await.unwrap(), ActivateOutcome::NoQuestions));
    }

    #[tokio::test]
    async fn activate_with_questions_succeeds() {
        let mut repo = MockQuizRepository::new();
        repo.expect_quiz_header()
            .returning(|id| Box::pin(async move { Ok(Some(header(id, 3))) }));
        repo.expect_activate_quiz()
            .times(1)
            .returning(|_| Box::pin(async { Ok(true) }));

        let svc = service(repo);
        assert!(matches!(svc.activate(1).await.unwrap(), ActivateOutcome::Activated));
    }

    // ----- submit tests -----

    #[tokio::test]
    async fn submit_grades_and_records_each_question() {
        let mut repo = MockQuizRepository::new();
        repo.expect_active_quiz()
            .returning(|| Box::pin(async { Ok(Some(header(1, 3))) }));
        repo.expect_has_submitted()
            .returning(|_, _| Box::pin(async { Ok(false) }));
        repo.expect_questions()
            .returning(|_| Box::pin(async { Ok(vec![question("B"), question("C"), question("A")]) }));
        repo.expect_save_submission()
            .withf(|s| {
                s.user_id == 5
                    && s.score == 2
                    && s.total == 3
                    && s.results
                        == vec![
                            QuestionResult {
                                question_number: 1,
                                selected: Some("b".to_string()),
                                is_correct: true,
                            },
                            QuestionResult {
                                question_number: 2,
                                selected: None,
                                is_correct: false,
                            },
                            QuestionResult {
                                question_number: 3,
                                selected: Some("x".to_string()),
                                is_correct: true,
                            },
                        ]
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(true) }));

        let svc = service(repo);
        let answers = vec![Some("b".to_string()), Some(" ".to_string()), Some("x".to_string())];
        let outcome = svc.submit(5, 1, &answers).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Graded(Grade { score: 2, total: 3 })));
    }

    #[tokio::test]
    async fn second_submission_is_rejected() {
        let mut repo = MockQuizRepository::new();
        repo.expect_active_quiz()
            .returning(|| Box::pin(async { Ok(Some(header(1, 3))) }));
        repo.expect_has_submitted()
            .returning(|_, _| Box::pin(async { Ok(true) }));
        repo.expect_save_submission().never();

        let svc = service(repo);
        let outcome = svc.submit(5, 1, &[]).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::AlreadySubmitted));
    }

    #[tokio::test]
    async fn submission_lost_to_a_concurrent_one_is_rejected() {
        let mut repo = MockQuizRepository::new();
        repo.expect_active_quiz()
            .returning(|| Box::pin(async { Ok(Some(header(1, 1))) }));
        repo.expect_has_submitted()
            .returning(|_, _| Box::pin(async { Ok(false) }));
        repo.expect_questions()
            .returning(|_| Box::pin(async { Ok(vec![question("A")]) }));
        repo.expect_save_submission()
            .times(1)
            .returning(|_| Box::pin(async { Ok(false) }));

        let svc = service(repo);
        let outcome = svc.submit(5, 1, &[Some("A".to_string())]).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::AlreadySubmitted));
    }

    #[tokio::test]
    async fn answers_for_a_replaced_quiz_are_not_graded() {
        let mut repo = MockQuizRepository::new();
        repo.expect_active_quiz()
            .returning(|| Box::pin(async { Ok(Some(header(2, 3))) }));
        repo.expect_questions().never();
        repo.expect_save_submission().never();

        let svc = service(repo);
        let outcome = svc.submit(5, 1, &[Some("A".to_string())]).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::QuizChanged));
    }

    #[tokio::test]
    async fn submit_without_active_quiz() {
        let mut repo = MockQuizRepository::new();
        repo.expect_active_quiz()
            .returning(|| Box::pin(async { Ok(None) }));

        let svc = service(repo);
        assert!(matches!(svc.submit(5, 1, &[]).await.unwrap(), SubmitOutcome::NoActiveQuiz));
    }

    #[test]
    fn genres_are_split_and_trimmed() {
        assert_eq!(parse_genres(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(parse_genres(" , ").is_empty());
    }
}
