mod common;

use chrono::NaiveDate;
use common::{create_test_db, create_test_db_with_url, create_user};
use dailyquiz::db::models::{NewQuiz, QuestionResult, Submission};
use dailyquiz::db::{Db, MAX_OTP_ATTEMPTS};
use dailyquiz::generator::{OpenAiGenerator, QuizGenerator, DEFAULT_API_URL};
use dailyquiz::models::{AnswerKey, ParsedQuestion};
use dailyquiz::services::quiz::{QuizService, SubmitOutcome};

fn sample_questions(n: usize) -> Vec<ParsedQuestion> {
    (1..=n)
        .map(|i| ParsedQuestion {
            question: format!("Question {i}?"),
            options: vec![
                format!("A) Wrong {i}"),
                format!("B) Right {i}"),
                format!("C) Other {i}"),
            ],
            answer: AnswerKey::from_letter("B").unwrap(),
            raw: format!("Question {i}?"),
        })
        .collect()
}

async fn schedule(db: &Db, date: &str) -> i64 {
    db.create_quiz_header(&NewQuiz {
        quiz_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        genres: vec!["History".to_string(), "Science".to_string()],
        difficulty: "medium".to_string(),
        num_questions: 3,
        created_by: "admin@example.com".to_string(),
    })
    .await
    .unwrap()
}

// ----- users and sessions -----

#[tokio::test]
async fn user_session_round_trip() {
    let db = create_test_db().await;
    let user_id = create_user(&db, "Ada", "ada@example.com").await;

    assert_eq!(
        db.verify_user_password("ada@example.com", "password1").await.unwrap(),
        Some(user_id)
    );
    assert_eq!(
        db.verify_user_password("ada@example.com", "nope").await.unwrap(),
        None
    );
    assert_eq!(
        db.verify_user_password("ghost@example.com", "password1").await.unwrap(),
        None
    );

    let session = db.create_user_session(user_id).await.unwrap();
    let user = db.get_user_by_session(&session).await.unwrap().unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.display_name(), "Ada Tester");
    assert!(!user.is_admin);

    db.delete_user_session(&session).await.unwrap();
    assert!(db.get_user_by_session(&session).await.unwrap().is_none());
}

#[tokio::test]
async fn passwords_are_stored_hashed() {
    let (db, url) = create_test_db_with_url().await;
    create_user(&db, "Ada", "ada@example.com").await;

    let pool = sqlx::SqlitePool::connect(&url).await.unwrap();
    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE email = ?")
        .bind("ada@example.com")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert!(stored.starts_with("$argon2"));
}

#[tokio::test]
async fn legacy_plaintext_password_is_upgraded_on_login() {
    let (db, url) = create_test_db_with_url().await;
    let pool = sqlx::SqlitePool::connect(&url).await.unwrap();
    sqlx::query(
        "INSERT INTO users (first_name, last_name, email, password) VALUES ('Old', 'Timer', 'old@example.com', 'plain123')",
    )
    .execute(&pool)
    .await
    .unwrap();

    assert!(db.verify_user_password("old@example.com", "wrong").await.unwrap().is_none());
    assert!(db.verify_user_password("old@example.com", "plain123").await.unwrap().is_some());

    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE email = ?")
        .bind("old@example.com")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(stored.starts_with("$argon2"));

    // Still works against the new hash
    assert!(db.verify_user_password("old@example.com", "plain123").await.unwrap().is_some());
}

#[tokio::test]
async fn set_password_replaces_credentials() {
    let db = create_test_db().await;
    let user_id = create_user(&db, "Ada", "ada@example.com").await;

    assert_eq!(
        db.set_password("ada@example.com", "newpass99").await.unwrap(),
        Some(user_id)
    );
    assert_eq!(db.set_password("ghost@example.com", "x").await.unwrap(), None);

    assert!(db.verify_user_password("ada@example.com", "password1").await.unwrap().is_none());
    assert!(db.verify_user_password("ada@example.com", "newpass99").await.unwrap().is_some());
}

// ----- one-time codes -----

#[tokio::test]
async fn otp_is_single_use_and_latest_wins() {
    let db = create_test_db().await;

    db.replace_otp("a@b.com", "111111").await.unwrap();
    db.replace_otp("a@b.com", "222222").await.unwrap();

    assert!(!db.take_otp("a@b.com", "111111").await.unwrap());
    assert!(!db.take_otp("other@b.com", "222222").await.unwrap());
    assert!(db.take_otp("a@b.com", "222222").await.unwrap());
    assert!(!db.take_otp("a@b.com", "222222").await.unwrap());
}

#[tokio::test]
async fn expired_otp_is_rejected() {
    let (db, url) = create_test_db_with_url().await;

    db.replace_otp("a@b.com", "123456").await.unwrap();
    let pool = sqlx::SqlitePool::connect(&url).await.unwrap();
    sqlx::query("UPDATE user_otps SET expires_at = datetime('now', '-1 minute') WHERE email = ?")
        .bind("a@b.com")
        .execute(&pool)
        .await
        .unwrap();

    assert!(!db.take_otp("a@b.com", "123456").await.unwrap());
}

#[tokio::test]
async fn otp_is_dropped_after_too_many_wrong_guesses() {
    let db = create_test_db().await;

    db.replace_otp("a@b.com", "123456").await.unwrap();
    for _ in 0..MAX_OTP_ATTEMPTS {
        assert!(!db.take_otp("a@b.com", "000000").await.unwrap());
    }

    assert!(!db.take_otp("a@b.com", "123456").await.unwrap());
}

#[tokio::test]
async fn wrong_guesses_below_the_limit_keep_the_code() {
    let db = create_test_db().await;

    db.replace_otp("a@b.com", "123456").await.unwrap();
    for _ in 1..MAX_OTP_ATTEMPTS {
        assert!(!db.take_otp("a@b.com", "000000").await.unwrap());
    }

    assert!(db.take_otp("a@b.com", "123456").await.unwrap());
}

#[tokio::test]
async fn new_code_resets_failed_attempts() {
    let db = create_test_db().await;

    db.replace_otp("a@b.com", "111111").await.unwrap();
    for _ in 1..MAX_OTP_ATTEMPTS {
        db.take_otp("a@b.com", "000000").await.unwrap();
    }
    db.replace_otp("a@b.com", "222222").await.unwrap();
    db.take_otp("a@b.com", "000000").await.unwrap();

    assert!(db.take_otp("a@b.com", "222222").await.unwrap());
}

// ----- admins -----

#[tokio::test]
async fn admin_granted_before_signup_applies_after() {
    let db = create_test_db().await;

    db.grant_admin("boss@example.com").await.unwrap();
    db.grant_admin("boss@example.com").await.unwrap();
    assert_eq!(db.admin_emails().await.unwrap(), vec!["boss@example.com"]);

    let user_id = create_user(&db, "Boss", "boss@example.com").await;
    let session = db.create_user_session(user_id).await.unwrap();
    let user = db.get_user_by_session(&session).await.unwrap().unwrap();

    assert!(user.is_admin);
    assert!(db.is_admin("boss@example.com").await.unwrap());
    assert!(!db.is_admin("nobody@example.com").await.unwrap());
}

// ----- quizzes -----

#[tokio::test]
async fn questions_survive_storage_including_placeholders() {
    let db = create_test_db().await;
    let quiz_id = schedule(&db, "2024-05-01").await;

    let mut questions = sample_questions(2);
    questions.push(ParsedQuestion::placeholder(3));
    db.replace_questions(quiz_id, &questions).await.unwrap();

    let stored = db.questions(quiz_id).await.unwrap();
    assert_eq!(stored, questions);
    assert!(stored[2].is_placeholder());

    let header = db.quiz_header(quiz_id).await.unwrap().unwrap();
    assert_eq!(header.question_count, 3);
    assert_eq!(header.genre_list(), vec!["History", "Science"]);
    assert_eq!(header.quiz_date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
}

#[tokio::test]
async fn replacing_questions_discards_old_ones() {
    let db = create_test_db().await;
    let quiz_id = schedule(&db, "2024-05-01").await;

    db.replace_questions(quiz_id, &sample_questions(3)).await.unwrap();
    db.replace_questions(quiz_id, &sample_questions(1)).await.unwrap();

    assert_eq!(db.questions(quiz_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn only_one_quiz_is_active() {
    let db = create_test_db().await;
    let first = schedule(&db, "2024-05-01").await;
    let second = schedule(&db, "2024-05-02").await;

    assert!(db.active_quiz().await.unwrap().is_none());

    assert!(db.activate_quiz(first).await.unwrap());
    assert!(db.activate_quiz(second).await.unwrap());

    let active = db.active_quiz().await.unwrap().unwrap();
    assert_eq!(active.id, second);

    let headers = db.quiz_headers().await.unwrap();
    assert_eq!(headers.iter().filter(|h| h.is_active).count(), 1);
    assert_eq!(headers[0].id, second, "newest date first");

    // Unknown quiz leaves the current one active
    assert!(!db.activate_quiz(999).await.unwrap());
    assert_eq!(db.active_quiz().await.unwrap().unwrap().id, second);
}

#[tokio::test]
async fn deleting_quiz_cascades() {
    let db = create_test_db().await;
    let user_id = create_user(&db, "Ada", "ada@example.com").await;
    let quiz_id = schedule(&db, "2024-05-01").await;
    db.replace_questions(quiz_id, &sample_questions(2)).await.unwrap();
    db.save_submission(&Submission {
        user_id,
        quiz_id,
        results: vec![],
        score: 1,
        total: 2,
    })
    .await
    .unwrap();

    assert!(db.delete_quiz(quiz_id).await.unwrap());
    assert!(!db.delete_quiz(quiz_id).await.unwrap());

    assert!(db.questions(quiz_id).await.unwrap().is_empty());
    assert!(db.user_history(user_id).await.unwrap().is_empty());
}

// ----- results -----

#[tokio::test]
async fn submission_updates_history_and_leaderboard() {
    let db = create_test_db().await;
    let ada = create_user(&db, "Ada", "ada@example.com").await;
    let bob = create_user(&db, "Bob", "bob@example.com").await;
    let quiz_id = schedule(&db, "2024-05-01").await;
    db.replace_questions(quiz_id, &sample_questions(2)).await.unwrap();

    assert!(!db.has_submitted(ada, quiz_id).await.unwrap());

    db.save_submission(&Submission {
        user_id: ada,
        quiz_id,
        results: vec![
            QuestionResult {
                question_number: 1,
                selected: Some("B".to_string()),
                is_correct: true,
            },
            QuestionResult {
                question_number: 2,
                selected: None,
                is_correct: false,
            },
        ],
        score: 1,
        total: 2,
    })
    .await
    .unwrap();
    db.save_submission(&Submission {
        user_id: bob,
        quiz_id,
        results: vec![],
        score: 2,
        total: 2,
    })
    .await
    .unwrap();

    assert!(db.has_submitted(ada, quiz_id).await.unwrap());

    let history = db.user_history(ada).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!((history[0].score, history[0].total), (1, 2));
    assert_eq!(history[0].quiz_id, quiz_id);

    let board = db.leaderboard(quiz_id).await.unwrap();
    let names: Vec<&str> = board.iter().map(|e| e.first_name.as_str()).collect();
    assert_eq!(names, vec!["Bob", "Ada"]);
}

#[tokio::test]
async fn second_submission_keeps_the_first() {
    let db = create_test_db().await;
    let ada = create_user(&db, "Ada", "ada@example.com").await;
    let quiz_id = schedule(&db, "2024-05-01").await;

    let mut saved = Vec::new();
    for score in [1, 2] {
        let stored = db
            .save_submission(&Submission {
                user_id: ada,
                quiz_id,
                results: vec![QuestionResult {
                    question_number: 1,
                    selected: Some("B".to_string()),
                    is_correct: score == 1,
                }],
                score,
                total: 2,
            })
            .await
            .unwrap();
        saved.push(stored);
    }

    assert_eq!(saved, vec![true, false]);
    let history = db.user_history(ada).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_submissions_grade_only_one() {
    let db = create_test_db().await;
    let ada = create_user(&db, "Ada", "ada@example.com").await;
    let quiz_id = schedule(&db, "2024-05-01").await;
    db.replace_questions(quiz_id, &sample_questions(1)).await.unwrap();
    assert!(db.activate_quiz(quiz_id).await.unwrap());

    let generator = OpenAiGenerator::new(DEFAULT_API_URL.to_string(), None, "m".to_string());
    let svc = QuizService::new(db.clone(), QuizGenerator::new(generator));

    let right = tokio::spawn({
        let svc = svc.clone();
        async move { svc.submit(ada, quiz_id, &[Some("B".to_string())]).await }
    });
    let wrong = tokio::spawn({
        let svc = svc.clone();
        async move { svc.submit(ada, quiz_id, &[Some("A".to_string())]).await }
    });
    let (right, wrong) = tokio::join!(right, wrong);
    let outcomes = [right.unwrap().unwrap(), wrong.unwrap().unwrap()];

    let graded: Vec<i64> = outcomes
        .iter()
        .filter_map(|o| match o {
            SubmitOutcome::Graded(grade) => Some(grade.score as i64),
            _ => None,
        })
        .collect();
    assert_eq!(graded.len(), 1, "exactly one submission is graded");
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, SubmitOutcome::AlreadySubmitted)));

    let history = db.user_history(ada).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score, graded[0], "stored score is the one shown");
}

#[tokio::test]
async fn reopening_database_does_not_rerun_migrations() {
    let (db, url) = create_test_db_with_url().await;
    create_user(&db, "Ada", "ada@example.com").await;

    let reopened = Db::new(url).await.unwrap();
    assert!(reopened.email_exists("ada@example.com").await.unwrap());
}
