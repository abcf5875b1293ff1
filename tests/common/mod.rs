#![allow(dead_code)]

use dailyquiz::db::Db;

/// Returns the database and its URL, for tests that need to reach the file
/// with a second connection.
pub async fn create_test_db_with_url() -> (Db, String) {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("dailyquiz_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite://{}", path.display());
    let db = Db::new(url.clone())
        .await
        .expect("failed to create test database");
    (db, url)
}

pub async fn create_test_db() -> Db {
    create_test_db_with_url().await.0
}

pub async fn create_user(db: &Db, first_name: &str, email: &str) -> i64 {
    db.create_user(first_name, "Tester", email, "password1")
        .await
        .expect("create user")
}
