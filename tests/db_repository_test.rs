//! Tests for database repository operations.

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::NamedTempFile;

use factor_rush::{
    DbErrorKind, GameMode, Leaderboard, NewScoreRow, Rank, RankKey, ScoreRepository, ScoreSubmission,
    SqliteScoreStore, SubmitOutcome,
};

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready repository.
fn setup_test_db() -> (NamedTempFile, ScoreRepository) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let repo = ScoreRepository::open(db_path).expect("Failed to open repository");
    (db_file, repo)
}

fn at(seconds: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 1)
        .and_then(|d| d.and_hms_opt(12, 0, seconds))
        .expect("Valid timestamp")
}

fn row(user: &str, mode: GameMode, factored: i32, undos: i32, seconds: u32) -> NewScoreRow {
    NewScoreRow::new(
        user.to_string(),
        user.to_uppercase(),
        None,
        mode.to_string(),
        factored,
        undos,
        at(seconds),
    )
}

fn submission(user: &str, mode: GameMode, factored: u32, undos: u32) -> ScoreSubmission {
    ScoreSubmission::new(
        user.to_string(),
        user.to_uppercase(),
        Some(format!("https://example.invalid/{}.png", user)),
        mode,
        factored,
        undos,
    )
}

#[test]
fn test_open_is_idempotent() {
    let (db, repo) = setup_test_db();
    repo.replace_personal_best(row("ada", GameMode::Normal, 3, 0, 0))
        .expect("Insert failed");

    let reopened =
        ScoreRepository::open(repo.db_path().to_string()).expect("Reopen should succeed");
    assert_eq!(reopened.count_for_mode(GameMode::Normal).expect("Count failed"), 1);
    drop(db);
}

#[test]
fn test_personal_best_not_found() {
    let (_db, repo) = setup_test_db();
    let best = repo
        .personal_best("nobody", GameMode::Normal)
        .expect("Query failed");
    assert!(best.is_none());
}

#[test]
fn test_replace_keeps_one_row_per_user_and_mode() {
    let (_db, repo) = setup_test_db();
    repo.replace_personal_best(row("ada", GameMode::Normal, 3, 2, 0))
        .expect("First insert failed");
    let stored = repo
        .replace_personal_best(row("ada", GameMode::Normal, 5, 1, 1))
        .expect("Replace failed");

    assert_eq!(*stored.numbers_factored(), 5);
    assert_eq!(repo.count_for_mode(GameMode::Normal).expect("Count failed"), 1);

    let best = repo
        .personal_best("ada", GameMode::Normal)
        .expect("Query failed")
        .expect("Record should exist");
    assert_eq!(best.id(), stored.id());
    assert_eq!(*best.undos(), 1);
}

#[test]
fn test_modes_are_stored_separately() {
    let (_db, repo) = setup_test_db();
    repo.replace_personal_best(row("ada", GameMode::Normal, 3, 0, 0))
        .expect("Insert failed");
    repo.replace_personal_best(row("ada", GameMode::Simple, 7, 0, 1))
        .expect("Insert failed");

    assert_eq!(repo.count_for_mode(GameMode::Normal).expect("Count failed"), 1);
    assert_eq!(repo.count_for_mode(GameMode::Simple).expect("Count failed"), 1);
    let simple = repo
        .personal_best("ada", GameMode::Simple)
        .expect("Query failed")
        .expect("Record should exist");
    assert_eq!(*simple.numbers_factored(), 7);
}

#[test]
fn test_top_scores_ordering_and_limit() {
    let (_db, repo) = setup_test_db();
    repo.replace_personal_best(row("carol", GameMode::Normal, 4, 0, 0))
        .expect("Insert failed");
    repo.replace_personal_best(row("bob", GameMode::Normal, 5, 3, 1))
        .expect("Insert failed");
    repo.replace_personal_best(row("ada", GameMode::Normal, 5, 2, 2))
        .expect("Insert failed");
    repo.replace_personal_best(row("dave", GameMode::Normal, 5, 2, 3))
        .expect("Insert failed");

    let top = repo
        .top_scores(GameMode::Normal, 10)
        .expect("Query failed");
    let users: Vec<&str> = top.iter().map(|r| r.user_id().as_str()).collect();
    assert_eq!(users, vec!["ada", "dave", "bob", "carol"]);

    let top_two = repo.top_scores(GameMode::Normal, 2).expect("Query failed");
    assert_eq!(top_two.len(), 2);
}

#[test]
fn test_count_outranking() {
    let (_db, repo) = setup_test_db();
    repo.replace_personal_best(row("a", GameMode::Normal, 6, 5, 0))
        .expect("Insert failed");
    repo.replace_personal_best(row("b", GameMode::Normal, 5, 1, 1))
        .expect("Insert failed");
    repo.replace_personal_best(row("c", GameMode::Normal, 5, 2, 2))
        .expect("Insert failed");
    repo.replace_personal_best(row("d", GameMode::Normal, 4, 0, 3))
        .expect("Insert failed");

    let ahead = repo
        .count_outranking(GameMode::Normal, RankKey::new(5, 2))
        .expect("Count failed");
    assert_eq!(ahead, 2);
}

#[test]
fn test_stored_row_converts_to_record() {
    let (_db, repo) = setup_test_db();
    let stored = repo
        .replace_personal_best(row("ada", GameMode::Simple, 2, 1, 4))
        .expect("Insert failed");
    let record = stored.into_record().expect("Conversion failed");
    assert_eq!(*record.mode(), GameMode::Simple);
    assert_eq!(record.key(), RankKey::new(2, 1));
    assert_eq!(*record.recorded_at(), at(4));
}

#[tokio::test]
async fn test_sqlite_store_rejects_worse_score() {
    let (_db, repo) = setup_test_db();
    let leaderboard = Leaderboard::new(SqliteScoreStore::new(repo.clone()));

    let first = leaderboard
        .submit_score(&submission("ada", GameMode::Normal, 5, 2))
        .await
        .expect("Submit failed");
    assert!(first.is_accepted());

    let worse = leaderboard
        .submit_score(&submission("ada", GameMode::Normal, 5, 3))
        .await
        .expect("Submit failed");
    assert_eq!(worse, SubmitOutcome::NotPersonalBest);

    let best = repo
        .personal_best("ada", GameMode::Normal)
        .expect("Query failed")
        .expect("Record should exist");
    assert_eq!(*best.undos(), 2);
    assert_eq!(repo.count_for_mode(GameMode::Normal).expect("Count failed"), 1);
}

#[tokio::test]
async fn test_sqlite_store_rank_and_photo_url() {
    let (_db, repo) = setup_test_db();
    let leaderboard = Leaderboard::new(SqliteScoreStore::new(repo));

    for (user, factored, undos) in [("a", 6, 0), ("b", 5, 1), ("c", 5, 4)] {
        leaderboard
            .submit_score(&submission(user, GameMode::Normal, factored, undos))
            .await
            .expect("Submit failed");
    }

    assert_eq!(
        leaderboard
            .rank_of("c", GameMode::Normal)
            .await
            .expect("Rank failed"),
        Rank::Ranked(3)
    );
    assert_eq!(
        leaderboard
            .rank_of("c", GameMode::Simple)
            .await
            .expect("Rank failed"),
        Rank::Unranked
    );

    let best = leaderboard
        .personal_best("b", GameMode::Normal)
        .await
        .expect("Query failed")
        .expect("Record should exist");
    assert_eq!(
        best.photo_url().as_deref(),
        Some("https://example.invalid/b.png")
    );
}

#[test]
fn test_open_in_missing_directory_is_connection_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("missing").join("scores.db");
    let err = ScoreRepository::open(path.to_string_lossy().into_owned())
        .expect_err("Parent directory does not exist");
    assert_eq!(err.kind, DbErrorKind::Connection);
}
