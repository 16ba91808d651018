//! Tests for personal-best submission, ranking and live top-N feeds.

use factor_rush::{
    GameMode, Leaderboard, LeaderboardError, MemoryScoreStore, Rank, RankKey, ScoreRecord,
    ScoreStore, ScoreSubmission, SubmitOutcome,
};

fn submission(user: &str, mode: GameMode, factored: u32, undos: u32) -> ScoreSubmission {
    ScoreSubmission::new(
        user.to_string(),
        format!("Player {}", user),
        None,
        mode,
        factored,
        undos,
    )
}

fn users(records: &[ScoreRecord]) -> Vec<&str> {
    records.iter().map(|r| r.user_id().as_str()).collect()
}

async fn seeded_board(scores: &[(&str, u32, u32)]) -> Leaderboard<MemoryScoreStore> {
    let board = Leaderboard::new(MemoryScoreStore::new());
    for &(user, factored, undos) in scores {
        board
            .submit_score(&submission(user, GameMode::Normal, factored, undos))
            .await
            .expect("Submit failed");
    }
    board
}

#[test]
fn test_rank_key_ordering() {
    let a = RankKey::new(5, 2);
    let b = RankKey::new(5, 3);
    let c = RankKey::new(4, 0);
    assert!(a > b && b > c);
    let mut keys = vec![c, a, b];
    keys.sort_by(|x, y| y.cmp(x));
    assert_eq!(keys, vec![a, b, c]);
}

#[tokio::test]
async fn test_first_submission_is_accepted() {
    let board = Leaderboard::new(MemoryScoreStore::new());
    let outcome = board
        .submit_score(&submission("ada", GameMode::Normal, 0, 4))
        .await
        .expect("Submit failed");
    let SubmitOutcome::Accepted(record) = outcome else {
        panic!("Any score beats no score");
    };
    assert_eq!(record.key(), RankKey::new(0, 4));
    assert_eq!(board.store().len().await, 1);
}

#[tokio::test]
async fn test_personal_best_replacement() {
    let board = seeded_board(&[("ada", 5, 2)]).await;

    for (factored, undos) in [(5, 2), (5, 3), (4, 0)] {
        let outcome = board
            .submit_score(&submission("ada", GameMode::Normal, factored, undos))
            .await
            .expect("Submit failed");
        assert_eq!(outcome, SubmitOutcome::NotPersonalBest);
    }

    let outcome = board
        .submit_score(&submission("ada", GameMode::Normal, 5, 1))
        .await
        .expect("Submit failed");
    assert!(outcome.is_accepted());

    let best = board
        .personal_best("ada", GameMode::Normal)
        .await
        .expect("Query failed")
        .expect("Record should exist");
    assert_eq!(best.key(), RankKey::new(5, 1));
    assert_eq!(board.store().len().await, 1);
}

#[tokio::test]
async fn test_modes_have_separate_personal_bests() {
    let board = seeded_board(&[("ada", 5, 0)]).await;
    let outcome = board
        .submit_score(&submission("ada", GameMode::Simple, 1, 0))
        .await
        .expect("Submit failed");
    assert!(outcome.is_accepted());
    assert_eq!(board.store().len().await, 2);
}

#[tokio::test]
async fn test_top_n_ordering() {
    let board = seeded_board(&[("c", 4, 0), ("b", 5, 3), ("a", 5, 2), ("d", 5, 2)]).await;

    let top = board.top_n(GameMode::Normal, 10).await.expect("Query failed");
    assert_eq!(users(&top), vec!["a", "d", "b", "c"]);

    let top_two = board.top_n(GameMode::Normal, 2).await.expect("Query failed");
    assert_eq!(users(&top_two), vec!["a", "d"]);

    let other = board.top_n(GameMode::Simple, 10).await.expect("Query failed");
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_rank_of() {
    let board = seeded_board(&[("a", 6, 9), ("b", 5, 1), ("c", 5, 2), ("d", 5, 2), ("e", 4, 0)]).await;

    let rank = |user: &'static str| {
        let board = board.clone();
        async move { board.rank_of(user, GameMode::Normal).await.expect("Rank failed") }
    };
    assert_eq!(rank("a").await, Rank::Ranked(1));
    assert_eq!(rank("b").await, Rank::Ranked(2));
    // Ties share a position.
    assert_eq!(rank("c").await, Rank::Ranked(3));
    assert_eq!(rank("d").await, Rank::Ranked(3));
    assert_eq!(rank("e").await, Rank::Ranked(5));
    assert_eq!(rank("nobody").await, Rank::Unranked);
}

#[tokio::test]
async fn test_subscription_delivers_initial_and_updates() {
    let board = seeded_board(&[("a", 3, 0)]).await;
    let mut feed = board
        .subscribe_top_n(GameMode::Normal, 2)
        .await
        .expect("Subscribe failed");

    let initial = feed.next().await.expect("Initial snapshot");
    assert_eq!(users(&initial), vec!["a"]);

    board
        .submit_score(&submission("b", GameMode::Normal, 4, 0))
        .await
        .expect("Submit failed");
    let update = feed.next().await.expect("Update after submit");
    assert_eq!(users(&update), vec!["b", "a"]);

    // Rejected submissions change nothing and notify nobody.
    board
        .submit_score(&submission("b", GameMode::Normal, 1, 0))
        .await
        .expect("Submit failed");
    assert_eq!(feed.try_next(), None);
}

#[tokio::test]
async fn test_new_subscription_supersedes_previous() {
    let board = seeded_board(&[]).await;
    let mut first = board
        .subscribe_top_n(GameMode::Normal, 5)
        .await
        .expect("Subscribe failed");
    let mut second = board
        .subscribe_top_n(GameMode::Normal, 5)
        .await
        .expect("Subscribe failed");

    assert!(!first.is_active());
    assert!(first.next().await.is_none());

    board
        .submit_score(&submission("a", GameMode::Normal, 1, 0))
        .await
        .expect("Submit failed");
    assert_eq!(second.try_next(), Some(vec![]));
    let update = second.try_next().expect("Update after submit");
    assert_eq!(users(&update), vec!["a"]);
    assert_eq!(first.try_next(), None);
}

#[tokio::test]
async fn test_unsubscribe_stops_updates() {
    let board = seeded_board(&[]).await;
    let feed = board
        .subscribe_top_n(GameMode::Normal, 5)
        .await
        .expect("Subscribe failed");
    assert!(board.has_subscription(GameMode::Normal));

    feed.unsubscribe();
    assert!(!board.has_subscription(GameMode::Normal));

    // Submitting after teardown must not fail.
    let outcome = board
        .submit_score(&submission("a", GameMode::Normal, 1, 0))
        .await
        .expect("Submit failed");
    assert!(outcome.is_accepted());
}

#[tokio::test]
async fn test_subscriptions_per_mode_are_independent() {
    let board = seeded_board(&[]).await;
    let normal = board
        .subscribe_top_n(GameMode::Normal, 5)
        .await
        .expect("Subscribe failed");
    let simple = board
        .subscribe_top_n(GameMode::Simple, 5)
        .await
        .expect("Subscribe failed");
    assert!(normal.is_active());
    assert!(simple.is_active());
    assert_eq!(simple.mode(), GameMode::Simple);
}

/// Store whose writes always fail.
#[derive(Debug, Default)]
struct BrokenStore {
    inner: MemoryScoreStore,
}

#[async_trait::async_trait]
impl ScoreStore for BrokenStore {
    async fn personal_best(
        &self,
        user_id: &str,
        mode: GameMode,
    ) -> Result<Option<ScoreRecord>, LeaderboardError> {
        self.inner.personal_best(user_id, mode).await
    }

    async fn replace_personal_best(
        &self,
        _submission: &ScoreSubmission,
    ) -> Result<ScoreRecord, LeaderboardError> {
        Err(LeaderboardError::new("disk full"))
    }

    async fn top_n(&self, mode: GameMode, n: usize) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        self.inner.top_n(mode, n).await
    }

    async fn count_outranking(
        &self,
        mode: GameMode,
        key: RankKey,
    ) -> Result<u64, LeaderboardError> {
        self.inner.count_outranking(mode, key).await
    }
}

#[tokio::test]
async fn test_failed_submission_surfaces_error() {
    let board = Leaderboard::new(BrokenStore::default());
    let result = board
        .submit_score(&submission("a", GameMode::Normal, 3, 0))
        .await;
    let err = result.expect_err("Write should fail");
    assert!(err.to_string().contains("disk full"));
    assert_eq!(
        board.rank_of("a", GameMode::Normal).await.expect("Rank failed"),
        Rank::Unranked
    );
}
