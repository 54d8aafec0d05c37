#[cfg(test)]
pub mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::utils::database::Database;
    use crate::utils::xp::Difficulty;

    async fn memory_database() -> Database {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        Database::from_pool(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_update_stats_is_additive() {
        let db = memory_database().await;

        db.update_stats(1, Some(100), "alice", 4, 1, Difficulty::Medium)
            .await
            .unwrap();
        db.update_stats(1, Some(100), "alice", 3, 2, Difficulty::Medium)
            .await
            .unwrap();

        let stats = db.get_stats(1, Some(100)).await.unwrap();
        assert_eq!(stats.quizzes_taken, 2);
        assert_eq!(stats.correct_answers, 7);
        assert_eq!(stats.wrong_answers, 3);
        assert!(stats.points > 0);
        assert_eq!(stats.accuracy(), 70.0);
    }

    #[tokio::test]
    async fn test_level_up_detected() {
        let db = memory_database().await;

        // A perfect 5-question medium quiz awards well over the 50 XP that
        // level 2 requires.
        let completion = db
            .update_stats(1, Some(100), "alice", 5, 0, Difficulty::Medium)
            .await
            .unwrap();

        assert!(completion.breakdown.total_xp >= 50);
        assert_eq!(completion.leveled_up, Some(db.get_stats(1, Some(100)).await.unwrap().level));
        assert_eq!(completion.current_streak, 1);
    }

    #[tokio::test]
    async fn test_same_day_quizzes_keep_streak() {
        let db = memory_database().await;

        let first = db
            .update_stats(1, Some(100), "alice", 1, 0, Difficulty::Easy)
            .await
            .unwrap();
        let second = db
            .update_stats(1, Some(100), "alice", 1, 0, Difficulty::Easy)
            .await
            .unwrap();

        assert_eq!(first.current_streak, 1);
        assert_eq!(second.current_streak, 1);
    }

    #[tokio::test]
    async fn test_guild_scoping_and_global_aggregate() {
        let db = memory_database().await;

        db.update_stats(1, Some(100), "alice", 2, 0, Difficulty::Easy)
            .await
            .unwrap();
        db.update_stats(1, Some(200), "alice", 3, 0, Difficulty::Easy)
            .await
            .unwrap();

        let guild_a = db.get_stats(1, Some(100)).await.unwrap();
        assert_eq!(guild_a.correct_answers, 2);

        let global = db.get_stats(1, None).await.unwrap();
        assert_eq!(global.correct_answers, 5);
        assert_eq!(global.quizzes_taken, 2);
    }

    #[tokio::test]
    async fn test_unknown_user_gets_empty_stats() {
        let db = memory_database().await;
        let stats = db.get_stats(404, Some(100)).await.unwrap();
        assert_eq!(stats.quizzes_taken, 0);
        assert_eq!(stats.level, 1);
        assert_eq!(stats.accuracy(), 0.0);
    }

    #[tokio::test]
    async fn test_leaderboard_ranks_by_points() {
        let db = memory_database().await;

        // bob answers more, harder questions than alice.
        db.update_stats(1, Some(100), "alice", 2, 3, Difficulty::Easy)
            .await
            .unwrap();
        db.update_stats(2, Some(100), "bob", 5, 0, Difficulty::Hard)
            .await
            .unwrap();

        let board = db.get_leaderboard(Some(100), 10).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].username, "bob");
        assert!(board[0].points > board[1].points);
        assert_eq!(board[0].accuracy, 100.0);

        // A different guild has no rows.
        assert!(db.get_leaderboard(Some(999), 10).await.unwrap().is_empty());

        // Global board aggregates across guilds.
        db.update_stats(1, Some(200), "alice", 5, 0, Difficulty::Hard)
            .await
            .unwrap();
        let global = db.get_leaderboard(None, 10).await.unwrap();
        assert_eq!(global.len(), 2);
        assert_eq!(global[0].username, "alice");
    }

    #[tokio::test]
    async fn test_version_tracking() {
        let db = memory_database().await;
        db.ensure_user(1, "alice").await.unwrap();

        assert_eq!(db.get_user_last_seen_version(1).await.unwrap(), "");
        db.update_user_last_seen_version(1, "0.1.0").await.unwrap();
        assert_eq!(db.get_user_last_seen_version(1).await.unwrap(), "0.1.0");
    }
}
