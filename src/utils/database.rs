use chrono::{Duration, NaiveDate, Utc};
use sqlx::{
    Row, SqlitePool as Pool,
    sqlite::{SqliteConnectOptions, SqlitePool},
};

use crate::utils::xp::{self, Difficulty, XpBreakdown};

/// Per-user, per-guild quiz counters. `guild_id` 0 holds stats earned in DMs.
#[derive(Clone, Debug, Default)]
pub struct UserStats {
    pub quizzes_taken: i64,
    pub correct_answers: i64,
    pub wrong_answers: i64,
    pub points: i64,
    pub xp: i64,
    pub level: i64,
    pub current_streak: i64,
    pub best_streak: i64,
    pub last_quiz_date: Option<NaiveDate>,
}

impl UserStats {
    pub fn accuracy(&self) -> f64 {
        let total = self.correct_answers + self.wrong_answers;
        if total == 0 {
            return 0.0;
        }
        (self.correct_answers as f64 / total as f64 * 1000.0).round() / 10.0
    }
}

#[derive(Clone, Debug)]
pub struct LeaderboardEntry {
    pub user_id: u64,
    pub username: String,
    pub points: i64,
    pub quizzes: i64,
    pub accuracy: f64,
}

/// Outcome of recording a finished quiz.
#[derive(Clone, Debug)]
pub struct QuizCompletion {
    pub breakdown: XpBreakdown,
    /// The new level when the award crossed a boundary.
    pub leveled_up: Option<i64>,
    pub current_streak: i64,
}

pub struct Database {
    pool: Pool,
}

impl Database {
    pub async fn new() -> Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::new()
            .filename("db.sqlite")
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::setup_tables(&pool).await?;

        Ok(Database { pool })
    }

    /// Build over an existing pool; used by the test suites with
    /// `sqlite::memory:`.
    pub async fn from_pool(pool: Pool) -> Result<Self, sqlx::Error> {
        Self::setup_tables(&pool).await?;
        Ok(Database { pool })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    async fn setup_tables(pool: &Pool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                username TEXT NOT NULL DEFAULT '',
                last_seen_version TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_stats (
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL DEFAULT 0,
                quizzes_taken INTEGER NOT NULL DEFAULT 0,
                correct_answers INTEGER NOT NULL DEFAULT 0,
                wrong_answers INTEGER NOT NULL DEFAULT 0,
                points INTEGER NOT NULL DEFAULT 0,
                xp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                current_streak INTEGER NOT NULL DEFAULT 0,
                best_streak INTEGER NOT NULL DEFAULT 0,
                last_quiz_date TEXT,
                UNIQUE (user_id, guild_id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn ensure_user(&self, user_id: u64, username: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, username) VALUES (?, ?)
            ON CONFLICT (user_id) DO UPDATE SET username = excluded.username
            "#,
        )
        .bind(user_id as i64)
        .bind(username)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn user_exists(&self, user_id: u64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("SELECT 1 FROM users WHERE user_id = ? LIMIT 1")
            .bind(user_id as i64)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result.is_some())
    }

    pub async fn get_username(&self, user_id: u64) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT username FROM users WHERE user_id = ?")
            .bind(user_id as i64)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("username")))
    }

    pub async fn get_user_last_seen_version(&self, user_id: u64) -> Result<String, sqlx::Error> {
        let row = sqlx::query("SELECT last_seen_version FROM users WHERE user_id = ?")
            .bind(user_id as i64)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("last_seen_version"))
    }

    pub async fn update_user_last_seen_version(
        &self,
        user_id: u64,
        version: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_seen_version = ? WHERE user_id = ?")
            .bind(version)
            .bind(user_id as i64)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Stats for one guild, or the aggregate across every guild when no
    /// guild is given.
    pub async fn get_stats(
        &self,
        user_id: u64,
        guild_id: Option<u64>,
    ) -> Result<UserStats, sqlx::Error> {
        let row = match guild_id {
            Some(guild_id) => {
                sqlx::query(
                    r#"
                    SELECT quizzes_taken, correct_answers, wrong_answers, points, xp,
                           level, current_streak, best_streak, last_quiz_date
                    FROM user_stats WHERE user_id = ? AND guild_id = ?
                    "#,
                )
                .bind(user_id as i64)
                .bind(guild_id as i64)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT SUM(quizzes_taken) AS quizzes_taken,
                           SUM(correct_answers) AS correct_answers,
                           SUM(wrong_answers) AS wrong_answers,
                           SUM(points) AS points,
                           SUM(xp) AS xp,
                           MAX(level) AS level,
                           MAX(current_streak) AS current_streak,
                           MAX(best_streak) AS best_streak,
                           MAX(last_quiz_date) AS last_quiz_date
                    FROM user_stats WHERE user_id = ?
                    HAVING COUNT(*) > 0
                    "#,
                )
                .bind(user_id as i64)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        let Some(row) = row else {
            return Ok(UserStats {
                level: 1,
                ..UserStats::default()
            });
        };

        Ok(UserStats {
            quizzes_taken: row.get("quizzes_taken"),
            correct_answers: row.get("correct_answers"),
            wrong_answers: row.get("wrong_answers"),
            points: row.get("points"),
            xp: row.get("xp"),
            level: row.get("level"),
            current_streak: row.get("current_streak"),
            best_streak: row.get("best_streak"),
            last_quiz_date: row
                .get::<Option<String>, _>("last_quiz_date")
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        })
    }

    /// Record a finished quiz. Counters are incremented, never overwritten;
    /// XP, level and streak are recomputed from the stored totals.
    pub async fn update_stats(
        &self,
        user_id: u64,
        guild_id: Option<u64>,
        username: &str,
        correct: u32,
        wrong: u32,
        difficulty: Difficulty,
    ) -> Result<QuizCompletion, sqlx::Error> {
        self.ensure_user(user_id, username).await?;

        let guild_key = guild_id.unwrap_or(0);
        let previous = self.get_stats(user_id, Some(guild_key)).await?;

        let today = Utc::now().date_naive();
        let yesterday = today - Duration::days(1);
        let is_first_today = previous.last_quiz_date != Some(today);
        let new_streak = match previous.last_quiz_date {
            Some(date) if date == today => previous.current_streak,
            Some(date) if date == yesterday => previous.current_streak + 1,
            _ => 1,
        };

        let breakdown = xp::calculate_total_xp(
            correct,
            correct + wrong,
            difficulty,
            new_streak as u32,
            is_first_today,
        );

        let new_xp = previous.xp + breakdown.total_xp;
        let new_level = xp::level_from_xp(new_xp);
        let leveled_up = xp::detect_level_up(previous.xp, new_xp);

        sqlx::query(
            r#"
            INSERT INTO user_stats
                (user_id, guild_id, quizzes_taken, correct_answers, wrong_answers,
                 points, xp, level, current_streak, best_streak, last_quiz_date)
            VALUES (?, ?, 1, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, guild_id) DO UPDATE SET
                quizzes_taken = quizzes_taken + 1,
                correct_answers = correct_answers + excluded.correct_answers,
                wrong_answers = wrong_answers + excluded.wrong_answers,
                points = points + excluded.points,
                xp = xp + excluded.points,
                level = excluded.level,
                current_streak = excluded.current_streak,
                best_streak = MAX(best_streak, excluded.best_streak),
                last_quiz_date = excluded.last_quiz_date
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_key as i64)
        .bind(correct as i64)
        .bind(wrong as i64)
        .bind(breakdown.total_xp)
        .bind(new_xp)
        .bind(new_level)
        .bind(new_streak)
        .bind(new_streak.max(previous.best_streak))
        .bind(today.format("%Y-%m-%d").to_string())
        .execute(&self.pool)
        .await?;

        Ok(QuizCompletion {
            breakdown,
            leveled_up,
            current_streak: new_streak,
        })
    }

    /// Ranked by points: one guild's rows, or totals across all guilds.
    pub async fn get_leaderboard(
        &self,
        guild_id: Option<u64>,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
        let rows = match guild_id {
            Some(guild_id) => {
                sqlx::query(
                    r#"
                    SELECT s.user_id, u.username, s.points, s.quizzes_taken,
                           s.correct_answers, s.wrong_answers
                    FROM user_stats s
                    JOIN users u ON u.user_id = s.user_id
                    WHERE s.guild_id = ?
                    ORDER BY s.points DESC
                    LIMIT ?
                    "#,
                )
                .bind(guild_id as i64)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT s.user_id, u.username,
                           SUM(s.points) AS points,
                           SUM(s.quizzes_taken) AS quizzes_taken,
                           SUM(s.correct_answers) AS correct_answers,
                           SUM(s.wrong_answers) AS wrong_answers
                    FROM user_stats s
                    JOIN users u ON u.user_id = s.user_id
                    GROUP BY s.user_id, u.username
                    ORDER BY points DESC
                    LIMIT ?
                    "#,
                )
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .iter()
            .map(|row| {
                let correct: i64 = row.get("correct_answers");
                let wrong: i64 = row.get("wrong_answers");
                let total = correct + wrong;
                let accuracy = if total == 0 {
                    0.0
                } else {
                    (correct as f64 / total as f64 * 1000.0).round() / 10.0
                };

                LeaderboardEntry {
                    user_id: row.get::<i64, _>("user_id") as u64,
                    username: row.get("username"),
                    points: row.get("points"),
                    quizzes: row.get("quizzes_taken"),
                    accuracy,
                }
            })
            .collect())
    }
}
