// Database access layer (SQLite via sqlx).

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::error::MealError;
use crate::leaderboard::{win_pct, Leaderboard, LeaderboardEntry, SortField};
use crate::meal::{Difficulty, Meal, ValidMeal};

/// Per-combatant battle outcome recorded in the meal's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct MealRow {
    id: i64,
    meal: String,
    cuisine: String,
    price: f64,
    difficulty: String,
    deleted: bool,
}

impl TryFrom<MealRow> for Meal {
    type Error = MealError;

    fn try_from(row: MealRow) -> Result<Self, Self::Error> {
        let difficulty =
            Difficulty::from_str_name(&row.difficulty).ok_or(MealError::CorruptRow {
                id: row.id,
                value: row.difficulty,
            })?;
        Ok(Meal {
            id: row.id,
            name: row.meal,
            cuisine: row.cuisine,
            price: row.price,
            difficulty,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct LeaderboardRow {
    id: i64,
    meal: String,
    cuisine: String,
    price: f64,
    difficulty: String,
    battles: i64,
    wins: i64,
}

impl TryFrom<LeaderboardRow> for LeaderboardEntry {
    type Error = MealError;

    fn try_from(row: LeaderboardRow) -> Result<Self, Self::Error> {
        let meal = Meal::try_from(MealRow {
            id: row.id,
            meal: row.meal,
            cuisine: row.cuisine,
            price: row.price,
            difficulty: row.difficulty,
            deleted: false,
        })?;
        Ok(LeaderboardEntry {
            meal,
            battles: row.battles,
            wins: row.wins,
            win_pct: win_pct(row.wins, row.battles),
        })
    }
}

const MEAL_COLUMNS: &str = "id, meal, cuisine, price, difficulty, deleted";

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared by the `win_pct` sort and its expression index; the two must match
/// for SQLite to use the index.
const WIN_PCT_EXPR: &str = "CASE WHEN battles > 0 THEN wins * 1.0 / battles ELSE 0.0 END";

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);
        // Every connection to `:memory:` opens its own empty database.
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS meals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meal TEXT NOT NULL,
                cuisine TEXT NOT NULL,
                price REAL NOT NULL CHECK (price > 0),
                difficulty TEXT NOT NULL CHECK (difficulty IN ('LOW', 'MED', 'HIGH')),
                battles INTEGER NOT NULL DEFAULT 0,
                wins INTEGER NOT NULL DEFAULT 0,
                position INTEGER NOT NULL DEFAULT 0,
                deleted BOOLEAN NOT NULL DEFAULT FALSE
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        // Names are unique among live meals only, so a deleted name can be reused.
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_meals_live_name ON meals (meal) WHERE deleted = FALSE",
        )
        .execute(&self.pool)
        .await?;

        for (name, column) in [
            ("idx_meals_position", "position"),
            ("idx_meals_wins", "wins"),
            ("idx_meals_price", "price"),
            ("idx_meals_battles", "battles"),
        ] {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {name} ON meals (deleted, {column})"
            ))
            .execute(&self.pool)
            .await?;
        }
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_meals_win_pct ON meals (deleted, ({WIN_PCT_EXPR}))"
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Verify the connection works and the meals table exists.
    pub async fn check(&self) -> Result<bool, sqlx::Error> {
        let table: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'meals'",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(table.is_some())
    }

    // ── Catalog ───────────────────────────────────────────────────────

    pub async fn create_meal(&self, meal: &ValidMeal) -> Result<Meal, MealError> {
        let result = sqlx::query_as::<_, MealRow>(
            "INSERT INTO meals (meal, cuisine, price, difficulty, position) \
             VALUES (?, ?, ?, ?, (SELECT COALESCE(MAX(position), 0) + 1 FROM meals WHERE deleted = FALSE)) \
             RETURNING id, meal, cuisine, price, difficulty, deleted",
        )
        .bind(&meal.name)
        .bind(&meal.cuisine)
        .bind(meal.price)
        .bind(meal.difficulty.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => {
                tracing::info!("Meal successfully added to the database: {}", meal.name);
                Meal::try_from(row)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tracing::warn!("Duplicate meal name: {}", meal.name);
                Err(MealError::DuplicateName(meal.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Soft delete: the row stays but is flagged and drops out of every view.
    pub async fn delete_meal(&self, id: i64) -> Result<(), MealError> {
        let result = sqlx::query("UPDATE meals SET deleted = TRUE WHERE id = ? AND deleted = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(self.not_live(id).await);
        }
        tracing::info!("Meal with ID {id} marked as deleted");
        Ok(())
    }

    /// Remove every meal, live or deleted.
    pub async fn clear_meals(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM meals").execute(&self.pool).await?;
        tracing::info!("Cleared {} meals from the catalog", result.rows_affected());
        Ok(result.rows_affected())
    }

    pub async fn get_meal_by_id(&self, id: i64) -> Result<Meal, MealError> {
        let row = sqlx::query_as::<_, MealRow>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) if row.deleted => Err(MealError::Deleted(id)),
            Some(row) => Meal::try_from(row),
            None => Err(MealError::NotFound(id)),
        }
    }

    /// A live meal wins over deleted rows that share its name.
    pub async fn get_meal_by_name(&self, name: &str) -> Result<Meal, MealError> {
        let row = sqlx::query_as::<_, MealRow>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE meal = ? ORDER BY deleted ASC, id DESC LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) if row.deleted => Err(MealError::NameDeleted(name.to_string())),
            Some(row) => Meal::try_from(row),
            None => Err(MealError::NameNotFound(name.to_string())),
        }
    }

    pub async fn list_meals(&self) -> Result<Vec<Meal>, MealError> {
        let rows = sqlx::query_as::<_, MealRow>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE deleted = FALSE ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Meal::try_from).collect()
    }

    /// Pick one live meal. `pick` receives the catalog size and returns an
    /// index below it; it is not called when the catalog is empty.
    pub async fn get_random_meal(
        &self,
        pick: impl FnOnce(usize) -> usize,
    ) -> Result<Meal, MealError> {
        let mut meals = self.list_meals().await?;
        if meals.is_empty() {
            tracing::info!("Cannot retrieve random meal because the meal database is empty");
            return Err(MealError::EmptyCatalog);
        }
        let index = pick(meals.len()).min(meals.len() - 1);
        tracing::info!("Random index selected: {index} (total meals: {})", meals.len());
        Ok(meals.swap_remove(index))
    }

    // ── Statistics ────────────────────────────────────────────────────

    pub async fn update_meal_stats(&self, id: i64, outcome: Outcome) -> Result<(), MealError> {
        let sql = match outcome {
            Outcome::Win => {
                "UPDATE meals SET battles = battles + 1, wins = wins + 1 WHERE id = ? AND deleted = FALSE"
            }
            Outcome::Loss => "UPDATE meals SET battles = battles + 1 WHERE id = ? AND deleted = FALSE",
        };
        let result = sqlx::query(sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(self.not_live(id).await);
        }
        tracing::info!("Recorded {} for meal {id}", outcome.as_str());
        Ok(())
    }

    /// Record both sides of a battle in one statement: either both meals are
    /// live and both rows change, or nothing does.
    pub async fn record_battle(&self, winner_id: i64, loser_id: i64) -> Result<(), MealError> {
        let result = sqlx::query(
            "UPDATE meals SET battles = battles + 1, \
             wins = wins + CASE WHEN id = ? THEN 1 ELSE 0 END \
             WHERE id IN (?, ?) AND deleted = FALSE \
             AND (SELECT COUNT(*) FROM meals WHERE id IN (?, ?) AND deleted = FALSE) = 2",
        )
        .bind(winner_id)
        .bind(winner_id)
        .bind(loser_id)
        .bind(winner_id)
        .bind(loser_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() != 2 {
            let id = match self.deleted_flag(winner_id).await? {
                Some(false) => loser_id,
                _ => winner_id,
            };
            return Err(self.not_live(id).await);
        }
        tracing::info!("Recorded win for meal {winner_id} and loss for meal {loser_id}");
        Ok(())
    }

    // ── Leaderboard ───────────────────────────────────────────────────

    pub async fn leaderboard(&self, sort: SortField) -> Result<Leaderboard, MealError> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(&format!(
            "SELECT id, meal, cuisine, price, difficulty, battles, wins, {WIN_PCT_EXPR} AS win_pct \
             FROM meals WHERE deleted = FALSE ORDER BY {}",
            sort.order_clause()
        ))
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(LeaderboardEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let board = Leaderboard::new(entries);
        if board.is_empty() {
            tracing::warn!("The leaderboard is empty");
        } else {
            tracing::debug!("Leaderboard sorted by {sort:?} has {} meals", board.len());
        }
        Ok(board)
    }

    pub async fn move_meal_to_top(&self, id: i64) -> Result<(), MealError> {
        self.reposition(
            id,
            "UPDATE meals SET position = (SELECT COALESCE(MIN(position), 0) - 1 FROM meals WHERE deleted = FALSE) \
             WHERE id = ? AND deleted = FALSE",
        )
        .await?;
        tracing::info!("Meal with ID {id} moved to the top of the leaderboard");
        Ok(())
    }

    pub async fn move_meal_to_bottom(&self, id: i64) -> Result<(), MealError> {
        self.reposition(
            id,
            "UPDATE meals SET position = (SELECT COALESCE(MAX(position), 0) + 1 FROM meals WHERE deleted = FALSE) \
             WHERE id = ? AND deleted = FALSE",
        )
        .await?;
        tracing::info!("Meal with ID {id} moved to the bottom of the leaderboard");
        Ok(())
    }

    async fn reposition(&self, id: i64, sql: &str) -> Result<(), MealError> {
        let result = sqlx::query(sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(self.not_live(id).await);
        }
        Ok(())
    }

    async fn deleted_flag(&self, id: i64) -> Result<Option<bool>, sqlx::Error> {
        sqlx::query_scalar("SELECT deleted FROM meals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Explain why a guarded write on `id` touched no rows.
    async fn not_live(&self, id: i64) -> MealError {
        match self.deleted_flag(id).await {
            Ok(Some(true)) => {
                tracing::info!("Meal with ID {id} has been deleted");
                MealError::Deleted(id)
            }
            Ok(None) => {
                tracing::info!("Meal with ID {id} not found");
                MealError::NotFound(id)
            }
            // Only reachable when the row changed between the write and this read.
            Ok(Some(false)) => {
                tracing::warn!("Meal with ID {id} was live but the guarded write matched nothing");
                MealError::NotFound(id)
            }
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    fn valid(name: &str, cuisine: &str, price: f64, difficulty: Difficulty) -> ValidMeal {
        ValidMeal {
            name: name.into(),
            cuisine: cuisine.into(),
            price,
            difficulty,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_meal() {
        let db = test_db().await;

        let meal = db
            .create_meal(&valid("Meal Name", "Cuisine Type", 8.99, Difficulty::Low))
            .await
            .unwrap();
        assert_eq!(meal.name, "Meal Name");
        assert_eq!(meal.cuisine, "Cuisine Type");
        assert_eq!(meal.price, 8.99);
        assert_eq!(meal.difficulty, Difficulty::Low);

        let by_id = db.get_meal_by_id(meal.id).await.unwrap();
        assert_eq!(by_id, meal);
        let by_name = db.get_meal_by_name("Meal Name").await.unwrap();
        assert_eq!(by_name, meal);

        assert!(matches!(
            db.get_meal_by_id(999).await,
            Err(MealError::NotFound(999))
        ));
        assert!(matches!(
            db.get_meal_by_name("Nope").await,
            Err(MealError::NameNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_duplicate_name() {
        let db = test_db().await;
        let meal = valid("Meal Name", "Cuisine Type", 8.99, Difficulty::Low);
        db.create_meal(&meal).await.unwrap();

        let err = db.create_meal(&meal).await.unwrap_err();
        assert_eq!(err.to_string(), "Meal with name 'Meal Name' already exists");
    }

    #[tokio::test]
    async fn test_delete_meal() {
        let db = test_db().await;
        let meal = db
            .create_meal(&valid("Gone", "Nowhere", 5.0, Difficulty::Med))
            .await
            .unwrap();

        db.delete_meal(meal.id).await.unwrap();

        assert!(matches!(
            db.get_meal_by_id(meal.id).await,
            Err(MealError::Deleted(_))
        ));
        assert!(matches!(
            db.get_meal_by_name("Gone").await,
            Err(MealError::NameDeleted(_))
        ));
        assert!(db.list_meals().await.unwrap().is_empty());

        let again = db.delete_meal(meal.id).await.unwrap_err();
        assert_eq!(again.to_string(), format!("Meal with ID {} has been deleted", meal.id));

        let missing = db.delete_meal(999).await.unwrap_err();
        assert_eq!(missing.to_string(), "Meal with ID 999 not found");
    }

    #[tokio::test]
    async fn test_deleted_name_can_be_reused() {
        let db = test_db().await;
        let tacos = valid("Tacos", "Mexican", 3.5, Difficulty::Low);
        let old = db.create_meal(&tacos).await.unwrap();
        db.delete_meal(old.id).await.unwrap();

        let new = db.create_meal(&tacos).await.unwrap();
        assert_ne!(old.id, new.id);
        assert_eq!(db.get_meal_by_name("Tacos").await.unwrap().id, new.id);
    }

    #[tokio::test]
    async fn test_random_meal() {
        let db = test_db().await;
        assert!(matches!(
            db.get_random_meal(|_| unreachable!()).await,
            Err(MealError::EmptyCatalog)
        ));

        let a = db
            .create_meal(&valid("A", "Cuisine A", 8.99, Difficulty::Low))
            .await
            .unwrap();
        let b = db
            .create_meal(&valid("B", "Cuisine B", 9.99, Difficulty::Med))
            .await
            .unwrap();
        let c = db
            .create_meal(&valid("C", "Cuisine C", 10.99, Difficulty::High))
            .await
            .unwrap();
        db.delete_meal(c.id).await.unwrap();

        let picked = db
            .get_random_meal(|len| {
                assert_eq!(len, 2);
                1
            })
            .await
            .unwrap();
        assert_eq!(picked, b);

        let picked = db.get_random_meal(|_| 0).await.unwrap();
        assert_eq!(picked, a);
    }

    #[tokio::test]
    async fn test_update_meal_stats() {
        let db = test_db().await;
        let meal = db
            .create_meal(&valid("Stats", "Cuisine", 4.0, Difficulty::Med))
            .await
            .unwrap();

        db.update_meal_stats(meal.id, Outcome::Win).await.unwrap();
        db.update_meal_stats(meal.id, Outcome::Loss).await.unwrap();
        db.update_meal_stats(meal.id, Outcome::Win).await.unwrap();

        let board = db.leaderboard(SortField::Position).await.unwrap();
        let entry = board.iter().next().unwrap();
        assert_eq!(entry.battles, 3);
        assert_eq!(entry.wins, 2);
        assert!((entry.win_pct - 2.0 / 3.0).abs() < 1e-9);

        db.delete_meal(meal.id).await.unwrap();
        let err = db.update_meal_stats(meal.id, Outcome::Win).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Meal with ID {} has been deleted", meal.id));
    }

    #[tokio::test]
    async fn test_record_battle_is_atomic() {
        let db = test_db().await;
        let winner = db
            .create_meal(&valid("Winner", "W", 4.0, Difficulty::Med))
            .await
            .unwrap();
        let loser = db
            .create_meal(&valid("Loser", "L", 4.0, Difficulty::Med))
            .await
            .unwrap();

        db.record_battle(winner.id, loser.id).await.unwrap();
        let board = db.leaderboard(SortField::Wins).await.unwrap();
        assert_eq!(board.meal_ids(), vec![winner.id, loser.id]);

        db.delete_meal(loser.id).await.unwrap();
        assert!(matches!(
            db.record_battle(winner.id, loser.id).await,
            Err(MealError::Deleted(id)) if id == loser.id
        ));
        assert!(matches!(
            db.record_battle(999, winner.id).await,
            Err(MealError::NotFound(999))
        ));

        // The failed battle must not have touched the winner.
        let board = db.leaderboard(SortField::Wins).await.unwrap();
        let entry = board.iter().next().unwrap();
        assert_eq!(entry.battles, 1);
        assert_eq!(entry.wins, 1);
    }

    #[tokio::test]
    async fn test_leaderboard_sorting() {
        let db = test_db().await;
        let a = db
            .create_meal(&valid("Meal A", "Cuisine A", 8.99, Difficulty::Low))
            .await
            .unwrap();
        let b = db
            .create_meal(&valid("Meal B", "Cuisine B", 9.99, Difficulty::Med))
            .await
            .unwrap();
        let c = db
            .create_meal(&valid("Meal C", "Cuisine C", 10.99, Difficulty::High))
            .await
            .unwrap();

        let board = db.leaderboard(SortField::Position).await.unwrap();
        assert_eq!(board.meal_ids(), vec![a.id, b.id, c.id]);

        let board = db.leaderboard(SortField::Price).await.unwrap();
        assert_eq!(board.meal_ids(), vec![c.id, b.id, a.id]);

        // a: 2/3, b: 2/4, c: 0/1
        db.record_battle(a.id, b.id).await.unwrap();
        db.record_battle(b.id, c.id).await.unwrap();
        db.record_battle(a.id, b.id).await.unwrap();
        db.record_battle(b.id, a.id).await.unwrap();
        let board = db.leaderboard(SortField::Wins).await.unwrap();
        assert_eq!(board.meal_ids(), vec![a.id, b.id, c.id]);

        let board = db.leaderboard(SortField::WinPct).await.unwrap();
        assert_eq!(board.meal_ids(), vec![a.id, b.id, c.id]);
        let first = board.iter().next().unwrap();
        assert!((first.win_pct - 2.0 / 3.0).abs() < 1e-9);

        let board = db.leaderboard(SortField::Battles).await.unwrap();
        assert_eq!(board.meal_ids(), vec![b.id, a.id, c.id]);
    }

    #[tokio::test]
    async fn test_leaderboard_excludes_deleted() {
        let db = test_db().await;
        assert!(db.leaderboard(SortField::Position).await.unwrap().is_empty());

        let a = db
            .create_meal(&valid("A", "X", 1.0, Difficulty::Low))
            .await
            .unwrap();
        let b = db
            .create_meal(&valid("B", "X", 2.0, Difficulty::Low))
            .await
            .unwrap();
        db.delete_meal(a.id).await.unwrap();

        let board = db.leaderboard(SortField::Position).await.unwrap();
        assert_eq!(board.meal_ids(), vec![b.id]);
    }

    #[tokio::test]
    async fn test_move_to_top_and_bottom() {
        let db = test_db().await;
        let mut ids = Vec::new();
        for name in ["A", "B", "C", "D"] {
            let meal = db
                .create_meal(&valid(name, "X", 1.0, Difficulty::Low))
                .await
                .unwrap();
            ids.push(meal.id);
        }

        db.move_meal_to_top(ids[2]).await.unwrap();
        let board = db.leaderboard(SortField::Position).await.unwrap();
        assert_eq!(board.meal_ids(), vec![ids[2], ids[0], ids[1], ids[3]]);

        db.move_meal_to_bottom(ids[0]).await.unwrap();
        let board = db.leaderboard(SortField::Position).await.unwrap();
        assert_eq!(board.meal_ids(), vec![ids[2], ids[1], ids[3], ids[0]]);

        // Moving the top meal to the top again keeps the order.
        db.move_meal_to_top(ids[2]).await.unwrap();
        let board = db.leaderboard(SortField::Position).await.unwrap();
        assert_eq!(board.meal_ids(), vec![ids[2], ids[1], ids[3], ids[0]]);

        // New meals land at the bottom.
        let e = db
            .create_meal(&valid("E", "X", 1.0, Difficulty::Low))
            .await
            .unwrap();
        let board = db.leaderboard(SortField::Position).await.unwrap();
        assert_eq!(board.rank_of(e.id), Some(5));

        assert!(matches!(
            db.move_meal_to_top(999).await,
            Err(MealError::NotFound(999))
        ));
        db.delete_meal(ids[1]).await.unwrap();
        assert!(matches!(
            db.move_meal_to_bottom(ids[1]).await,
            Err(MealError::Deleted(_))
        ));
    }

    #[tokio::test]
    async fn test_check_and_clear() {
        let db = test_db().await;
        assert!(db.check().await.unwrap());

        db.create_meal(&valid("A", "X", 1.0, Difficulty::Low))
            .await
            .unwrap();
        db.create_meal(&valid("B", "X", 1.0, Difficulty::Low))
            .await
            .unwrap();
        assert_eq!(db.clear_meals().await.unwrap(), 2);
        assert!(db.list_meals().await.unwrap().is_empty());
    }

    /// File-backed database in the temp dir, removed again on drop.
    struct TempDb {
        path: std::path::PathBuf,
    }

    impl TempDb {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "meal_max_{name}_{}.db",
                std::process::id()
            ));
            let db = Self { path };
            db.remove_files();
            db
        }

        fn url(&self) -> String {
            format!("sqlite:{}?mode=rwc", self.path.display())
        }

        fn remove_files(&self) {
            for suffix in ["", "-wal", "-shm"] {
                let mut file = self.path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }

    impl Drop for TempDb {
        fn drop(&mut self) {
            self.remove_files();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_on_file_database() {
        let file = TempDb::new("concurrent_writes");
        let db = std::sync::Arc::new(Database::new(&file.url()).await.unwrap());

        let mut ids = Vec::new();
        for i in 0..40 {
            let meal = db
                .create_meal(&valid(&format!("Meal {i}"), "X", 1.0, Difficulty::Low))
                .await
                .unwrap();
            ids.push(meal.id);
        }
        let home = db
            .create_meal(&valid("Home", "H", 2.0, Difficulty::Med))
            .await
            .unwrap();
        let away = db
            .create_meal(&valid("Away", "A", 2.0, Difficulty::Med))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for (i, &id) in ids.iter().enumerate() {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                match i % 3 {
                    0 => db.delete_meal(id).await,
                    1 => db.move_meal_to_top(id).await,
                    _ => db.move_meal_to_bottom(id).await,
                }
            }));
        }
        let (home_id, away_id) = (home.id, away.id);
        for _ in 0..10 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.record_battle(home_id, away_id).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let board = db.leaderboard(SortField::Battles).await.unwrap();
        let deleted = ids.iter().step_by(3).count();
        assert_eq!(board.len(), ids.len() - deleted + 2);
        assert_eq!(&board.meal_ids()[..2], &[home.id, away.id]);
        let mut rows = board.iter();
        let first = rows.next().unwrap();
        let second = rows.next().unwrap();
        assert_eq!((first.wins, first.battles), (10, 10));
        assert_eq!((second.wins, second.battles), (0, 10));
    }
}
