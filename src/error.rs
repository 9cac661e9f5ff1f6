// Error types for catalog, leaderboard, and battle operations.

use thiserror::Error;

/// Errors from catalog and leaderboard operations.
#[derive(Debug, Error)]
pub enum MealError {
    #[error("Meal name must not be empty")]
    EmptyName,
    #[error("Invalid price: {0}. Price must be a positive number.")]
    InvalidPrice(f64),
    #[error("Invalid price: {0}. Price must be at most {max}.", max = crate::meal::MAX_PRICE)]
    PriceTooHigh(f64),
    #[error("Invalid difficulty level: {0}. Must be 'LOW', 'MED', or 'HIGH'.")]
    InvalidDifficulty(String),
    #[error("Meal with name '{0}' already exists")]
    DuplicateName(String),
    #[error("Meal with ID {0} not found")]
    NotFound(i64),
    #[error("Meal with ID {0} has been deleted")]
    Deleted(i64),
    #[error("Meal with name {0} not found")]
    NameNotFound(String),
    #[error("Meal with name {0} has been deleted")]
    NameDeleted(String),
    #[error("The meal database is empty.")]
    EmptyCatalog,
    #[error("Invalid sort_by parameter: {0}")]
    InvalidSort(String),
    /// A stored row holds a difficulty outside LOW/MED/HIGH.
    #[error("Corrupt difficulty '{value}' stored for meal {id}")]
    CorruptRow { id: i64, value: String },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Errors from staging combatants and resolving battles.
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("Combatant list is full, cannot add more combatants.")]
    CombatantsFull,
    #[error("Two combatants must be prepped for a battle.")]
    NotEnoughCombatants,
    #[error("Meal '{0}' is already prepped as a combatant")]
    AlreadyStaged(String),
    #[error(transparent)]
    Meal(#[from] MealError),
}

impl From<sqlx::Error> for BattleError {
    fn from(e: sqlx::Error) -> Self {
        BattleError::Meal(MealError::Database(e))
    }
}
