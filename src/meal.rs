// Meal domain types and input validation.

use serde::{Deserialize, Serialize};

use crate::error::MealError;

/// How hard a meal is to prepare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Low,
    Med,
    High,
}

impl Difficulty {
    /// Parse the stored form (`LOW`, `MED`, `HIGH`).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Self::Low),
            "MED" => Some(Self::Med),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Med => "MED",
            Self::High => "HIGH",
        }
    }

    /// Amount subtracted from a combatant's battle score.
    /// Harder meals lose less.
    pub fn score_modifier(self) -> f64 {
        match self {
            Self::High => 1.0,
            Self::Med => 2.0,
            Self::Low => 3.0,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    #[serde(rename = "meal")]
    pub name: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
}

/// Upper bound on a meal's price. Keeps battle scores finite.
pub const MAX_PRICE: f64 = 1_000_000.0;

/// Unvalidated meal as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMeal {
    pub meal: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: String,
}

/// A meal that passed validation and can be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMeal {
    pub name: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
}

impl NewMeal {
    pub fn validate(self) -> Result<ValidMeal, MealError> {
        let name = self.meal.trim().to_string();
        if name.is_empty() {
            return Err(MealError::EmptyName);
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(MealError::InvalidPrice(self.price));
        }
        if self.price > MAX_PRICE {
            return Err(MealError::PriceTooHigh(self.price));
        }
        let difficulty = Difficulty::from_str_name(&self.difficulty)
            .ok_or(MealError::InvalidDifficulty(self.difficulty))?;
        Ok(ValidMeal {
            name,
            cuisine: self.cuisine,
            price: self.price,
            difficulty,
        })
    }
}
