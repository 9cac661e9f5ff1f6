// Leaderboard sort fields and the ordered view returned to callers.
//
// Ordering itself lives in the database: every meal carries an integer
// `position` (default order) and the sortable columns are indexed, so
// reads never re-sort in memory.

use serde::Serialize;

use crate::error::MealError;
use crate::meal::Meal;

/// Field the leaderboard is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Leaderboard position: insertion order unless moved to top/bottom.
    #[default]
    Position,
    Wins,
    WinPct,
    Price,
    Battles,
}

impl SortField {
    /// Parse a `sort` query value. A missing or empty value means `Position`.
    pub fn parse(s: Option<&str>) -> Result<Self, MealError> {
        match s.map(str::trim) {
            None | Some("") | Some("position") => Ok(Self::Position),
            Some("wins") => Ok(Self::Wins),
            Some("win_pct") => Ok(Self::WinPct),
            Some("price") => Ok(Self::Price),
            Some("battles") => Ok(Self::Battles),
            Some(other) => Err(MealError::InvalidSort(other.to_string())),
        }
    }

    /// SQL `ORDER BY` clause. Ties fall back to leaderboard position.
    pub(crate) fn order_clause(self) -> &'static str {
        match self {
            Self::Position => "position ASC, id ASC",
            Self::Wins => "wins DESC, position ASC, id ASC",
            Self::WinPct => "win_pct DESC, wins DESC, position ASC, id ASC",
            Self::Price => "price DESC, position ASC, id ASC",
            Self::Battles => "battles DESC, position ASC, id ASC",
        }
    }
}

/// A meal together with its battle record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    #[serde(flatten)]
    pub meal: Meal,
    pub battles: i64,
    pub wins: i64,
    pub win_pct: f64,
}

/// Win percentage, 0 for meals that have not fought yet.
pub fn win_pct(wins: i64, battles: i64) -> f64 {
    if battles > 0 {
        wins as f64 / battles as f64
    } else {
        0.0
    }
}

/// Ordered snapshot of the leaderboard. Iterating it never consumes it,
/// so callers can walk the ordering as many times as they need.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new(entries: Vec<LeaderboardEntry>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LeaderboardEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Meal ids in leaderboard order.
    #[cfg(test)]
    pub(crate) fn meal_ids(&self) -> Vec<i64> {
        self.iter().map(|e| e.meal.id).collect()
    }

    /// 1-based rank of a meal, if it is on the board.
    #[cfg(test)]
    pub(crate) fn rank_of(&self, meal_id: i64) -> Option<usize> {
        self.iter().position(|e| e.meal.id == meal_id).map(|i| i + 1)
    }
}

impl<'a> IntoIterator for &'a Leaderboard {
    type Item = &'a LeaderboardEntry;
    type IntoIter = std::slice::Iter<'a, LeaderboardEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
