// Battle engine: combatant staging, scoring, and winner selection.
//
// Each combatant gets a strength score from its price, cuisine, and
// difficulty. The scores feed a logistic win probability (same curve as an
// Elo expected score) and one uniform roll decides the winner.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::dice::Dice;
use crate::error::BattleError;
use crate::meal::Meal;
use crate::metrics;

/// Score difference at which the stronger side is a 10:1 favourite.
pub const SCORE_SCALE: f64 = 100.0;

/// Strength of a combatant: `price * cuisine length - difficulty modifier`.
pub fn battle_score(meal: &Meal) -> f64 {
    meal.price * meal.cuisine.chars().count() as f64 - meal.difficulty.score_modifier()
}

/// Probability that a combatant scoring `score_a` beats one scoring `score_b`.
/// Two infinite scores of the same sign count as an even match.
pub fn win_probability(score_a: f64, score_b: f64) -> f64 {
    let diff = (score_b - score_a) / SCORE_SCALE;
    if diff.is_nan() {
        return 0.5;
    }
    1.0 / (1.0 + 10.0_f64.powf(diff))
}

/// Result of a resolved battle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleReport {
    pub winner: Meal,
    pub loser: Meal,
    pub winner_score: f64,
    pub loser_score: f64,
    /// Chance the winner had going in.
    pub winner_probability: f64,
    pub roll: f64,
}

/// Pick a winner between `a` and `b` given a roll in `[0, 1)`.
/// `a` wins when the roll falls below its win probability.
pub fn resolve(a: &Meal, b: &Meal, roll: f64) -> BattleReport {
    let score_a = battle_score(a);
    let score_b = battle_score(b);
    let p_a = win_probability(score_a, score_b);

    if roll < p_a {
        BattleReport {
            winner: a.clone(),
            loser: b.clone(),
            winner_score: score_a,
            loser_score: score_b,
            winner_probability: p_a,
            roll,
        }
    } else {
        BattleReport {
            winner: b.clone(),
            loser: a.clone(),
            winner_score: score_b,
            loser_score: score_a,
            winner_probability: 1.0 - p_a,
            roll,
        }
    }
}

/// Combatants staged for the next battle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Stage {
    #[default]
    Empty,
    One(Meal),
    Two(Meal, Meal),
}

impl Stage {
    /// Add a combatant. Fails when two are already staged or the meal is
    /// already on the stage.
    pub fn prep(&mut self, meal: Meal) -> Result<(), BattleError> {
        match std::mem::take(self) {
            Stage::Empty => *self = Stage::One(meal),
            Stage::One(first) if first.id == meal.id => {
                *self = Stage::One(first);
                return Err(BattleError::AlreadyStaged(meal.name));
            }
            Stage::One(first) => *self = Stage::Two(first, meal),
            full @ Stage::Two(..) => {
                *self = full;
                return Err(BattleError::CombatantsFull);
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Stage::Empty;
    }

    /// Both combatants, in staging order.
    pub fn pair(&self) -> Result<(&Meal, &Meal), BattleError> {
        match self {
            Stage::Two(a, b) => Ok((a, b)),
            _ => Err(BattleError::NotEnoughCombatants),
        }
    }

    pub fn combatants(&self) -> Vec<Meal> {
        match self {
            Stage::Empty => Vec::new(),
            Stage::One(a) => vec![a.clone()],
            Stage::Two(a, b) => vec![a.clone(), b.clone()],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Stage::Empty => 0,
            Stage::One(_) => 1,
            Stage::Two(..) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Stage::Empty)
    }
}

/// Process-wide combatant stage. The lock is held for the whole of each
/// operation, including the database write of a battle, so prep, battle,
/// and clear calls never interleave.
#[derive(Clone)]
pub struct Arena {
    stage: Arc<Mutex<Stage>>,
    dice: Dice,
}

impl Arena {
    pub fn new(dice: Dice) -> Self {
        Self {
            stage: Arc::new(Mutex::new(Stage::Empty)),
            dice,
        }
    }

    /// Stage a combatant and return the current line-up.
    pub async fn prep_combatant(&self, meal: Meal) -> Result<Vec<Meal>, BattleError> {
        let mut stage = self.stage.lock().await;
        let name = meal.name.clone();
        stage.prep(meal)?;
        metrics::STAGED_COMBATANTS.set(stage.len() as i64);
        tracing::info!("Prepped combatant {name} ({} staged)", stage.len());
        Ok(stage.combatants())
    }

    pub async fn combatants(&self) -> Vec<Meal> {
        self.stage.lock().await.combatants()
    }

    pub async fn clear_combatants(&self) {
        let mut stage = self.stage.lock().await;
        if stage.is_empty() {
            tracing::debug!("No combatants staged");
        } else {
            tracing::info!("Cleared {} combatants", stage.len());
        }
        stage.clear();
        metrics::STAGED_COMBATANTS.set(0);
    }

    /// Resolve a battle between the two staged combatants and record the
    /// result. The stage is emptied only once the result is stored.
    pub async fn battle(&self, db: &Database) -> Result<BattleReport, BattleError> {
        let mut stage = self.stage.lock().await;
        let (a, b) = stage.pair()?;
        let report = resolve(a, b, self.dice.roll());

        db.record_battle(report.winner.id, report.loser.id).await?;

        stage.clear();
        metrics::STAGED_COMBATANTS.set(0);
        metrics::BATTLES_TOTAL.inc();
        metrics::BATTLE_WINS_TOTAL
            .with_label_values(&[report.winner.difficulty.as_str()])
            .inc();
        tracing::info!(
            "Battle complete: {} beat {} (p={:.3}, roll={:.3})",
            report.winner.name,
            report.loser.name,
            report.winner_probability,
            report.roll
        );
        Ok(report)
    }
}
