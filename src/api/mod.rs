// HTTP API routes (meal catalog, leaderboard, combatants, battles).

mod extract;

use axum::{
    extract::{Json, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use self::extract::{ApiJson, ApiPath, ApiQuery};
use crate::battle::Arena;
use crate::db::Database;
use crate::dice::Dice;
use crate::error::{BattleError, MealError};
use crate::leaderboard::SortField;
use crate::meal::NewMeal;
use crate::metrics;

// ── Request types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MoveMealRequest {
    pub meal_id: i64,
}

#[derive(Deserialize)]
pub struct PrepCombatantRequest {
    pub meal: String,
}

#[derive(Deserialize)]
pub struct MealNameParams {
    pub meal_name: String,
}

#[derive(Deserialize)]
pub struct LeaderboardParams {
    pub sort: Option<String>,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub arena: Arena,
    pub dice: Dice,
}

impl AppState {
    pub fn new(db: Arc<Database>, dice: Dice) -> Self {
        Self {
            db,
            arena: Arena::new(dice.clone()),
            dice,
        }
    }
}

// ── Error helpers ─────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "status": "error", "error": msg }))).into_response()
}

fn internal_error(e: &sqlx::Error) -> Response {
    tracing::error!("Database error: {e}");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

fn meal_error(e: MealError) -> Response {
    let status = match &e {
        MealError::EmptyName
        | MealError::InvalidPrice(_)
        | MealError::PriceTooHigh(_)
        | MealError::InvalidDifficulty(_)
        | MealError::InvalidSort(_) => StatusCode::BAD_REQUEST,
        MealError::DuplicateName(_) => StatusCode::CONFLICT,
        MealError::NotFound(_)
        | MealError::Deleted(_)
        | MealError::NameNotFound(_)
        | MealError::NameDeleted(_)
        | MealError::EmptyCatalog => StatusCode::NOT_FOUND,
        MealError::CorruptRow { .. } => {
            tracing::error!("{e}");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
        MealError::Database(db) => return internal_error(db),
    };
    json_error(status, &e.to_string())
}

fn battle_error(e: BattleError) -> Response {
    match e {
        BattleError::Meal(e) => meal_error(e),
        other => json_error(StatusCode::CONFLICT, &other.to_string()),
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Health
        .route("/health", get(health_check))
        .route("/db-check", get(db_check))
        // Catalog
        .route("/create-meal", post(create_meal))
        .route("/delete-meal/{id}", delete(delete_meal))
        .route("/clear-meals", delete(clear_meals))
        .route("/get-all-meals", get(get_all_meals))
        .route("/get-meal-by-id/{id}", get(get_meal_by_id))
        .route("/get-meal-from-name", get(get_meal_by_name))
        .route("/get-random-meal", get(get_random_meal))
        // Leaderboard
        .route("/leaderboard", get(get_leaderboard))
        .route("/move-meal-to-top", post(move_meal_to_top))
        .route("/move-meal-to-bottom", post(move_meal_to_bottom))
        // Battle
        .route("/clear-combatants", post(clear_combatants))
        .route("/prep-combatant", post(prep_combatant))
        .route("/get-combatants", get(get_combatants))
        .route("/battle", get(battle));

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(get_metrics))
        .layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

async fn track_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = metrics::normalize_path(req.uri().path());
    let start = Instant::now();

    let response = next.run(req).await;

    metrics::API_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), endpoint.as_str(), response.status().as_str()])
        .inc();
    metrics::API_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint.as_str()])
        .observe(start.elapsed().as_secs_f64());
    response
}

// ── Health handlers ───────────────────────────────────────────────────

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "service": "meal-max-backend" }))
}

async fn db_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.check().await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "database_status": "healthy" })),
        )
            .into_response(),
        Ok(false) => json_error(StatusCode::SERVICE_UNAVAILABLE, "meals table does not exist"),
        Err(e) => internal_error(&e),
    }
}

async fn get_metrics() -> impl IntoResponse {
    match metrics::gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ── Catalog handlers ──────────────────────────────────────────────────

async fn create_meal(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NewMeal>,
) -> impl IntoResponse {
    let meal = match req.validate() {
        Ok(meal) => meal,
        Err(e) => return meal_error(e),
    };
    match state.db.create_meal(&meal).await {
        Ok(meal) => {
            metrics::MEALS_CREATED_TOTAL.inc();
            (
                StatusCode::CREATED,
                Json(json!({ "status": "success", "meal": meal })),
            )
                .into_response()
        }
        Err(e) => meal_error(e),
    }
}

async fn delete_meal(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    match state.db.delete_meal(id).await {
        Ok(()) => {
            metrics::MEALS_DELETED_TOTAL.inc();
            (StatusCode::OK, Json(json!({ "status": "meal deleted" }))).into_response()
        }
        Err(e) => meal_error(e),
    }
}

async fn clear_meals(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.clear_meals().await {
        Ok(_) => {
            // Staged meals no longer exist.
            state.arena.clear_combatants().await;
            (StatusCode::OK, Json(json!({ "status": "success" }))).into_response()
        }
        Err(e) => internal_error(&e),
    }
}

async fn get_all_meals(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.list_meals().await {
        Ok(meals) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "meals": meals })),
        )
            .into_response(),
        Err(e) => meal_error(e),
    }
}

async fn get_meal_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    match state.db.get_meal_by_id(id).await {
        Ok(meal) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "meal": meal })),
        )
            .into_response(),
        Err(e) => meal_error(e),
    }
}

async fn get_meal_by_name(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<MealNameParams>,
) -> impl IntoResponse {
    match state.db.get_meal_by_name(&params.meal_name).await {
        Ok(meal) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "meal": meal })),
        )
            .into_response(),
        Err(e) => meal_error(e),
    }
}

async fn get_random_meal(State(state): State<AppState>) -> impl IntoResponse {
    let dice = state.dice.clone();
    match state.db.get_random_meal(|len| dice.index(len)).await {
        Ok(meal) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "meal": meal })),
        )
            .into_response(),
        Err(e) => meal_error(e),
    }
}

// ── Leaderboard handlers ──────────────────────────────────────────────

async fn get_leaderboard(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<LeaderboardParams>,
) -> impl IntoResponse {
    let sort = match SortField::parse(params.sort.as_deref()) {
        Ok(sort) => sort,
        Err(e) => return meal_error(e),
    };
    match state.db.leaderboard(sort).await {
        Ok(board) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "leaderboard": board })),
        )
            .into_response(),
        Err(e) => meal_error(e),
    }
}

async fn move_meal_to_top(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MoveMealRequest>,
) -> impl IntoResponse {
    match state.db.move_meal_to_top(req.meal_id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "success" }))).into_response(),
        Err(e) => meal_error(e),
    }
}

async fn move_meal_to_bottom(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MoveMealRequest>,
) -> impl IntoResponse {
    match state.db.move_meal_to_bottom(req.meal_id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "success" }))).into_response(),
        Err(e) => meal_error(e),
    }
}

// ── Battle handlers ───────────────────────────────────────────────────

async fn clear_combatants(State(state): State<AppState>) -> impl IntoResponse {
    state.arena.clear_combatants().await;
    (StatusCode::OK, Json(json!({ "status": "combatants cleared" })))
}

async fn prep_combatant(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PrepCombatantRequest>,
) -> impl IntoResponse {
    let meal = match state.db.get_meal_by_name(&req.meal).await {
        Ok(meal) => meal,
        Err(e) => return meal_error(e),
    };
    match state.arena.prep_combatant(meal).await {
        Ok(combatants) => (
            StatusCode::OK,
            Json(json!({ "status": "combatant prepared", "combatants": combatants })),
        )
            .into_response(),
        Err(e) => battle_error(e),
    }
}

async fn get_combatants(State(state): State<AppState>) -> impl IntoResponse {
    let combatants = state.arena.combatants().await;
    (
        StatusCode::OK,
        Json(json!({ "status": "success", "combatants": combatants })),
    )
}

async fn battle(State(state): State<AppState>) -> impl IntoResponse {
    match state.arena.battle(&state.db).await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({
                "status": "battle complete",
                "winner": report.winner.name,
                "result": report,
            })),
        )
            .into_response(),
        Err(e) => battle_error(e),
    }
}
