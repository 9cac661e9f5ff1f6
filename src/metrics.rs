// Prometheus metrics definitions for the Meal Max backend.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Meals currently staged for the next battle (0..=2).
    pub static ref STAGED_COMBATANTS: IntGauge =
        IntGauge::new("meal_max_staged_combatants", "Meals staged for the next battle")
            .expect("valid metric definition");

    // ── Counters ─────────────────────────────────────────────────────

    pub static ref MEALS_CREATED_TOTAL: IntCounter =
        IntCounter::new("meal_max_meals_created_total", "Meals added to the catalog")
            .expect("valid metric definition");

    pub static ref MEALS_DELETED_TOTAL: IntCounter =
        IntCounter::new("meal_max_meals_deleted_total", "Meals soft-deleted from the catalog")
            .expect("valid metric definition");

    pub static ref BATTLES_TOTAL: IntCounter =
        IntCounter::new("meal_max_battles_total", "Battles resolved")
            .expect("valid metric definition");

    /// Battle wins, by the winner's difficulty.
    pub static ref BATTLE_WINS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("meal_max_battle_wins_total", "Battle wins by difficulty"),
        &["difficulty"],
    )
    .expect("valid metric definition");

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("meal_max_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .expect("valid metric definition");

    // ── Histograms ───────────────────────────────────────────────────

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "meal_max_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        &["endpoint"],
    )
    .expect("valid metric definition");
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() -> prometheus::Result<()> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(STAGED_COMBATANTS.clone()),
        Box::new(MEALS_CREATED_TOTAL.clone()),
        Box::new(MEALS_DELETED_TOTAL.clone()),
        Box::new(BATTLES_TOTAL.clone()),
        Box::new(BATTLE_WINS_TOTAL.clone()),
        Box::new(API_REQUESTS_TOTAL.clone()),
        Box::new(API_REQUEST_DURATION_SECONDS.clone()),
    ];

    for c in collectors {
        match REGISTRY.register(c) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Normalize a URL path for metric labels: replace numeric path segments with `:id`
/// to prevent cardinality explosion.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.parse::<i64>().is_ok() {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
