// In crates/web-server/src/lib.rs

use analytics::{AggregationService, DateSummary, HistoryRow, grid_rows};
use app_config::types::ServerSettings;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use core_types::format::parse_date;
use core_types::{ApacComments, DailyReport, HistoricalFilter, Sector, SectorRecap, Validate};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use storage::ReportStore;
use tokio::net::TcpListener;
use types::ListResponse;

pub mod error;
pub mod types;

// Re-export our custom error type for convenience.
pub use error::{Error, Result};

/// The shared application state that is available to all API handlers.
///
/// Every handler locks the store for the duration of one synchronous
/// operation; no lock is held across an `.await`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<ReportStore>>,
}

impl AppState {
    pub fn new(store: Arc<Mutex<ReportStore>>) -> Self {
        Self { store }
    }

    fn store(&self) -> MutexGuard<'_, ReportStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates the main application router with all routes and middleware.
///
/// # Arguments
///
/// * `app_state`: The shared `AppState` holding the report store.
///
/// # Returns
///
/// The configured `axum::Router`.
pub fn create_router(app_state: AppState) -> Router {
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let api_router = Router::new()
        .route("/reports/today", get(get_todays_report_handler))
        .route("/reports/{date}", get(get_report_handler))
        .route("/reports/{date}/summary", get(get_summary_handler))
        .route("/reports/{date}/memo", get(get_memo_handler))
        .route("/reports/{date}/history", post(save_to_history_handler))
        .route("/history", get(get_history_handler))
        .route("/recaps", put(put_recap_handler))
        .route("/recaps/{sector}/{date}", get(get_recap_handler))
        .route("/apac", put(put_apac_handler))
        .route("/drafts", delete(clear_drafts_handler));

    Router::new()
        .route("/health", get(health_check_handler))
        .nest("/api", api_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

async fn health_check_handler() -> &'static str {
    "OK"
}

// --- Reports ---

/// `GET /api/reports/today`. 404 until something has been entered today.
async fn get_todays_report_handler(State(state): State<AppState>) -> Result<Json<DailyReport>> {
    state
        .store()
        .todays_report()
        .map(Json)
        .ok_or_else(|| Error::NotFound("No report has been entered today".to_string()))
}

fn find_report(state: &AppState, date: NaiveDate) -> Result<DailyReport> {
    state
        .store()
        .report_by_date(date)
        .ok_or_else(|| Error::NotFound(format!("No report for {date}")))
}

async fn get_report_handler(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DailyReport>> {
    let date = parse_date(&date)?;
    find_report(&state, date).map(Json)
}

async fn get_summary_handler(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DateSummary>> {
    let date = parse_date(&date)?;
    let store = state.store();
    Ok(Json(AggregationService::new(&store).date_summary(date)))
}

/// `GET /api/reports/{date}/memo`: the plain-text memo, offered as a download.
async fn get_memo_handler(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<impl IntoResponse> {
    let date = parse_date(&date)?;
    let report = find_report(&state, date)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export::memo_filename(&report, "txt")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export::render_memo(&report),
    ))
}

/// `POST /api/reports/{date}/history`: snapshots the report for `date` into
/// saved history. Dates covered by seed data are refused.
async fn save_to_history_handler(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<(StatusCode, Json<DailyReport>)> {
    let date = parse_date(&date)?;
    let mut store = state.store();
    if store.is_seed_date(date) {
        return Err(Error::Conflict(format!("{date} is already covered by seed data")));
    }
    let report = store
        .report_by_date(date)
        .ok_or_else(|| Error::NotFound(format!("No report for {date}")))?;
    store.save_to_history(report.clone());
    Ok((StatusCode::CREATED, Json(report)))
}

/// `GET /api/history?dateFrom=&dateTo=&sector=`: the flattened grid rows.
async fn get_history_handler(
    State(state): State<AppState>,
    Query(filter): Query<HistoricalFilter>,
) -> Json<ListResponse<HistoryRow>> {
    let reports = state.store().historical_data();
    Json(grid_rows(&reports, &filter).into())
}

// --- Drafts ---

async fn put_recap_handler(
    State(state): State<AppState>,
    Json(recap): Json<SectorRecap>,
) -> Result<Json<SectorRecap>> {
    recap.validate()?;
    tracing::info!(sector = %recap.sector, date = %recap.date, "Saving sector recap.");
    state.store().set_sector_recap(recap.clone());
    Ok(Json(recap))
}

async fn get_recap_handler(
    State(state): State<AppState>,
    Path((sector, date)): Path<(String, String)>,
) -> Result<Json<SectorRecap>> {
    let sector: Sector = sector.parse()?;
    let date = parse_date(&date)?;
    state
        .store()
        .sector_recap(sector, date)
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("No {sector} recap for {date}")))
}

async fn put_apac_handler(
    State(state): State<AppState>,
    Json(comments): Json<ApacComments>,
) -> Result<Json<ApacComments>> {
    comments.validate()?;
    tracing::info!(date = %comments.date, "Saving APAC comments.");
    state.store().set_apac_comments(comments.clone());
    Ok(Json(comments))
}

async fn clear_drafts_handler(State(state): State<AppState>) -> StatusCode {
    state.store().clear_drafts();
    StatusCode::NO_CONTENT
}

/// The main entry point for running the web server.
///
/// This function sets up the TCP listener and serves the application router.
/// It will run forever until the process is terminated.
pub async fn run(settings: &ServerSettings, store: Arc<Mutex<ReportStore>>) -> Result<()> {
    let app = create_router(AppState::new(store));

    let address = format!("{}:{}", settings.host, settings.port);
    tracing::info!("Web server listening on {}", address);

    let listener = TcpListener::bind(&address)
        .await
        .map_err(Error::ServerBindError)?;

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(Error::ServeError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use core_types::Metrics;
    use storage::{FixedClock, MemoryKvStore};
    use tower::ServiceExt;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    fn seeded_report(date: NaiveDate) -> DailyReport {
        let stamp = date.and_hms_opt(18, 0, 0).unwrap().and_utc();
        DailyReport {
            date,
            apac_comments: ApacComments::from_totals(Metrics::new(10.0, 20.0, 30.0), date),
            sector_recaps: vec![SectorRecap::new(Sector::Sovs, date, Metrics::new(10.0, 20.0, 30.0))],
            created_at: stamp,
            last_modified: stamp,
        }
    }

    fn app() -> (Router, Arc<Mutex<ReportStore>>) {
        let seed = vec![seeded_report(NaiveDate::from_ymd_opt(2024, 3, 13).unwrap())];
        let store = Arc::new(Mutex::new(ReportStore::new(
            Arc::new(MemoryKvStore::new()),
            Arc::new(FixedClock::on(today())),
            seed,
        )));
        (create_router(AppState::new(store.clone())), store)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn recap_body(sector: &str, date: &str) -> serde_json::Value {
        serde_json::json!({
            "sector": sector,
            "date": date,
            "marketMovesAndFlows": "Spreads tighter",
            "marketCommentary": "Real money buying",
            "metrics": { "pnl": 1500.0, "risk": 50000.0, "volumes": 2500000.0 }
        })
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let (app, _) = app();
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn todays_report_is_404_until_a_recap_is_saved() {
        let (app, _) = app();
        let response = app.clone().oneshot(get("/api/reports/today")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(json(Method::PUT, "/api/recaps", recap_body("Japan IG", "2024-03-14")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/api/reports/today")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report = body_json(response).await;
        assert_eq!(report["date"], "2024-03-14");
        assert_eq!(report["apacComments"]["pnl"], 1500.0);
        assert_eq!(report["sectorRecaps"][0]["sector"], "Japan IG");
    }

    #[tokio::test]
    async fn blank_required_fields_are_rejected() {
        let (app, store) = app();
        let mut body = recap_body("Sovs", "2024-03-14");
        body["marketMovesAndFlows"] = serde_json::json!("   ");
        let response = app
            .clone()
            .oneshot(json(Method::PUT, "/api/recaps", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let error = body_json(response).await;
        assert_eq!(error["code"], 422);
        assert!(store.lock().unwrap().all_sector_recaps(today()).is_empty());

        let apac = serde_json::json!({
            "pnl": 0.0, "risk": 0.0, "volumes": 0.0,
            "marketCommentary": "", "date": "2024-03-14"
        });
        let response = app.oneshot(json(Method::PUT, "/api/apac", apac)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn recap_lookup_accepts_loose_sector_names() {
        let (app, _) = app();
        app.clone()
            .oneshot(json(Method::PUT, "/api/recaps", recap_body("SEA IG", "2024-03-11")))
            .await
            .unwrap();

        let response = app.clone().oneshot(get("/api/recaps/sea-ig/2024-03-11")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["sector"], "SEA IG");

        let response = app.clone().oneshot(get("/api/recaps/Nowhere/2024-03-11")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(get("/api/recaps/Sovs/2024-03-11")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn report_by_date_and_bad_dates() {
        let (app, _) = app();
        let response = app.clone().oneshot(get("/api/reports/2024-03-13")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(get("/api/reports/2024-01-01")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(get("/api/reports/14-03-2024")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn summary_reports_progress() {
        let (app, _) = app();
        app.clone()
            .oneshot(json(Method::PUT, "/api/recaps", recap_body("India IG", "2024-03-14")))
            .await
            .unwrap();
        let response = app.oneshot(get("/api/reports/2024-03-14/summary")).await.unwrap();
        let summary = body_json(response).await;
        assert_eq!(summary["totalSectors"], 6);
        assert_eq!(summary["completedSectors"], 1);
        assert_eq!(summary["isComplete"], false);
        assert_eq!(summary["totals"]["pnl"], 1500.0);
    }

    #[tokio::test]
    async fn history_is_filtered_and_flattened() {
        let (app, _) = app();
        app.clone()
            .oneshot(json(Method::PUT, "/api/recaps", recap_body("Japan IG", "2024-03-14")))
            .await
            .unwrap();

        let response = app.clone().oneshot(get("/api/history")).await.unwrap();
        let all = body_json(response).await;
        assert_eq!(all["totalItems"], 4);
        assert_eq!(all["items"][0]["id"], "2024-03-14-apac");

        let response = app
            .oneshot(get("/api/history?dateFrom=2024-03-13&dateTo=2024-03-13&sector=Sovs"))
            .await
            .unwrap();
        let filtered = body_json(response).await;
        assert_eq!(filtered["totalItems"], 2);
        assert_eq!(filtered["items"][1]["sector"], "Sovs");
    }

    #[tokio::test]
    async fn memo_is_served_as_text() {
        let (app, _) = app();
        let response = app.oneshot(get("/api/reports/2024-03-13/memo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Market_Memo_2024_03_13.txt\""
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8(body.to_vec()).unwrap().starts_with("APAC Market Memo\n"));
    }

    fn post(uri: &str) -> Request<Body> {
        Request::builder().method(Method::POST).uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn saving_to_history_and_clearing_drafts() {
        let (app, store) = app();
        app.clone()
            .oneshot(json(Method::PUT, "/api/recaps", recap_body("China IG", "2024-03-12")))
            .await
            .unwrap();

        // 2024-03-12 has a draft but no report in seed or history yet.
        let response = app.clone().oneshot(post("/api/reports/2024-03-12/history")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Seed data already covers 2024-03-13.
        let response = app.clone().oneshot(post("/api/reports/2024-03-13/history")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(store.lock().unwrap().saved_history().is_empty());

        app.clone()
            .oneshot(json(Method::PUT, "/api/recaps", recap_body("Japan IG", "2024-03-14")))
            .await
            .unwrap();
        let response = app.clone().oneshot(post("/api/reports/2024-03-14/history")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["date"], "2024-03-14");
        assert_eq!(store.lock().unwrap().saved_history().len(), 1);

        let response = app
            .oneshot(Request::builder().method(Method::DELETE).uri("/api/drafts").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let store = store.lock().unwrap();
        assert!(store.sector_recap(Sector::ChinaIg, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()).is_none());
        assert!(store.sector_recap(Sector::JapanIg, today()).is_some());
        assert_eq!(store.saved_history().len(), 1);
    }
}
