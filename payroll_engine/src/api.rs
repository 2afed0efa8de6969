//! HTTP API for the Payroll Engine.
//!
//! This module exposes a thin JSON API around the calculators using
//! the [`axum`](https://crates.io/crates/axum) framework.  Handlers
//! only decode requests, pick the rule set, call into the library and
//! encode the result; the attendance ledger is the only state they
//! share.

use crate::attendance::{AttendanceDurationCalculator, AttendanceRecord};
use crate::config::Config;
use crate::engine::{run_payroll, PayrollCalculator};
use crate::error::CalcError;
use crate::ledger::{AttendanceLedger, AttendanceSummary};
use crate::models::{AttendanceResult, PayPeriod, PayRunInput, PayRunResult, PayrollInput, PayrollResult};
use crate::payslip::Payslip;
use crate::rules::{load_rule_sets_from_dir, RuleBook, RuleSet};
use anyhow::{Context, Result};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Application state shared across requests.
pub struct AppState {
    pub rules: RuleBook,
    pub ledger: RwLock<AttendanceLedger>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Calc(#[from] CalcError),
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),
    #[error("{}", .0.body_text())]
    Query(#[from] QueryRejection),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Calc(err) => match err.root() {
                CalcError::UnknownRuleSet(_) => StatusCode::NOT_FOUND,
                e if e.is_state_conflict() => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            },
            ApiError::Body(rejection) => rejection.status(),
            ApiError::Query(rejection) => rejection.status(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "request rejected");
        }
        let body = Json(serde_json::json!({"error": self.to_string()}));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Build the API router over the given rule book and an empty
/// attendance ledger.
pub fn build_router(rules: RuleBook) -> Router {
    let state = Arc::new(AppState {
        rules,
        ledger: RwLock::new(AttendanceLedger::new()),
    });
    Router::new()
        .route("/health", get(health_check))
        .route("/api/rules", get(list_rules))
        .route("/api/attendance/calculate", post(calculate_attendance))
        .route("/api/attendance/clock-in", post(clock_in))
        .route("/api/attendance/clock-out", post(clock_out))
        .route("/api/attendance/:employee_id", get(list_attendance))
        .route("/api/attendance/:employee_id/summary", get(attendance_summary))
        .route("/api/payroll/calculate", post(calculate_payroll))
        .route("/api/payroll/run", post(run_payroll_handler))
        .route("/api/payroll/payslip", post(payslip_handler))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize)]
struct RulesResponse {
    default: String,
    rule_sets: Vec<RuleSet>,
}

async fn list_rules(State(state): State<Arc<AppState>>) -> ApiResult<RulesResponse> {
    Ok(Json(RulesResponse {
        default: state.rules.default_key().to_string(),
        rule_sets: state.rules.iter().cloned().collect(),
    }))
}

#[derive(Debug, Deserialize)]
struct AttendanceRequest {
    clock_in: NaiveTime,
    clock_out: NaiveTime,
    #[serde(default)]
    rule_set: Option<String>,
}

async fn calculate_attendance(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<AttendanceRequest>, JsonRejection>,
) -> ApiResult<AttendanceResult> {
    let Json(req) = payload?;
    let rules = state.rules.resolve(req.rule_set.as_deref())?;
    let result = AttendanceDurationCalculator::new(rules.attendance).compute(req.clock_in, req.clock_out)?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct ClockRequest {
    employee_id: String,
    /// Defaults to the server's local time.
    #[serde(default)]
    at: Option<NaiveDateTime>,
    #[serde(default)]
    rule_set: Option<String>,
}

impl ClockRequest {
    fn moment(&self) -> (NaiveDate, NaiveTime) {
        let at = self.at.unwrap_or_else(|| Local::now().naive_local());
        (at.date(), at.time())
    }
}

async fn clock_in(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ClockRequest>, JsonRejection>,
) -> ApiResult<AttendanceRecord> {
    let Json(req) = payload?;
    let (date, time) = req.moment();
    let record = state.ledger.write().await.clock_in(&req.employee_id, date, time)?;
    Ok(Json(record))
}

async fn clock_out(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ClockRequest>, JsonRejection>,
) -> ApiResult<AttendanceRecord> {
    let Json(req) = payload?;
    let rules = state.rules.resolve(req.rule_set.as_deref())?;
    let calculator = AttendanceDurationCalculator::new(rules.attendance);
    let (date, time) = req.moment();
    let record = state
        .ledger
        .write()
        .await
        .clock_out(&req.employee_id, date, time, &calculator)?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

async fn list_attendance(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
    query: std::result::Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<Vec<AttendanceRecord>> {
    let Query(range) = query?;
    let ledger = state.ledger.read().await;
    let records = ledger
        .records_for(&employee_id, range.start, range.end)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
struct SummaryQuery {
    start: NaiveDate,
    end: NaiveDate,
}

async fn attendance_summary(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
    query: std::result::Result<Query<SummaryQuery>, QueryRejection>,
) -> ApiResult<AttendanceSummary> {
    let Query(range) = query?;
    let summary = state
        .ledger
        .read()
        .await
        .summarize(&employee_id, range.start, range.end)?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
struct PayrollRequest {
    #[serde(flatten)]
    input: PayrollInput,
    #[serde(default)]
    rule_set: Option<String>,
}

async fn calculate_payroll(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PayrollRequest>, JsonRejection>,
) -> ApiResult<PayrollResult> {
    let Json(req) = payload?;
    let rules = state.rules.resolve(req.rule_set.as_deref())?;
    let result = PayrollCalculator::new(rules.payroll).compute(&req.input)?;
    Ok(Json(result))
}

/// Pay runs fan out over the rayon pool, so they run off the async
/// executor.
async fn run_payroll_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PayRunInput>, JsonRejection>,
) -> ApiResult<PayRunResult> {
    let Json(input) = payload?;
    let employees = input.entries.len();
    let result = tokio::task::spawn_blocking(move || run_payroll(input, &state.rules))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))??;
    info!(
        rule_set = %result.rule_set,
        employees,
        start = %result.period.start,
        end = %result.period.end,
        "pay run completed"
    );
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct PayslipRequest {
    employee_name: String,
    pay_period: PayPeriod,
    input: PayrollInput,
    #[serde(default)]
    rule_set: Option<String>,
}

#[derive(Debug, Serialize)]
struct PayslipResponse {
    payslip: Payslip,
    lines: Vec<String>,
    breakdown: PayrollResult,
}

async fn payslip_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PayslipRequest>, JsonRejection>,
) -> ApiResult<PayslipResponse> {
    let Json(req) = payload?;
    let period = req.pay_period;
    if period.start > period.end {
        return Err(CalcError::InvalidPeriod {
            start: period.start,
            end: period.end,
        }
        .into());
    }
    let rules = state.rules.resolve(req.rule_set.as_deref())?;
    let breakdown = PayrollCalculator::new(rules.payroll).compute(&req.input)?;
    let payslip = Payslip::new(req.employee_name, period, &req.input, &breakdown);
    let lines = payslip.lines();
    Ok(Json(PayslipResponse {
        payslip,
        lines,
        breakdown,
    }))
}

/// Launch the API server.  Rule sets are loaded from the configured
/// directory on top of the built-in default, then the server binds to
/// the configured address and runs until it is interrupted.
pub async fn serve(config: Config) -> Result<()> {
    let loaded = load_rule_sets_from_dir(&config.rules_dir)?;
    let rules = RuleBook::new(loaded, &config.default_rule_set).context("building rule book")?;
    let router = build_router(rules);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "server listening");
    axum::serve(listener, router).await.context("server failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn app() -> Router {
        build_router(RuleBook::default())
    }

    #[tokio::test]
    async fn calculates_attendance() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/attendance/calculate",
            Some(json!({"clock_in": "09:00:00", "clock_out": "19:30:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"total_hours": 9.5, "overtime_hours": 1.5}));
    }

    #[tokio::test]
    async fn inverted_attendance_range_is_bad_request() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/attendance/calculate",
            Some(json!({"clock_in": "18:00:00", "clock_out": "09:00:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("earlier than"));
    }

    #[tokio::test]
    async fn clock_workflow_and_summary() {
        let app = app();
        let clock_in = json!({"employee_id": "E001", "at": "2024-05-02T09:00:00"});
        let (status, body) = send(&app, "POST", "/api/attendance/clock-in", Some(clock_in.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clock_in"], "09:00:00");

        let (status, _) = send(&app, "POST", "/api/attendance/clock-in", Some(clock_in)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            "POST",
            "/api/attendance/clock-out",
            Some(json!({"employee_id": "E001", "at": "2024-05-02T19:30:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_hours"], 9.5);
        assert_eq!(body["overtime_hours"], 1.5);

        let (status, body) = send(&app, "GET", "/api/attendance/E001?start=2024-05-01", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            "GET",
            "/api/attendance/E001/summary?start=2024-05-01&end=2024-05-31",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"days_worked": 1, "total_hours": 9.5, "overtime_hours": 1.5}));
    }

    #[tokio::test]
    async fn malformed_requests_get_json_errors() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/payroll/calculate")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());

        let (status, body) = send(
            &app,
            "POST",
            "/api/attendance/calculate",
            Some(json!({"clock_in": "09:00:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());

        let (status, body) = send(&app, "GET", "/api/attendance/E001/summary?start=2024-05-01", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn clock_out_without_clock_in_is_conflict() {
        let (status, _) = send(
            &app(),
            "POST",
            "/api/attendance/clock-out",
            Some(json!({"employee_id": "E404", "at": "2024-05-02T18:00:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn calculates_payroll_with_defaults() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/payroll/calculate",
            Some(json!({"base_salary": 1_000_000.0, "holiday_hours": 8.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hourly_wage"], 9860.0);
        assert_eq!(body["holiday_pay"], 157_760.0);
        assert_eq!(body["gross_pay"], 1_157_760.0);
    }

    #[tokio::test]
    async fn payroll_errors_map_to_status_codes() {
        let app = app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/payroll/calculate",
            Some(json!({"base_salary": -1.0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/api/payroll/calculate",
            Some(json!({"base_salary": 1.0, "rule_set": "XX-1999"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn runs_payroll_for_many_employees() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/payroll/run",
            Some(json!({
                "pay_period": {"start": "2024-03-01", "end": "2024-03-31"},
                "entries": [
                    {"employee_id": "E001", "employee_name": "Kim", "input": {"base_salary": 3_000_000.0}},
                    {"employee_id": "E002", "employee_name": "Lee", "input": {"base_salary": 4_000_000.0, "overtime_hours": 4.0}}
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rule_set"], "KR-2024");
        assert_eq!(body["results"][1]["employee_id"], "E002");
        assert!(body["totals"]["net_pay"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn renders_payslip() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/payroll/payslip",
            Some(json!({
                "employee_name": "Kim Minsu",
                "pay_period": {"start": "2024-03-01", "end": "2024-03-31"},
                "input": {"base_salary": 5_000_000.0, "overtime_hours": 10.0}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lines"][0], "Base salary: 5,000,000원");
        assert_eq!(body["payslip"]["net_pay"]["formatted"], "4,641,726원");
    }

    #[tokio::test]
    async fn lists_rule_sets_and_health() {
        let (status, body) = send(&app(), "GET", "/api/rules", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["default"], "KR-2024");
        assert_eq!(body["rule_sets"][0]["payroll"]["minimum_hourly_wage"], 9860.0);

        let app = app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
