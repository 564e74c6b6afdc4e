//! HTTP request handlers for the attendance API.
//!
//! This module contains the handler functions for all API endpoints. Every
//! request gets a correlation id that is logged on entry and on failure.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregation::aggregate_period;
use crate::attendance::process_tap;
use crate::calculation::{PeriodRange, period_range};
use crate::error::EngineError;
use crate::models::{Employee, EmployeeId, NewEmployee};
use crate::report::{
    CSV_CONTENT_TYPE, EmployeePayroll, EmployeePeriodDetail, NotificationOutcome, ReportSummary,
    StoredSummary, build_summary, csv_filename, employee_payroll, employee_period_detail,
    send_reports, send_stored, stored_summary, summary_to_csv,
};
use crate::store::EmployeeStore;

use super::request::{
    AssignTagRequest, BanQuery, CalculateRangeQuery, LabelQuery, MonthQuery, PeriodQuery,
    RangeQuery, TapRequest,
};
use super::response::{ApiError, ApiErrorResponse, CalculationResponse, TapResponse};
use super::state::AppState;

type ApiResult<T> = Result<T, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/attendance/tap", post(tap_handler))
        .route("/payroll/calculate-range", post(calculate_range_handler))
        .route("/payroll/calculate-month", post(calculate_month_handler))
        .route("/payroll/employee/:id", get(employee_payroll_handler))
        .route("/report/summary", get(summary_handler))
        .route("/report/summary-range", get(summary_range_handler))
        .route("/report/summary.csv", get(summary_csv_handler))
        .route("/report/summary-range.csv", get(summary_range_csv_handler))
        .route("/report/send", post(send_handler))
        .route("/report/send-range", post(send_range_handler))
        .route("/report/stored", get(stored_handler))
        .route("/report/send-stored", post(send_stored_handler))
        .route("/report/employee/:id", get(employee_detail_handler))
        .route("/employees", get(list_employees_handler).post(create_employee_handler))
        .route("/employees/:id/tag", put(assign_tag_handler))
        .route("/employees/:id/ban", put(ban_handler))
        .with_state(state)
}

/// Logs a failed request and converts the error.
fn failure(correlation_id: Uuid, err: EngineError) -> ApiErrorResponse {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "Request failed"
    );
    err.into()
}

/// Unwraps a JSON body, turning rejections into API errors.
fn json_body<T>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> ApiResult<T> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(ApiErrorResponse::bad_request(error))
}

/// Unwraps a query string, turning rejections into API errors.
fn query_params<T>(
    correlation_id: Uuid,
    query: Result<Query<T>, QueryRejection>,
) -> ApiResult<T> {
    query.map(|Query(params)| params).map_err(|rejection| {
        let body_text = rejection.body_text();
        warn!(
            correlation_id = %correlation_id,
            error = %body_text,
            "Query string rejected"
        );
        ApiErrorResponse::bad_request(ApiError::invalid_query(body_text))
    })
}

fn reporting_range(correlation_id: Uuid, query: RangeQuery) -> ApiResult<PeriodRange> {
    PeriodRange::reporting(query.start, query.end, query.label)
        .map_err(|err| failure(correlation_id, err))
}

fn calendar_range(correlation_id: Uuid, query: &PeriodQuery) -> ApiResult<PeriodRange> {
    period_range(query.kind, query.anchor_or_today()).map_err(|err| failure(correlation_id, err))
}

fn csv_response(summary: &ReportSummary) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", csv_filename(summary)),
            ),
        ],
        summary_to_csv(summary),
    )
        .into_response()
}

/// Handler for POST /attendance/tap.
async fn tap_handler(
    State(state): State<AppState>,
    payload: Result<Json<TapRequest>, JsonRejection>,
) -> ApiResult<Json<TapResponse>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing tap");

    let request = json_body(correlation_id, payload)?;
    let outcome = process_tap(state.store(), &request.tag_id, Utc::now(), state.calendar())
        .await
        .map_err(|err| failure(correlation_id, err))?;

    Ok(Json(outcome.into()))
}

async fn run_aggregation(
    state: &AppState,
    correlation_id: Uuid,
    range: PeriodRange,
) -> ApiResult<Json<CalculationResponse>> {
    let start_time = Instant::now();
    let run = aggregate_period(state.store(), &range)
        .await
        .map_err(|err| failure(correlation_id, err))?;

    info!(
        correlation_id = %correlation_id,
        period = %run.period,
        employees = run.employees,
        duration_us = start_time.elapsed().as_micros(),
        "Payroll calculation completed"
    );
    Ok(Json(run.into()))
}

/// Handler for POST /payroll/calculate-range.
async fn calculate_range_handler(
    State(state): State<AppState>,
    query: Result<Query<CalculateRangeQuery>, QueryRejection>,
) -> ApiResult<Json<CalculationResponse>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing range calculation");

    let query = query_params(correlation_id, query)?;
    let range = PeriodRange::custom(query.start, query.end, query.label)
        .map_err(|err| failure(correlation_id, err))?;
    run_aggregation(&state, correlation_id, range).await
}

/// Handler for POST /payroll/calculate-month.
async fn calculate_month_handler(
    State(state): State<AppState>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> ApiResult<Json<CalculationResponse>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing month calculation");

    let query = query_params(correlation_id, query)?;
    let range =
        PeriodRange::month(query.year, query.month).map_err(|err| failure(correlation_id, err))?;
    run_aggregation(&state, correlation_id, range).await
}

/// Handler for GET /payroll/employee/:id.
async fn employee_payroll_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<EmployeeId>,
    query: Result<Query<LabelQuery>, QueryRejection>,
) -> ApiResult<Json<EmployeePayroll>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, employee_id, "Fetching employee payroll");

    let query = query_params(correlation_id, query)?;
    let payroll = employee_payroll(state.store(), employee_id, &query.label)
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(Json(payroll))
}

/// Handler for GET /report/summary.
async fn summary_handler(
    State(state): State<AppState>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<Json<ReportSummary>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Building period summary");

    let query = query_params(correlation_id, query)?;
    let range = calendar_range(correlation_id, &query)?;
    let summary = build_summary(state.store(), &range)
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(Json(summary))
}

/// Handler for GET /report/summary-range.
async fn summary_range_handler(
    State(state): State<AppState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<Json<ReportSummary>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Building range summary");

    let query = query_params(correlation_id, query)?;
    let range = reporting_range(correlation_id, query)?;
    let summary = build_summary(state.store(), &range)
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(Json(summary))
}

/// Handler for GET /report/summary.csv.
async fn summary_csv_handler(
    State(state): State<AppState>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Exporting period summary");

    let query = query_params(correlation_id, query)?;
    let range = calendar_range(correlation_id, &query)?;
    let summary = build_summary(state.store(), &range)
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(csv_response(&summary))
}

/// Handler for GET /report/summary-range.csv.
async fn summary_range_csv_handler(
    State(state): State<AppState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Exporting range summary");

    let query = query_params(correlation_id, query)?;
    let range = reporting_range(correlation_id, query)?;
    let summary = build_summary(state.store(), &range)
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(csv_response(&summary))
}

/// Handler for POST /report/send.
async fn send_handler(
    State(state): State<AppState>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<Json<NotificationOutcome>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Sending period notifications");

    let query = query_params(correlation_id, query)?;
    let range = calendar_range(correlation_id, &query)?;
    let summary = build_summary(state.store(), &range)
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(Json(
        send_reports(state.sender(), state.template(), &summary).await,
    ))
}

/// Handler for POST /report/send-range.
async fn send_range_handler(
    State(state): State<AppState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<Json<NotificationOutcome>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Sending range notifications");

    let query = query_params(correlation_id, query)?;
    let range = reporting_range(correlation_id, query)?;
    let summary = build_summary(state.store(), &range)
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(Json(
        send_reports(state.sender(), state.template(), &summary).await,
    ))
}

/// Handler for GET /report/stored.
async fn stored_handler(
    State(state): State<AppState>,
    query: Result<Query<LabelQuery>, QueryRejection>,
) -> ApiResult<Json<StoredSummary>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Listing stored payroll");

    let query = query_params(correlation_id, query)?;
    let summary = stored_summary(state.store(), &query.label)
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(Json(summary))
}

/// Handler for POST /report/send-stored.
async fn send_stored_handler(
    State(state): State<AppState>,
    query: Result<Query<LabelQuery>, QueryRejection>,
) -> ApiResult<Json<NotificationOutcome>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Sending stored payroll notifications");

    let query = query_params(correlation_id, query)?;
    let outcome = send_stored(state.store(), state.sender(), state.template(), &query.label)
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(Json(outcome))
}

/// Handler for GET /report/employee/:id.
async fn employee_detail_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<EmployeeId>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> ApiResult<Json<EmployeePeriodDetail>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, employee_id, "Fetching employee month detail");

    let query = query_params(correlation_id, query)?;
    let range =
        PeriodRange::month(query.year, query.month).map_err(|err| failure(correlation_id, err))?;
    let detail = employee_period_detail(state.store(), employee_id, &range)
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(Json(detail))
}

/// Handler for GET /employees.
async fn list_employees_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<Employee>>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Listing employees");

    let employees = state
        .store()
        .list_employees()
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(Json(employees))
}

/// Handler for POST /employees.
async fn create_employee_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewEmployee>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Creating employee");

    let request = json_body(correlation_id, payload)?;
    let employee = state
        .store()
        .insert_employee(request)
        .await
        .map_err(|err| failure(correlation_id, err))?;

    info!(
        correlation_id = %correlation_id,
        employee_id = employee.id,
        "Employee created"
    );
    Ok((StatusCode::CREATED, Json(employee)))
}

/// Handler for PUT /employees/:id/tag.
async fn assign_tag_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<EmployeeId>,
    payload: Result<Json<AssignTagRequest>, JsonRejection>,
) -> ApiResult<Json<Employee>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, employee_id, "Assigning tag");

    let request = json_body(correlation_id, payload)?;
    let employee = state
        .store()
        .assign_tag(employee_id, &request.tag_id)
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(Json(employee))
}

/// Handler for PUT /employees/:id/ban.
async fn ban_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<EmployeeId>,
    query: Result<Query<BanQuery>, QueryRejection>,
) -> ApiResult<Json<Employee>> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, employee_id, "Updating banned flag");

    let query = query_params(correlation_id, query)?;
    let employee = state
        .store()
        .set_banned(employee_id, query.banned)
        .await
        .map_err(|err| failure(correlation_id, err))?;
    Ok(Json(employee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let config = ConfigLoader::load("./config/default").expect("Failed to load config");
        AppState::in_memory(config).expect("Failed to build state")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn tap_request(tag: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/attendance/tap")
            .header("Content-Type", "application/json")
            .body(Body::from(format!(r#"{{"tag_id": "{}"}}"#, tag)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_tap_known_tag_checks_in() {
        let router = create_router(create_test_state());

        let response = router.oneshot(tap_request("04:A2:19:7F")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["action"], "checkin");
        assert_eq!(json["employee_name"], "Linh Tran");
    }

    #[tokio::test]
    async fn test_tap_unknown_tag_returns_404() {
        let router = create_router(create_test_state());

        let response = router.oneshot(tap_request("FF:FF")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: ApiError = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(error.code, "UNKNOWN_TAG");
    }

    #[tokio::test]
    async fn test_tap_malformed_json_returns_400() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/attendance/tap")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{invalid json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(error.code, "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_tap_missing_field_returns_validation_error() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/attendance/tap")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(error.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_calculate_range_rejects_inverted_range() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/payroll/calculate-range?start=2025-10-31&end=2025-10-01&label=bad")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(error.code, "INVALID_RANGE");
    }

    #[tokio::test]
    async fn test_calculate_month_rejects_month_13() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/payroll/calculate-month?year=2025&month=13")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(error.code, "INVALID_DATE");
    }

    #[tokio::test]
    async fn test_missing_query_parameter_returns_400() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/report/summary-range?start=2025-10-01")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(error.code, "INVALID_QUERY");
    }

    #[tokio::test]
    async fn test_week_summary_uses_week_label() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/report/summary?kind=week&anchor=2025-10-21")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["period"], "2025-W43");
        assert_eq!(json["start"], "2025-10-20T00:00:00Z");
        assert_eq!(json["end"], "2025-10-27T00:00:00Z");
        assert_eq!(json["employee_count"], 0);
    }

    #[tokio::test]
    async fn test_summary_csv_headers() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/report/summary.csv?kind=quarter&anchor=2025-10-01")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            response.headers().get("content-disposition").unwrap(),
            "attachment; filename=\"report_2025-Q4.csv\""
        );
    }

    #[tokio::test]
    async fn test_employee_payroll_not_found() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/payroll/employee/1?label=2025-10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_send_stored_without_payroll_returns_400() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/report/send-stored?label=2025-10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(error.code, "NO_PAYROLL_FOR_PERIOD");
    }

    #[tokio::test]
    async fn test_create_employee_returns_201() {
        let router = create_router(create_test_state());

        let body = r#"{
            "full_name": "Thu Vo",
            "email": "thu.vo@company.com",
            "tag_id": "04:EE:01:10",
            "hourly_rate": "26000"
        }"#;

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/employees")
                    .header("Content-Type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["full_name"], "Thu Vo");
        assert_eq!(json["id"], 5);
    }

    #[tokio::test]
    async fn test_assign_taken_tag_returns_409() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/employees/2/tag")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"tag_id": "04:A2:19:7F"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_ban_unknown_employee_returns_404() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/employees/99/ban?banned=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
