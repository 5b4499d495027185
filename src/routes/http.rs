// GET handlers: version, health, aggregates and CSV exports

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::AppState;
use crate::error::Error;
use crate::export::{write_diff_csv, write_snapshot_csv};
use crate::models::{Category, QueryOptions};
use crate::version::{NAME, VERSION};

/// Query string shared by the report endpoints. Timestamps are RFC3339.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ReportQuery {
    tag: Option<String>,
    before: Option<String>,
    after: Option<String>,
}

impl ReportQuery {
    fn options(&self) -> Result<QueryOptions, ApiError> {
        Ok(QueryOptions {
            before: parse_time("before", self.before.as_deref())?,
            after: parse_time("after", self.after.as_deref())?,
            tag: self.tag.clone().filter(|t| !t.is_empty()),
            category: None,
        })
    }
}

fn parse_time(name: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match value {
        None | Some("") => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| {
                tracing::info!(param = name, value = s, error = %e, "bad time parameter");
                ApiError::BadRequest(format!("invalid {name} {s:?}: {e}"))
            }),
    }
}

pub(super) enum ApiError {
    BadRequest(String),
    Internal(Error),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidRange | Error::ReservedEntity => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Internal(e) => {
                tracing::warn!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn parse_category(s: &str) -> Result<Category, ApiError> {
    s.parse().map_err(ApiError::BadRequest)
}

fn csv_response(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment;filename={filename}"),
            ),
        ],
        body,
    )
        .into_response()
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

pub(super) async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "pong" }))
}

/// GET /api/v0/proportion: Venus share of Venus + Lotus QAP.
pub(super) async fn proportion_handler(
    State(state): State<AppState>,
    Query(q): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let p = state.stats.proportion(&q.options()?).await?;
    Ok(Json(serde_json::json!({ "proportion": p })))
}

/// GET /api/v0/static/{category}
pub(super) async fn static_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(q): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let opts = q.options()?.category(parse_category(&category)?);
    let info = state.stats.static_info(&opts, false).await?;
    Ok(Json(info))
}

/// GET /api/v0/static/many/{category}: two-hourly series over the last week.
pub(super) async fn static_many_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(q): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = parse_category(&category)?;
    let tag = q.tag.filter(|t| !t.is_empty());
    let series = state
        .stats
        .static_series(category, tag, Utc::now())
        .await?;
    Ok(Json(series))
}

/// GET /api/v0/miners: composite entity views as JSON.
pub(super) async fn entities_handler(
    State(state): State<AppState>,
    Query(q): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entities = state.stats.entities(&q.options()?).await?;
    Ok(Json(entities))
}

pub(super) async fn entities_csv_handler(
    State(state): State<AppState>,
    Query(q): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let entities = state.stats.entities(&q.options()?).await?;
    let body = write_snapshot_csv(&entities).map_err(Error::from)?;
    Ok(csv_response("miners.csv", body))
}

pub(super) async fn diff_csv_handler(
    State(state): State<AppState>,
    Query(q): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let report = state.stats.diff(&q.options()?).await?;
    let body = write_diff_csv(&report).map_err(Error::from)?;
    Ok(csv_response("diff.csv", body))
}

/// GET /api/v0/network: latest network-total power record, or null.
pub(super) async fn network_handler(
    State(state): State<AppState>,
    Query(q): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let power = state.stats.network_power(q.options()?.before).await?;
    Ok(Json(power))
}
