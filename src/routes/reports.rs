use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult, get_trace_id};
use crate::reports::{self, AnalysisId, DateRange, ReportTable};

#[derive(Debug, Deserialize)]
pub struct RunReportBody {
    pub analysis: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Result envelope consumed by the dashboard frontend: the table plus the
/// request context it was produced under.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub id: Uuid,
    pub analysis: AnalysisId,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub row_count: usize,
    pub duration_ms: u64,
    pub trace_id: Option<String>,
    pub table: ReportTable,
}

pub async fn create_report(
    State(state): State<AppState>,
    Json(body): Json<RunReportBody>,
) -> AppResult<Json<ReportResponse>> {
    let analysis: AnalysisId = body.analysis.parse()?;
    let range = parse_range(body.start_date.as_deref(), body.end_date.as_deref())?;

    run_report(&state, analysis, range).await
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(analysis): Path<String>,
    Query(query): Query<RunReportQuery>,
) -> AppResult<Json<ReportResponse>> {
    let analysis: AnalysisId = analysis.parse()?;
    let range = parse_range(query.start_date.as_deref(), query.end_date.as_deref())?;

    run_report(&state, analysis, range).await
}

async fn run_report(
    state: &AppState,
    analysis: AnalysisId,
    range: Option<DateRange>,
) -> AppResult<Json<ReportResponse>> {
    let started = std::time::Instant::now();

    let table = reports::run(&state.registry, state.executor.as_ref(), analysis, range).await?;

    Ok(Json(ReportResponse {
        id: Uuid::new_v4(),
        analysis,
        start_date: range.map(|r| r.start),
        end_date: range.map(|r| r.end),
        row_count: table.row_count(),
        duration_ms: started.elapsed().as_millis() as u64,
        trace_id: get_trace_id(),
        table,
    }))
}

/// Both dates or neither; shape problems are caught here, ordering is the
/// dispatcher's concern.
fn parse_range(start: Option<&str>, end: Option<&str>) -> AppResult<Option<DateRange>> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => {
            let start = parse_date("start_date", start)?;
            let end = parse_date("end_date", end)?;
            Ok(Some(DateRange::new(start, end)))
        }
        _ => Err(AppError::Validation(
            "start_date and end_date must be supplied together".to_string(),
        )),
    }
}

fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid {field} format, use YYYY-MM-DD")))
}
