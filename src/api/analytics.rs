use crate::client::{prepare_records, UsageQuery};
use crate::dashboard::{build_dashboard, DashboardCharts, Granularity, QueryWindow};
use crate::errors::AppError;
use crate::models::usage::UsageRecord;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ChartsRequest {
    #[serde(default)]
    pub records: Option<Vec<UsageRecord>>,
    pub granularity: Option<Granularity>,
    pub start_timestamp: Option<i64>,
    pub end_timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ChartsQuery {
    pub username: Option<String>,
    pub start_timestamp: Option<i64>,
    pub end_timestamp: Option<i64>,
    pub default_time: Option<Granularity>,
    #[serde(default)]
    pub self_only: bool,
}

fn check_window(start: Option<i64>, end: Option<i64>) -> Result<(), AppError> {
    match (start, end) {
        (Some(s), Some(e)) if s > e => Err(AppError::BadRequest(format!(
            "start_timestamp ({}) is after end_timestamp ({})",
            s, e
        ))),
        _ => Ok(()),
    }
}

/// POST /api/v1/dashboard/charts: run the pipeline over records supplied
/// in the body
pub async fn build_dashboard_charts(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChartsRequest>,
) -> Result<Json<DashboardCharts>, AppError> {
    check_window(req.start_timestamp, req.end_timestamp)?;

    let window = match (req.start_timestamp, req.end_timestamp) {
        (Some(start), Some(end)) => Some(QueryWindow { start, end }),
        _ => None,
    };

    let now = chrono::Utc::now().timestamp();
    let records = prepare_records(req.records.unwrap_or_default(), now);
    let ctx = state.config.context(req.granularity, window);

    Ok(Json(build_dashboard(&records, &ctx)))
}

/// GET /api/v1/dashboard/charts: fetch usage from the backend and chart it
pub async fn get_dashboard_charts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChartsQuery>,
) -> Result<Json<DashboardCharts>, AppError> {
    let granularity = params.default_time.unwrap_or(state.config.default_time);
    let now = chrono::Utc::now().timestamp();
    let window = QueryWindow::resolve(params.start_timestamp, params.end_timestamp, granularity, now);
    check_window(Some(window.start), Some(window.end))?;

    let query = UsageQuery {
        username: params.username,
        start_timestamp: window.start,
        end_timestamp: window.end,
        granularity,
        self_only: params.self_only,
    };
    let records = state.backend.fetch_usage(&query, now).await?;
    let ctx = state.config.context(Some(granularity), Some(window));

    Ok(Json(build_dashboard(&records, &ctx)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_window() {
        assert!(check_window(Some(1), Some(2)).is_ok());
        assert!(check_window(Some(2), Some(2)).is_ok());
        assert!(check_window(Some(3), None).is_ok());
        assert!(matches!(check_window(Some(3), Some(2)), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_request_body_defaults() {
        let req: ChartsRequest = serde_json::from_str("{}").unwrap();
        assert!(req.records.is_none());
        assert!(req.granularity.is_none());

        let req: ChartsRequest =
            serde_json::from_str(r#"{"granularity":"week","records":[{"model_name":"m"}]}"#).unwrap();
        assert_eq!(req.granularity, Some(Granularity::Week));
        assert_eq!(req.records.unwrap()[0].model_name, "m");
    }
}
