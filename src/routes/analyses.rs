use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;
use crate::reports::AnalysisId;

/// One entry of the dashboard's analysis selector.
#[derive(Debug, Serialize)]
pub struct AnalysisDescriptor {
    pub id: AnalysisId,
    pub title: &'static str,
    pub time_scoped: bool,
}

pub async fn list_analyses(State(state): State<AppState>) -> Json<Vec<AnalysisDescriptor>> {
    let analyses = state
        .registry
        .iter()
        .map(|(id, def)| AnalysisDescriptor {
            id,
            title: id.title(),
            time_scoped: def.requires_date_range(),
        })
        .collect();

    Json(analyses)
}
