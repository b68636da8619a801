//! Network fee quote endpoint

use axum::{extract::State, Json};
use paygate_types::FeeBreakdown;

use crate::{state::AppState, ApiResult};

/// GET /api/v1/fees/recommended - Current fee quote for a typical
/// settlement transaction
pub async fn get_recommended(State(state): State<AppState>) -> ApiResult<Json<FeeBreakdown>> {
    let quote = state.workflow.recommended_fee_quote().await?;
    Ok(Json(quote))
}
