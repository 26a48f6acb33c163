use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::api::AppState;
use crate::api::response::ApiError;
use crate::convert::Conversion;
use crate::core::validate::{parse_amount, validate_code};

/// Raw query of `GET /convert`. Missing parameters are validated as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConvertQuery {
    pub from: String,
    pub to: String,
    pub amount: String,
}

pub async fn convert(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
) -> Result<Json<Conversion>, ApiError> {
    let from = validate_code(&query.from)?;
    let to = validate_code(&query.to)?;
    let amount = parse_amount(&query.amount)?;

    let conversion = state
        .converter
        .convert(&state.call_context(), &from, &to, amount)
        .await?;
    Ok(Json(conversion))
}
