//! Admin endpoints for currency records.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::response::{ApiError, MessageResponse};
use crate::core::currency::Currency;
use crate::core::error::ValidationError;
use crate::core::validate::{parse_rate, validate_code};

/// A rate as sent by clients: either a JSON number or a decimal string,
/// possibly with a comma separator.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RateInput {
    Number(f64),
    Text(String),
}

impl RateInput {
    fn parse(input: Option<&RateInput>) -> Result<f64, ValidationError> {
        match input {
            Some(RateInput::Number(n)) => parse_rate(&n.to_string()),
            Some(RateInput::Text(s)) => parse_rate(s),
            None => Err(ValidationError::InvalidRate("missing rate_to_usd".to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCurrencyRequest {
    #[serde(default)]
    pub code: String,
    pub rate_to_usd: Option<RateInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCurrencyRequest {
    pub rate_to_usd: Option<RateInput>,
    pub updated_by: Option<Uuid>,
}

pub async fn add_currency(
    State(state): State<AppState>,
    body: Result<Json<AddCurrencyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(request) = body?;
    let code = validate_code(&request.code)?;
    let rate = RateInput::parse(request.rate_to_usd.as_ref())?;

    state
        .admin
        .add(&state.call_context(), Currency::new(code, rate))
        .await?;

    Ok((
        StatusCode::CREATED,
        MessageResponse::new("currency added successfully"),
    ))
}

pub async fn update_currency(
    State(state): State<AppState>,
    Path(code): Path<String>,
    body: Result<Json<UpdateCurrencyRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let code = validate_code(&code)?;
    let Json(request) = body?;
    let rate = RateInput::parse(request.rate_to_usd.as_ref())?;

    state
        .admin
        .update(&state.call_context(), &code, rate, request.updated_by)
        .await?;

    Ok(MessageResponse::new("currency updated successfully"))
}

pub async fn remove_currency(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let code = validate_code(&code)?;
    state.admin.remove(&state.call_context(), &code).await?;
    Ok(MessageResponse::new("currency removed successfully"))
}
