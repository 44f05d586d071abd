use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use parcel_services::validation::RULE_FORMAT;
use parcel_services::{FieldViolation, NewProperty, PropertyError, PropertyFilter, PropertyRecord, SortDirection};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::AppState;

/// Query string for `GET /properties`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub sort: Option<String>,
}

impl ListQuery {
    fn into_parts(self) -> Result<(PropertyFilter, Option<SortDirection>), PropertyError> {
        let sort = match self.sort.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(SortDirection::parse(raw).ok_or_else(|| {
                PropertyError::ValidationFailed(vec![FieldViolation::new(
                    "sort",
                    RULE_FORMAT,
                    "Sort must be 'asc' or 'desc'",
                )])
            })?),
        };
        let filter = PropertyFilter {
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
        };
        Ok((filter, sort))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/properties", get(list_properties).post(create_property))
        .route("/properties/{id}", get(get_property).delete(delete_property))
}

async fn create_property(
    State(state): State<AppState>,
    body: Result<Json<NewProperty>, JsonRejection>,
) -> Result<(StatusCode, Json<PropertyRecord>), ApiError> {
    let Json(input) = body.map_err(|rejection| {
        let error = PropertyError::ValidationFailed(vec![FieldViolation::new(
            "body",
            RULE_FORMAT,
            rejection.body_text(),
        )]);
        ApiError::logged("create_property", None, error)
    })?;

    let record = state
        .service
        .create(input)
        .await
        .map_err(|e| ApiError::logged("create_property", None, e))?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_properties(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PropertyRecord>>, ApiError> {
    let (filter, sort) = query
        .into_parts()
        .map_err(|e| ApiError::logged("list_properties", None, e))?;

    let records = state
        .service
        .list(filter, sort)
        .await
        .map_err(|e| ApiError::logged("list_properties", None, e))?;
    Ok(Json(records))
}

async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PropertyRecord>, ApiError> {
    let record = state
        .service
        .get_by_id(&id)
        .await
        .map_err(|e| ApiError::logged("get_property", Some(&id), e))?;
    Ok(Json(record))
}

async fn delete_property(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let success = state
        .service
        .delete_by_id(&id)
        .await
        .map_err(|e| ApiError::logged("delete_property", Some(&id), e))?;
    Ok(Json(json!({ "success": success })))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.service.health().await {
        (StatusCode::OK, Json(json!({ "status": "ok", "database": "reachable" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "unreachable" })),
        )
    }
}
