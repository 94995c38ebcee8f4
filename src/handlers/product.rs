// src/handlers/product.rs
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Query, State,
    },
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::dtos::product::{CreatedResponse, DeletedResponse, IdParams, InventorySummary, UpdatedResponse};
use crate::error::AppError;
use crate::models::product::{Document, Product};
use crate::state::AppState;

// Largest request body `/api` reads; larger bodies surface as an operation error
pub const API_BODY_LIMIT: usize = 2 * 1024 * 1024;

// What a request to `/api` asks for, derived from its method alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
    Unsupported,
}

impl From<&Method> for Operation {
    fn from(method: &Method) -> Self {
        match *method {
            Method::GET => Operation::List,
            Method::POST => Operation::Create,
            Method::PUT => Operation::Update,
            Method::DELETE => Operation::Delete,
            _ => Operation::Unsupported,
        }
    }
}

// ANY /api - list, create, update (?id=) or delete (?id=) products
// Query and body rejections are resolved in `dispatch`, only where the operation reads them.
#[instrument(skip(state, params, body))]
pub async fn handle_products(
    State(state): State<AppState>,
    method: Method,
    params: Result<Query<IdParams>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match dispatch(&state, Operation::from(&method), params, body).await {
        Ok(response) => response,
        Err(e) => forget_broken_connection(&state, e).await.into_response(),
    }
}

async fn dispatch(
    state: &AppState,
    operation: Operation,
    params: Result<Query<IdParams>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let store = state.connections.acquire().await?;

    match operation {
        Operation::List => {
            let products = store.find_all().await?;
            Ok(Json(products).into_response())
        }
        Operation::Create => {
            let product = parse_document(body)?;
            let id = store.insert_one(product).await?;
            info!(%id, "Product created");

            Ok((
                StatusCode::CREATED,
                Json(CreatedResponse {
                    message: "Product created".to_string(),
                    id,
                }),
            )
                .into_response())
        }
        Operation::Update => {
            let id = require_id(&params)?;
            let fields = parse_document(body)?;
            let modified_count = store.update_one(id, fields).await?;
            info!(%id, modified_count, "Product updated");

            Ok(Json(UpdatedResponse {
                message: "Product updated".to_string(),
                modified_count,
            })
            .into_response())
        }
        Operation::Delete => {
            let id = require_id(&params)?;
            let deleted_count = store.delete_one(id).await?;
            info!(%id, deleted_count, "Product deleted");

            Ok(Json(DeletedResponse {
                message: "Product deleted".to_string(),
                deleted_count,
            })
            .into_response())
        }
        Operation::Unsupported => Ok(method_not_allowed()),
    }
}

// GET /api/summary - totals the browser page shows under the table
#[instrument(skip(state))]
pub async fn inventory_summary(State(state): State<AppState>) -> Result<Json<InventorySummary>, AppError> {
    match summarize(&state).await {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => Err(forget_broken_connection(&state, e).await),
    }
}

async fn summarize(state: &AppState) -> Result<InventorySummary, AppError> {
    let store = state.connections.acquire().await?;
    let products = store.find_all().await?;
    Ok(products.into_iter().map(Product::from_document).collect())
}

// A connection failure mid-request is not repaired; the next request reconnects
async fn forget_broken_connection(state: &AppState, e: AppError) -> AppError {
    if e.is_connection() {
        state.connections.invalidate().await;
    }
    e
}

fn require_id(params: &Result<Query<IdParams>, QueryRejection>) -> Result<&str, AppError> {
    let Query(params) = params
        .as_ref()
        .map_err(|rejection| AppError::validation(rejection.body_text()))?;
    params
        .id()
        .ok_or_else(|| AppError::validation("Missing required query parameter 'id'"))
}

fn parse_document(body: Result<Bytes, BytesRejection>) -> Result<Document, AppError> {
    let body = body.map_err(|rejection| {
        AppError::operation(format!("Failed to read request body: {}", rejection.body_text()))
    })?;
    match serde_json::from_slice::<Value>(&body)? {
        Value::Object(doc) => Ok(doc),
        _ => Err(AppError::operation("Request body must be a JSON object")),
    }
}

fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, POST, PUT, DELETE")],
        "Method not allowed",
    )
        .into_response()
}
