use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::Json,
};
use protomock_engine::MockRequest;
use protomock_models::{
    CreatePrototypeRequest, CreatePrototypeResponse, ErrorEnvelope, ListPrototypesResponse,
    MatchCriteria, MockError, Prototype,
};
use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::AppState;

type ErrorReply = (StatusCode, Json<ErrorEnvelope>);

fn reply_error(e: &MockError) -> ErrorReply {
    (
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(e.to_envelope()),
    )
}

#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_prototype(
    State(state): State<AppState>,
    Json(payload): Json<CreatePrototypeRequest>,
) -> Result<(StatusCode, Json<CreatePrototypeResponse>), ErrorReply> {
    info!("Registering prototype: {}", payload.name);

    let cancel = CancellationToken::new();
    match state
        .store
        .save_or_update(&cancel, payload.into_prototype())
        .await
    {
        Ok(id) => Ok((
            StatusCode::CREATED,
            Json(CreatePrototypeResponse { success: true, id }),
        )),
        Err(e) => {
            error!("Failed to register prototype: {}", e);
            Err(reply_error(&e))
        }
    }
}

#[instrument(skip(state))]
pub async fn list_prototypes(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ListPrototypesResponse>, ErrorReply> {
    let result = if params.is_empty() {
        state.store.find_all().await
    } else {
        let criteria = MatchCriteria {
            url_path: params.get("urlPath").cloned(),
            method: params.get("method").cloned(),
        };
        let offset = params
            .get("offset")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(0);
        let limit = params
            .get("limit")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(0);
        state.store.matching(criteria, offset, limit).await
    };

    match result {
        Ok(prototypes) => Ok(Json(ListPrototypesResponse { prototypes })),
        Err(e) => {
            error!("Failed to list prototypes: {}", e);
            Err(reply_error(&e))
        }
    }
}

#[instrument(skip(state))]
pub async fn get_prototype(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Prototype>, ErrorReply> {
    match state.store.find(&id).await {
        Ok(prototype) => Ok(Json(prototype)),
        Err(e) => {
            error!("Failed to get prototype {}: {}", id, e);
            Err(reply_error(&e))
        }
    }
}

#[instrument(skip(state, updates))]
pub async fn patch_prototype(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(updates): Json<HashMap<String, Value>>,
) -> Result<Json<Prototype>, ErrorReply> {
    info!("Patching prototype: {}", id);

    match state.store.update_fields(&id, updates).await {
        Ok(prototype) => Ok(Json(prototype)),
        Err(e) => {
            error!("Failed to patch prototype {}: {}", id, e);
            Err(reply_error(&e))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_prototype(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ErrorReply> {
    info!("Deleting prototype: {}", id);

    match state.store.delete(&id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete prototype {}: {}", id, e);
            Err(reply_error(&e))
        }
    }
}

#[instrument(skip(state, headers, body), fields(method = %method, path = %path))]
pub async fn serve_mock(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ErrorReply> {
    let mut header_map = HashMap::new();
    for (name, value) in headers.iter() {
        // First value per name wins.
        header_map
            .entry(name.as_str().to_string())
            .or_insert_with(|| value.to_str().unwrap_or_default().to_string());
    }

    let request = MockRequest {
        method: method.to_string(),
        path: format!("/{}", path),
        headers: header_map,
        // Path params arrive through the query map; the route itself is a
        // wildcard with no named segments.
        path_params: query.clone(),
        query,
        body,
    };

    let cancel = CancellationToken::new();
    match state.engine.handle(&cancel, request).await {
        Ok(resolved) => Ok(Json(resolved)),
        Err(e) => Err(reply_error(&e)),
    }
}

#[instrument(skip(_state))]
pub async fn health_check(State(_state): State<AppState>) -> Result<&'static str, StatusCode> {
    Ok("OK")
}
