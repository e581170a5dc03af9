use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use url::Url;

use crate::import::{ContactSource, HttpSource};
use crate::repository::{ImportError, MutationError};
use crate::store::ContactStore;

use super::{
    models::{
        ContactBody, ContactsResponse, ErrorResponse, HealthResponse, ImportRequest,
        ImportResponse, ListParams, MutationResponse,
    },
    AppState,
};

pub async fn health<S, F>(State(state): State<AppState<S, F>>) -> impl IntoResponse
where
    S: ContactStore + Send + Sync + 'static,
    F: ContactSource + Send + Sync + 'static,
{
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            uptime_secs,
        }),
    )
}

pub async fn list_contacts<S, F>(
    State(state): State<AppState<S, F>>,
    Query(params): Query<ListParams>,
) -> Response
where
    S: ContactStore + Send + Sync + 'static,
    F: ContactSource + Send + Sync + 'static,
{
    let repo = &state.repository;
    if let Some(q) = params.q {
        repo.set_query(q);
    }
    if let Some(favorites_only) = params.favorites_only {
        repo.set_favorites_only(favorites_only);
    }

    match repo.list() {
        Ok(_) => Json(ContactsResponse {
            contacts: repo.visible().into_iter().map(Into::into).collect(),
            query: repo.query(),
            favorites_only: repo.favorites_only(),
        })
        .into_response(),
        Err(err) => {
            log::error!("Failed to load contacts: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

pub async fn add_contact<S, F>(
    State(state): State<AppState<S, F>>,
    Json(body): Json<ContactBody>,
) -> Response
where
    S: ContactStore + Send + Sync + 'static,
    F: ContactSource + Send + Sync + 'static,
{
    let result = state
        .repository
        .add(&body.name, body.phone.as_deref(), body.email.as_deref());
    mutation_response(result, StatusCode::CREATED)
}

pub async fn update_contact<S, F>(
    State(state): State<AppState<S, F>>,
    Path(id): Path<i64>,
    Json(body): Json<ContactBody>,
) -> Response
where
    S: ContactStore + Send + Sync + 'static,
    F: ContactSource + Send + Sync + 'static,
{
    let result =
        state
            .repository
            .update(id, &body.name, body.phone.as_deref(), body.email.as_deref());
    mutation_response(result, StatusCode::OK)
}

pub async fn delete_contact<S, F>(
    State(state): State<AppState<S, F>>,
    Path(id): Path<i64>,
) -> Response
where
    S: ContactStore + Send + Sync + 'static,
    F: ContactSource + Send + Sync + 'static,
{
    mutation_response(state.repository.delete(id), StatusCode::OK)
}

pub async fn toggle_favorite<S, F>(
    State(state): State<AppState<S, F>>,
    Path(id): Path<i64>,
) -> Response
where
    S: ContactStore + Send + Sync + 'static,
    F: ContactSource + Send + Sync + 'static,
{
    // toggles are computed from the snapshot the caller last saw
    let Some(contact) = state.repository.find(id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    mutation_response(state.repository.toggle_favorite(&contact), StatusCode::OK)
}

pub async fn run_import<S, F>(
    State(state): State<AppState<S, F>>,
    body: Option<Json<ImportRequest>>,
) -> Response
where
    S: ContactStore + Send + Sync + 'static,
    F: ContactSource + Send + Sync + 'static,
{
    let result = match body.and_then(|Json(b)| b.url) {
        Some(raw) => match Url::parse(&raw) {
            Ok(url) => state.repository.import(&HttpSource::new(url)).await,
            Err(err) => {
                log::warn!("Invalid import url {raw}: {err}");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        message: format!("invalid url: {err}"),
                    }),
                )
                    .into_response();
            }
        },
        None => state.repository.import(state.source.as_ref()).await,
    };

    match result {
        Ok(imported) => Json(ImportResponse {
            imported,
            refresh_error: None,
        })
        .into_response(),
        Err(ImportError::Busy) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                message: "an import is already running".to_string(),
            }),
        )
            .into_response(),
        Err(err @ ImportError::Fetch(_)) => {
            log::error!("Import fetch failed: {err}");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    message: err.to_string(),
                }),
            )
                .into_response()
        }
        Err(err @ ImportError::Store { .. }) => {
            log::error!("Import failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: err.to_string(),
                }),
            )
                .into_response()
        }
        Err(ImportError::Refresh { inserted, source }) => {
            log::warn!("Imported {inserted} contacts, but reload failed: {source}");
            Json(ImportResponse {
                imported: inserted,
                refresh_error: Some(source.to_string()),
            })
            .into_response()
        }
    }
}

pub async fn not_found() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}

fn mutation_response(result: Result<(), MutationError>, ok_status: StatusCode) -> Response {
    match result {
        Ok(()) => (ok_status, Json(MutationResponse { refresh_error: None })).into_response(),
        Err(MutationError::EmptyName) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                message: "contact name must not be empty".to_string(),
            }),
        )
            .into_response(),
        Err(err @ MutationError::Write(_)) => {
            log::error!("Contact write failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: err.to_string(),
                }),
            )
                .into_response()
        }
        Err(MutationError::Refresh(err)) => {
            log::warn!("Change saved, but reload failed: {err}");
            (
                ok_status,
                Json(MutationResponse {
                    refresh_error: Some(err.to_string()),
                }),
            )
                .into_response()
        }
    }
}
