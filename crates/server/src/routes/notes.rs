use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use tracing::instrument;
use utils::{
    api::notes::{ListNotesResponse, NoteRequest, NoteResponse},
    response::ApiResponse,
};

use super::error::{ErrorResponse, storage_error};
use crate::{
    AppState,
    auth::RequestContext,
    db::notes::{Note, NoteInput},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/{note_id}", put(update_note).delete(delete_note))
}

#[instrument(
    name = "notes.list_notes",
    skip(state, ctx),
    fields(subject = %ctx.identity.subject())
)]
async fn list_notes(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ApiResponse<ListNotesResponse>>, ErrorResponse> {
    let notes = state
        .notes()
        .list_for_owner(ctx.identity.subject())
        .await
        .map_err(|error| storage_error(error, "list notes"))?;

    Ok(Json(ApiResponse::success(ListNotesResponse {
        notes: notes.into_iter().map(note_response).collect(),
    })))
}

#[instrument(
    name = "notes.create_note",
    skip(state, ctx, payload),
    fields(subject = %ctx.identity.subject())
)]
async fn create_note(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<NoteRequest>,
) -> Result<Json<ApiResponse<NoteResponse>>, ErrorResponse> {
    let input = note_input(&payload)?;

    let note = state
        .notes()
        .create(ctx.identity.subject(), input)
        .await
        .map_err(|error| storage_error(error, "create note"))?;

    tracing::info!(note_id = note.id, "note created");
    Ok(Json(ApiResponse::success_with_message(
        note_response(note),
        "ok",
    )))
}

#[instrument(
    name = "notes.update_note",
    skip(state, ctx, payload),
    fields(subject = %ctx.identity.subject())
)]
async fn update_note(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(note_id): Path<i64>,
    Json(payload): Json<NoteRequest>,
) -> Result<Json<ApiResponse<NoteResponse>>, ErrorResponse> {
    let input = note_input(&payload)?;
    ensure_owner(&state, note_id, ctx.identity.subject()).await?;

    // The row can vanish between the ownership check and the write.
    let note = state
        .notes()
        .update_owned(note_id, ctx.identity.subject(), input)
        .await
        .map_err(|error| storage_error(error, "update note"))?
        .ok_or_else(not_found)?;

    Ok(Json(ApiResponse::success_with_message(
        note_response(note),
        "ok",
    )))
}

#[instrument(
    name = "notes.delete_note",
    skip(state, ctx),
    fields(subject = %ctx.identity.subject())
)]
async fn delete_note(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(note_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ErrorResponse> {
    ensure_owner(&state, note_id, ctx.identity.subject()).await?;

    let deleted = state
        .notes()
        .delete_owned(note_id, ctx.identity.subject())
        .await
        .map_err(|error| storage_error(error, "delete note"))?;

    if !deleted {
        return Err(not_found());
    }

    tracing::info!(note_id, "note deleted");
    Ok(Json(ApiResponse::success_with_message((), "ok")))
}

/// 404 when the note does not exist, 403 when someone else owns it.
async fn ensure_owner(
    state: &AppState,
    note_id: i64,
    subject: &str,
) -> Result<(), ErrorResponse> {
    let note = state
        .notes()
        .find(note_id)
        .await
        .map_err(|error| storage_error(error, "load note"))?
        .ok_or_else(not_found)?;

    if note.user_id != subject {
        return Err(ErrorResponse::new(StatusCode::FORBIDDEN, "Forbidden"));
    }

    Ok(())
}

fn note_input(payload: &NoteRequest) -> Result<NoteInput<'_>, ErrorResponse> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ErrorResponse::new(StatusCode::BAD_REQUEST, "Title is required"));
    }

    Ok(NoteInput {
        title,
        content: &payload.content,
    })
}

fn not_found() -> ErrorResponse {
    ErrorResponse::new(StatusCode::NOT_FOUND, "Note not found")
}

fn note_response(note: Note) -> NoteResponse {
    NoteResponse {
        id: note.id,
        title: note.title,
        content: note.content,
        created_at: note.created_at,
        updated_at: note.updated_at,
    }
}
