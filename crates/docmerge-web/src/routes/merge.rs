//! Download routes - merged documents.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use docmerge_core::MergeTarget;
use std::sync::Arc;
use tracing::info;

use crate::helpers::{OptionExt, ResultExt, RouteResult, route_error, spawn_core};
use crate::state::AppState;

/// Merge the selected entries into one download.
///
/// `target` is `pdf`, `word` or `combined`. A target with nothing to merge
/// answers 204 No Content, which leaves the browser on the page. Any other
/// failure is queued on the session and the browser is sent back to the
/// session page, where it shows up above the entry list.
pub async fn download_merged(
    State(state): State<Arc<AppState>>,
    Path((session_id, target)): Path<(String, String)>,
) -> RouteResult<Response> {
    let target = MergeTarget::from_slug(&target)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown merge target {target}")))?;

    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    // Snapshot inside lock (cheap: payloads are reference-counted)
    let plan = session
        .with_session(|s| s.workspace.plan(target))
        .await
        .or_not_found("Session not found")?;

    let merged = match plan.convert_words(state.converter.as_deref()).await {
        Ok(plan) => spawn_core("Merge", move || plan.build()).await?,
        Err(e) => Err(e),
    };

    let artifact = match merged {
        Ok(artifact) => artifact,
        Err(e) if e.is_benign() => {
            info!("Session {}: {}", session_id, e);
            return Response::builder()
                .status(StatusCode::NO_CONTENT)
                .body(Body::empty())
                .or_internal_error();
        }
        Err(e) => {
            let (_, message) = route_error(&e);
            session
                .with_session_mut(|s| s.errors.push(message))
                .await
                .or_not_found("Session not found")?;
            return Ok(Redirect::to(&format!("/session/{session_id}")).into_response());
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, artifact.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.file_name),
        )
        .body(Body::from(artifact.bytes))
        .or_internal_error()
}
