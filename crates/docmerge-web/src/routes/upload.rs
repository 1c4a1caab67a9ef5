//! Upload routes - reconciling the upload set and resetting a session.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use docmerge_core::Upload;
use std::sync::Arc;
use tracing::{debug, info};

use super::capture_workspace;
use crate::helpers::{OptionExt, ResultExt, RouteResult};
use crate::state::AppState;
use crate::templates::WorkspaceTemplate;

/// Receive the complete current upload set.
///
/// Every `files` field is one file currently in the upload widget. A set
/// with no files clears the session. HTMX requests get the workspace
/// fragment back; plain form posts are redirected to the session page.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        if field.name() != Some("files") {
            continue;
        }
        // An empty file input still submits one nameless part
        let Some(filename) = field.file_name().filter(|n| !n.is_empty()).map(str::to_string)
        else {
            continue;
        };
        let data = field.bytes().await.or_bad_request()?;
        debug!("Received {} ({} bytes)", filename, data.len());
        uploads.push(Upload::new(filename, data));
    }

    let count = uploads.len();
    let outcome = session
        .with_session_mut(|s| s.workspace.reconcile(uploads))
        .await
        .or_not_found("Session not found")?;
    info!(
        "Session {}: {} files uploaded, {:?}",
        session_id, count, outcome.reconciliation
    );

    if headers.get("HX-Request").is_none() {
        // Standard HTTP redirect for non-JS clients (303 See Other for POST-Redirect-GET)
        return Response::builder()
            .status(StatusCode::SEE_OTHER)
            .header(header::LOCATION, format!("/session/{session_id}"))
            .body(Body::empty())
            .or_internal_error();
    }

    let notices = outcome
        .skipped
        .iter()
        .map(|name| format!("Skipped {name}: only PDF and Word (.docx) files can be merged"))
        .collect();
    let view = capture_workspace(&state, &session).await?.with_notices(notices);
    Ok(WorkspaceTemplate { view }.into_response())
}

/// Forget every file, edit and ordering decision.
///
/// Sends the browser back to the session page so the file input is cleared
/// too (HX-Redirect for HTMX, 303 otherwise).
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;
    session
        .with_session_mut(|s| s.workspace.reset())
        .await
        .or_not_found("Session not found")?;

    let redirect_url = format!("/session/{session_id}");
    if headers.get("HX-Request").is_some() {
        // HX-Redirect tells HTMX to do a full page navigation
        Response::builder()
            .status(StatusCode::OK)
            .header("HX-Redirect", redirect_url)
            .body(Body::empty())
            .or_internal_error()
    } else {
        Response::builder()
            .status(StatusCode::SEE_OTHER)
            .header(header::LOCATION, redirect_url)
            .body(Body::empty())
            .or_internal_error()
    }
}
