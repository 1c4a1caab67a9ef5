//! Page routes - full HTML page renders.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use std::sync::Arc;

use super::capture_workspace;
use crate::helpers::RouteResult;
use crate::state::AppState;
use crate::templates::AppTemplate;

/// Landing page: every visit starts a fresh, empty session.
pub async fn index(State(state): State<Arc<AppState>>) -> Redirect {
    let session_id = state.create_session().await;
    Redirect::to(&format!("/session/{session_id}"))
}

/// Full session page.
///
/// Unknown or expired sessions send the browser back to `/` for a new one.
pub async fn session_page(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<Response> {
    let Some(session) = state.get_session(&session_id).await else {
        return Ok(Redirect::to("/").into_response());
    };

    let view = capture_workspace(&state, &session).await?;
    Ok(AppTemplate {
        view,
        max_upload_mb: state.config.max_upload_mb,
    }
    .into_response())
}
