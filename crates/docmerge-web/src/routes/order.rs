//! Ordering routes - merge order and inclusion.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use docmerge_core::{EntryKey, Move};
use std::sync::Arc;
use tracing::debug;

use super::capture_workspace;
use crate::helpers::{CoreResultExt, OptionExt, RouteResult};
use crate::state::AppState;
use crate::templates::WorkspaceTemplate;

/// Move an entry up or down, or toggle whether it takes part in merges.
pub async fn update_order(
    State(state): State<Arc<AppState>>,
    Path((session_id, key, action)): Path<(String, String, String)>,
) -> RouteResult<WorkspaceTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;
    let key = EntryKey::from(key);

    let changed = session
        .with_session_mut(|s| match action.as_str() {
            "up" => s.workspace.shift(&key, Move::Up).map(Some),
            "down" => s.workspace.shift(&key, Move::Down).map(Some),
            "toggle" => s.workspace.toggle(&key).map(|_| Some(true)),
            _ => Ok(None),
        })
        .await
        .or_not_found("Session not found")?
        .or_status()?
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Unknown action {action}")))?;
    debug!("Order {} on {}: changed={}", action, key, changed);

    let view = capture_workspace(&state, &session).await?;
    Ok(WorkspaceTemplate { view })
}

/// Back to upload order with every entry included.
pub async fn restore_order(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<WorkspaceTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;
    session
        .with_session_mut(|s| s.workspace.restore_default_order())
        .await
        .or_not_found("Session not found")?;

    let view = capture_workspace(&state, &session).await?;
    Ok(WorkspaceTemplate { view })
}
