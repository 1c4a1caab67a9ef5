//! Edit routes - deleting pages from PDF entries.

use axum::extract::{Path, State};
use axum_extra::extract::Form;
use docmerge_core::{DocumentKind, EntryKey, Error, PageEdit, PdfDocument, pdf};
use std::sync::Arc;

use super::{EditForm, capture_workspace, load_panel};
use crate::helpers::{CoreResultExt, OptionExt, RouteResult, route_error, spawn_core};
use crate::state::AppState;
use crate::templates::{EditPanelTemplate, WorkspaceTemplate};

/// Page-deletion panel for one PDF entry.
///
/// HTMX: Replaces the contents of `#edit-panel`.
pub async fn edit_panel(
    State(state): State<Arc<AppState>>,
    Path((session_id, key)): Path<(String, String)>,
) -> RouteResult<EditPanelTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let panel = load_panel(&session, &EntryKey::from(key), None).await?;
    Ok(EditPanelTemplate { panel })
}

/// Delete the submitted pages from the original upload.
///
/// Replaces any earlier edit of the same entry. Bad page numbers and
/// unreadable uploads are shown in the panel rather than failing the
/// request; nothing is committed then.
pub async fn apply_edit(
    State(state): State<Arc<AppState>>,
    Path((session_id, key)): Path<(String, String)>,
    Form(form): Form<EditForm>,
) -> RouteResult<WorkspaceTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;
    let key = EntryKey::from(key);

    let (name, original) = session
        .with_session(|s| {
            s.workspace.entry(&key).and_then(|entry| {
                if entry.is_kind(DocumentKind::Pdf) {
                    Ok((entry.name().to_string(), entry.payload().clone()))
                } else {
                    Err(Error::UnsupportedFormat(entry.name().to_string()))
                }
            })
        })
        .await
        .or_not_found("Session not found")?
        .or_status()?;

    // The page list is only checked once the page count is known
    let outcome = spawn_core("Page deletion", move || {
        let doc = PdfDocument::parse(&name, &original)?;
        let selection = form.selection(doc.page_count())?;
        pdf::delete_parsed_pages(doc, &selection)
    })
    .await?;

    let message = match outcome {
        Ok(edit) => {
            let summary = match &edit {
                PageEdit::Passthrough => "No pages selected; every page is kept".to_string(),
                PageEdit::Rewritten { pages, .. } => format!("Edit applied: {pages} pages remain"),
            };
            // The entry may have vanished while the edit ran; apply_page_edit checks
            session
                .with_session_mut(|s| s.workspace.apply_page_edit(&key, edit))
                .await
                .or_not_found("Session not found")?
                .or_status()?;
            (summary, false)
        }
        Err(e) => {
            let (status, message) = route_error(&e);
            if status.is_server_error() {
                return Err((status, message));
            }
            (message, true)
        }
    };

    let panel = load_panel(&session, &key, Some(message)).await?;
    let view = capture_workspace(&state, &session).await?.with_panel(panel);
    Ok(WorkspaceTemplate { view })
}

/// Discard the edit of an entry, restoring its original pages.
pub async fn revert_edit(
    State(state): State<Arc<AppState>>,
    Path((session_id, key)): Path<(String, String)>,
) -> RouteResult<WorkspaceTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;
    let key = EntryKey::from(key);

    let reverted = session
        .with_session_mut(|s| s.workspace.revert_edit(&key))
        .await
        .or_not_found("Session not found")?
        .or_status()?;

    let message = if reverted {
        "All pages restored"
    } else {
        "Nothing to restore"
    };
    let panel = load_panel(&session, &key, Some((message.to_string(), false))).await?;
    let view = capture_workspace(&state, &session).await?.with_panel(panel);
    Ok(WorkspaceTemplate { view })
}
