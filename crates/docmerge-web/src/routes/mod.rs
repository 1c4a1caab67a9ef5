//! HTTP route handlers for the document merger.
//!
//! HTML routes return askama fragments for HTMX; downloads return raw bytes.
//! Every handler follows the same shape: snapshot what it needs from the
//! session, do slow work with no lock held, then commit.

mod edit;
mod merge;
mod order;
mod pages;
mod upload;

pub use edit::{apply_edit, edit_panel, revert_edit};
pub use merge::download_merged;
pub use order::{restore_order, update_order};
pub use pages::{index, session_page};
pub use upload::{reset_session, upload_files};

use docmerge_core::{DocumentKind, EntryKey, Error, PageSelection, PdfDocument};
use serde::Deserialize;

use crate::helpers::{CoreResultExt, OptionExt, RouteResult, route_error, spawn_core};
use crate::state::{AppState, SessionRef};
use crate::templates::{EditPanelView, WorkspaceView};

/// Page-deletion form. Checkboxes and the free-text list are combined.
#[derive(Deserialize, Default)]
pub struct EditForm {
    #[serde(default)]
    pub page: Vec<u32>,
    #[serde(default)]
    pub range: Option<String>,
}

impl EditForm {
    /// The selected pages of a document with `total` pages.
    ///
    /// Out-of-range pages fail with [`Error::InvalidPage`] before any range
    /// is expanded.
    pub fn selection(&self, total: usize) -> docmerge_core::Result<PageSelection> {
        let mut selection: PageSelection = self.page.iter().copied().collect();
        selection.validate(total)?;
        if let Some(range) = self.range.as_deref().filter(|r| !r.trim().is_empty()) {
            selection.extend(PageSelection::parse(range, total)?.iter());
        }
        Ok(selection)
    }
}

/// Render the current workspace of a session.
async fn capture_workspace(state: &AppState, session: &SessionRef<'_>) -> RouteResult<WorkspaceView> {
    let id = session.id();
    let conversion = state.conversion_available();
    // Pending errors are shown once
    session
        .with_session_mut(|s| {
            let errors = std::mem::take(&mut s.errors);
            WorkspaceView::capture(&id, &s.workspace, conversion).with_errors(errors)
        })
        .await
        .or_not_found("Session not found")
}

/// Build the edit panel for a PDF entry.
///
/// Page counts come from parsing the original and the active edit, which
/// happens off the runtime. An upload that does not parse still gets a
/// panel, showing the cause instead of the page list.
async fn load_panel(
    session: &SessionRef<'_>,
    key: &EntryKey,
    message: Option<(String, bool)>,
) -> RouteResult<EditPanelView> {
    let (name, original, edited) = session
        .with_session(|s| {
            let workspace = &s.workspace;
            workspace.entry(key).and_then(|entry| {
                if !entry.is_kind(DocumentKind::Pdf) {
                    return Err(Error::UnsupportedFormat(entry.name().to_string()));
                }
                let edited = workspace
                    .overlay()
                    .is_edited(key)
                    .then(|| workspace.overlay().resolve(key, entry.payload()));
                Ok((entry.name().to_string(), entry.payload().clone(), edited))
            })
        })
        .await
        .or_not_found("Session not found")?
        .or_status()?;

    let counted_name = name.clone();
    let counted = spawn_core("Page count", move || {
        let total = PdfDocument::parse(&counted_name, &original)?.page_count();
        let remaining = edited
            .map(|bytes| PdfDocument::parse(&counted_name, &bytes).map(|d| d.page_count()))
            .transpose()?;
        Ok((total, remaining))
    })
    .await?;

    let (total, remaining) = match counted {
        Ok(counts) => counts,
        Err(e) => {
            let (status, cause) = route_error(&e);
            if status.is_server_error() {
                return Err((status, cause));
            }
            return Ok(EditPanelView::unreadable(session.id(), key.to_string(), name, cause));
        }
    };

    let (message, is_error) = message.map_or((None, false), |(m, e)| (Some(m), e));
    Ok(EditPanelView {
        session_id: session.id(),
        key: key.to_string(),
        name,
        pages: (1..=total).collect(),
        edited_pages: remaining,
        message,
        is_error,
        readable: true,
    })
}
