//! Askama templates for HTMX responses.
//!
//! ## Template Structure
//!
//! - `base.html` - Common layout with CSS/JS
//! - `app.html` - The whole session page: upload form plus workspace
//! - `partials/workspace.html` - Entry list, merge buttons, notices; the
//!   target of every upload, ordering and edit request
//! - `partials/edit_panel.html` - Page-deletion form for one PDF entry
//!
//! Templates only see the view structs below, never the session itself,
//! so rendering never needs a lock.

use askama::Template;
use askama_web::WebTemplate;
use docmerge_core::util::format_size;
use docmerge_core::{DocumentKind, DocumentSession, MergeTarget};

// =============================================================================
// View Models
// =============================================================================

/// One row of the entry list.
pub struct EntryView {
    pub key: String,
    pub name: String,
    /// "PDF" or "Word"
    pub kind: String,
    pub is_pdf: bool,
    pub size: String,
    pub included: bool,
    pub edited: bool,
}

/// Page-deletion panel for one PDF entry.
pub struct EditPanelView {
    pub session_id: String,
    pub key: String,
    pub name: String,
    /// 1-based page numbers of the original upload
    pub pages: Vec<usize>,
    /// Page count after the active edit, if there is one
    pub edited_pages: Option<usize>,
    pub message: Option<String>,
    pub is_error: bool,
    /// False when the upload could not be parsed; `message` holds the cause
    pub readable: bool,
}

impl EditPanelView {
    /// Panel for an upload that does not parse as a PDF.
    pub fn unreadable(session_id: String, key: String, name: String, cause: String) -> Self {
        Self {
            session_id,
            key,
            name,
            pages: Vec::new(),
            edited_pages: None,
            message: Some(cause),
            is_error: true,
            readable: false,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Everything the workspace fragment shows.
pub struct WorkspaceView {
    pub session_id: String,
    pub entries: Vec<EntryView>,
    pub has_pdf: bool,
    pub has_word: bool,
    pub can_merge_pdf: bool,
    pub can_merge_word: bool,
    pub can_merge_combined: bool,
    pub conversion_available: bool,
    pub notices: Vec<String>,
    pub errors: Vec<String>,
    pub panel: Option<EditPanelView>,
}

impl WorkspaceView {
    /// Snapshot a session for rendering.
    pub fn capture(session_id: &str, workspace: &DocumentSession, conversion_available: bool) -> Self {
        let overlay = workspace.overlay();
        let ordering = workspace.ordering();

        let entries: Vec<EntryView> = workspace
            .arranged()
            .into_iter()
            .map(|doc| EntryView {
                key: doc.key().to_string(),
                name: doc.name().to_string(),
                kind: doc.kind().map(|k| k.to_string()).unwrap_or_default(),
                is_pdf: doc.is_kind(DocumentKind::Pdf),
                size: format_size(doc.size()),
                included: ordering.is_included(doc.key()),
                edited: overlay.is_edited(doc.key()),
            })
            .collect();

        let registry = workspace.registry();
        let has_kind = |kind| registry.entries().iter().any(|e| e.is_kind(kind));

        Self {
            session_id: session_id.to_string(),
            has_pdf: has_kind(DocumentKind::Pdf),
            has_word: has_kind(DocumentKind::Word),
            can_merge_pdf: workspace.can_merge(MergeTarget::Pdf),
            can_merge_word: workspace.can_merge(MergeTarget::Word),
            can_merge_combined: conversion_available && workspace.can_merge(MergeTarget::Combined),
            conversion_available,
            entries,
            notices: Vec::new(),
            errors: Vec::new(),
            panel: None,
        }
    }

    #[must_use]
    pub fn with_notices(mut self, notices: Vec<String>) -> Self {
        self.notices = notices;
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    #[must_use]
    pub fn with_panel(mut self, panel: EditPanelView) -> Self {
        self.panel = Some(panel);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Full Page Templates
// =============================================================================

/// Session page: upload form and workspace.
#[derive(Template, WebTemplate)]
#[template(path = "app.html")]
pub struct AppTemplate {
    pub view: WorkspaceView,
    pub max_upload_mb: usize,
}

// =============================================================================
// Fragment Templates (HTMX partial responses)
// =============================================================================

/// Workspace fragment, swapped into `#workspace`.
#[derive(Template, WebTemplate)]
#[template(path = "partials/workspace.html")]
pub struct WorkspaceTemplate {
    pub view: WorkspaceView,
}

/// Edit panel fragment, swapped into `#edit-panel`.
#[derive(Template, WebTemplate)]
#[template(path = "partials/edit_panel.html")]
pub struct EditPanelTemplate {
    pub panel: EditPanelView,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use docmerge_core::{Upload, word};

    fn docx() -> Vec<u8> {
        word::build(&[word::Paragraph::new("x")]).unwrap()
    }

    #[test]
    fn test_empty_session_disables_merges() {
        let view = WorkspaceView::capture("s", &DocumentSession::new(), true);
        assert!(view.is_empty());
        assert!(!view.can_merge_pdf);
        assert!(!view.can_merge_word);
        assert!(!view.can_merge_combined);
    }

    #[test]
    fn test_capture_reflects_session() {
        let mut session = DocumentSession::new();
        session.reconcile(vec![
            Upload::new("a.pdf", b"%PDF".to_vec()),
            Upload::new("x.docx", docx()),
        ]);

        let view = WorkspaceView::capture("s", &session, false);
        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].kind, "PDF");
        assert_eq!(view.entries[1].kind, "Word");
        assert!(view.can_merge_pdf && view.can_merge_word);
        // Combined merging needs a converter
        assert!(!view.can_merge_combined);
    }

    #[test]
    fn test_workspace_renders_entries_and_notices() {
        let mut session = DocumentSession::new();
        session.reconcile(vec![Upload::new("report.pdf", b"%PDF".to_vec())]);
        let view = WorkspaceView::capture("abc", &session, false)
            .with_notices(vec!["Skipped notes.txt".to_string()]);

        let html = WorkspaceTemplate { view }.render().unwrap();
        assert!(html.contains("report.pdf"));
        assert!(html.contains("Skipped notes.txt"));
        assert!(html.contains("/api/merge/abc/pdf"));
    }

    #[test]
    fn test_edit_panel_lists_every_page() {
        let panel = EditPanelView {
            session_id: "abc".to_string(),
            key: "k".to_string(),
            name: "a.pdf".to_string(),
            pages: vec![1, 2, 3],
            edited_pages: Some(2),
            message: None,
            is_error: false,
            readable: true,
        };
        assert_eq!(panel.page_count(), 3);

        let html = EditPanelTemplate { panel }.render().unwrap();
        assert!(html.contains("value=\"3\""));
        assert!(html.contains("/api/edit/abc/k"));
    }

    #[test]
    fn test_unreadable_panel_shows_cause_without_form() {
        let panel = EditPanelView::unreadable(
            "abc".to_string(),
            "k".to_string(),
            "bad.pdf".to_string(),
            "failed to parse bad.pdf: invalid file header".to_string(),
        );

        let html = EditPanelTemplate { panel }.render().unwrap();
        assert!(html.contains("failed to parse bad.pdf"));
        assert!(html.contains("class=\"error\""));
        assert!(!html.contains("type=\"checkbox\""));
    }

    #[test]
    fn test_workspace_renders_errors() {
        let view = WorkspaceView::capture("abc", &DocumentSession::new(), false)
            .with_errors(vec!["failed to parse bad.pdf".to_string()]);

        let html = WorkspaceTemplate { view }.render().unwrap();
        assert!(html.contains("<p class=\"error\">failed to parse bad.pdf</p>"));
    }
}
