use docmerge_core::{AppConfig, DocumentSession, PdfConverter};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// One browser session: its documents and when it was last used.
pub struct Session {
    pub workspace: DocumentSession,
    pub touched_at: Instant,
    /// Failures to show on the next workspace render (e.g. a failed download)
    pub errors: Vec<String>,
}

impl Session {
    fn new() -> Self {
        Self {
            workspace: DocumentSession::new(),
            touched_at: Instant::now(),
            errors: Vec::new(),
        }
    }
}

/// Global application state
pub struct AppState {
    /// Active sessions indexed by UUID
    sessions: RwLock<HashMap<Uuid, Session>>,
    pub config: AppConfig,
    /// Word-to-PDF converter, if one was found at startup
    pub converter: Option<Arc<dyn PdfConverter>>,
}

impl AppState {
    pub fn new(config: AppConfig, converter: Option<Arc<dyn PdfConverter>>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            converter,
        }
    }

    pub const fn conversion_available(&self) -> bool {
        self.converter.is_some()
    }

    /// Create an empty session.
    ///
    /// Returns the session ID as a string (for URL embedding).
    pub async fn create_session(&self) -> String {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(id, Session::new());
        info!("Created session {}", id);
        id.to_string()
    }

    /// Get a session by ID string and mark it as used.
    ///
    /// Returns `None` if the ID is not a valid UUID or session doesn't exist.
    pub async fn get_session(&self, id: &str) -> Option<SessionRef<'_>> {
        let uuid = Uuid::parse_str(id).ok()?;
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&uuid)?;
        session.touched_at = Instant::now();
        Some(SessionRef {
            id: uuid,
            state: self,
        })
    }

    /// Drop sessions idle for longer than `ttl`. Returns how many were dropped.
    pub async fn cleanup_old_sessions(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let before = sessions.len();

        sessions.retain(|_, session| now.duration_since(session.touched_at) < ttl);
        before - sessions.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// A borrowed reference to a session that provides safe access patterns.
///
/// Locks are only taken inside the synchronous closures below, so no guard
/// is ever held across an `.await`. Anything slow (parsing, merging,
/// conversion) must work on data cloned out of the closure.
///
/// ```ignore
/// let plan = session.with_session(|s| s.workspace.plan(target)).await?;
/// let artifact = tokio::task::spawn_blocking(move || plan.build()).await;
/// ```
pub struct SessionRef<'a> {
    id: Uuid,
    state: &'a AppState,
}

impl SessionRef<'_> {
    pub fn id(&self) -> String {
        self.id.to_string()
    }

    /// Access session data immutably within a closure.
    ///
    /// Returns `None` if the session expired in the meantime.
    pub async fn with_session<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Session) -> R,
    {
        let sessions = self.state.sessions.read().await;
        sessions.get(&self.id).map(f)
    }

    /// Access session data mutably within a closure.
    pub async fn with_session_mut<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.state.sessions.write().await;
        sessions.get_mut(&self.id).map(f)
    }
}
