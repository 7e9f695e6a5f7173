//! Non-owning back-reference from objects to their session.

use super::{Session, SessionInner};
use std::fmt;
use std::sync::Weak;
use uuid::Uuid;

/// Weak handle to the session an object was read through.
///
/// Holding a link never keeps a session alive; [`upgrade`](Self::upgrade)
/// returns `None` once the session is dropped.
#[derive(Clone)]
pub struct SessionLink {
    session_id: Uuid,
    inner: Weak<SessionInner>,
}

impl SessionLink {
    pub(crate) fn new(session_id: Uuid, inner: Weak<SessionInner>) -> Self {
        Self { session_id, inner }
    }

    /// A link that identifies a session but never resolves to one.
    pub fn detached(session_id: Uuid) -> Self {
        Self {
            session_id,
            inner: Weak::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn upgrade(&self) -> Option<Session> {
        self.inner.upgrade().map(|inner| Session { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for SessionLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLink")
            .field("session_id", &self.session_id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
