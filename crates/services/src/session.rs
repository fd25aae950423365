//! Authenticated session values and the sign-in/out change feed.
//!
//! A `Session` is an explicit value threaded into every service operation;
//! nothing in the core reads ambient auth state. `AuthState` is the single
//! writer for role transitions, and open dashboards subscribe to it so a
//! sign-out tears them down.

use checkin_core::model::{CoachId, UserId};
use tokio::sync::watch;

use crate::error::SessionError;

/// The caller's role, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Coach,
    Client,
}

/// An authenticated identity scoping every repository query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub role: Role,
    /// For clients: the assigned coach. For coaches: their own id.
    pub coach_id: Option<CoachId>,
}

impl Session {
    /// A coach session scoped to the coach's own roster.
    #[must_use]
    pub fn coach(user_id: UserId) -> Self {
        let coach_id = user_id.as_coach_id();
        Self {
            user_id,
            role: Role::Coach,
            coach_id: Some(coach_id),
        }
    }

    /// A client session scoped to the assigned coach.
    #[must_use]
    pub fn client(user_id: UserId, coach_id: CoachId) -> Self {
        Self {
            user_id,
            role: Role::Client,
            coach_id: Some(coach_id),
        }
    }
}

/// Holds the current session and notifies subscribers of transitions.
pub struct AuthState {
    tx: watch::Sender<Option<Session>>,
}

impl AuthState {
    /// Starts signed out.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Starts already signed in, for wiring tests and trusted bootstraps.
    #[must_use]
    pub fn signed_in(session: Session) -> Self {
        let (tx, _) = watch::channel(Some(session));
        Self { tx }
    }

    pub fn sign_in(&self, session: Session) {
        self.tx.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    /// The current session, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unauthenticated` when signed out.
    pub fn current_session(&self) -> Result<Session, SessionError> {
        self.tx
            .borrow()
            .clone()
            .ok_or(SessionError::Unauthenticated)
    }

    /// Subscribe to session transitions. Every sign-in or sign-out emits,
    /// and subscribers treat any emission as an invalidation of work scoped
    /// to the previous session.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_signed_out() {
        let auth = AuthState::new();
        assert_eq!(auth.current_session(), Err(SessionError::Unauthenticated));
    }

    #[test]
    fn sign_in_exposes_the_session() {
        let auth = AuthState::new();
        auth.sign_in(Session::coach(UserId::new("coach-1")));
        let session = auth.current_session().unwrap();
        assert_eq!(session.role, Role::Coach);
        assert_eq!(session.coach_id, Some(CoachId::new("coach-1")));
    }

    #[tokio::test]
    async fn transitions_wake_subscribers() {
        let auth = AuthState::new();
        let mut rx = auth.subscribe();
        auth.sign_in(Session::client(UserId::new("u1"), CoachId::new("coach-1")));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        auth.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }
}
