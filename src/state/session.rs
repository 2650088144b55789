use crate::dao::models::{User, UserId};

/// Who the scoring core is currently playing for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// No user selected yet; scoring triggers and polls are skipped.
    #[default]
    Unresolved,
    /// Scoring and reads target this user.
    Active(User),
}

/// Events that move the session forward. There is no way back to
/// [`SessionPhase::Unresolved`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session store already pointed at this user at startup.
    Restored(User),
    /// A freshly registered user became current.
    Created(User),
    /// An existing user was selected.
    Selected(User),
}

impl SessionEvent {
    /// The user this event makes current.
    pub fn user(&self) -> &User {
        match self {
            SessionEvent::Restored(user)
            | SessionEvent::Created(user)
            | SessionEvent::Selected(user) => user,
        }
    }

    fn into_user(self) -> User {
        match self {
            SessionEvent::Restored(user)
            | SessionEvent::Created(user)
            | SessionEvent::Selected(user) => user,
        }
    }
}

/// Versioned session state owned by the session controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMachine {
    phase: SessionPhase,
    version: usize,
}

impl SessionMachine {
    /// Create an unresolved session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// Incremented on every applied event.
    pub fn version(&self) -> usize {
        self.version
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.phase {
            SessionPhase::Active(user) => Some(user),
            SessionPhase::Unresolved => None,
        }
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.current_user().map(|user| user.id)
    }

    /// Apply an event; every event lands in [`SessionPhase::Active`].
    pub fn apply(&mut self, event: SessionEvent) -> &SessionPhase {
        self.phase = SessionPhase::Active(event.into_user());
        self.version += 1;
        &self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: UserId, name: &str) -> User {
        User {
            id,
            username: name.into(),
        }
    }

    #[test]
    fn initial_session_is_unresolved() {
        let sm = SessionMachine::new();
        assert_eq!(sm.phase(), &SessionPhase::Unresolved);
        assert_eq!(sm.current_user_id(), None);
        assert_eq!(sm.version(), 0);
    }

    #[test]
    fn every_event_activates_and_bumps_version() {
        let mut sm = SessionMachine::new();

        sm.apply(SessionEvent::Created(user(1, "ann")));
        assert_eq!(sm.current_user_id(), Some(1));

        sm.apply(SessionEvent::Selected(user(2, "bo")));
        assert_eq!(sm.phase(), &SessionPhase::Active(user(2, "bo")));
        assert_eq!(sm.version(), 2);
    }

    #[test]
    fn reselecting_same_user_still_counts_as_transition() {
        let mut sm = SessionMachine::new();
        sm.apply(SessionEvent::Restored(user(3, "cy")));
        sm.apply(SessionEvent::Selected(user(3, "cy")));
        assert_eq!(sm.version(), 2);
    }
}
