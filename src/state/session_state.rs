/// Session state definitions for a scraping session
///
/// A session moves `Idle -> Fetching -> Ready`, then either back to `Fetching` for the
/// next page or to `Idle` when a fetch fails or the session is reset.
use std::fmt;

/// Represents the lifecycle stage of a scraping session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No document is loaded
    #[default]
    Idle,

    /// A page request is in flight
    Fetching,

    /// A document is loaded and extractors may run
    Ready,
}

impl SessionState {
    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Fetching)
                | (Self::Ready, Self::Fetching)
                | (Self::Fetching, Self::Ready)
                | (Self::Fetching, Self::Idle)
                | (Self::Ready, Self::Idle)
        )
    }

    /// Returns true if extractors may run in this state
    pub fn has_document(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns the lowercase name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(SessionState::default(), SessionState::Idle);
    }

    #[test]
    fn test_legal_transitions() {
        assert!(SessionState::Idle.can_transition_to(SessionState::Fetching));
        assert!(SessionState::Fetching.can_transition_to(SessionState::Ready));
        assert!(SessionState::Fetching.can_transition_to(SessionState::Idle));
        assert!(SessionState::Ready.can_transition_to(SessionState::Fetching));
        assert!(SessionState::Ready.can_transition_to(SessionState::Idle));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!SessionState::Idle.can_transition_to(SessionState::Ready));
        assert!(!SessionState::Idle.can_transition_to(SessionState::Idle));
        assert!(!SessionState::Fetching.can_transition_to(SessionState::Fetching));
        assert!(!SessionState::Ready.can_transition_to(SessionState::Ready));
    }

    #[test]
    fn test_has_document() {
        assert!(SessionState::Ready.has_document());
        assert!(!SessionState::Idle.has_document());
        assert!(!SessionState::Fetching.has_document());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", SessionState::Idle), "idle");
        assert_eq!(format!("{}", SessionState::Fetching), "fetching");
        assert_eq!(format!("{}", SessionState::Ready), "ready");
    }
}
