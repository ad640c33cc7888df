//! Window lifecycle phases.

use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum LifecyclePhase {
    Uninitialized,
    PlaceholderLoading,
    ContentLoading,
    Ready,
    Visible,
    Hidden,
    Error,
    Closing,
    Destroyed,
}

impl LifecyclePhase {
    /// Whether `self -> next` is a legal edge.
    ///
    /// Transitions only move forward, except the Error -> ContentLoading
    /// retry edge and the Visible/Hidden toggle.
    pub fn can_transition_to(self, next: LifecyclePhase) -> bool {
        use LifecyclePhase::*;

        match (self, next) {
            (Uninitialized, PlaceholderLoading) => true,
            (PlaceholderLoading, ContentLoading) => true,
            (ContentLoading, Ready) | (ContentLoading, Error) => true,
            (Error, ContentLoading) => true,
            (Ready, Visible) | (Ready, Hidden) => true,
            (Visible, Hidden) | (Hidden, Visible) => true,
            (Closing, Destroyed) => true,
            (Closing, _) | (Destroyed, _) => false,
            (_, Closing) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == LifecyclePhase::Destroyed
    }

    /// Content is loaded and visibility is tracked by the phase.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            LifecyclePhase::Ready | LifecyclePhase::Visible | LifecyclePhase::Hidden
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LifecyclePhase::*;

    #[test]
    fn test_happy_path_edges() {
        assert!(Uninitialized.can_transition_to(PlaceholderLoading));
        assert!(PlaceholderLoading.can_transition_to(ContentLoading));
        assert!(ContentLoading.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Visible));
        assert!(Visible.can_transition_to(Hidden));
        assert!(Hidden.can_transition_to(Visible));
        assert!(Hidden.can_transition_to(Closing));
        assert!(Closing.can_transition_to(Destroyed));
    }

    #[test]
    fn test_retry_edge_is_the_only_backward_edge() {
        assert!(ContentLoading.can_transition_to(Error));
        assert!(Error.can_transition_to(ContentLoading));

        assert!(!Ready.can_transition_to(ContentLoading));
        assert!(!Visible.can_transition_to(PlaceholderLoading));
        assert!(!ContentLoading.can_transition_to(PlaceholderLoading));
        assert!(!Error.can_transition_to(Ready));
    }

    #[test]
    fn test_destroyed_is_terminal() {
        assert!(Destroyed.is_terminal());
        for next in [Uninitialized, PlaceholderLoading, Ready, Visible, Closing] {
            assert!(!Destroyed.can_transition_to(next));
        }
        assert!(!Closing.can_transition_to(Hidden));
    }

    #[test]
    fn test_any_live_phase_can_close() {
        for phase in [Uninitialized, PlaceholderLoading, ContentLoading, Ready, Error, Visible] {
            assert!(phase.can_transition_to(Closing));
        }
    }
}
