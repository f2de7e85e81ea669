//! Worker lifecycle phases and their allowed transitions.

use crate::error::LifecycleError;

/// Phase of the gateway worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerPhase {
    /// Created, not yet installed
    Parsed,
    /// Precaching the manifest
    Installing,
    /// Installed and waiting to activate
    Installed,
    /// Purging stale caches
    Activating,
    /// Controlling clients; no further transitions
    Activated,
}

/// Phases reachable from `from`
#[must_use]
pub fn allowed_transitions(from: WorkerPhase) -> Vec<WorkerPhase> {
    use WorkerPhase::*;
    match from {
        Parsed => vec![Installing],
        Installing => vec![Installed],
        Installed => vec![Activating],
        Activating => vec![Activated],
        Activated => vec![],
    }
}

/// Check a phase transition
pub fn validate_transition(from: WorkerPhase, to: WorkerPhase) -> Result<(), LifecycleError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(LifecycleError::IllegalTransition { from, to })
    }
}

/// Mutable lifecycle flags of one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    phase: WorkerPhase,
    skip_waiting: bool,
    clients_claimed: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            phase: WorkerPhase::Parsed,
            skip_waiting: false,
            clients_claimed: false,
        }
    }
}

impl Lifecycle {
    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    /// Move to `to` if allowed
    pub fn transition(&mut self, to: WorkerPhase) -> Result<(), LifecycleError> {
        validate_transition(self.phase, to)?;
        tracing::debug!(from = ?self.phase, to = ?to, "worker phase changed");
        self.phase = to;
        Ok(())
    }

    /// Activate without waiting for older workers to release their clients
    pub fn skip_waiting(&mut self) {
        self.skip_waiting = true;
    }

    /// Whether skip-waiting was requested
    #[inline]
    #[must_use]
    pub fn skips_waiting(&self) -> bool {
        self.skip_waiting
    }

    /// Installed and allowed to activate now
    #[must_use]
    pub fn ready_to_activate(&self) -> bool {
        self.phase == WorkerPhase::Installed && self.skip_waiting
    }

    /// Take control of all open clients
    pub fn claim_clients(&mut self) {
        self.clients_claimed = true;
    }

    /// Whether clients are controlled by this worker
    #[inline]
    #[must_use]
    pub fn controls_clients(&self) -> bool {
        self.clients_claimed
    }
}

/// Command sent by the hosting page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Force a pending update to activate immediately
    SkipWaiting,
    /// Anything else; ignored
    Unknown(String),
}

impl ClientMessage {
    /// Parse the `type` field of a posted message
    #[must_use]
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "SKIP_WAITING" => Self::SkipWaiting,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_allowed() {
        let mut lifecycle = Lifecycle::default();
        for phase in [
            WorkerPhase::Installing,
            WorkerPhase::Installed,
            WorkerPhase::Activating,
            WorkerPhase::Activated,
        ] {
            lifecycle.transition(phase).unwrap();
        }
        assert_eq!(lifecycle.phase(), WorkerPhase::Activated);
    }

    #[test]
    fn cannot_activate_before_install() {
        let mut lifecycle = Lifecycle::default();
        let err = lifecycle.transition(WorkerPhase::Activating).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::IllegalTransition {
                from: WorkerPhase::Parsed,
                to: WorkerPhase::Activating,
            }
        );
        assert_eq!(lifecycle.phase(), WorkerPhase::Parsed);
    }

    #[test]
    fn activated_is_terminal() {
        assert!(allowed_transitions(WorkerPhase::Activated).is_empty());
    }

    #[test]
    fn ready_to_activate_needs_skip_waiting() {
        let mut lifecycle = Lifecycle::default();
        lifecycle.transition(WorkerPhase::Installing).unwrap();
        lifecycle.transition(WorkerPhase::Installed).unwrap();
        assert!(!lifecycle.ready_to_activate());
        lifecycle.skip_waiting();
        assert!(lifecycle.ready_to_activate());
    }

    #[test]
    fn message_parsing() {
        assert_eq!(ClientMessage::from_type("SKIP_WAITING"), ClientMessage::SkipWaiting);
        assert_eq!(
            ClientMessage::from_type("PING"),
            ClientMessage::Unknown("PING".into())
        );
    }
}
