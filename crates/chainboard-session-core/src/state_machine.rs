use crate::ports::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectedPhase {
    /// The board account has not been created (or its state is unknown); the
    /// only valid remote write is the one-time initialization.
    Uninitialized,
    /// A board snapshot has been loaded; submissions are accepted.
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected(ConnectedPhase),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    BeginConnect,
    AuthorizationGranted,
    AuthorizationDenied,
    AccountMissing,
    SnapshotLoaded,
    Disconnect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: ConnectionStatus,
    pub to: ConnectionStatus,
    pub reason: &'static str,
}

/// Applies `action` to `from`, rejecting anything outside the session
/// lifecycle. A silent probe may grant authorization straight from
/// `Disconnected` (no user prompt, so no `Connecting` hop).
pub fn transition(
    from: ConnectionStatus,
    action: SessionAction,
) -> Result<(ConnectionStatus, StateTransition), SessionError> {
    use ConnectedPhase::{Ready, Uninitialized};
    use ConnectionStatus::{Connected, Connecting, Disconnected};
    use SessionAction as A;

    let (to, reason) = match (from, action) {
        (_, A::Disconnect) => (Disconnected, "session reset"),
        (Disconnected, A::BeginConnect) => (Connecting, "user connect requested"),
        (Disconnected, A::AuthorizationGranted) => {
            (Connected(Uninitialized), "silent probe trusted")
        }
        (Connecting, A::AuthorizationGranted) => (Connected(Uninitialized), "authorization granted"),
        (Connecting, A::AuthorizationDenied) => (Disconnected, "authorization denied"),
        (Connected(Uninitialized | Ready), A::AccountMissing) => {
            (Connected(Uninitialized), "account snapshot unavailable")
        }
        (Connected(Uninitialized | Ready), A::SnapshotLoaded) => {
            (Connected(Ready), "snapshot loaded")
        }
        _ => return Err(SessionError::IllegalTransition { from, action }),
    };
    Ok((to, StateTransition { from, to, reason }))
}
