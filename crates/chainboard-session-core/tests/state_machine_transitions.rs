use chainboard_session_core::{
    transition, ConnectedPhase, ConnectionStatus, SessionAction, SessionError,
};

#[test]
fn explicit_connect_happy_path() {
    let (s1, _) = transition(ConnectionStatus::Disconnected, SessionAction::BeginConnect)
        .expect("disconnected -> connecting");
    assert_eq!(s1, ConnectionStatus::Connecting);
    let (s2, _) =
        transition(s1, SessionAction::AuthorizationGranted).expect("connecting -> connected");
    assert_eq!(
        s2,
        ConnectionStatus::Connected(ConnectedPhase::Uninitialized)
    );
    let (s3, _) = transition(s2, SessionAction::SnapshotLoaded).expect("uninitialized -> ready");
    assert_eq!(s3, ConnectionStatus::Connected(ConnectedPhase::Ready));
}

#[test]
fn silent_probe_skips_connecting() {
    let (next, record) = transition(
        ConnectionStatus::Disconnected,
        SessionAction::AuthorizationGranted,
    )
    .expect("probe grants without prompt");
    assert_eq!(
        next,
        ConnectionStatus::Connected(ConnectedPhase::Uninitialized)
    );
    assert_eq!(record.reason, "silent probe trusted");
}

#[test]
fn denied_authorization_returns_to_disconnected() {
    let (connecting, _) = transition(ConnectionStatus::Disconnected, SessionAction::BeginConnect)
        .expect("begin connect");
    let (next, _) = transition(connecting, SessionAction::AuthorizationDenied)
        .expect("connecting -> disconnected");
    assert_eq!(next, ConnectionStatus::Disconnected);
}

#[test]
fn missing_account_drops_back_to_uninitialized() {
    let ready = ConnectionStatus::Connected(ConnectedPhase::Ready);
    let (next, _) = transition(ready, SessionAction::AccountMissing).expect("ready -> uninit");
    assert_eq!(
        next,
        ConnectionStatus::Connected(ConnectedPhase::Uninitialized)
    );
}

#[test]
fn disconnect_is_legal_from_every_state() {
    for state in [
        ConnectionStatus::Disconnected,
        ConnectionStatus::Connecting,
        ConnectionStatus::Connected(ConnectedPhase::Uninitialized),
        ConnectionStatus::Connected(ConnectedPhase::Ready),
    ] {
        let (next, _) = transition(state, SessionAction::Disconnect).expect("disconnect");
        assert_eq!(next, ConnectionStatus::Disconnected);
    }
}

#[test]
fn illegal_transition_is_rejected() {
    let err = transition(ConnectionStatus::Disconnected, SessionAction::SnapshotLoaded)
        .expect_err("must fail");
    assert!(matches!(err, SessionError::IllegalTransition { .. }));
    assert!(err.to_string().contains("illegal session transition"));

    transition(ConnectionStatus::Connecting, SessionAction::SnapshotLoaded)
        .expect_err("snapshot cannot load before authorization");
}
