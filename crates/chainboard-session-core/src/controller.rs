use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{
    CommitmentLevel, ConfirmationHandle, RequestContext, Session, SignerIdentity, TimestampMs,
};
use crate::ports::{ClockPort, RemoteAccountPort, SessionError, SigningAgentPort};
use crate::state_machine::{transition, ConnectedPhase, ConnectionStatus, SessionAction};

/// Static configuration shared by every request context the controller builds.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub endpoint: String,
    pub commitment: CommitmentLevel,
    pub remote_call_timeout: Duration,
}

impl SessionSettings {
    pub fn new(
        endpoint: impl Into<String>,
        commitment: CommitmentLevel,
        remote_call_timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            commitment,
            remote_call_timeout,
        }
    }
}

/// Per-action re-entrancy guard. A second invocation while one is in flight is
/// rejected with `OperationInProgress` instead of racing a duplicate submission.
#[derive(Debug)]
struct Gate {
    busy: AtomicBool,
    name: &'static str,
}

impl Gate {
    const fn new(name: &'static str) -> Self {
        Self {
            busy: AtomicBool::new(false),
            name,
        }
    }

    fn acquire(&self) -> Result<GateGuard<'_>, SessionError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Ok(GateGuard(self))
        } else {
            Err(SessionError::OperationInProgress(self.name))
        }
    }
}

struct GateGuard<'a>(&'a Gate);

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.0.busy.store(false, Ordering::SeqCst);
    }
}

/// Orchestrates the session lifecycle: authorization through the signing
/// agent, reads and writes against the board account, and reconciliation of
/// the local snapshot after every mutation or on load.
pub struct SessionController<R, A, C>
where
    R: RemoteAccountPort,
    A: SigningAgentPort,
    C: ClockPort,
{
    remote: R,
    agent: A,
    clock: C,
    settings: SessionSettings,
    session: Mutex<Session>,
    connect_gate: Gate,
    init_gate: Gate,
    submit_gate: Gate,
    cancel: Mutex<CancellationToken>,
}

impl<R, A, C> SessionController<R, A, C>
where
    R: RemoteAccountPort,
    A: SigningAgentPort,
    C: ClockPort,
{
    pub fn new(remote: R, agent: A, clock: C, settings: SessionSettings) -> Self {
        Self {
            remote,
            agent,
            clock,
            settings,
            session: Mutex::new(Session::new()),
            connect_gate: Gate::new("connect"),
            init_gate: Gate::new("account initialization"),
            submit_gate: Gate::new("link submission"),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Current session state, cloned for the view layer.
    pub fn session(&self) -> Session {
        self.with_session(|s| s.clone())
    }

    pub fn set_pending_input(&self, value: impl Into<String>) {
        let value = value.into();
        self.with_session(|s| s.pending_input = value);
    }

    /// Startup path: silent re-authentication, then an initial board fetch.
    /// Probe failures are expected steady states and are swallowed.
    pub async fn bootstrap(&self) -> Result<(), SessionError> {
        let _guard = self.connect_gate.acquire()?;
        let already_connected =
            self.with_session(|s| !matches!(s.connection, ConnectionStatus::Disconnected));
        if already_connected {
            return Ok(());
        }

        let identity = match self
            .bounded("authorization probe", self.agent.probe_authorization())
            .await
        {
            Ok(identity) => identity,
            Err(e) => {
                debug!(error = %e, "silent authorization probe declined");
                return Ok(());
            }
        };

        self.apply_transition(SessionAction::AuthorizationGranted, |s| {
            s.wallet = Some(identity.clone());
        })?;
        info!(wallet = %identity, "re-authenticated from prior grant");

        if let Err(e) = self.refresh_snapshot(&identity, true).await {
            debug!(error = %e, "initial board fetch failed");
        }
        Ok(())
    }

    /// User-initiated connect. Failure returns the session to `Disconnected`
    /// and is surfaced to the caller; `load_error` is not touched.
    pub async fn connect_wallet(&self) -> Result<SignerIdentity, SessionError> {
        let _guard = self.connect_gate.acquire()?;
        self.apply_transition(SessionAction::BeginConnect, |_| {})?;

        let identity = match self
            .bounded("authorization request", self.agent.request_authorization())
            .await
        {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "wallet connect failed");
                self.apply_transition(SessionAction::AuthorizationDenied, |_| {})?;
                return Err(e);
            }
        };

        self.apply_transition(SessionAction::AuthorizationGranted, |s| {
            s.wallet = Some(identity.clone());
        })?;
        info!(wallet = %identity, "wallet connected");

        if let Err(e) = self.refresh_snapshot(&identity, true).await {
            debug!(error = %e, "post-connect board fetch failed");
        }
        Ok(identity)
    }

    /// One-time board account creation, valid only before the first snapshot
    /// has loaded. The snapshot is re-fetched regardless of the creation
    /// outcome so the session always reflects the authoritative remote state.
    pub async fn initialize_account(&self) -> Result<(), SessionError> {
        let _guard = self.init_gate.acquire()?;
        let signer = self.with_session(|s| match s.connection {
            ConnectionStatus::Connected(ConnectedPhase::Uninitialized) => {
                s.wallet.clone().ok_or(SessionError::NotAuthorized)
            }
            ConnectionStatus::Connected(ConnectedPhase::Ready) => {
                Err(SessionError::AlreadyInitialized)
            }
            _ => Err(SessionError::NotAuthorized),
        })?;

        let ctx = self.request_context(signer.clone());
        let created = self
            .bounded(
                "account initialization",
                self.remote.initialize_account(&ctx),
            )
            .await;
        match &created {
            Ok(receipt) => info!(receipt = %receipt, "board account created"),
            Err(e) => warn!(error = %e, "board account initialization failed"),
        }

        let refreshed = self.refresh_snapshot(&signer, true).await;
        created?;
        refreshed?;
        Ok(())
    }

    /// Submits the pending input as a new link, then reconciles with the
    /// remote list. The input is cleared only when the append itself succeeds,
    /// so a failed submission can be retried without re-typing.
    pub async fn submit_link(&self) -> Result<ConfirmationHandle, SessionError> {
        let _guard = self.submit_gate.acquire()?;
        let (signer, link) = self.with_session(|s| {
            match s.connection {
                ConnectionStatus::Connected(ConnectedPhase::Ready) => {}
                ConnectionStatus::Connected(ConnectedPhase::Uninitialized) => {
                    return Err(SessionError::AccountNotInitialized)
                }
                _ => return Err(SessionError::NotAuthorized),
            }
            if s.pending_input.is_empty() {
                return Err(SessionError::EmptyInput);
            }
            let signer = s.wallet.clone().ok_or(SessionError::NotAuthorized)?;
            Ok((signer, s.pending_input.clone()))
        })?;

        let ctx = self.request_context(signer.clone());
        let appended = self
            .bounded("link submission", self.remote.append_item(&ctx, &link))
            .await;
        match &appended {
            Ok(receipt) => {
                info!(link = %link, receipt = %receipt, "link submitted");
                self.with_session(|s| s.pending_input.clear());
            }
            Err(e) => warn!(error = %e, "link submission failed; pending input retained"),
        }

        if let Err(e) = self.refresh_snapshot(&signer, false).await {
            debug!(error = %e, "post-submit board refresh failed");
        }
        appended
    }

    /// Re-reads the full board snapshot for an already connected session.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let signer = self.with_session(|s| match s.connection {
            ConnectionStatus::Connected(_) => s.wallet.clone().ok_or(SessionError::NotAuthorized),
            _ => Err(SessionError::NotAuthorized),
        })?;
        self.refresh_snapshot(&signer, false).await
    }

    /// Cancels any in-flight remote call and resets the session.
    pub fn disconnect(&self) {
        let token = {
            let mut guard = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, CancellationToken::new())
        };
        token.cancel();
        self.with_session(|s| *s = Session::new());
        info!("session reset");
    }

    /// Pure construction of the per-operation request context. Never cached:
    /// the signer may change if the user re-authenticates.
    fn request_context(&self, signer: SignerIdentity) -> RequestContext {
        RequestContext {
            endpoint: self.settings.endpoint.clone(),
            commitment: self.settings.commitment,
            signer,
        }
    }

    /// Fetches the authoritative list and replaces the local snapshot
    /// wholesale. On the initial post-connect fetch any failure clears
    /// `items` (the state is unknown, so the init affordance is the safe
    /// fallback); on later refreshes a transient read failure keeps the
    /// last-known snapshot.
    async fn refresh_snapshot(
        &self,
        signer: &SignerIdentity,
        initial: bool,
    ) -> Result<(), SessionError> {
        let ctx = self.request_context(signer.clone());
        let fetched = self
            .bounded("board fetch", self.remote.fetch_items(&ctx))
            .await;
        let now = TimestampMs(self.clock.now_ms());

        match fetched {
            Ok(items) => {
                debug!(count = items.len(), "board snapshot replaced");
                self.apply_transition(SessionAction::SnapshotLoaded, |s| {
                    s.items = Some(items);
                    s.load_error = None;
                    s.last_refreshed_at = Some(now);
                })
            }
            Err(SessionError::AccountNotInitialized) => {
                debug!("board account not initialized");
                self.apply_transition(SessionAction::AccountMissing, |s| {
                    s.items = None;
                    s.load_error = None;
                })?;
                Err(SessionError::AccountNotInitialized)
            }
            Err(e) => {
                warn!(error = %e, "board fetch failed");
                if initial {
                    self.apply_transition(SessionAction::AccountMissing, |s| {
                        s.items = None;
                        s.load_error = Some(e.to_string());
                    })?;
                } else {
                    self.with_session(|s| s.load_error = Some(e.to_string()));
                }
                Err(e)
            }
        }
    }

    /// Races a remote call against the configured deadline and the session's
    /// cancellation token. On expiry the call result is discarded and the
    /// session stays in its last stable state.
    async fn bounded<T>(
        &self,
        what: &'static str,
        fut: impl Future<Output = Result<T, SessionError>>,
    ) -> Result<T, SessionError> {
        let cancel = {
            let guard = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
            guard.clone()
        };
        tokio::select! {
            _ = cancel.cancelled() => Err(SessionError::Cancelled(what)),
            outcome = tokio::time::timeout(self.settings.remote_call_timeout, fut) => {
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(SessionError::Timeout(what)),
                }
            }
        }
    }

    fn apply_transition(
        &self,
        action: SessionAction,
        update: impl FnOnce(&mut Session),
    ) -> Result<(), SessionError> {
        self.with_session(|s| {
            let (next, record) = transition(s.connection, action)?;
            debug!(from = ?record.from, to = ?record.to, reason = record.reason, "session transition");
            s.connection = next;
            update(s);
            Ok(())
        })
    }

    fn with_session<T>(&self, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
