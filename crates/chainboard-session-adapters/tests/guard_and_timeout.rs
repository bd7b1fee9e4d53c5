mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use chainboard_session_adapters::{InjectedAgentAdapter, ProgramRpcAdapter};
use chainboard_session_core::{
    ConfirmationHandle, ConnectedPhase, ConnectionStatus, LinkItem, RemoteAccountPort,
    RequestContext, SessionController, SessionError,
};

use common::{board_handle, ready_fixture, settings, TestClock};

/// Remote that can park append calls until the test releases them, so a
/// second invocation can be issued while the first is provably in flight.
#[derive(Clone)]
struct HeldRemote {
    inner: ProgramRpcAdapter<InjectedAgentAdapter>,
    gate: Arc<HoldGate>,
}

#[derive(Default)]
struct HoldGate {
    hold_appends: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl HeldRemote {
    fn new(inner: ProgramRpcAdapter<InjectedAgentAdapter>) -> Self {
        Self {
            inner,
            gate: Arc::default(),
        }
    }
}

#[async_trait]
impl RemoteAccountPort for HeldRemote {
    async fn fetch_items(&self, ctx: &RequestContext) -> Result<Vec<LinkItem>, SessionError> {
        self.inner.fetch_items(ctx).await
    }

    async fn initialize_account(
        &self,
        ctx: &RequestContext,
    ) -> Result<ConfirmationHandle, SessionError> {
        self.inner.initialize_account(ctx).await
    }

    async fn append_item(
        &self,
        ctx: &RequestContext,
        link: &str,
    ) -> Result<ConfirmationHandle, SessionError> {
        if self.gate.hold_appends.load(Ordering::SeqCst) {
            self.gate.entered.notify_one();
            self.gate.release.notified().await;
        }
        self.inner.append_item(ctx, link).await
    }
}

/// Remote whose selected calls never complete, for deadline coverage under
/// paused time.
#[derive(Clone)]
struct StalledRemote {
    inner: ProgramRpcAdapter<InjectedAgentAdapter>,
    hang_reads: Arc<AtomicBool>,
    hang_appends: Arc<AtomicBool>,
}

impl StalledRemote {
    fn new(inner: ProgramRpcAdapter<InjectedAgentAdapter>) -> Self {
        Self {
            inner,
            hang_reads: Arc::default(),
            hang_appends: Arc::default(),
        }
    }
}

#[async_trait]
impl RemoteAccountPort for StalledRemote {
    async fn fetch_items(&self, ctx: &RequestContext) -> Result<Vec<LinkItem>, SessionError> {
        if self.hang_reads.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.fetch_items(ctx).await
    }

    async fn initialize_account(
        &self,
        ctx: &RequestContext,
    ) -> Result<ConfirmationHandle, SessionError> {
        self.inner.initialize_account(ctx).await
    }

    async fn append_item(
        &self,
        ctx: &RequestContext,
        link: &str,
    ) -> Result<ConfirmationHandle, SessionError> {
        if self.hang_appends.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.append_item(ctx, link).await
    }
}

fn held_controller() -> (
    Arc<SessionController<HeldRemote, InjectedAgentAdapter, TestClock>>,
    HeldRemote,
) {
    let agent = InjectedAgentAdapter::deterministic(true);
    let remote = HeldRemote::new(ProgramRpcAdapter::in_memory(agent.clone(), board_handle()));
    let controller = Arc::new(SessionController::new(
        remote.clone(),
        agent,
        TestClock::default(),
        settings(),
    ));
    (controller, remote)
}

fn stalled_controller() -> (
    Arc<SessionController<StalledRemote, InjectedAgentAdapter, TestClock>>,
    StalledRemote,
) {
    let agent = InjectedAgentAdapter::deterministic(true);
    let remote = StalledRemote::new(ProgramRpcAdapter::in_memory(agent.clone(), board_handle()));
    let controller = Arc::new(SessionController::new(
        remote.clone(),
        agent,
        TestClock::default(),
        settings(),
    ));
    (controller, remote)
}

#[tokio::test]
async fn empty_input_short_circuits_before_any_remote_call() {
    let fixture = ready_fixture().await;
    let signed_so_far = fixture.agent.debug_submission_count();

    let err = fixture
        .controller
        .submit_link()
        .await
        .expect_err("empty input must be rejected locally");
    assert!(matches!(err, SessionError::EmptyInput));
    assert_eq!(fixture.agent.debug_submission_count(), signed_so_far);
}

#[tokio::test]
async fn overlapping_submit_is_rejected_while_first_is_in_flight() {
    let (controller, remote) = held_controller();
    controller.bootstrap().await.expect("bootstrap");
    controller.initialize_account().await.expect("create");

    remote.gate.hold_appends.store(true, Ordering::SeqCst);
    controller.set_pending_input("http://example.com/a.gif");

    let first = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.submit_link().await }
    });
    remote.gate.entered.notified().await;

    let err = controller
        .submit_link()
        .await
        .expect_err("second submit must be refused while one is in flight");
    assert!(matches!(
        err,
        SessionError::OperationInProgress("link submission")
    ));

    remote.gate.hold_appends.store(false, Ordering::SeqCst);
    remote.gate.release.notify_one();
    first
        .await
        .expect("submit task")
        .expect("held submit completes once released");

    let items = controller.session().items.expect("snapshot");
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn disconnect_cancels_an_in_flight_submission() {
    let (controller, remote) = held_controller();
    controller.bootstrap().await.expect("bootstrap");
    controller.initialize_account().await.expect("create");

    remote.gate.hold_appends.store(true, Ordering::SeqCst);
    controller.set_pending_input("http://example.com/a.gif");

    let held = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.submit_link().await }
    });
    remote.gate.entered.notified().await;

    controller.disconnect();

    let err = held
        .await
        .expect("submit task")
        .expect_err("cancelled submit must not report success");
    assert!(matches!(err, SessionError::Cancelled("link submission")));
    assert_eq!(
        controller.session().connection,
        ConnectionStatus::Disconnected
    );
}

#[tokio::test(start_paused = true)]
async fn stalled_initial_fetch_times_out_into_uninitialized() {
    let (controller, remote) = stalled_controller();
    remote.hang_reads.store(true, Ordering::SeqCst);

    controller
        .bootstrap()
        .await
        .expect("startup fetch failures are swallowed");

    let session = controller.session();
    assert_eq!(
        session.connection,
        ConnectionStatus::Connected(ConnectedPhase::Uninitialized)
    );
    assert!(session.items.is_none());
    let load_error = session.load_error.expect("deadline expiry is reported");
    assert!(load_error.contains("timed out"), "got: {load_error}");
}

#[tokio::test(start_paused = true)]
async fn stalled_submit_times_out_and_retains_input() {
    let (controller, remote) = stalled_controller();
    controller.bootstrap().await.expect("bootstrap");
    controller.initialize_account().await.expect("create");

    remote.hang_appends.store(true, Ordering::SeqCst);
    controller.set_pending_input("http://example.com/a.gif");

    let err = controller
        .submit_link()
        .await
        .expect_err("stalled append must hit the deadline");
    assert!(matches!(err, SessionError::Timeout("link submission")));

    let session = controller.session();
    assert_eq!(session.pending_input, "http://example.com/a.gif");
    assert_eq!(
        session.connection,
        ConnectionStatus::Connected(ConnectedPhase::Ready)
    );
    assert!(session.items.is_some());
}
