#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chainboard_session_adapters::{InjectedAgentAdapter, ProgramRpcAdapter};
use chainboard_session_core::{
    AccountHandle, ClockPort, CommitmentLevel, SessionController, SessionSettings,
};

#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> u64 {
        self.now.fetch_add(1, Ordering::SeqCst) + 1_739_750_400_000
    }
}

pub type TestController =
    SessionController<ProgramRpcAdapter<InjectedAgentAdapter>, InjectedAgentAdapter, TestClock>;

pub struct Fixture {
    pub controller: Arc<TestController>,
    pub agent: InjectedAgentAdapter,
    pub program: ProgramRpcAdapter<InjectedAgentAdapter>,
}

pub fn board_handle() -> AccountHandle {
    AccountHandle {
        program_id: "BoardProgram1111111111111111111111111111111".to_owned(),
        account_id: "BoardList1111111111111111111111111111111111".to_owned(),
    }
}

pub fn settings() -> SessionSettings {
    SessionSettings::new(
        "http://127.0.0.1:0",
        CommitmentLevel::Processed,
        Duration::from_secs(2),
    )
}

pub fn fixture_with_agent(agent: InjectedAgentAdapter) -> Fixture {
    let program = ProgramRpcAdapter::in_memory(agent.clone(), board_handle());
    let controller = Arc::new(SessionController::new(
        program.clone(),
        agent.clone(),
        TestClock::default(),
        settings(),
    ));
    Fixture {
        controller,
        agent,
        program,
    }
}

pub fn trusted_fixture() -> Fixture {
    fixture_with_agent(InjectedAgentAdapter::deterministic(true))
}

pub fn untrusted_fixture() -> Fixture {
    fixture_with_agent(InjectedAgentAdapter::deterministic(false))
}

pub fn absent_agent_fixture() -> Fixture {
    fixture_with_agent(InjectedAgentAdapter::disabled(
        "no injected signing agent in test environment",
    ))
}

/// Connected session with a freshly initialized, empty board.
pub async fn ready_fixture() -> Fixture {
    let fixture = trusted_fixture();
    fixture.controller.bootstrap().await.expect("bootstrap");
    fixture
        .controller
        .initialize_account()
        .await
        .expect("initialize board account");
    fixture
}
