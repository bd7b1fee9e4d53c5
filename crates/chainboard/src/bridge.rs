//! Bridge between the command-line shell and the session workspace crates.
//! This must remain the only shell-facing boundary for board operations.

use std::sync::Arc;

use chainboard_session_adapters::{
    ClientConfig, InjectedAgentAdapter, ProgramRpcAdapter, SystemClockAdapter,
};
use chainboard_session_core::{
    ConfirmationHandle, Session, SessionController, SessionError, SignerIdentity,
};

type BoardController = SessionController<
    ProgramRpcAdapter<InjectedAgentAdapter>,
    InjectedAgentAdapter,
    SystemClockAdapter,
>;

#[derive(Clone)]
pub struct SessionBridge {
    controller: Arc<BoardController>,
}

impl SessionBridge {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = InjectedAgentAdapter::with_config(config);
        let program = ProgramRpcAdapter::with_config(config, agent.clone());
        Self {
            controller: Arc::new(SessionController::new(
                program,
                agent,
                SystemClockAdapter,
                config.session_settings(),
            )),
        }
    }

    /// Silent re-authentication first; falls back to an explicit prompt when
    /// no prior grant exists.
    pub async fn ensure_connected(&self) -> Result<SignerIdentity, SessionError> {
        self.controller.bootstrap().await?;
        if let Some(wallet) = self.controller.session().wallet {
            return Ok(wallet);
        }
        self.controller.connect_wallet().await
    }

    pub async fn initialize(&self) -> Result<(), SessionError> {
        self.controller.initialize_account().await
    }

    pub async fn submit(&self, link: &str) -> Result<ConfirmationHandle, SessionError> {
        self.controller.set_pending_input(link);
        self.controller.submit_link().await
    }

    pub async fn refresh(&self) -> Result<(), SessionError> {
        self.controller.refresh().await
    }

    pub fn disconnect(&self) {
        self.controller.disconnect();
    }

    pub fn session(&self) -> Session {
        self.controller.session()
    }
}
