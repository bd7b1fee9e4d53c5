use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;

use chainboard_session_core::{
    AccountHandle, ConfirmationHandle, InstructionKind, LinkItem, RemoteAccountPort,
    RequestContext, SessionError, SignerIdentity, SigningAgentPort, TransactionIntent,
};

use crate::jsonrpc::{RpcClient, RpcFailure, CODE_ACCOUNT_MISSING};
use crate::ClientConfig;

/// Typed client for the one fixed board account. Reads go straight to the
/// cluster endpoint named by the request context; writes are built into
/// transaction intents and delegated to the signing agent.
#[derive(Debug, Clone)]
pub struct ProgramRpcAdapter<A> {
    agent: A,
    handle: AccountHandle,
    mode: ProgramMode,
}

#[derive(Debug, Clone)]
enum ProgramMode {
    InMemory(Arc<Mutex<BoardDouble>>),
    Proxy(RpcClient),
    Disabled(String),
}

/// Local double of the board account. `items: None` models an account that has
/// never been created.
#[derive(Debug, Default)]
struct BoardDouble {
    items: Option<Vec<LinkItem>>,
    fail_reads: bool,
}

#[derive(Debug, Deserialize)]
struct WireAccount {
    #[serde(default)]
    items: Vec<LinkItem>,
}

impl<A> ProgramRpcAdapter<A>
where
    A: SigningAgentPort,
{
    pub fn with_config(config: &ClientConfig, agent: A) -> Self {
        let mode = if config.strict_runtime_required() {
            match RpcClient::build(config.cluster_url.clone(), config.remote_call_timeout()) {
                Ok(rpc) => ProgramMode::Proxy(rpc),
                Err(e) => ProgramMode::Disabled(format!(
                    "failed to initialize cluster rpc client in production profile: {e}"
                )),
            }
        } else {
            ProgramMode::InMemory(Arc::default())
        };
        Self {
            agent,
            handle: config.account_handle(),
            mode,
        }
    }

    /// Fully local board double, for tests and offline development.
    pub fn in_memory(agent: A, handle: AccountHandle) -> Self {
        Self {
            agent,
            handle,
            mode: ProgramMode::InMemory(Arc::default()),
        }
    }

    /// Replaces the in-memory account state out of band, simulating writes
    /// performed by other clients.
    pub fn debug_replace_items(&self, items: Option<Vec<LinkItem>>) -> Result<(), SessionError> {
        let board = self.board()?;
        lock_board(board).items = items;
        Ok(())
    }

    /// Forces subsequent reads of the in-memory double to fail, simulating a
    /// transient network error distinct from a missing account.
    pub fn debug_set_read_failure(&self, fail: bool) -> Result<(), SessionError> {
        let board = self.board()?;
        lock_board(board).fail_reads = fail;
        Ok(())
    }

    fn board(&self) -> Result<&Arc<Mutex<BoardDouble>>, SessionError> {
        match &self.mode {
            ProgramMode::InMemory(state) => Ok(state),
            _ => Err(SessionError::ReadFailed(
                "in-memory board double not active".to_owned(),
            )),
        }
    }

    fn intent(&self, instruction: InstructionKind, signer: &SignerIdentity) -> TransactionIntent {
        TransactionIntent {
            account: self.handle.clone(),
            instruction,
            signer: signer.clone(),
        }
    }
}

#[async_trait]
impl<A> RemoteAccountPort for ProgramRpcAdapter<A>
where
    A: SigningAgentPort,
{
    async fn fetch_items(&self, ctx: &RequestContext) -> Result<Vec<LinkItem>, SessionError> {
        match &self.mode {
            ProgramMode::Disabled(reason) => Err(SessionError::ReadFailed(reason.clone())),
            ProgramMode::InMemory(state) => {
                let board = lock_board(state);
                if board.fail_reads {
                    return Err(SessionError::ReadFailed(
                        "injected read failure".to_owned(),
                    ));
                }
                match &board.items {
                    Some(items) => Ok(items.clone()),
                    None => Err(SessionError::AccountNotInitialized),
                }
            }
            ProgramMode::Proxy(rpc) => {
                let result = rpc
                    .call_at(
                        &ctx.endpoint,
                        "getListAccount",
                        serde_json::json!([self.handle.account_id, ctx.commitment.rpc_name()]),
                    )
                    .await
                    .map_err(|e| match e {
                        RpcFailure::Transport(msg) => SessionError::ReadFailed(msg),
                        RpcFailure::Rpc { code, .. } if code == CODE_ACCOUNT_MISSING => {
                            SessionError::AccountNotInitialized
                        }
                        RpcFailure::Rpc { message, .. } => SessionError::ReadFailed(message),
                    })?;
                let account: WireAccount = serde_json::from_value(result)
                    .map_err(|e| SessionError::ReadFailed(format!("account decode failed: {e}")))?;
                Ok(account.items)
            }
        }
    }

    async fn initialize_account(
        &self,
        ctx: &RequestContext,
    ) -> Result<ConfirmationHandle, SessionError> {
        let intent = self.intent(InstructionKind::InitializeAccount, &ctx.signer);
        match &self.mode {
            ProgramMode::Disabled(reason) => Err(SessionError::SubmissionFailed(reason.clone())),
            ProgramMode::InMemory(state) => {
                // Sign before applying, like the real flow: the program is the
                // one that rejects a duplicate create.
                let receipt = self.agent.sign_and_submit(intent).await?;
                let mut board = lock_board(state);
                if board.items.is_some() {
                    return Err(SessionError::AlreadyInitialized);
                }
                board.items = Some(Vec::new());
                Ok(receipt)
            }
            ProgramMode::Proxy(_) => self.agent.sign_and_submit(intent).await,
        }
    }

    async fn append_item(
        &self,
        ctx: &RequestContext,
        link: &str,
    ) -> Result<ConfirmationHandle, SessionError> {
        if link.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let intent = self.intent(
            InstructionKind::AppendItem {
                link: link.to_owned(),
            },
            &ctx.signer,
        );
        match &self.mode {
            ProgramMode::Disabled(reason) => Err(SessionError::SubmissionFailed(reason.clone())),
            ProgramMode::InMemory(state) => {
                let receipt = self.agent.sign_and_submit(intent).await?;
                let mut board = lock_board(state);
                let Some(items) = board.items.as_mut() else {
                    return Err(SessionError::AccountNotInitialized);
                };
                items.push(LinkItem {
                    link: link.to_owned(),
                    submitter: ctx.signer.clone(),
                });
                Ok(receipt)
            }
            ProgramMode::Proxy(_) => self.agent.sign_and_submit(intent).await,
        }
    }
}

fn lock_board(state: &Arc<Mutex<BoardDouble>>) -> MutexGuard<'_, BoardDouble> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
