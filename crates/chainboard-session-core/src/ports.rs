use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    ConfirmationHandle, LinkItem, RequestContext, SignerIdentity, TransactionIntent,
};
use crate::state_machine::{ConnectionStatus, SessionAction};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no compatible signing agent available: {0}")]
    AgentUnavailable(String),
    #[error("signing agent has not authorized this origin")]
    NotAuthorized,
    #[error("user rejected the authorization request")]
    UserRejected,
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    #[error("board account has not been initialized")]
    AccountNotInitialized,
    #[error("board account is already initialized")]
    AlreadyInitialized,
    #[error("account read failed: {0}")]
    ReadFailed(String),
    #[error("link input is empty")]
    EmptyInput,
    #[error("{0} is already in progress")]
    OperationInProgress(&'static str),
    #[error("{0} timed out")]
    Timeout(&'static str),
    #[error("{0} was cancelled")]
    Cancelled(&'static str),
    #[error("illegal session transition: {from:?} on {action:?}")]
    IllegalTransition {
        from: ConnectionStatus,
        action: SessionAction,
    },
}

/// Browser-injected signing agent. Holds the user's key material and may show
/// its own UI when asked to authorize or sign.
#[async_trait]
pub trait SigningAgentPort: Send + Sync {
    /// Silent re-authentication against a previously granted permission.
    /// `NotAuthorized` is an expected steady state, not a fault.
    async fn probe_authorization(&self) -> Result<SignerIdentity, SessionError>;

    /// Explicit authorization request; prompts the user.
    async fn request_authorization(&self) -> Result<SignerIdentity, SessionError>;

    /// Delegates signing and submission of `intent` to the agent.
    async fn sign_and_submit(
        &self,
        intent: TransactionIntent,
    ) -> Result<ConfirmationHandle, SessionError>;
}

/// Typed operations against the one fixed board account. Writes go through the
/// signing agent; reads return the full list or nothing.
#[async_trait]
pub trait RemoteAccountPort: Send + Sync {
    /// Full snapshot read. The caller must replace, never merge, its local copy.
    async fn fetch_items(&self, ctx: &RequestContext) -> Result<Vec<LinkItem>, SessionError>;

    /// One-time account creation. A duplicate create is rejected by the remote
    /// program with `AlreadyInitialized`.
    async fn initialize_account(
        &self,
        ctx: &RequestContext,
    ) -> Result<ConfirmationHandle, SessionError>;

    /// Appends `link` attributed to the context's signer. The new entry is not
    /// guaranteed visible until a subsequent `fetch_items`.
    async fn append_item(
        &self,
        ctx: &RequestContext,
        link: &str,
    ) -> Result<ConfirmationHandle, SessionError>;
}

pub trait ClockPort: Send + Sync {
    fn now_ms(&self) -> u64;
}
