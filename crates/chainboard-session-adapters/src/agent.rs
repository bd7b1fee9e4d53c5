use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use chainboard_session_core::{
    ConfirmationHandle, SessionError, SignerIdentity, SigningAgentPort, TransactionIntent,
};

use crate::jsonrpc::{
    RpcClient, RpcFailure, CODE_ACCOUNT_EXISTS, CODE_ACCOUNT_MISSING, CODE_NOT_AUTHORIZED,
    CODE_SIGNING_FAILED, CODE_USER_REJECTED,
};
use crate::ClientConfig;

const DETERMINISTIC_IDENTITY: &str = "AgentDev1111111111111111111111111111111111";

/// Bridge to the browser-injected signing agent. Absence of the agent is a
/// recoverable condition surfaced as `AgentUnavailable`, never a crash.
#[derive(Debug, Clone)]
pub struct InjectedAgentAdapter {
    mode: AgentMode,
    state: Arc<AgentState>,
}

#[derive(Debug, Clone)]
enum AgentMode {
    Disabled(String),
    Deterministic,
    Proxy(RpcClient),
}

#[derive(Debug, Default)]
struct AgentState {
    trusted: AtomicBool,
    submissions: AtomicU64,
}

impl InjectedAgentAdapter {
    pub fn with_config(config: &ClientConfig) -> Self {
        let mode = if let Some(ref base_url) = config.agent_proxy_url {
            match RpcClient::build(base_url.clone(), config.remote_call_timeout()) {
                Ok(rpc) => AgentMode::Proxy(rpc),
                Err(e) => {
                    if config.strict_runtime_required() {
                        AgentMode::Disabled(format!(
                            "failed to initialize signing agent proxy in production profile: {e}"
                        ))
                    } else {
                        AgentMode::Deterministic
                    }
                }
            }
        } else if config.strict_runtime_required() {
            AgentMode::Disabled(
                "signing agent proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            AgentMode::Deterministic
        };
        Self::with_mode(mode, false)
    }

    /// Built-in agent double with a fixed identity. `trusted` controls whether
    /// the silent probe succeeds, mirroring a previously granted permission.
    pub fn deterministic(trusted: bool) -> Self {
        Self::with_mode(AgentMode::Deterministic, trusted)
    }

    /// No agent present in the environment; every call fails with
    /// `AgentUnavailable`.
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self::with_mode(AgentMode::Disabled(reason.into()), false)
    }

    fn with_mode(mode: AgentMode, trusted: bool) -> Self {
        Self {
            mode,
            state: Arc::new(AgentState {
                trusted: AtomicBool::new(trusted),
                submissions: AtomicU64::new(0),
            }),
        }
    }

    /// Number of sign-and-submit calls the deterministic agent has seen.
    pub fn debug_submission_count(&self) -> u64 {
        self.state.submissions.load(Ordering::SeqCst)
    }

    fn deterministic_identity(&self) -> SignerIdentity {
        SignerIdentity(DETERMINISTIC_IDENTITY.to_owned())
    }
}

#[async_trait]
impl SigningAgentPort for InjectedAgentAdapter {
    async fn probe_authorization(&self) -> Result<SignerIdentity, SessionError> {
        match &self.mode {
            AgentMode::Disabled(reason) => Err(SessionError::AgentUnavailable(reason.clone())),
            AgentMode::Deterministic => {
                if self.state.trusted.load(Ordering::SeqCst) {
                    Ok(self.deterministic_identity())
                } else {
                    Err(SessionError::NotAuthorized)
                }
            }
            AgentMode::Proxy(rpc) => {
                let result = rpc
                    .call("wallet_connect", serde_json::json!({"onlyIfTrusted": true}))
                    .await
                    .map_err(|e| match e {
                        RpcFailure::Transport(msg) => SessionError::AgentUnavailable(msg),
                        RpcFailure::Rpc { code, .. }
                            if code == CODE_USER_REJECTED || code == CODE_NOT_AUTHORIZED =>
                        {
                            SessionError::NotAuthorized
                        }
                        RpcFailure::Rpc { message, .. } => SessionError::AgentUnavailable(message),
                    })?;
                identity_from_result(&result)
            }
        }
    }

    async fn request_authorization(&self) -> Result<SignerIdentity, SessionError> {
        match &self.mode {
            AgentMode::Disabled(reason) => Err(SessionError::AgentUnavailable(reason.clone())),
            AgentMode::Deterministic => {
                self.state.trusted.store(true, Ordering::SeqCst);
                Ok(self.deterministic_identity())
            }
            AgentMode::Proxy(rpc) => {
                let result = rpc
                    .call("wallet_connect", serde_json::json!({"onlyIfTrusted": false}))
                    .await
                    .map_err(|e| match e {
                        RpcFailure::Transport(msg) => SessionError::AgentUnavailable(msg),
                        RpcFailure::Rpc { code, .. } if code == CODE_USER_REJECTED => {
                            SessionError::UserRejected
                        }
                        RpcFailure::Rpc { message, .. } => SessionError::AgentUnavailable(message),
                    })?;
                identity_from_result(&result)
            }
        }
    }

    async fn sign_and_submit(
        &self,
        intent: TransactionIntent,
    ) -> Result<ConfirmationHandle, SessionError> {
        match &self.mode {
            AgentMode::Disabled(reason) => Err(SessionError::AgentUnavailable(reason.clone())),
            AgentMode::Deterministic => {
                if !self.state.trusted.load(Ordering::SeqCst) {
                    return Err(SessionError::SigningFailed(
                        "no authorized identity".to_owned(),
                    ));
                }
                let seq = self.state.submissions.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(ConfirmationHandle(format!("det-sub-{seq:04}")))
            }
            AgentMode::Proxy(rpc) => {
                let encoded = serde_json::to_value(&intent)
                    .map_err(|e| SessionError::SigningFailed(format!("intent encode failed: {e}")))?;
                let result = rpc
                    .call("wallet_signAndSubmit", serde_json::json!({"intent": encoded}))
                    .await
                    .map_err(|e| match e {
                        RpcFailure::Transport(msg) => SessionError::SubmissionFailed(msg),
                        RpcFailure::Rpc { code, .. } if code == CODE_USER_REJECTED => {
                            SessionError::SigningFailed("user declined to sign".to_owned())
                        }
                        RpcFailure::Rpc { code, message } if code == CODE_SIGNING_FAILED => {
                            SessionError::SigningFailed(message)
                        }
                        RpcFailure::Rpc { code, .. } if code == CODE_ACCOUNT_MISSING => {
                            SessionError::AccountNotInitialized
                        }
                        RpcFailure::Rpc { code, .. } if code == CODE_ACCOUNT_EXISTS => {
                            SessionError::AlreadyInitialized
                        }
                        RpcFailure::Rpc { message, .. } => SessionError::SubmissionFailed(message),
                    })?;
                let signature = result
                    .get("signature")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        SessionError::SubmissionFailed(
                            "agent response missing signature".to_owned(),
                        )
                    })?;
                Ok(ConfirmationHandle(signature.to_owned()))
            }
        }
    }
}

fn identity_from_result(result: &Value) -> Result<SignerIdentity, SessionError> {
    result
        .get("identity")
        .and_then(Value::as_str)
        .map(|raw| SignerIdentity(raw.to_owned()))
        .ok_or_else(|| SessionError::AgentUnavailable("agent response missing identity".to_owned()))
}
