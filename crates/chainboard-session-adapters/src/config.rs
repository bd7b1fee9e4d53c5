use std::time::Duration;

use chainboard_session_core::{AccountHandle, CommitmentLevel, SessionSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeProfile {
    #[default]
    Development,
    Production,
}

/// Deployment descriptor for the client: the fixed cluster endpoint, the fixed
/// board account and owning program, and the signing agent location. Loaded
/// once at startup; never user supplied.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub cluster_url: String,
    pub commitment: CommitmentLevel,
    pub program_id: String,
    pub account_id: String,
    pub agent_proxy_url: Option<String>,
    pub remote_call_timeout_ms: u64,
    pub runtime_profile: RuntimeProfile,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cluster_url: "https://api.devnet.solana.com".to_owned(),
            commitment: CommitmentLevel::Processed,
            program_id: "BoardProgram1111111111111111111111111111111".to_owned(),
            account_id: "BoardList1111111111111111111111111111111111".to_owned(),
            agent_proxy_url: None,
            remote_call_timeout_ms: 15_000,
            runtime_profile: RuntimeProfile::Development,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("CHAINBOARD_CLUSTER_URL") {
            config.cluster_url = value;
        }
        if let Ok(value) = std::env::var("CHAINBOARD_COMMITMENT") {
            match value.parse() {
                Ok(level) => config.commitment = level,
                Err(e) => tracing::warn!(error = %e, "ignoring CHAINBOARD_COMMITMENT"),
            }
        }
        if let Ok(value) = std::env::var("CHAINBOARD_PROGRAM_ID") {
            config.program_id = value;
        }
        if let Ok(value) = std::env::var("CHAINBOARD_ACCOUNT_ID") {
            config.account_id = value;
        }
        if let Ok(value) = std::env::var("CHAINBOARD_AGENT_PROXY_URL") {
            config.agent_proxy_url = Some(value);
        }
        if let Ok(value) = std::env::var("CHAINBOARD_REMOTE_TIMEOUT_MS") {
            match value.parse() {
                Ok(ms) => config.remote_call_timeout_ms = ms,
                Err(e) => tracing::warn!(error = %e, "ignoring CHAINBOARD_REMOTE_TIMEOUT_MS"),
            }
        }
        if let Ok(value) = std::env::var("CHAINBOARD_PROFILE") {
            if value.eq_ignore_ascii_case("production") {
                config.runtime_profile = RuntimeProfile::Production;
            }
        }
        config
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn account_handle(&self) -> AccountHandle {
        AccountHandle {
            program_id: self.program_id.clone(),
            account_id: self.account_id.clone(),
        }
    }

    pub fn remote_call_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_call_timeout_ms)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings::new(
            self.cluster_url.clone(),
            self.commitment,
            self.remote_call_timeout(),
        )
    }
}
