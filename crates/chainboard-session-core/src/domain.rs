use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state_machine::ConnectionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampMs(pub u64);

/// Public identifier of the wallet account authorized by the signing agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignerIdentity(pub String);

impl fmt::Display for SignerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored entry of the shared board. Entries are never edited in place;
/// the whole list is replaced on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkItem {
    pub link: String,
    pub submitter: SignerIdentity,
}

/// Durability level requested for reads and writes against the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentLevel {
    #[default]
    Processed,
    Confirmed,
    Finalized,
}

impl CommitmentLevel {
    pub fn rpc_name(self) -> &'static str {
        match self {
            CommitmentLevel::Processed => "processed",
            CommitmentLevel::Confirmed => "confirmed",
            CommitmentLevel::Finalized => "finalized",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown commitment level: {0}")]
pub struct ParseCommitmentLevelError(String);

impl FromStr for CommitmentLevel {
    type Err = ParseCommitmentLevelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "processed" => Ok(CommitmentLevel::Processed),
            "confirmed" => Ok(CommitmentLevel::Confirmed),
            "finalized" => Ok(CommitmentLevel::Finalized),
            other => Err(ParseCommitmentLevelError(other.to_owned())),
        }
    }
}

/// Fixed identifiers of the board account and the program that owns it.
/// Loaded once from configuration, never user supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHandle {
    pub program_id: String,
    pub account_id: String,
}

/// Per-operation bundle of endpoint, durability level and signer. Built fresh
/// for every remote call; the signer may change between re-authentications.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub endpoint: String,
    pub commitment: CommitmentLevel,
    pub signer: SignerIdentity,
}

/// What the signing agent is asked to sign and submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub account: AccountHandle,
    pub instruction: InstructionKind,
    pub signer: SignerIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstructionKind {
    InitializeAccount,
    AppendItem { link: String },
}

/// Opaque receipt for a signed and submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationHandle(pub String);

impl fmt::Display for ConfirmationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// UI-relevant session state. `items` is either absent (account missing or
/// unreadable) or a full snapshot of the remote list; partial merges are
/// never performed.
#[derive(Debug, Clone)]
pub struct Session {
    pub connection: ConnectionStatus,
    pub wallet: Option<SignerIdentity>,
    pub pending_input: String,
    pub items: Option<Vec<LinkItem>>,
    pub load_error: Option<String>,
    pub last_refreshed_at: Option<TimestampMs>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            connection: ConnectionStatus::Disconnected,
            wallet: None,
            pending_input: String::new(),
            items: None,
            load_error: None,
            last_refreshed_at: None,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
