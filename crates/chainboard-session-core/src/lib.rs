pub mod controller;
pub mod domain;
pub mod ports;
pub mod state_machine;

pub use controller::{SessionController, SessionSettings};
pub use domain::{
    AccountHandle, CommitmentLevel, ConfirmationHandle, InstructionKind, LinkItem, RequestContext,
    Session, SignerIdentity, TimestampMs, TransactionIntent,
};
pub use ports::{ClockPort, RemoteAccountPort, SessionError, SigningAgentPort};
pub use state_machine::{
    transition, ConnectedPhase, ConnectionStatus, SessionAction, StateTransition,
};
