pub mod agent;
pub mod clock;
pub mod config;
pub mod program;

mod jsonrpc;

pub use agent::InjectedAgentAdapter;
pub use clock::SystemClockAdapter;
pub use config::{ClientConfig, RuntimeProfile};
pub use program::ProgramRpcAdapter;
