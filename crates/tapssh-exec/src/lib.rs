//! tapssh-exec: Run one shell command on a remote device over SSH
//!
//! A [`ConnectionManager`] owns at most one live session, a
//! [`CommandExecutor`] runs connect → execute → disconnect under a deadline,
//! and failures are mapped by [`classify`] onto a closed set of
//! [`ErrorCategory`] values with user-facing messages.

pub mod classify;
pub mod config;
pub mod error;
pub mod executor;
pub mod manager;
pub mod relay;
pub mod report;
pub mod result;
pub mod ssh;
pub mod traits;

pub use classify::{Classification, ErrorCategory, Locale, classify, classify_message};
pub use config::{ExecConfig, TransportConfig};
pub use error::{ErrorKind, SshError};
pub use executor::SshCommandExecutor;
pub use manager::{ConnectionManager, SessionLease};
pub use relay::{RelayError, RelayExecutor};
pub use report::{
    CommandState, CommandStatus, JsonFileStatusStore, MemoryStatusStore, Reporter, StatusError,
    StatusStore,
};
pub use result::{
    CommandDescriptor, CommandOutcome, CommandRequest, ExecutionResult, RemoteOutput, SshTarget,
};
pub use ssh::RusshTransport;
pub use traits::{CommandExecutor, Session, Transport};
