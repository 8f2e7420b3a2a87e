//! tapssh-api: Shared wire types for the relay hop
//!
//! Contains the request/response bodies exchanged between the tapssh client
//! and the tapssh relay service, over HTTP and WebSocket.

pub mod events;
pub mod requests;
pub mod responses;

pub use events::{WsEvent, WsRequest};
pub use requests::{ExecuteRequest, SshCommandSpec};
pub use responses::{ExecuteResponse, LogEntry, LogsResponse, RootResponse};
