//! tapssh-relay: HTTP service that performs the SSH hop for remote clients
//!
//! Clients POST a command descriptor to `/api/ssh/execute`; the relay runs it
//! with a direct executor and answers with a classified result. The same
//! execution is offered over a WebSocket at `/api/ws/{client_id}`.

pub mod api;
pub mod config;
pub mod router;
pub mod state;

pub use config::Config;
pub use router::create_router;
pub use state::AppState;
