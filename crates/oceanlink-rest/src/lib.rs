#![warn(missing_docs)]

//! OceanLink REST subsystem: authenticated sessions, bounded dispatch and the relogin protocol for the storage array API

pub mod cli;
pub mod client;
pub mod codes;
pub mod config;
pub mod credentials;
pub mod envelope;
pub mod error;
pub mod gate;
pub mod ops;
pub mod pager;
pub mod session;
pub mod transport;

pub use client::ArrayClient;
pub use codes::ReservedCodes;
pub use config::ArrayConfig;
pub use envelope::{ErrorInfo, ResultEnvelope};
pub use error::{RestError, Result};
pub use gate::{ConcurrencyGate, GatePermit};
pub use ops::ShareProto;
pub use pager::{PageWindow, Pager};
pub use session::{CallOptions, Session, SessionState};
pub use transport::{HttpMethod, HttpTransport, TlsOptions, Transport};
