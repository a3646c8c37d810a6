//! RouterOS device interaction
//!
//! Wire protocol framing, authenticated sessions, the per-device
//! connection pool, and the status probe.

mod pool;
mod probe;
mod protocol;
mod session;

pub use pool::{ConnectionPool, PooledSession};
pub use probe::{ProbeError, ProbeReport, probe};
pub use protocol::encode_length;
pub use session::{COMMAND_TIMEOUT, CONNECT_TIMEOUT, ConnectParams, Sentence, SessionError};
