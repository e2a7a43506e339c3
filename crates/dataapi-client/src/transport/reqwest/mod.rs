//! Reqwest-based HTTP transport.
//!
//! ```rust,ignore
//! use dataapi_client::transport::{ReqwestConfig, ReqwestTransport};
//!
//! let transport = ReqwestTransport::new(ReqwestConfig::default().with_timeout(10))?;
//! let options = ApiOptions::new().with_transport(Arc::new(transport));
//! ```

mod client;
mod config;
mod error;

pub use self::client::ReqwestTransport;
pub use self::config::{DEFAULT_TIMEOUT_SECS, ReqwestConfig};
pub use self::error::Error;
