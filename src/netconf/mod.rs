//! NETCONF over SSH.
//!
//! The provisioning run only sees [`DeviceSession`] and [`ConfigLock`];
//! [`connect`] produces the real implementation backed by `ssh2`.

mod client;
mod framing;
pub mod rpc;
mod session;

pub use client::connect;
pub use rpc::RUNNING;
pub use session::{ConfigLock, DeviceSession};

use thiserror::Error;

/// Anything that can go wrong while talking to the device.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Connect(String),

    #[error("{0}")]
    Auth(String),

    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("framing error: {0}")]
    Framing(String),

    #[error("session closed by device")]
    Closed,

    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("{operation} rejected: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },
}
