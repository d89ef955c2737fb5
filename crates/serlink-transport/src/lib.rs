//! Byte-stream link transport abstraction.
//!
//! Provides the [`Connector`] and [`LinkStream`] traits that the session
//! layer drives, plus a TCP bridge transport for serial device servers
//! that expose a remote serial port as a network endpoint.
//!
//! This is the lowest layer of serlink. Everything else builds on top of
//! the [`LinkStream`] contract defined here.

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{ConnectError, Result};
pub use tcp::{TcpConnector, TcpLink};
pub use traits::{Connector, LinkStream};
