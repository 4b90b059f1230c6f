//! The underlying CAN transport is an external collaborator: the core is
//! handed something that can send and receive exactly one CAN frame at a
//! time, and never reaches into a socket, a bus handle, or a UDP stub
//! itself.

use std::time::Duration;

use crate::error::Result;

/// Blocking single-frame CAN transport, injected into a [`crate::context::Context`].
pub trait CanTransport {
    /// Send exactly one CAN frame, blocking up to `timeout`.
    fn send(&mut self, frame: &[u8], timeout: Duration) -> Result<usize>;

    /// Receive exactly one CAN frame into `buf`, blocking up to `timeout`.
    /// On success, returns the number of bytes written into `buf`.
    fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;
}
