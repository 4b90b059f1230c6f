//! ISO-TP (ISO 15765-2) segmentation/reassembly state machine and frame
//! codec for Unified Diagnostic Services over CAN and CAN-FD.
//!
//! This crate is the protocol core: it segments a message payload into
//! Single-, First- and Consecutive-Frames, drives the Flow-Control
//! handshake (block size, separation time, wait frames), and enforces the
//! four ISO-TP timers. The underlying CAN transport and monotonic clock
//! are external collaborators, injected through the [`transport::CanTransport`]
//! and [`timing::Clock`] traits.

pub mod addressing;
pub mod can;
pub mod cf;
pub mod context;
pub mod error;
pub mod fc;
pub mod ff;
mod recv;
mod send;
pub mod sf;
pub mod state;
pub mod timing;
pub mod transport;

pub use addressing::AddressingMode;
pub use can::CanFormat;
pub use context::Context;
pub use error::{IsoTpError, Result};
pub use fc::FlowStatus;
pub use timing::{Clock, SystemClock, Timeouts};
pub use transport::CanTransport;

#[cfg(test)]
#[ctor::ctor]
fn setup_test_logging() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .with_ansi(true)
        .init();
}
