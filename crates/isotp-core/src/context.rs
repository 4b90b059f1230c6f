//! Per-conversation context: owns the invariants, timers, addressing mode
//! and injected transport/clock that every `send`/`recv` call is driven
//! through. Process-wide state is never used; every message is carried by
//! a caller-owned [`Context`].

use std::time::Duration;

use crate::addressing::AddressingMode;
use crate::can::{CanFormat, CANFD_MAX_DATALEN};
use crate::error::Result;
use crate::state::CodecState;
use crate::timing::{Clock, Timeouts};
use crate::transport::CanTransport;
use crate::{recv, send};

/// A single ISO-TP conversation: immutable configuration plus the mutable
/// scratch state a transfer needs, parameterized over the injected
/// transport and clock.
///
/// Not safe for concurrent use from multiple threads; two contexts with
/// distinct transport handles may run on separate threads.
pub struct Context<T: CanTransport, C: Clock> {
    pub(crate) format: CanFormat,
    pub(crate) mode: AddressingMode,
    pub(crate) max_wait: u32,
    pub(crate) timeouts: Timeouts,
    pub(crate) transport: T,
    pub(crate) clock: C,
    pub(crate) state: CodecState,
}

impl<T: CanTransport, C: Clock> Context<T, C> {
    /// Create a context in the idle state.
    pub fn new(
        format: CanFormat,
        mode: AddressingMode,
        max_wait: u32,
        timeouts: Timeouts,
        transport: T,
        clock: C,
    ) -> Self {
        Self {
            format,
            mode,
            max_wait,
            timeouts,
            transport,
            clock,
            state: CodecState::new(format, mode),
        }
    }

    /// Return the context to the idle state. Called automatically at the
    /// start of every `send`/`recv`; exposed so a caller can discard a
    /// partially-completed transfer after an error without dropping the
    /// context (and its transport) entirely.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// The address-extension byte last written or observed for this
    /// conversation. `0` until a frame has been sent or received under
    /// extended/mixed addressing.
    pub fn address_extension(&self) -> u8 {
        self.state.address_extension
    }

    /// Set the address-extension byte used for subsequently-built frames.
    pub fn set_address_extension(&mut self, byte: u8) {
        self.state.address_extension = byte;
    }

    /// Send `payload` as one ISO-TP message, blocking until it is fully
    /// transferred, a protocol timer expires, or the peer aborts. Returns
    /// the number of bytes sent.
    pub fn send(&mut self, payload: &[u8], timeout: Duration) -> Result<usize> {
        send::send(self, payload, timeout)
    }

    /// Receive one ISO-TP message into `out`, advertising `bs` and
    /// `stmin_usec` to the peer in every Flow-Control frame this context
    /// issues. Blocks until the message is fully received, a protocol
    /// timer expires, or the peer's declared length does not fit `out`.
    /// Returns the number of bytes received.
    pub fn recv(&mut self, out: &mut [u8], bs: u8, stmin_usec: u32, timeout: Duration) -> Result<usize> {
        recv::recv(self, out, bs, stmin_usec, timeout)
    }

    /// Transmit the scratch buffer's current frame through the injected
    /// transport. Used by the send/receive engines after a codec builds a
    /// frame into `self.state.frame`.
    pub(crate) fn tx_frame(&mut self, timeout: Duration) -> Result<()> {
        self.transport.send(&self.state.frame[..self.state.frame_len], timeout)?;
        Ok(())
    }

    /// Receive one CAN frame through the injected transport into the
    /// scratch buffer, ready for a codec parser to consume.
    pub(crate) fn rx_frame(&mut self, timeout: Duration) -> Result<usize> {
        let mut buf = [0u8; CANFD_MAX_DATALEN];
        let n = self.transport.recv(&mut buf, timeout)?;
        self.state.frame[..n].copy_from_slice(&buf[..n]);
        self.state.frame_len = n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::SystemClock;
    use std::collections::VecDeque;

    pub(crate) struct LoopbackTransport {
        pub(crate) inbox: VecDeque<Vec<u8>>,
        pub(crate) sent: Vec<Vec<u8>>,
    }

    impl CanTransport for LoopbackTransport {
        fn send(&mut self, frame: &[u8], _timeout: Duration) -> Result<usize> {
            self.sent.push(frame.to_vec());
            Ok(frame.len())
        }

        fn recv(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
            match self.inbox.pop_front() {
                Some(frame) => {
                    buf[..frame.len()].copy_from_slice(&frame);
                    Ok(frame.len())
                }
                None => Err(crate::error::IsoTpError::Transport("no frame queued".into())),
            }
        }
    }

    #[test]
    fn reset_clears_in_flight_transfer_state() {
        let transport = LoopbackTransport {
            inbox: VecDeque::new(),
            sent: Vec::new(),
        };
        let mut ctx = Context::new(
            CanFormat::Classic,
            AddressingMode::Normal,
            0,
            Timeouts::default(),
            transport,
            SystemClock::new(),
        );
        ctx.state.total_datalen = 20;
        ctx.state.remaining_datalen = 14;
        ctx.state.sequence_num = 3;

        ctx.reset();

        assert_eq!(ctx.state.total_datalen, 0);
        assert_eq!(ctx.state.remaining_datalen, 0);
        assert_eq!(ctx.state.sequence_num, 0);
    }

    #[test]
    fn address_extension_accessors_round_trip() {
        let transport = LoopbackTransport {
            inbox: VecDeque::new(),
            sent: Vec::new(),
        };
        let mut ctx = Context::new(
            CanFormat::Classic,
            AddressingMode::Extended,
            0,
            Timeouts::default(),
            transport,
            SystemClock::new(),
        );
        assert_eq!(ctx.address_extension(), 0);
        ctx.set_address_extension(0xAB);
        assert_eq!(ctx.address_extension(), 0xAB);
    }
}
