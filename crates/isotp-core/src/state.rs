//! Mutable protocol state shared by every codec, independent of the
//! transport and clock a [`crate::context::Context`] is parameterized over.
//! Keeping it separate lets the codec modules stay free functions that
//! take `&mut CodecState` instead of a generic `Context<T, C>`.

use crate::addressing::AddressingMode;
use crate::can::{CanFormat, CANFD_MAX_DATALEN};

/// Scratch buffer and per-transfer bookkeeping for one conversation.
pub struct CodecState {
    pub format: CanFormat,
    pub mode: AddressingMode,

    pub address_extension: u8,

    pub frame: [u8; CANFD_MAX_DATALEN],
    pub frame_len: usize,

    pub total_datalen: u32,
    pub remaining_datalen: u32,
    pub sequence_num: u8,
}

impl CodecState {
    pub fn new(format: CanFormat, mode: AddressingMode) -> Self {
        Self {
            format,
            mode,
            address_extension: 0,
            frame: [0u8; CANFD_MAX_DATALEN],
            frame_len: 0,
            total_datalen: 0,
            remaining_datalen: 0,
            sequence_num: 0,
        }
    }

    /// Reset all per-transfer bookkeeping. The addressing mode, CAN
    /// format, and last-known address extension survive a reset.
    pub fn reset(&mut self) {
        self.frame = [0u8; CANFD_MAX_DATALEN];
        self.frame_len = 0;
        self.total_datalen = 0;
        self.remaining_datalen = 0;
        self.sequence_num = 0;
    }

    pub fn ae_len(&self) -> usize {
        self.mode.extension_len()
    }
}
