//! Addressing mode as a single tagged variant with its own small method
//! set, so every codec derives extension length and byte placement the
//! same way instead of re-deriving it inline.

use crate::can::CanFormat;
use crate::error::{IsoTpError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Normal,
    NormalFixed,
    Extended,
    Mixed,
}

impl AddressingMode {
    /// Length, in bytes, of the leading address-extension field.
    pub fn extension_len(self) -> usize {
        match self {
            AddressingMode::Normal | AddressingMode::NormalFixed => 0,
            AddressingMode::Extended | AddressingMode::Mixed => 1,
        }
    }

    /// Maximum ISO-TP payload bytes a single CAN frame of `format` can
    /// carry once the address extension is accounted for.
    pub fn max_payload(self, format: CanFormat) -> Result<usize> {
        let can_dl = format.max_datalen();
        let ae_len = self.extension_len();
        if can_dl <= ae_len {
            return Err(IsoTpError::Fault);
        }
        Ok(can_dl - ae_len)
    }

    /// Write the address-extension byte at the front of `frame`, if this
    /// mode carries one. Returns the number of bytes written (0 or 1).
    pub fn place_extension(self, frame: &mut [u8], byte: u8) -> usize {
        if self.extension_len() == 1 {
            frame[0] = byte;
            1
        } else {
            0
        }
    }

    /// Read the address-extension byte from the front of `frame`, if this
    /// mode carries one.
    pub fn read_extension(self, frame: &[u8]) -> Option<u8> {
        if self.extension_len() == 1 {
            frame.first().copied()
        } else {
            None
        }
    }
}
