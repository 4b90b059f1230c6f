//! Flow-Control codec: the receiver's half of the handshake, plus the
//! STmin microsecond <-> byte conversion (ISO 15765-2:2016 table 20).

use crate::can::pad_frame;
use crate::error::{IsoTpError, Result};
use crate::state::CodecState;

const FC_PCI: u8 = 0x30;
const PCI_MASK: u8 = 0xf0;

/// Flow status sub-code of a Flow-Control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    /// Clear To Send: the receiver is ready for the next block of CFs.
    Cts,
    /// Wait: the receiver needs more time before the next block.
    Wait,
    /// Overflow: the receiver cannot accept the declared message length.
    Ovflw,
}

impl FlowStatus {
    fn to_nibble(self) -> u8 {
        match self {
            FlowStatus::Cts => 0,
            FlowStatus::Wait => 1,
            FlowStatus::Ovflw => 2,
        }
    }

    fn from_nibble(nibble: u8) -> Result<Self> {
        match nibble {
            0 => Ok(FlowStatus::Cts),
            1 => Ok(FlowStatus::Wait),
            2 => Ok(FlowStatus::Ovflw),
            _ => Err(IsoTpError::BadMessage),
        }
    }
}

/// Encode a separation time, in microseconds, into the single STmin byte.
///
/// Values are clamped to what the encoding can represent; anything at or
/// beyond the 127ms range ceiling saturates to the `0x7F` cap rather than
/// erroring, since STmin is advisory and a sender may request any value.
pub fn encode_stmin(usec: u32) -> u8 {
    if usec < 100 {
        0x00
    } else if usec < 1_000 {
        0xf0 + (usec / 100) as u8
    } else if usec < 127_000 {
        (usec / 1_000) as u8
    } else {
        0x7f
    }
}

/// Decode an STmin byte into microseconds. Reserved byte values (the
/// `0x80..=0xf0` and `0xfa..=0xff` ranges) decode to the 127ms cap, per
/// the table's "treat as maximum" guidance for reserved codes.
pub fn decode_stmin(byte: u8) -> u32 {
    match byte {
        0x00 => 0,
        0x01..=0x7f => byte as u32 * 1_000,
        0xf1..=0xf9 => (byte - 0xf0) as u32 * 100,
        _ => 127_000,
    }
}

/// Build a Flow-Control frame announcing `fs`, block size `bs`, and the
/// separation time `stmin_usec`. Returns the frame length (after padding).
pub fn prepare_fc(state: &mut CodecState, fs: FlowStatus, bs: u8, stmin_usec: u32) -> Result<usize> {
    let ae_len = state.ae_len();
    if ae_len == 1 {
        state.frame[0] = state.address_extension;
    }
    state.frame[ae_len] = FC_PCI | fs.to_nibble();
    state.frame[ae_len + 1] = bs;
    state.frame[ae_len + 2] = encode_stmin(stmin_usec);

    let written_len = ae_len + 3;
    state.frame_len = pad_frame(state.format, &mut state.frame, written_len)?;
    Ok(state.frame_len)
}

/// Parse a Flow-Control frame out of `state`'s scratch buffer. Returns the
/// decoded flow status, block size, and separation time in microseconds.
pub fn parse_fc(state: &mut CodecState) -> Result<(FlowStatus, u8, u32)> {
    let ae_len = state.ae_len();
    if state.frame_len < ae_len + 3 {
        return Err(IsoTpError::MsgSize);
    }
    if state.frame[ae_len] & PCI_MASK != FC_PCI {
        return Err(IsoTpError::NoMessage);
    }

    let fs = FlowStatus::from_nibble(state.frame[ae_len] & 0x0f)?;
    let bs = state.frame[ae_len + 1];
    let stmin_usec = decode_stmin(state.frame[ae_len + 2]);

    if ae_len == 1 {
        state.address_extension = state.frame[0];
    }

    Ok((fs, bs, stmin_usec))
}
