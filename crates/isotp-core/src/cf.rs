//! Consecutive-Frame codec: carries the payload bytes that follow a
//! First-Frame, each one tagged with a 4-bit sequence number that wraps
//! `15 -> 0`.

use crate::can::pad_frame;
use crate::error::{IsoTpError, Result};
use crate::state::CodecState;

const CF_PCI: u8 = 0x20;
const PCI_MASK: u8 = 0xf0;

/// Build the next Consecutive-Frame for the transfer `state` is carrying.
/// `payload` is the full message being sent; the byte range copied is
/// derived from `state`'s `total_datalen`/`remaining_datalen` bookkeeping.
/// Returns the frame length (after padding).
pub fn prepare_cf(state: &mut CodecState, payload: &[u8]) -> Result<usize> {
    let ae_len = state.ae_len();
    let max_payload = state.mode.max_payload(state.format)?;
    let header_len = ae_len + 1;
    let available = max_payload.checked_sub(1).ok_or(IsoTpError::Fault)?;

    let offset = (state.total_datalen - state.remaining_datalen) as usize;
    let copy_len = available.min(state.remaining_datalen as usize);
    if offset + copy_len > payload.len() {
        return Err(IsoTpError::Invalid);
    }

    if ae_len == 1 {
        state.frame[0] = state.address_extension;
    }
    state.frame[ae_len] = CF_PCI | (state.sequence_num & 0x0f);
    state.frame[header_len..header_len + copy_len]
        .copy_from_slice(&payload[offset..offset + copy_len]);

    let written_len = header_len + copy_len;
    state.frame_len = pad_frame(state.format, &mut state.frame, written_len)?;

    state.remaining_datalen -= copy_len as u32;
    state.sequence_num = (state.sequence_num + 1) % 16;

    Ok(state.frame_len)
}

/// Parse a Consecutive-Frame out of `state`'s scratch buffer, copying its
/// payload bytes into `out` at the position the in-flight transfer has
/// reached. Returns the number of bytes copied.
///
/// A frame whose PCI nibble is not `0x2` is treated as noise tolerated
/// during the CF loop: it is silently ignored, returning `0` with no state
/// change. A frame carrying the wrong sequence number aborts the transfer.
pub fn parse_cf(state: &mut CodecState, out: &mut [u8]) -> Result<usize> {
    if (state.total_datalen as usize) > out.len() {
        return Err(IsoTpError::NoBufferSpace);
    }

    let ae_len = state.ae_len();
    if state.frame_len <= ae_len {
        return Ok(0);
    }
    if state.frame[ae_len] & PCI_MASK != CF_PCI {
        return Ok(0);
    }

    let sn = state.frame[ae_len] & 0x0f;
    if sn != state.sequence_num {
        return Err(IsoTpError::ConnAborted);
    }

    if ae_len == 1 {
        state.address_extension = state.frame[0];
    }

    let header_len = ae_len + 1;
    let available = state.frame_len.saturating_sub(header_len);
    let copy_len = available.min(state.remaining_datalen as usize);
    let offset = (state.total_datalen - state.remaining_datalen) as usize;
    out[offset..offset + copy_len].copy_from_slice(&state.frame[header_len..header_len + copy_len]);

    state.remaining_datalen -= copy_len as u32;
    state.sequence_num = (state.sequence_num + 1) % 16;

    Ok(copy_len)
}
