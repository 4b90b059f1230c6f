//! Single-Frame codec: an entire message that fits in one CAN frame.

use crate::addressing::AddressingMode;
use crate::can::{pad_frame, CanFormat};
use crate::error::{IsoTpError, Result};
use crate::state::CodecState;

const SF_PCI: u8 = 0x00;
const PCI_MASK: u8 = 0xf0;

fn no_escape_max(mode: AddressingMode) -> usize {
    match mode {
        AddressingMode::Normal | AddressingMode::NormalFixed => 7,
        AddressingMode::Extended | AddressingMode::Mixed => 6,
    }
}

/// Build a Single-Frame carrying `payload` into `state`'s scratch buffer.
/// Returns the number of payload bytes written.
pub fn prepare_sf(state: &mut CodecState, payload: &[u8]) -> Result<usize> {
    let len = payload.len();
    if len > u32::MAX as usize {
        return Err(IsoTpError::OutOfRange);
    }

    state.reset();
    let ae_len = state.ae_len();
    let max_payload = state.mode.max_payload(state.format)?;

    let header_len;
    if len <= no_escape_max(state.mode) {
        ae_len_place(state);
        state.frame[ae_len] = SF_PCI | (len as u8 & 0x0f);
        header_len = ae_len + 1;
    } else if state.format == CanFormat::Fd {
        let (lower, upper) = if ae_len == 0 {
            (8usize, max_payload.saturating_sub(2))
        } else {
            (7usize, max_payload.saturating_sub(3))
        };
        if len < lower || len > upper {
            return Err(IsoTpError::Overflow);
        }
        ae_len_place(state);
        state.frame[ae_len] = SF_PCI;
        state.frame[ae_len + 1] = len as u8;
        header_len = ae_len + 2;
    } else {
        return Err(IsoTpError::Overflow);
    }

    state.frame[header_len..header_len + len].copy_from_slice(payload);
    let written_len = header_len + len;
    state.frame_len = pad_frame(state.format, &mut state.frame, written_len)?;
    Ok(len)
}

fn ae_len_place(state: &mut CodecState) {
    if state.ae_len() == 1 {
        state.frame[0] = state.address_extension;
    }
}

/// Parse a Single-Frame out of `state`'s scratch buffer into `out`. Returns
/// the number of payload bytes copied.
pub fn parse_sf(state: &mut CodecState, out: &mut [u8]) -> Result<usize> {
    let ae_len = state.ae_len();
    if state.frame_len <= ae_len {
        return Err(IsoTpError::BadMessage);
    }
    if state.frame[ae_len] & PCI_MASK != SF_PCI {
        return Err(IsoTpError::BadMessage);
    }

    let (sf_dl, header_len) = if state.frame_len <= 8 {
        let sf_dl = (state.frame[ae_len] & 0x0f) as usize;
        let max = no_escape_max(state.mode);
        if sf_dl == 0 || sf_dl > max {
            return Err(IsoTpError::Unsupported);
        }
        (sf_dl, ae_len + 1)
    } else {
        if state.frame_len <= ae_len + 1 {
            return Err(IsoTpError::BadMessage);
        }
        let sf_dl = state.frame[ae_len + 1] as usize;
        if sf_dl <= 7 || sf_dl > state.frame_len - (ae_len + 2) {
            return Err(IsoTpError::Unsupported);
        }
        (sf_dl, ae_len + 2)
    };

    if out.len() < sf_dl {
        return Err(IsoTpError::NoBufferSpace);
    }

    if ae_len == 1 {
        state.address_extension = state.frame[0];
    }

    out[..sf_dl].copy_from_slice(&state.frame[header_len..header_len + sf_dl]);
    state.total_datalen = 0;
    state.remaining_datalen = 0;
    Ok(sf_dl)
}
