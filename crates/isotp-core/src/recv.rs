//! Receive engine: dispatches an incoming frame by PCI, drives the FC-then-
//! CF-block loop, and enforces `N_Ar`/`N_Cr`.

use std::time::Duration;

use crate::cf::parse_cf;
use crate::context::Context;
use crate::error::{IsoTpError, Result};
use crate::fc::{prepare_fc, FlowStatus};
use crate::ff::parse_ff;
use crate::sf::parse_sf;
use crate::timing::{Clock, Deadline};
use crate::transport::CanTransport;

/// Receive one ISO-TP message into `out`. See [`Context::recv`].
pub(crate) fn recv<T: CanTransport, C: Clock>(
    ctx: &mut Context<T, C>,
    out: &mut [u8],
    bs: u8,
    stmin_usec: u32,
    timeout: Duration,
) -> Result<usize> {
    ctx.state.reset();

    let mut deadline = Deadline::default();
    deadline.arm(ctx.clock.now_usec(), ctx.timeouts.n_ar_usec);
    if deadline.expired(ctx.clock.now_usec()) {
        tracing::warn!("timed out awaiting first frame");
        return Err(IsoTpError::TimedOut);
    }

    ctx.rx_frame(timeout)?;

    let ae_len = ctx.state.ae_len();
    if ctx.state.frame_len <= ae_len {
        return Err(IsoTpError::NoMessage);
    }
    let pci = ctx.state.frame[ae_len] & 0xf0;

    match pci {
        0x00 => {
            let copied = parse_sf(&mut ctx.state, out)?;
            tracing::debug!(copied, "received single-frame message");
            Ok(copied)
        }
        0x10 => match parse_ff(&mut ctx.state, out) {
            Ok(copied) => {
                tracing::debug!(total = ctx.state.total_datalen, copied, "received first-frame");
                recv_cf_blocks(ctx, out, bs, stmin_usec, timeout, copied)
            }
            Err(IsoTpError::Overflow) => {
                tracing::warn!(cap = out.len(), "first-frame exceeds receive buffer, sending FC.OVFLW");
                let _ = prepare_fc(&mut ctx.state, FlowStatus::Ovflw, bs, stmin_usec);
                ctx.tx_frame(timeout)?;
                Err(IsoTpError::ConnAborted)
            }
            Err(e) => Err(e),
        },
        _ => Err(IsoTpError::NoMessage),
    }
}

/// Receive Consecutive-Frames until the message declared by the preceding
/// First-Frame is complete, issuing a fresh `FC.CTS` at the start of every
/// block of up to `bs` frames (`bs == 0` meaning one block covers the rest
/// of the message).
fn recv_cf_blocks<T: CanTransport, C: Clock>(
    ctx: &mut Context<T, C>,
    out: &mut [u8],
    bs: u8,
    stmin_usec: u32,
    timeout: Duration,
    mut received: usize,
) -> Result<usize> {
    let block_limit = if bs == 0 { u32::MAX } else { bs as u32 };

    while ctx.state.remaining_datalen > 0 {
        prepare_fc(&mut ctx.state, FlowStatus::Cts, bs, stmin_usec)?;
        ctx.tx_frame(timeout)?;

        let mut deadline = Deadline::default();
        deadline.arm(ctx.clock.now_usec(), ctx.timeouts.n_cr_usec);

        let mut received_in_block = 0u32;
        while received_in_block < block_limit && ctx.state.remaining_datalen > 0 {
            if deadline.expired(ctx.clock.now_usec()) {
                tracing::warn!("timed out awaiting consecutive frame");
                return Err(IsoTpError::TimedOut);
            }

            ctx.rx_frame(timeout)?;
            let copied = parse_cf(&mut ctx.state, out)?;
            if copied == 0 {
                // Non-CF noise during the block: tolerated, doesn't count
                // toward the block or re-arm the deadline.
                continue;
            }

            received += copied;
            received_in_block += 1;
            tracing::trace!(sn = ctx.state.sequence_num, remaining = ctx.state.remaining_datalen, "received CF");
            deadline.arm(ctx.clock.now_usec(), ctx.timeouts.n_cr_usec);
        }
    }

    Ok(received)
}
