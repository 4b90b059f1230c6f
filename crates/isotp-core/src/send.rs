//! Send engine: drives the SF-or-FF-then-CF loop, honours the peer's Flow-
//! Control frames, and enforces `N_As`/`N_Bs`.

use std::time::Duration;

use crate::cf::prepare_cf;
use crate::context::Context;
use crate::error::{IsoTpError, Result};
use crate::fc::{parse_fc, FlowStatus};
use crate::ff::prepare_ff;
use crate::sf::prepare_sf;
use crate::timing::{Clock, Deadline};
use crate::transport::CanTransport;

/// Send `payload` as one ISO-TP message. See [`Context::send`].
pub(crate) fn send<T: CanTransport, C: Clock>(
    ctx: &mut Context<T, C>,
    payload: &[u8],
    timeout: Duration,
) -> Result<usize> {
    ctx.state.reset();

    if payload.len() > u32::MAX as usize {
        return Err(IsoTpError::OutOfRange);
    }

    match prepare_sf(&mut ctx.state, payload) {
        Ok(wrote) => {
            ctx.tx_frame(timeout)?;
            tracing::debug!(wrote, "sent single-frame message");
            return Ok(wrote);
        }
        Err(IsoTpError::Overflow) => {}
        Err(e) => return Err(e),
    }

    send_multi_frame(ctx, payload, timeout)
}

fn send_multi_frame<T: CanTransport, C: Clock>(
    ctx: &mut Context<T, C>,
    payload: &[u8],
    timeout: Duration,
) -> Result<usize> {
    let total_len = payload.len() as u32;
    prepare_ff(&mut ctx.state, payload, total_len)?;
    ctx.tx_frame(timeout)?;
    tracing::debug!(total_len, "sent first-frame, awaiting flow control");

    let mut fc_wait_count: u32 = 0;
    let mut deadline = Deadline::default();
    deadline.arm(ctx.clock.now_usec(), ctx.timeouts.n_as_usec);

    while ctx.state.remaining_datalen > 0 {
        if deadline.expired(ctx.clock.now_usec()) {
            tracing::warn!("timed out awaiting flow control");
            return Err(IsoTpError::TimedOut);
        }

        ctx.rx_frame(timeout)?;
        let (fs, bs, stmin_usec) = parse_fc(&mut ctx.state)?;

        match fs {
            FlowStatus::Cts => {
                fc_wait_count = 0;
                send_block(ctx, payload, bs, stmin_usec, timeout)?;
                if ctx.state.remaining_datalen > 0 {
                    deadline.arm(ctx.clock.now_usec(), ctx.timeouts.n_bs_usec);
                }
            }
            FlowStatus::Wait => {
                fc_wait_count += 1;
                if ctx.max_wait > 0 && fc_wait_count > ctx.max_wait {
                    tracing::warn!(fc_wait_count, "FC.WAIT cap exceeded");
                    return Err(IsoTpError::ConnAborted);
                }
                deadline.arm(ctx.clock.now_usec(), ctx.timeouts.n_bs_usec);
            }
            FlowStatus::Ovflw => {
                tracing::warn!("peer reported FC.OVFLW");
                return Err(IsoTpError::ConnAborted);
            }
        }
    }

    Ok(total_len as usize)
}

/// Send one block of Consecutive-Frames: `bs` of them, or until the
/// transfer completes; `bs == 0` means send the whole remainder.
fn send_block<T: CanTransport, C: Clock>(
    ctx: &mut Context<T, C>,
    payload: &[u8],
    bs: u8,
    stmin_usec: u32,
    timeout: Duration,
) -> Result<()> {
    let block_limit = if bs == 0 { u32::MAX } else { bs as u32 };
    let mut sent = 0u32;

    while sent < block_limit && ctx.state.remaining_datalen > 0 {
        prepare_cf(&mut ctx.state, payload)?;
        ctx.tx_frame(timeout)?;
        sent += 1;
        tracing::trace!(sn = ctx.state.sequence_num, remaining = ctx.state.remaining_datalen, "sent CF");

        if sent < block_limit && ctx.state.remaining_datalen > 0 {
            ctx.clock.sleep(stmin_usec as u64);
        }
    }

    Ok(())
}
