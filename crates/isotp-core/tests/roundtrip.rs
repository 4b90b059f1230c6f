//! End-to-end `send`/`recv` round trips over an in-memory loopback
//! transport, covering the concrete scenarios from the protocol spec.

use std::sync::mpsc;
use std::time::Duration;

use isotp_core::can::CanFormat;
use isotp_core::context::Context;
use isotp_core::error::{IsoTpError, Result};
use isotp_core::timing::{SystemClock, Timeouts};
use isotp_core::transport::CanTransport;
use isotp_core::AddressingMode;

/// One half of a simulated CAN bus: frames sent on `outbound` are
/// delivered to the peer's `inbound`.
struct ChannelTransport {
    outbound: mpsc::Sender<Vec<u8>>,
    inbound: mpsc::Receiver<Vec<u8>>,
}

impl CanTransport for ChannelTransport {
    fn send(&mut self, frame: &[u8], _timeout: Duration) -> Result<usize> {
        self.outbound
            .send(frame.to_vec())
            .map_err(|_| IsoTpError::Transport("peer disconnected".into()))?;
        Ok(frame.len())
    }

    fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let frame = self
            .inbound
            .recv_timeout(timeout)
            .map_err(|_| IsoTpError::Transport("no frame arrived before timeout".into()))?;
        buf[..frame.len()].copy_from_slice(&frame);
        Ok(frame.len())
    }
}

fn channel_pair() -> (ChannelTransport, ChannelTransport) {
    let (tx_a, rx_a) = mpsc::channel();
    let (tx_b, rx_b) = mpsc::channel();
    (
        ChannelTransport {
            outbound: tx_a,
            inbound: rx_b,
        },
        ChannelTransport {
            outbound: tx_b,
            inbound: rx_a,
        },
    )
}

fn context_pair(
    format: CanFormat,
    mode: AddressingMode,
) -> (
    Context<ChannelTransport, SystemClock>,
    Context<ChannelTransport, SystemClock>,
) {
    let (sender_transport, receiver_transport) = channel_pair();
    let sender = Context::new(
        format,
        mode,
        0,
        Timeouts::default(),
        sender_transport,
        SystemClock::new(),
    );
    let receiver = Context::new(
        format,
        mode,
        0,
        Timeouts::default(),
        receiver_transport,
        SystemClock::new(),
    );
    (sender, receiver)
}

#[test]
fn single_frame_round_trip() {
    let (mut sender, mut receiver) = context_pair(CanFormat::Classic, AddressingMode::Normal);
    let payload = [0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6];

    let handle = std::thread::spawn(move || sender.send(&payload, Duration::from_secs(1)));

    let mut out = [0u8; 7];
    let received = receiver.recv(&mut out, 8, 0, Duration::from_secs(1)).unwrap();
    let sent = handle.join().unwrap().unwrap();

    assert_eq!(sent, 7);
    assert_eq!(received, 7);
    assert_eq!(out, payload);
}

#[test]
fn multi_frame_round_trip_twenty_bytes() {
    let (mut sender, mut receiver) = context_pair(CanFormat::Classic, AddressingMode::Normal);
    let payload = [0xAAu8; 20];

    let handle = std::thread::spawn(move || sender.send(&payload, Duration::from_secs(1)));

    let mut out = [0u8; 20];
    let received = receiver.recv(&mut out, 0, 0, Duration::from_secs(1)).unwrap();
    let sent = handle.join().unwrap().unwrap();

    assert_eq!(sent, 20);
    assert_eq!(received, 20);
    assert_eq!(out, [0xAAu8; 20]);
}

#[test]
fn multi_frame_round_trip_honours_small_block_size() {
    let (mut sender, mut receiver) = context_pair(CanFormat::Classic, AddressingMode::Normal);
    let payload: Vec<u8> = (0u8..100).collect();
    let expected = payload.clone();

    let handle = std::thread::spawn(move || sender.send(&payload, Duration::from_secs(1)));

    let mut out = [0u8; 100];
    let received = receiver.recv(&mut out, 2, 0, Duration::from_secs(1)).unwrap();
    let sent = handle.join().unwrap().unwrap();

    assert_eq!(sent, 100);
    assert_eq!(received, 100);
    assert_eq!(&out[..], &expected[..]);
}

#[test]
fn round_trip_with_extended_addressing() {
    let (mut sender, mut receiver) = context_pair(CanFormat::Classic, AddressingMode::Extended);
    sender.set_address_extension(0x42);
    receiver.set_address_extension(0x42);
    let payload: Vec<u8> = (0u8..50).collect();
    let expected = payload.clone();

    let handle = std::thread::spawn(move || sender.send(&payload, Duration::from_secs(1)));

    let mut out = [0u8; 50];
    let received = receiver.recv(&mut out, 0, 0, Duration::from_secs(1)).unwrap();
    let sent = handle.join().unwrap().unwrap();

    assert_eq!(sent, 50);
    assert_eq!(received, 50);
    assert_eq!(&out[..], &expected[..]);
}

#[test]
fn large_message_round_trips_over_the_escaped_first_frame() {
    let (mut sender, mut receiver) = context_pair(CanFormat::Fd, AddressingMode::Normal);
    let payload: Vec<u8> = (0..5000u32).map(|i| (i % 256) as u8).collect();
    let expected = payload.clone();

    let handle = std::thread::spawn(move || sender.send(&payload, Duration::from_secs(2)));

    let mut out = vec![0u8; 5000];
    let received = receiver.recv(&mut out, 0, 0, Duration::from_secs(2)).unwrap();
    let sent = handle.join().unwrap().unwrap();

    assert_eq!(sent, 5000);
    assert_eq!(received, 5000);
    assert_eq!(out, expected);
}
