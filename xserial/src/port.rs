//! Hardware port abstraction.
//!
//! This module provides the `SerialPort` trait through which the transport
//! drives the UART peripheral, plus two implementations:
//!
//! - `FnHooks`: plain function pointers, any of which may be left unbound
//!   while the board is still being wired up
//! - `LoopbackPort`: in-memory wire for testing, every byte sent can be
//!   looped straight back into the receive path
//!
//! # Example
//!
//! ```rust,ignore
//! use xserial::port::FnHooks;
//! use xserial::Transport;
//!
//! static COM1: Transport<FnHooks> =
//!     Transport::new(FnHooks::new(uart1_send, uart1_enable_tx, uart1_enable_rx));
//! ```

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::buffer::RingBuffer;
use crate::transport::Transport;

/// The primitives a UART driver must supply.
///
/// Methods take `&self` because they are invoked from both the foreground
/// and the interrupt context.
pub trait SerialPort {
    /// Writes one byte to the transmit register.
    ///
    /// The peripheral must later signal "ready for next byte", which the
    /// driver forwards to [`Transport::on_transmit_ready`].
    fn send_byte(&self, byte: u8);

    /// Arms or disarms the transmit interrupt path. Must be idempotent.
    fn set_tx_enabled(&self, enabled: bool);

    /// Arms or disarms the receive interrupt path. Must be idempotent.
    fn set_rx_enabled(&self, enabled: bool);

    /// Returns false while `send_byte` is not wired to the hardware.
    fn can_send(&self) -> bool {
        true
    }
}

impl<P: SerialPort + ?Sized> SerialPort for &P {
    fn send_byte(&self, byte: u8) {
        (**self).send_byte(byte)
    }

    fn set_tx_enabled(&self, enabled: bool) {
        (**self).set_tx_enabled(enabled)
    }

    fn set_rx_enabled(&self, enabled: bool) {
        (**self).set_rx_enabled(enabled)
    }

    fn can_send(&self) -> bool {
        (**self).can_send()
    }
}

#[cfg(feature = "alloc")]
impl<P: SerialPort + ?Sized> SerialPort for alloc::sync::Arc<P> {
    fn send_byte(&self, byte: u8) {
        (**self).send_byte(byte)
    }

    fn set_tx_enabled(&self, enabled: bool) {
        (**self).set_tx_enabled(enabled)
    }

    fn set_rx_enabled(&self, enabled: bool) {
        (**self).set_rx_enabled(enabled)
    }

    fn can_send(&self) -> bool {
        (**self).can_send()
    }
}

/// A port made of bare function pointers.
///
/// Unbound enable hooks are silently skipped. An unbound `send_byte` makes
/// [`SerialPort::can_send`] report false.
#[derive(Debug, Clone, Copy, Default)]
pub struct FnHooks {
    pub send_byte: Option<fn(u8)>,
    pub set_tx_enabled: Option<fn(bool)>,
    pub set_rx_enabled: Option<fn(bool)>,
}

impl FnHooks {
    /// Creates a port with every hook bound.
    pub const fn new(
        send_byte: fn(u8),
        set_tx_enabled: fn(bool),
        set_rx_enabled: fn(bool),
    ) -> Self {
        Self {
            send_byte: Some(send_byte),
            set_tx_enabled: Some(set_tx_enabled),
            set_rx_enabled: Some(set_rx_enabled),
        }
    }

    /// Creates a port with no hooks bound.
    pub const fn unbound() -> Self {
        Self {
            send_byte: None,
            set_tx_enabled: None,
            set_rx_enabled: None,
        }
    }

    pub const fn with_send_byte(mut self, hook: fn(u8)) -> Self {
        self.send_byte = Some(hook);
        self
    }

    pub const fn with_tx_enable(mut self, hook: fn(bool)) -> Self {
        self.set_tx_enabled = Some(hook);
        self
    }

    pub const fn with_rx_enable(mut self, hook: fn(bool)) -> Self {
        self.set_rx_enabled = Some(hook);
        self
    }
}

impl SerialPort for FnHooks {
    fn send_byte(&self, byte: u8) {
        if let Some(hook) = self.send_byte {
            hook(byte);
        }
    }

    fn set_tx_enabled(&self, enabled: bool) {
        if let Some(hook) = self.set_tx_enabled {
            hook(enabled);
        }
    }

    fn set_rx_enabled(&self, enabled: bool) {
        if let Some(hook) = self.set_rx_enabled {
            hook(enabled);
        }
    }

    fn can_send(&self) -> bool {
        self.send_byte.is_some()
    }
}

/// A loopback port for testing.
///
/// Bytes handed to `send_byte` land on an in-memory wire of capacity `N`;
/// [`LoopbackPort::service`] plays the role of the UART peripheral and its
/// interrupt controller.
#[derive(Debug)]
pub struct LoopbackPort<const N: usize> {
    wire: RingBuffer<N>,
    tx_enabled: AtomicBool,
    rx_enabled: AtomicBool,
    tx_enables: AtomicUsize,
    tx_disables: AtomicUsize,
    rx_enables: AtomicUsize,
    lost: AtomicUsize,
}

impl<const N: usize> LoopbackPort<N> {
    /// Creates a new loopback port with both paths disabled.
    pub const fn new() -> Self {
        Self {
            wire: RingBuffer::new(),
            tx_enabled: AtomicBool::new(false),
            rx_enabled: AtomicBool::new(false),
            tx_enables: AtomicUsize::new(0),
            tx_disables: AtomicUsize::new(0),
            rx_enables: AtomicUsize::new(0),
            lost: AtomicUsize::new(0),
        }
    }

    pub fn is_tx_enabled(&self) -> bool {
        self.tx_enabled.load(Ordering::Acquire)
    }

    pub fn is_rx_enabled(&self) -> bool {
        self.rx_enabled.load(Ordering::Acquire)
    }

    /// Number of `set_tx_enabled(true)` calls seen.
    pub fn tx_enable_count(&self) -> usize {
        self.tx_enables.load(Ordering::Relaxed)
    }

    /// Number of `set_tx_enabled(false)` calls seen.
    pub fn tx_disable_count(&self) -> usize {
        self.tx_disables.load(Ordering::Relaxed)
    }

    /// Number of `set_rx_enabled(true)` calls seen.
    pub fn rx_enable_count(&self) -> usize {
        self.rx_enables.load(Ordering::Relaxed)
    }

    /// Bytes sent while the wire was full.
    pub fn lost(&self) -> usize {
        self.lost.load(Ordering::Relaxed)
    }

    /// Returns the number of bytes on the wire.
    pub fn in_flight(&self) -> usize {
        self.wire.len()
    }

    /// Takes the oldest byte off the wire.
    pub fn pop_sent(&self) -> Option<u8> {
        self.wire.pop()
    }

    /// Takes everything currently on the wire.
    pub fn take_sent(&self) -> heapless::Vec<u8, N> {
        let mut out = heapless::Vec::new();
        while let Some(byte) = self.wire.pop() {
            // The wire never holds more than N bytes.
            let _ = out.push(byte);
        }
        out
    }

    /// Runs the peripheral until the transmit path goes idle.
    ///
    /// Fires `on_transmit_ready` for as long as transmit stays enabled and
    /// loops every byte that reaches the wire back through
    /// `on_byte_received` while receive is enabled. Returns the number of
    /// bytes looped back. `transport` must be bound to this port.
    pub fn service<P, const TX: usize, const RX: usize>(
        &self,
        transport: &Transport<P, TX, RX>,
    ) -> usize
    where
        P: SerialPort,
    {
        let mut looped = 0;
        while self.is_tx_enabled() {
            transport.on_transmit_ready();
            looped += self.deliver(transport);
        }
        looped + self.deliver(transport)
    }

    fn deliver<P, const TX: usize, const RX: usize>(
        &self,
        transport: &Transport<P, TX, RX>,
    ) -> usize
    where
        P: SerialPort,
    {
        let mut delivered = 0;
        while self.is_rx_enabled() {
            match self.wire.pop() {
                Some(byte) => {
                    transport.on_byte_received(byte);
                    delivered += 1;
                }
                None => break,
            }
        }
        delivered
    }
}

impl<const N: usize> Default for LoopbackPort<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SerialPort for LoopbackPort<N> {
    fn send_byte(&self, byte: u8) {
        if !self.wire.push(byte) {
            self.lost.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn set_tx_enabled(&self, enabled: bool) {
        let counter = if enabled { &self.tx_enables } else { &self.tx_disables };
        counter.fetch_add(1, Ordering::Relaxed);
        self.tx_enabled.store(enabled, Ordering::Release);
    }

    fn set_rx_enabled(&self, enabled: bool) {
        if enabled {
            self.rx_enables.fetch_add(1, Ordering::Relaxed);
        }
        self.rx_enabled.store(enabled, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicU8;

    static LAST_SENT: AtomicU8 = AtomicU8::new(0);
    static TX_LINE: AtomicBool = AtomicBool::new(false);

    fn send(byte: u8) {
        LAST_SENT.store(byte, Ordering::SeqCst);
    }

    fn tx_line(enabled: bool) {
        TX_LINE.store(enabled, Ordering::SeqCst);
    }

    #[test]
    fn test_fn_hooks_unbound() {
        let hooks = FnHooks::unbound();
        assert!(!hooks.can_send());

        // Unbound enable hooks are no-ops
        hooks.set_tx_enabled(true);
        hooks.set_rx_enabled(true);
    }

    #[test]
    fn test_fn_hooks_bound() {
        let hooks = FnHooks::unbound().with_send_byte(send).with_tx_enable(tx_line);
        assert!(hooks.can_send());

        hooks.send_byte(0x5A);
        assert_eq!(LAST_SENT.load(Ordering::SeqCst), 0x5A);

        hooks.set_tx_enabled(true);
        assert!(TX_LINE.load(Ordering::SeqCst));
        hooks.set_tx_enabled(false);
        assert!(!TX_LINE.load(Ordering::SeqCst));
    }

    #[test]
    fn test_loopback_wire() {
        let port: LoopbackPort<4> = LoopbackPort::new();
        for b in b"abcde" {
            port.send_byte(*b);
        }
        assert_eq!(port.lost(), 1);
        assert_eq!(port.take_sent().as_slice(), b"abcd");
        assert_eq!(port.in_flight(), 0);
    }

    #[test]
    fn test_loopback_counts_enables() {
        let port: LoopbackPort<4> = LoopbackPort::new();
        port.set_tx_enabled(true);
        port.set_tx_enabled(false);
        port.set_rx_enabled(true);

        assert_eq!(port.tx_enable_count(), 1);
        assert_eq!(port.tx_disable_count(), 1);
        assert_eq!(port.rx_enable_count(), 1);
        assert!(!port.is_tx_enabled());
        assert!(port.is_rx_enabled());
    }
}
