use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::*;
use tokio::sync::{Notify, mpsc};
use xserial::SerialPort;

/// Simulated UART register block.
///
/// `send_byte` pushes onto the wire channel; the enable lines are plain
/// flags polled by the interrupt tasks.
#[derive(Debug)]
pub struct SimPort {
    wire: mpsc::UnboundedSender<u8>,
    tx_enabled: AtomicBool,
    rx_enabled: AtomicBool,
    tx_kick: Notify,
    sent: AtomicUsize,
}

impl SimPort {
    pub fn new(wire: mpsc::UnboundedSender<u8>) -> Self {
        Self {
            wire,
            tx_enabled: AtomicBool::new(false),
            rx_enabled: AtomicBool::new(false),
            tx_kick: Notify::new(),
            sent: AtomicUsize::new(0),
        }
    }

    pub fn is_tx_enabled(&self) -> bool {
        self.tx_enabled.load(Ordering::Acquire)
    }

    pub fn is_rx_enabled(&self) -> bool {
        self.rx_enabled.load(Ordering::Acquire)
    }

    /// Resolves once the transmit line has been raised.
    pub async fn tx_enabled(&self) {
        while !self.is_tx_enabled() {
            self.tx_kick.notified().await;
        }
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }
}

impl SerialPort for SimPort {
    fn send_byte(&self, byte: u8) {
        if self.wire.send(byte).is_err() {
            warn!("wire closed, byte {:#04x} lost", byte);
            return;
        }
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    fn set_tx_enabled(&self, enabled: bool) {
        self.tx_enabled.store(enabled, Ordering::Release);
        if enabled {
            self.tx_kick.notify_one();
        }
    }

    fn set_rx_enabled(&self, enabled: bool) {
        debug!("rx {}", if enabled { "enabled" } else { "disabled" });
        self.rx_enabled.store(enabled, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_byte_reaches_wire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let port = SimPort::new(tx);

        port.send_byte(0x42);
        assert_eq!(rx.recv().await, Some(0x42));
        assert_eq!(port.sent(), 1);
    }

    #[tokio::test]
    async fn test_tx_enable_wakes_waiter() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let port = SimPort::new(tx);

        port.set_tx_enabled(true);
        port.tx_enabled().await;
        assert!(port.is_tx_enabled());
    }
}
