//! Interrupt-driven serial transport.
//!
//! A [`Transport`] owns the transmit and receive ring buffers of one serial
//! line and the transmit-armed flag, and talks to the UART through a
//! [`SerialPort`]. The foreground calls [`Transport::enqueue_for_send`] and
//! [`Transport::dequeue_received`]; the UART driver's interrupt handlers
//! call [`Transport::on_transmit_ready`] and [`Transport::on_byte_received`].
//!
//! Transmit path states:
//!
//! ```text
//!   Idle ──enqueue──▶ Armed ──ready/pop──▶ Draining ──last pop──▶ (disarmed)
//!    ▲                                                                │
//!    └──────────────── ready on empty buffer: set_tx_enabled(false) ──┘
//! ```
//!
//! The hardware gets one extra "ready" event after the last byte of a
//! burst, and that event is what turns the transmitter off.

use core::sync::atomic::{fence, AtomicBool, Ordering};

use crate::buffer::RingBuffer;
use crate::config::{SendPolicy, SerialConfig};
use crate::error::{Error, ErrorKind, Result};
use crate::port::SerialPort;
use crate::{DEFAULT_RX_CAPACITY, DEFAULT_TX_CAPACITY};

/// One serial line.
///
/// All operations take `&self`, so a transport can live in a `static` and
/// be shared between the main loop and interrupt handlers. The transmit
/// buffer is produced by the foreground and consumed by
/// `on_transmit_ready`; the receive buffer is produced by
/// `on_byte_received` and consumed by the foreground. Each side must stay
/// in its own context: two foreground writers, or two nested calls to the
/// same interrupt entry point, break the single-producer/single-consumer
/// discipline.
#[derive(Debug)]
pub struct Transport<
    P,
    const TX: usize = DEFAULT_TX_CAPACITY,
    const RX: usize = DEFAULT_RX_CAPACITY,
> {
    tx: RingBuffer<TX>,
    rx: RingBuffer<RX>,

    /// True while the transmit interrupt is expected to keep draining `tx`.
    tx_armed: AtomicBool,

    config: SerialConfig,
    port: P,
}

impl<P, const TX: usize, const RX: usize> Transport<P, TX, RX> {
    /// Creates a transport with the blocking send policy.
    pub const fn new(port: P) -> Self {
        Self::with_config(port, SerialConfig::new())
    }

    /// Creates a transport with an explicit configuration.
    pub const fn with_config(port: P, config: SerialConfig) -> Self {
        Self {
            tx: RingBuffer::new(),
            rx: RingBuffer::new(),
            tx_armed: AtomicBool::new(false),
            config,
            port,
        }
    }

    /// The hardware hooks this transport drives.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// The configuration fixed at construction.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Number of received bytes waiting to be read.
    pub fn received_count(&self) -> usize {
        self.rx.len()
    }

    /// Number of bytes queued but not yet handed to the hardware.
    pub fn transmit_count(&self) -> usize {
        self.tx.len()
    }

    /// Returns true while the transmit path is armed.
    ///
    /// Drivers that have a separate "transmission complete" interrupt check
    /// this after `on_transmit_ready` to know when to switch to it.
    pub fn is_tx_armed(&self) -> bool {
        self.tx_armed.load(Ordering::Acquire)
    }

    /// Takes one received byte.
    pub fn dequeue_received(&self) -> Result<u8> {
        self.rx.pop().ok_or(Error::new(ErrorKind::BufferEmpty))
    }

    /// Busy-waits until a byte has been received and returns it.
    pub fn dequeue_blocking(&self) -> u8 {
        loop {
            while self.received_count() == 0 {
                relax();
            }
            if let Some(byte) = self.rx.pop() {
                return byte;
            }
        }
    }

    /// Reads up to `buf.len()` received bytes without waiting.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut n = 0;
        while n < buf.len() {
            match self.rx.pop() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }

        if n == 0 {
            return Err(Error::new(ErrorKind::BufferEmpty));
        }
        Ok(n)
    }

    /// Busy-waits until `buf` is completely filled.
    pub fn read_exact_blocking(&self, buf: &mut [u8]) {
        for slot in buf.iter_mut() {
            *slot = self.dequeue_blocking();
        }
    }

    /// Interrupt entry point: the UART received `byte`.
    ///
    /// The byte is dropped when the receive buffer is full.
    pub fn on_byte_received(&self, byte: u8) {
        if !self.rx.push(byte) {
            log::trace!("rx buffer full, dropped {:#04x}", byte);
        }
    }
}

impl<P: SerialPort, const TX: usize, const RX: usize> Transport<P, TX, RX> {
    /// Resets both buffers, disarms transmit and enables reception.
    ///
    /// Must run before any other operation or interrupt. Calling it again
    /// discards whatever is buffered; only do so while the UART interrupts
    /// are masked.
    pub fn initialize(&self) {
        self.tx.clear();
        self.rx.clear();
        self.tx_armed.store(false, Ordering::Release);
        log::debug!(
            "serial transport initialized: tx={} rx={} policy={:?}",
            TX,
            RX,
            self.config.send_policy
        );
        self.port.set_rx_enabled(true);
    }

    /// Queues `byte` for transmission according to the configured policy.
    ///
    /// With [`SendPolicy::Blocking`] this waits for room and always succeeds;
    /// with [`SendPolicy::NonBlocking`] it fails with `BufferFull` and leaves
    /// the transport untouched.
    pub fn enqueue_for_send(&self, byte: u8) -> Result<()> {
        match self.config.send_policy {
            SendPolicy::Blocking => {
                while !self.tx.push(byte) {
                    relax();
                }
                self.arm();
                Ok(())
            }
            SendPolicy::NonBlocking => self.try_enqueue_for_send(byte),
        }
    }

    /// Queues `byte` for transmission without ever waiting.
    pub fn try_enqueue_for_send(&self, byte: u8) -> Result<()> {
        if !self.tx.push(byte) {
            return Err(Error::new(ErrorKind::BufferFull));
        }
        self.arm();
        Ok(())
    }

    /// Queues a slice for transmission.
    ///
    /// Blocking: queues every byte. Non-blocking: queues as many bytes as
    /// fit and fails with `BufferFull` only when none did.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        let mut written = 0;
        for &byte in data {
            match self.enqueue_for_send(byte) {
                Ok(()) => written += 1,
                Err(e) if written == 0 => return Err(e),
                Err(_) => break,
            }
        }
        Ok(written)
    }

    /// Busy-waits until every queued byte has been handed to the hardware.
    pub fn flush(&self) {
        while self.transmit_count() != 0 {
            relax();
        }
    }

    /// Interrupt entry point: the UART can take the next byte.
    ///
    /// Sends one queued byte, disarming once the buffer runs dry. A call on
    /// an already empty buffer switches the transmitter off.
    pub fn on_transmit_ready(&self) {
        let bound = self.port.can_send();
        debug_assert!(bound, "on_transmit_ready called without a send_byte hook");
        if !bound {
            log::error!("serial transmit interrupt with no send_byte hook bound");
            return;
        }

        match self.tx.pop() {
            Some(byte) => {
                self.port.send_byte(byte);
                if self.tx.is_empty() {
                    self.tx_armed.store(false, Ordering::Release);
                }
            }
            None => {
                self.tx_armed.store(false, Ordering::Release);
                self.port.set_tx_enabled(false);

                // A byte queued while we were switching off must not be
                // stranded behind a disabled transmitter. Pairs with the
                // fence in `arm`.
                fence(Ordering::SeqCst);
                if !self.tx.is_empty() {
                    self.tx_armed.store(true, Ordering::Release);
                    self.port.set_tx_enabled(true);
                }
            }
        }
    }

    /// Starts the hardware on the first byte queued since the last drain.
    fn arm(&self) {
        fence(Ordering::SeqCst);
        if !self.tx_armed.swap(true, Ordering::AcqRel) {
            log::trace!("tx armed");
            self.port.set_tx_enabled(true);
        }
    }
}

#[inline]
fn relax() {
    #[cfg(feature = "std")]
    std::thread::yield_now();
    #[cfg(not(feature = "std"))]
    core::hint::spin_loop();
}
