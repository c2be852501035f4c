//! # XSerial - Interrupt-Driven UART Transport
//!
//! XSerial is a `no_std` serial transport that decouples the byte-level
//! transmit/receive interrupts of a UART from the application's read and
//! write calls:
//!
//! - **Lock-free buffering**: one single-producer/single-consumer ring
//!   buffer per direction, shared between interrupt and main loop by `&`
//! - **Edge-triggered transmit**: the first queued byte starts the
//!   hardware, the transmit interrupt drains the buffer and stops it again
//! - **Pluggable hardware**: any driver implementing [`SerialPort`] works,
//!   including plain function pointers ([`port::FnHooks`])
//! - **Blocking or non-blocking send**, chosen per line
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Application (foreground)                 │
//! │   enqueue_for_send / write        dequeue_received / read │
//! ├───────────────────────────┬──────────────────────────────┤
//! │      tx RingBuffer        │        rx RingBuffer         │
//! │   + armed flag            │                              │
//! ├───────────────────────────┴──────────────────────────────┤
//! │              UART driver (interrupt context)             │
//! │   on_transmit_ready ─▶ send_byte     on_byte_received    │
//! │   set_tx_enabled / set_rx_enabled                        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use xserial::{port::FnHooks, Transport};
//!
//! static COM1: Transport<FnHooks> =
//!     Transport::new(FnHooks::new(uart1_send, uart1_enable_tx, uart1_enable_rx));
//!
//! fn main() {
//!     COM1.initialize();
//!     COM1.write(b"Hello world\n").ok();
//!     let c = COM1.dequeue_blocking();
//! }
//!
//! #[interrupt]
//! fn USART1_TXE() {
//!     COM1.on_transmit_ready();
//! }
//!
//! #[interrupt]
//! fn USART1_RXNE() {
//!     COM1.on_byte_received(uart1_read_data());
//! }
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(feature = "std", test))]
#[cfg_attr(test, macro_use)]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod buffer;
pub mod config;
pub mod error;
pub mod io;
pub mod port;
pub mod transport;

// Re-export commonly used types
pub use buffer::RingBuffer;
pub use config::{SendPolicy, SerialConfig};
pub use error::{Error, ErrorKind, Result};
pub use port::SerialPort;
pub use transport::Transport;

/// Default transmit buffer capacity. Must be a power of two.
pub const DEFAULT_TX_CAPACITY: usize = 128;

/// Default receive buffer capacity. Must be a power of two.
pub const DEFAULT_RX_CAPACITY: usize = 128;
