//! Buffer management for the serial transport.
//!
//! A single [`RingBuffer`] type backs both directions of a line: the
//! transmit buffer (filled by the foreground, drained by the transmit
//! interrupt) and the receive buffer (filled by the receive interrupt,
//! drained by the foreground).

mod ring;

pub use ring::RingBuffer;
