//! Loopback example.
//!
//! Wires a transport to an in-memory loopback port, writes a greeting with
//! `write!`, plays the UART interrupts by hand and reads the bytes back.
//!
//! Run with: cargo run --example loopback --features std

use std::io::{Read, Write};

use xserial::port::LoopbackPort;
use xserial::{SendPolicy, SerialConfig, Transport};

fn main() -> std::io::Result<()> {
    let port: LoopbackPort<64> = LoopbackPort::new();
    let config = SerialConfig::new().with_send_policy(SendPolicy::NonBlocking);
    let serial: Transport<&LoopbackPort<64>, 64, 64> = Transport::with_config(&port, config);
    serial.initialize();

    let mut line = &serial;
    writeln!(line, "Hello world")?;
    println!("queued {} bytes, tx armed: {}", serial.transmit_count(), serial.is_tx_armed());

    let looped = port.service(&serial);
    println!("looped back {} bytes, tx armed: {}", looped, serial.is_tx_armed());

    let mut buf = [0u8; 64];
    let n = Read::read(&mut line, &mut buf)?;
    print!("received: {}", String::from_utf8_lossy(&buf[..n]));

    // Nothing left: std::io reports WouldBlock, the native API BufferEmpty
    let err = Read::read(&mut line, &mut buf).unwrap_err();
    println!("second read: {:?} / {:?}", err.kind(), serial.dequeue_received());

    println!(
        "tx enabled {} time(s), disabled {} time(s)",
        port.tx_enable_count(),
        port.tx_disable_count()
    );
    Ok(())
}
