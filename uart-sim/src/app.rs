//! The foreground program running on the simulated board.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::*;
use xserial::{SerialPort, Transport};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Greets, waits for one byte and reports it, then echoes everything it
/// receives until `shutdown` is raised.
pub fn run<P, const TX: usize, const RX: usize>(
    serial: &Transport<P, TX, RX>,
    shutdown: &AtomicBool,
) -> std::io::Result<()>
where
    P: SerialPort,
{
    let mut out = serial;
    writeln!(out, "Hello world")?;

    while serial.received_count() == 0 {
        if shutdown.load(Ordering::Acquire) {
            return Ok(());
        }
        thread::sleep(POLL_INTERVAL);
    }
    let c = serial.dequeue_blocking();
    info!("first byte: {:#04x}", c);
    write!(out, "you entered ")?;
    out.write_all(&[c])?;
    writeln!(out)?;

    let mut echoed = 0usize;
    while !shutdown.load(Ordering::Acquire) {
        match serial.dequeue_received() {
            Ok(byte) => {
                if !echo(serial, byte, shutdown) {
                    break;
                }
                echoed += 1;
            }
            Err(_) => thread::sleep(POLL_INTERVAL),
        }
    }

    info!("echoed {} bytes", echoed);
    Ok(())
}

/// Queues `byte`, retrying while the transmit buffer is full. Gives up once
/// the line is gone, since nothing will drain the buffer any more.
fn echo<P, const TX: usize, const RX: usize>(
    serial: &Transport<P, TX, RX>,
    byte: u8,
    shutdown: &AtomicBool,
) -> bool
where
    P: SerialPort,
{
    while serial.try_enqueue_for_send(byte).is_err() {
        if shutdown.load(Ordering::Acquire) {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use xserial::port::LoopbackPort;

    #[test]
    fn test_greets_and_reports_first_byte() {
        let port = Arc::new(LoopbackPort::<64>::new());
        let serial: Arc<Transport<Arc<LoopbackPort<64>>, 64, 64>> =
            Arc::new(Transport::new(port.clone()));
        serial.initialize();
        let shutdown = Arc::new(AtomicBool::new(false));

        serial.on_byte_received(b'Q');
        let app = {
            let serial = serial.clone();
            let shutdown = shutdown.clone();
            thread::spawn(move || run(&*serial, &shutdown))
        };

        let expected = b"Hello world\nyou entered Q\n";
        let mut wire = Vec::new();
        while wire.len() < expected.len() {
            if port.is_tx_enabled() {
                serial.on_transmit_ready();
            }
            while let Some(b) = port.pop_sent() {
                wire.push(b);
            }
            thread::yield_now();
        }

        shutdown.store(true, Ordering::Release);
        app.join().unwrap().unwrap();
        assert_eq!(wire, expected);
    }

    #[test]
    fn test_echo_gives_up_after_shutdown() {
        let port = Arc::new(LoopbackPort::<4>::new());
        let serial: Transport<Arc<LoopbackPort<4>>, 2, 2> = Transport::new(port);
        serial.initialize();

        assert!(echo(&serial, 1, &AtomicBool::new(false)));
        assert!(echo(&serial, 2, &AtomicBool::new(false)));
        assert!(!echo(&serial, 3, &AtomicBool::new(true)));
        assert_eq!(serial.transmit_count(), 2);
    }
}
