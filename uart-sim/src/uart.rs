use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use log::*;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use xserial::Transport;

use crate::port::SimPort;

pub type SimSerial = Transport<SimPort>;

/// Time to shift one 8N1 frame (start + 8 data + stop bits) at `baud`.
///
/// `baud` must be non-zero; the command line rejects zero before it gets here.
pub fn byte_time(baud: u32) -> Duration {
    Duration::from_nanos(10 * 1_000_000_000 / u64::from(baud))
}

/// Counters the simulated peripheral keeps outside the transport.
#[derive(Debug, Default)]
pub struct UartStats {
    pub received: AtomicUsize,
    pub ignored: AtomicUsize,
}

/// The peripheral side of one simulated UART.
///
/// Each task below stands in for one interrupt source; the transport sees
/// them exactly as it would see hardware handlers.
pub struct UartSim {
    serial: Arc<SimSerial>,
    byte_time: Duration,
    stats: Arc<UartStats>,
    shutdown: Arc<AtomicBool>,
}

impl UartSim {
    pub fn new(serial: Arc<SimSerial>, baud: u32, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            serial,
            byte_time: byte_time(baud),
            stats: Arc::new(UartStats::default()),
            shutdown,
        }
    }

    pub fn stats(&self) -> Arc<UartStats> {
        self.stats.clone()
    }

    /// Drives the line over `stream` until the peer hangs up.
    pub async fn run<S>(self, stream: S, wire: mpsc::UnboundedReceiver<u8>)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);

        let tx_irq = tokio::spawn(Self::transmit_interrupts(self.serial.clone(), self.byte_time));
        let line_out = tokio::spawn(Self::wire_out(wire, writer));

        let stats = self.stats.clone();
        Self::receive_interrupts(self.serial.clone(), reader, self.byte_time, stats).await;

        self.shutdown.store(true, Ordering::Release);
        tx_irq.abort();
        line_out.abort();
        debug!("line shut down");
    }

    /// "Transmit register empty" interrupt: fires once per byte time while
    /// the transmit line is enabled.
    async fn transmit_interrupts(serial: Arc<SimSerial>, byte_time: Duration) {
        let mut tick = time::interval(byte_time);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            serial.port().tx_enabled().await;
            tick.tick().await;
            serial.on_transmit_ready();
        }
    }

    /// "Receive data available" interrupt: one call per byte arriving on
    /// the wire, paced at the line rate.
    async fn receive_interrupts<R>(
        serial: Arc<SimSerial>,
        mut reader: R,
        byte_time: Duration,
        stats: Arc<UartStats>,
    )
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 256];
        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => {
                    info!("Peer closed the line");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    error!("Line read error: {}", e);
                    break;
                }
            };

            for &byte in &buf[..n] {
                time::sleep(byte_time).await;
                if serial.port().is_rx_enabled() {
                    stats.received.fetch_add(1, Ordering::Relaxed);
                    serial.on_byte_received(byte);
                } else {
                    stats.ignored.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Shifts bytes handed to `send_byte` out onto the socket.
    async fn wire_out<W>(mut wire: mpsc::UnboundedReceiver<u8>, mut writer: W)
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(byte) = wire.recv().await {
            if let Err(e) = writer.write_all(&[byte]).await {
                error!("Line write error: {}", e);
                break;
            }
            let _ = writer.flush().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_time() {
        assert_eq!(byte_time(9600), Duration::from_nanos(1_041_666));
        assert_eq!(byte_time(1_000_000), Duration::from_micros(10));
    }

    #[tokio::test]
    async fn test_round_trip_over_duplex() {
        let (wire_tx, wire_rx) = mpsc::unbounded_channel();
        let serial = Arc::new(SimSerial::new(SimPort::new(wire_tx)));
        serial.initialize();

        let shutdown = Arc::new(AtomicBool::new(false));
        let sim = UartSim::new(serial.clone(), 1_000_000, shutdown.clone());
        let stats = sim.stats();

        let (local, mut remote) = tokio::io::duplex(64);
        let line = tokio::spawn(sim.run(local, wire_rx));

        serial.write(b"hi").unwrap();
        let mut out = [0u8; 2];
        remote.read_exact(&mut out).await.unwrap();
        assert_eq!(&out, b"hi");

        remote.write_all(b"ok").await.unwrap();
        while serial.received_count() < 2 {
            time::sleep(Duration::from_millis(1)).await;
        }
        let mut back = [0u8; 2];
        assert_eq!(serial.read(&mut back), Ok(2));
        assert_eq!(&back, b"ok");

        drop(remote);
        line.await.unwrap();
        assert!(shutdown.load(Ordering::Acquire));
        assert_eq!(stats.received.load(Ordering::Relaxed), 2);
    }
}
