use core::fmt;

use crate::error::{Error, ErrorKind, Result};
use crate::port::SerialPort;
use crate::transport::Transport;

pub trait Read {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

pub trait Write {
    fn write(&mut self, buf: &[u8]) -> Result<usize>;
    fn flush(&mut self) -> Result<()>;

    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => {
                    return Err(Error::new(ErrorKind::BufferFull));
                }
                Ok(n) => buf = &buf[n..],
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl<P, const TX: usize, const RX: usize> Read for &Transport<P, TX, RX> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Transport::read(*self, buf)
    }
}

impl<P: SerialPort, const TX: usize, const RX: usize> Write for &Transport<P, TX, RX> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        Transport::write(*self, buf)
    }

    fn flush(&mut self) -> Result<()> {
        Transport::flush(*self);
        Ok(())
    }
}

// Lets `write!` target a serial line without std, the way printf sits on
// top of putchar.
impl<P: SerialPort, const TX: usize, const RX: usize> fmt::Write for &Transport<P, TX, RX> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Write::write_all(self, s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(feature = "std")]
impl<P, const TX: usize, const RX: usize> std::io::Read for &Transport<P, TX, RX> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        Ok(Transport::read(*self, buf)?)
    }
}

#[cfg(feature = "std")]
impl<P: SerialPort, const TX: usize, const RX: usize> std::io::Write for &Transport<P, TX, RX> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(Transport::write(*self, buf)?)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Transport::flush(*self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SendPolicy, SerialConfig};
    use crate::port::LoopbackPort;
    use core::fmt::Write as _;

    #[test]
    fn test_fmt_write() {
        let port: LoopbackPort<32> = LoopbackPort::new();
        let serial: Transport<&LoopbackPort<32>, 32, 32> = Transport::new(&port);
        serial.initialize();

        write!(&serial, "n={}", 42).unwrap();
        port.service(&serial);

        let mut buf = [0u8; 8];
        let n = Read::read(&mut &serial, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"n=42");
    }

    #[test]
    fn test_write_all_non_blocking_overflow() {
        let port: LoopbackPort<4> = LoopbackPort::new();
        let config = SerialConfig::new().with_send_policy(SendPolicy::NonBlocking);
        let serial: Transport<&LoopbackPort<4>, 4, 4> = Transport::with_config(&port, config);
        serial.initialize();

        let mut writer = &serial;
        let err = Write::write_all(&mut writer, b"too long").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferFull);
        assert_eq!(serial.transmit_count(), 4);
    }
}
