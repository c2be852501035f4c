use core::fmt;

/// The expected, recoverable outcomes of a transport operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The transmit buffer has no free slot.
    BufferFull,
    /// The receive buffer has nothing pending.
    BufferEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub const fn new(kind: ErrorKind) -> Self {
        Error { kind }
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::BufferFull => write!(f, "Transmit buffer full"),
            ErrorKind::BufferEmpty => write!(f, "Receive buffer empty"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl From<Error> for std::io::Error {
    fn from(err: Error) -> std::io::Error {
        // Both kinds mean "try again once the other context has run".
        std::io::Error::new(std::io::ErrorKind::WouldBlock, err)
    }
}

pub type Result<T> = core::result::Result<T, Error>;
