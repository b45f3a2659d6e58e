//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    io,
};

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug)]
pub enum Chip8Error {
    /// VM fault during the interpreter loop, such as a call stack overflow.
    Runtime(&'static str),
    /// Attempt to load a ROM that can't fit in memory.
    LargeProgram,
    /// Font data of the wrong size.
    Font(String),
    Io(io::Error),
    Fmt(fmt::Error),
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime(msg) => write!(f, "runtime error: {}", msg),
            Self::LargeProgram => write!(f, "program too large for VM memory"),
            Self::Font(msg) => write!(f, "font error: {}", msg),
            Self::Io(err) => write!(f, "{}", err),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Chip8Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Fmt(err) => Some(err),
            _ => None,
        }
    }
}

impl From<fmt::Error> for Chip8Error {
    fn from(err: fmt::Error) -> Self {
        Chip8Error::Fmt(err)
    }
}

impl From<io::Error> for Chip8Error {
    fn from(err: io::Error) -> Self {
        Chip8Error::Io(err)
    }
}
