//! Program images.
use std::{fs::File, io::Read, path::Path};

use log::debug;

use crate::{
    constants::*,
    error::{Chip8Error, Chip8Result},
};

/// A program image to be loaded into the VM at `MEM_START`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    name: String,
    data: Vec<u8>,
}

impl Rom {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Read a ROM file from disk.
    ///
    /// Files that don't fit in the program memory are rejected
    /// rather than truncated.
    pub fn from_file(filepath: impl AsRef<Path>) -> Chip8Result<Self> {
        let filepath = filepath.as_ref();
        let mut data = Vec::with_capacity(MAX_PROGRAM_SIZE);

        // Read at most one byte past the limit.
        File::open(filepath)?
            .take(MAX_PROGRAM_SIZE as u64 + 1)
            .read_to_end(&mut data)?;

        if data.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::LargeProgram);
        }

        debug!("read {} bytes from {}", data.len(), filepath.display());

        let name = filepath
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| filepath.display().to_string());

        Ok(Self::new(name, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
