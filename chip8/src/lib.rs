mod bytecode;
mod clock;
pub mod constants;
mod cpu;
mod devices;
mod disasm;
mod error;
mod interp;
mod rom;
mod vm;

pub use self::{
    bytecode::{Instr, Opcode},
    clock::Hz,
    cpu::Keypad,
    devices::{Control, Devices, InvalidKeyCode, KeyCode},
    error::{Chip8Error, Chip8Result},
    interp::Flow,
    rom::Rom,
};

/// Borrowed view of the 64x32 monochrome display, row major.
pub type Chip8DisplayBuffer<'a> = &'a [bool; constants::DISPLAY_BUFFER_SIZE];

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        disasm::Disassembler,
        error::{Chip8Error, Chip8Result},
        vm::{Chip8Conf, Chip8Vm},
        Control, Devices, Flow, KeyCode, Keypad, Rom,
    };
}
