//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use crate::{
    bytecode::{Instr, Opcode},
    constants::*,
};

pub struct Disassembler<'a> {
    bytecode: &'a [u8],
    cursor: usize,
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self {
            bytecode,
            cursor: 0,
        }
    }

    /// Write every instruction to the given writer, one per line.
    ///
    /// Addresses are shown as they would be laid out in memory.
    pub fn disassemble<W: FmtWrite>(&mut self, w: &mut W) -> fmt::Result {
        self.cursor = 0;
        while self.cursor < self.bytecode.len() {
            self.disassemble_next(w)?;
        }
        self.cursor = 0;
        Ok(())
    }

    /// Write a single instruction to the given writer.
    fn disassemble_next<W: FmtWrite>(&mut self, w: &mut W) -> fmt::Result {
        let addr = MEM_START + self.cursor;

        match &self.bytecode[self.cursor..] {
            &[a, b, ..] => {
                let op = Opcode::from_bytes([a, b]);
                writeln!(w, "{:04X}: {:04X}  {}", addr, op, Instr::decode(op))?;
                self.cursor += 2;
            }
            &[a] => {
                // Trailing byte that doesn't make up a whole instruction.
                writeln!(w, "{:04X}: {:02X}    DB 0x{:02X}", addr, a, a)?;
                self.cursor += 1;
            }
            &[] => {}
        }

        Ok(())
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instr::*;

        match *self {
            Sys(nnn) => write!(f, "SYS 0x{nnn:03X}"),
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp(nnn) => write!(f, "JP 0x{nnn:03X}"),
            Call(nnn) => write!(f, "CALL 0x{nnn:03X}"),
            SeByte(x, kk) => write!(f, "SE V{x:X}, 0x{kk:02X}"),
            SneByte(x, kk) => write!(f, "SNE V{x:X}, 0x{kk:02X}"),
            SeReg(x, y) => write!(f, "SE V{x:X}, V{y:X}"),
            LdByte(x, kk) => write!(f, "LD V{x:X}, 0x{kk:02X}"),
            AddByte(x, kk) => write!(f, "ADD V{x:X}, 0x{kk:02X}"),
            LdReg(x, y) => write!(f, "LD V{x:X}, V{y:X}"),
            Or(x, y) => write!(f, "OR V{x:X}, V{y:X}"),
            And(x, y) => write!(f, "AND V{x:X}, V{y:X}"),
            Xor(x, y) => write!(f, "XOR V{x:X}, V{y:X}"),
            AddReg(x, y) => write!(f, "ADD V{x:X}, V{y:X}"),
            Sub(x, y) => write!(f, "SUB V{x:X}, V{y:X}"),
            Shr(x) => write!(f, "SHR V{x:X}"),
            Subn(x, y) => write!(f, "SUBN V{x:X}, V{y:X}"),
            Shl(x) => write!(f, "SHL V{x:X}"),
            SneReg(x, y) => write!(f, "SNE V{x:X}, V{y:X}"),
            LdI(nnn) => write!(f, "LD I, 0x{nnn:03X}"),
            JpV0(nnn) => write!(f, "JP V0, 0x{nnn:03X}"),
            Rnd(x, kk) => write!(f, "RND V{x:X}, 0x{kk:02X}"),
            Drw(x, y, n) => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            Skp(x) => write!(f, "SKP V{x:X}"),
            Sknp(x) => write!(f, "SKNP V{x:X}"),
            LdVxDt(x) => write!(f, "LD V{x:X}, DT"),
            LdVxK(x) => write!(f, "LD V{x:X}, K"),
            LdDtVx(x) => write!(f, "LD DT, V{x:X}"),
            LdStVx(x) => write!(f, "LD ST, V{x:X}"),
            AddIVx(x) => write!(f, "ADD I, V{x:X}"),
            LdFVx(x) => write!(f, "LD F, V{x:X}"),
            LdBVx(x) => write!(f, "LD B, V{x:X}"),
            Store(x) => write!(f, "LD [I], V{x:X}"),
            Load(x) => write!(f, "LD V{x:X}, [I]"),
            Unknown(word) => write!(f, "UNKNOWN 0x{word:04X}"),
        }
    }
}
