//! Instruction decoding.
use std::fmt;

use crate::constants::*;

/// A 16-bit instruction word, stored big-endian in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    #[inline(always)]
    pub fn from_bytes([a, b]: [u8; 2]) -> Self {
        Self(u16::from_be_bytes([a, b]))
    }

    /// The four 4-bit fields, most significant first.
    #[inline(always)]
    pub fn nibbles(self) -> [u8; 4] {
        let [a, b] = self.0.to_be_bytes();
        [a >> 4, a & 0xF, b >> 4, b & 0xF]
    }

    /// Operand X, the second nibble.
    #[inline(always)]
    pub fn x(self) -> u8 {
        ((self.0 >> 8) & 0xF) as u8
    }

    /// Operand Y, the third nibble.
    #[inline(always)]
    pub fn y(self) -> u8 {
        ((self.0 >> 4) & 0xF) as u8
    }

    /// Operand N, the last nibble.
    #[inline(always)]
    pub fn n(self) -> u8 {
        (self.0 & 0xF) as u8
    }

    /// Operand KK (also known as NN), the low byte.
    #[inline(always)]
    pub fn kk(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Operand NNN, the 12-bit address.
    #[inline(always)]
    pub fn nnn(self) -> Address {
        self.0 & ADDRESS_MASK
    }
}

impl fmt::UpperHex for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

/// Decoded instruction.
///
/// Register operands are indices into V0-VF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    /// 0nnn (SYS addr)
    Sys(Address),
    /// 00E0 (CLS)
    Cls,
    /// 00EE (RET)
    Ret,
    /// 1nnn (JP addr)
    Jp(Address),
    /// 2nnn (CALL addr)
    Call(Address),
    /// 3xkk (SE Vx, byte)
    SeByte(u8, u8),
    /// 4xkk (SNE Vx, byte)
    SneByte(u8, u8),
    /// 5xy0 (SE Vx, Vy)
    SeReg(u8, u8),
    /// 6xkk (LD Vx, byte)
    LdByte(u8, u8),
    /// 7xkk (ADD Vx, byte)
    AddByte(u8, u8),
    /// 8xy0 (LD Vx, Vy)
    LdReg(u8, u8),
    /// 8xy1 (OR Vx, Vy)
    Or(u8, u8),
    /// 8xy2 (AND Vx, Vy)
    And(u8, u8),
    /// 8xy3 (XOR Vx, Vy)
    Xor(u8, u8),
    /// 8xy4 (ADD Vx, Vy)
    AddReg(u8, u8),
    /// 8xy5 (SUB Vx, Vy)
    Sub(u8, u8),
    /// 8xy6 (SHR Vx)
    Shr(u8),
    /// 8xy7 (SUBN Vx, Vy)
    Subn(u8, u8),
    /// 8xyE (SHL Vx)
    Shl(u8),
    /// 9xy0 (SNE Vx, Vy)
    SneReg(u8, u8),
    /// Annn (LD I, addr)
    LdI(Address),
    /// Bnnn (JP V0, addr)
    JpV0(Address),
    /// Cxkk (RND Vx, byte)
    Rnd(u8, u8),
    /// Dxyn (DRW Vx, Vy, nibble)
    Drw(u8, u8, u8),
    /// Ex9E (SKP Vx)
    Skp(u8),
    /// ExA1 (SKNP Vx)
    Sknp(u8),
    /// Fx07 (LD Vx, DT)
    LdVxDt(u8),
    /// Fx0A (LD Vx, K)
    LdVxK(u8),
    /// Fx15 (LD DT, Vx)
    LdDtVx(u8),
    /// Fx18 (LD ST, Vx)
    LdStVx(u8),
    /// Fx1E (ADD I, Vx)
    AddIVx(u8),
    /// Fx29 (LD F, Vx)
    LdFVx(u8),
    /// Fx33 (LD B, Vx)
    LdBVx(u8),
    /// Fx55 (LD [I], Vx)
    Store(u8),
    /// Fx65 (LD Vx, [I])
    Load(u8),
    /// Opcode that matches none of the instruction patterns.
    Unknown(u16),
}

impl Instr {
    /// Decode an opcode.
    ///
    /// The first nibble identifies the instruction family. Families
    /// 0, 8, E and F are further identified by their trailing nibbles.
    pub fn decode(op: Opcode) -> Self {
        use Instr::*;

        let nnn = op.nnn();
        let kk = op.kk();

        match op.nibbles() {
            [0x0, 0x0, 0xE, 0x0] => Cls,
            [0x0, 0x0, 0xE, 0xE] => Ret,
            [0x0, ..] => Sys(nnn),
            [0x1, ..] => Jp(nnn),
            [0x2, ..] => Call(nnn),
            [0x3, x, _, _] => SeByte(x, kk),
            [0x4, x, _, _] => SneByte(x, kk),
            [0x5, x, y, _] => SeReg(x, y),
            [0x6, x, _, _] => LdByte(x, kk),
            [0x7, x, _, _] => AddByte(x, kk),
            [0x8, x, y, 0x0] => LdReg(x, y),
            [0x8, x, y, 0x1] => Or(x, y),
            [0x8, x, y, 0x2] => And(x, y),
            [0x8, x, y, 0x3] => Xor(x, y),
            [0x8, x, y, 0x4] => AddReg(x, y),
            [0x8, x, y, 0x5] => Sub(x, y),
            [0x8, x, _, 0x6] => Shr(x),
            [0x8, x, y, 0x7] => Subn(x, y),
            [0x8, x, _, 0xE] => Shl(x),
            [0x9, x, y, _] => SneReg(x, y),
            [0xA, ..] => LdI(nnn),
            [0xB, ..] => JpV0(nnn),
            [0xC, x, _, _] => Rnd(x, kk),
            [0xD, x, y, n] => Drw(x, y, n),
            [0xE, x, 0x9, 0xE] => Skp(x),
            [0xE, x, 0xA, 0x1] => Sknp(x),
            [0xF, x, 0x0, 0x7] => LdVxDt(x),
            [0xF, x, 0x0, 0xA] => LdVxK(x),
            [0xF, x, 0x1, 0x5] => LdDtVx(x),
            [0xF, x, 0x1, 0x8] => LdStVx(x),
            [0xF, x, 0x1, 0xE] => AddIVx(x),
            [0xF, x, 0x2, 0x9] => LdFVx(x),
            [0xF, x, 0x3, 0x3] => LdBVx(x),
            [0xF, x, 0x5, 0x5] => Store(x),
            [0xF, x, 0x6, 0x5] => Load(x),
            _ => Unknown(op.0),
        }
    }
}

impl From<Opcode> for Instr {
    fn from(op: Opcode) -> Self {
        Instr::decode(op)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn decode(word: u16) -> Instr {
        Instr::decode(Opcode(word))
    }

    #[test]
    fn test_operand_fields() {
        let op = Opcode::from_bytes([0xD1, 0x2F]);
        assert_eq!(op, Opcode(0xD12F));
        assert_eq!(op.nibbles(), [0xD, 0x1, 0x2, 0xF]);
        assert_eq!(op.x(), 0x1);
        assert_eq!(op.y(), 0x2);
        assert_eq!(op.n(), 0xF);
        assert_eq!(op.kk(), 0x2F);
        assert_eq!(op.nnn(), 0x12F);
    }

    #[test]
    fn test_decode_families() {
        use Instr::*;

        assert_eq!(decode(0x00E0), Cls);
        assert_eq!(decode(0x00EE), Ret);
        assert_eq!(decode(0x0123), Sys(0x123));
        assert_eq!(decode(0x1ABC), Jp(0xABC));
        assert_eq!(decode(0x2ABC), Call(0xABC));
        assert_eq!(decode(0x3A42), SeByte(0xA, 0x42));
        assert_eq!(decode(0x4A42), SneByte(0xA, 0x42));
        assert_eq!(decode(0x5AB0), SeReg(0xA, 0xB));
        assert_eq!(decode(0x6A02), LdByte(0xA, 0x02));
        assert_eq!(decode(0x7A05), AddByte(0xA, 0x05));
        assert_eq!(decode(0x8AB0), LdReg(0xA, 0xB));
        assert_eq!(decode(0x8AB1), Or(0xA, 0xB));
        assert_eq!(decode(0x8AB2), And(0xA, 0xB));
        assert_eq!(decode(0x8AB3), Xor(0xA, 0xB));
        assert_eq!(decode(0x8AB4), AddReg(0xA, 0xB));
        assert_eq!(decode(0x8AB5), Sub(0xA, 0xB));
        assert_eq!(decode(0x8AB6), Shr(0xA));
        assert_eq!(decode(0x8AB7), Subn(0xA, 0xB));
        assert_eq!(decode(0x8ABE), Shl(0xA));
        assert_eq!(decode(0x9AB0), SneReg(0xA, 0xB));
        assert_eq!(decode(0xA210), LdI(0x210));
        assert_eq!(decode(0xB300), JpV0(0x300));
        assert_eq!(decode(0xC10F), Rnd(0x1, 0x0F));
        assert_eq!(decode(0xD125), Drw(0x1, 0x2, 0x5));
        assert_eq!(decode(0xE39E), Skp(0x3));
        assert_eq!(decode(0xE3A1), Sknp(0x3));
        assert_eq!(decode(0xF307), LdVxDt(0x3));
        assert_eq!(decode(0xF30A), LdVxK(0x3));
        assert_eq!(decode(0xF315), LdDtVx(0x3));
        assert_eq!(decode(0xF318), LdStVx(0x3));
        assert_eq!(decode(0xF31E), AddIVx(0x3));
        assert_eq!(decode(0xF329), LdFVx(0x3));
        assert_eq!(decode(0xF033), LdBVx(0x0));
        assert_eq!(decode(0xF355), Store(0x3));
        assert_eq!(decode(0xF365), Load(0x3));
    }

    #[test]
    fn test_decode_unknown() {
        assert_eq!(decode(0x8AB8), Instr::Unknown(0x8AB8));
        assert_eq!(decode(0xE3FF), Instr::Unknown(0xE3FF));
        assert_eq!(decode(0xF3FF), Instr::Unknown(0xF3FF));
        assert_eq!(decode(0xF399), Instr::Unknown(0xF399));
    }

    #[test]
    fn test_decode_is_total() {
        let unknown = (0..=u16::MAX)
            .map(decode)
            .filter(|instr| matches!(instr, Instr::Unknown(_)))
            .count();

        // 8xy_ has 7 unused variants, Ex__ has 254, and Fx__ has 247, for each of the 16 registers.
        assert_eq!(unknown, 16 * (16 * 7 + 254 + 247));
    }
}
