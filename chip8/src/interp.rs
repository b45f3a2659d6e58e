//! Instruction handlers.
use log::debug;
use rand::Rng;

use crate::{bytecode::Instr, constants::*, cpu::Chip8Cpu};

/// Control flow directive returned by each instruction.
///
/// Handlers never move the program counter themselves. The directive is
/// applied afterwards, by the virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Advance to the next instruction.
    Next,
    /// Skip over the next instruction.
    Skip,
    /// Program counter has jumped to a new address.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump(Address),
    /// Stall on the current instruction.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    Block,
    /// The opcode is not a known instruction.
    NotImplemented,
}

impl Flow {
    #[inline(always)]
    fn skip_if(condition: bool) -> Self {
        if condition {
            Flow::Skip
        } else {
            Flow::Next
        }
    }
}

/// Execute a single decoded instruction against the machine state.
pub(crate) fn execute<R: Rng>(cpu: &mut Chip8Cpu, instr: Instr, rng: &mut R) -> Flow {
    use Instr::*;

    match instr {
        // 0nnn (SYS addr)
        //
        // Jump to a machine code routine of the host computer.
        // Ignored by modern interpreters.
        Sys(nnn) => {
            debug!("{:04X}: ignoring machine code routine at {:03X}", cpu.pc, nnn);
            Flow::Next
        }
        // 00E0 (CLS)
        //
        // Clear display
        Cls => {
            cpu.clear_display();
            Flow::Next
        }
        // 00EE (RET)
        //
        // Return from a subroutine.
        // Subtract 1 from the stack pointer, then jump to the address at the top of the stack.
        Ret => match cpu.sp.checked_sub(1) {
            Some(sp) => {
                cpu.sp = sp;
                Flow::Jump(cpu.stack[sp] & ADDRESS_MASK)
            }
            None => {
                cpu.set_error("call stack underflow");
                Flow::Block
            }
        },
        // 1nnn (JP addr)
        //
        // Jump to address.
        Jp(nnn) => Flow::Jump(nnn),
        // 2nnn (CALL addr)
        //
        // Call subroutine at NNN.
        // The return address is pushed, then the stack pointer is incremented.
        Call(nnn) => {
            if cpu.sp >= STACK_SIZE {
                cpu.set_error("call stack overflow");
                return Flow::Block;
            }
            cpu.stack[cpu.sp] = cpu.pc.wrapping_add(INSTR_SIZE) & ADDRESS_MASK;
            cpu.sp += 1;
            Flow::Jump(nnn)
        }
        // 3xkk (SE Vx, byte)
        //
        // Skip the next instruction if register VX equals value KK.
        SeByte(vx, kk) => Flow::skip_if(cpu.registers[vx as usize] == kk),
        // 4xkk (SNE Vx, byte)
        //
        // Skip the next instruction if register VX does not equal value KK.
        SneByte(vx, kk) => Flow::skip_if(cpu.registers[vx as usize] != kk),
        // 5xy0 (SE Vx, Vy)
        //
        // Skip the next instruction if register VX equals VY.
        SeReg(vx, vy) => {
            Flow::skip_if(cpu.registers[vx as usize] == cpu.registers[vy as usize])
        }
        // 6xkk (LD Vx, byte)
        //
        // Set register VX to value KK.
        LdByte(vx, kk) => {
            cpu.registers[vx as usize] = kk;
            Flow::Next
        }
        // 7xkk (ADD Vx, byte)
        //
        // Add value KK to register VX. Carry flag is not set.
        AddByte(vx, kk) => {
            let x = cpu.registers[vx as usize];
            cpu.registers[vx as usize] = x.wrapping_add(kk);
            Flow::Next
        }
        // Arithmetic instructions
        LdReg(..) | Or(..) | And(..) | Xor(..) | AddReg(..) | Sub(..) | Shr(_) | Subn(..)
        | Shl(_) => exec_math(cpu, instr),
        // 9xy0 (SNE Vx, Vy)
        //
        // Skip next instruction if Vx != Vy.
        SneReg(vx, vy) => {
            Flow::skip_if(cpu.registers[vx as usize] != cpu.registers[vy as usize])
        }
        // Annn (LD I, addr)
        //
        // Set address register I to value NNN.
        LdI(nnn) => {
            cpu.address = nnn;
            Flow::Next
        }
        // Bnnn (JP V0, addr)
        //
        // Jump to address NNN offset by register V0.
        JpV0(nnn) => Flow::Jump((nnn + cpu.registers[0] as Address) & ADDRESS_MASK),
        // Cxkk (RND Vx, byte)
        //
        // Generate random number.
        // Set register VX to the result of bitwise AND between a random number and KK.
        Rnd(vx, kk) => {
            cpu.registers[vx as usize] = kk & rng.gen::<u8>();
            Flow::Next
        }
        // Dxyn (DRW Vx, Vy, nibble)
        //
        // Draw sprite to the display buffer, at coordinate as per registers Vx and Vy.
        // Sprite is encoded as 8 pixels wide, N pixels high, stored in bits located in
        // memory pointed to by address register I.
        //
        // If the sprite is drawn outside of the display area, it is wrapped around to the other side.
        //
        // If the drawing operation erases existing pixels in the display buffer, register VF is set to
        // 1, and set to 0 if no display bits are unset. This is used for collision detection.
        Drw(vx, vy, n) => {
            let (x, y) = (
                cpu.registers[vx as usize] as usize,
                cpu.registers[vy as usize] as usize,
            );
            let mut is_erased = false;

            for r in 0..n as usize {
                let row = cpu.read(cpu.address as usize + r);

                // Each row is 8 bits representing the 8 pixels of the sprite.
                for c in 0..8 {
                    if (row >> (7 - c)) & 1 == 0 {
                        continue;
                    }

                    let d = ((x + c) & DISPLAY_WIDTH_MASK)
                        + ((y + r) & DISPLAY_HEIGHT_MASK) * DISPLAY_WIDTH;

                    // XOR erases a pixel when it was already set.
                    is_erased |= cpu.display[d];
                    cpu.display[d] ^= true;
                }
            }

            // If a pixel was erased, then a collision occurred.
            cpu.registers[FLAG_REGISTER] = is_erased as u8;
            cpu.display_dirty = true;
            Flow::Next
        }
        Skp(_) | Sknp(_) | LdVxDt(_) | LdVxK(_) | LdDtVx(_) | LdStVx(_) | AddIVx(_)
        | LdFVx(_) | LdBVx(_) | Store(_) | Load(_) => exec_misc(cpu, instr),
        Unknown(_) => Flow::NotImplemented,
    }
}

/// Execute an arithmetic instruction
#[inline]
#[must_use]
fn exec_math(cpu: &mut Chip8Cpu, instr: Instr) -> Flow {
    use Instr::*;

    let regs = &mut cpu.registers;

    match instr {
        // 8xy0 (LD Vx, Vy)
        //
        // Store the value of register VY in register VX.
        LdReg(vx, vy) => regs[vx as usize] = regs[vy as usize],
        // 8xy1 (OR Vx, Vy)
        //
        // Performs bitwise OR on VX and VY, and stores the result in VX.
        Or(vx, vy) => regs[vx as usize] |= regs[vy as usize],
        // 8xy2 (AND Vx, Vy)
        //
        // Performs bitwise AND on VX and VY, and stores the result in VX.
        And(vx, vy) => regs[vx as usize] &= regs[vy as usize],
        // 8xy3 (XOR Vx, Vy)
        //
        // Performs bitwise XOR on VX and VY, and stores the result in VX.
        Xor(vx, vy) => regs[vx as usize] ^= regs[vy as usize],
        // 8xy4 (ADD Vx, Vy)
        //
        // Adds VY to VX, and stores the result in VX.
        // Overflow is wrapped.
        // If overflow, set VF to 1, else 0.
        AddReg(vx, vy) => {
            let result = regs[vx as usize] as u16 + regs[vy as usize] as u16;
            regs[FLAG_REGISTER] = (result > 0xFF) as u8;
            regs[vx as usize] = (result & 0xFF) as u8; // Overflow wrap
        }
        // 8xy5 (SUB Vx, Vy)
        //
        // Subtracts VY from VX, and stores the result in VX.
        // VF is set to 1 only when the difference is positive.
        Sub(vx, vy) => {
            let (flag, result) = subtract(regs[vx as usize], regs[vy as usize]);
            regs[FLAG_REGISTER] = flag;
            regs[vx as usize] = result;
        }
        // 8xy6 (SHR Vx)
        //
        // If the least-significant bit of Vx is 1, then VF is set to 1, otherwise 0.
        // Shift VX right by 1.
        // VY is unused.
        Shr(vx) => {
            regs[FLAG_REGISTER] = regs[vx as usize] & 1;
            regs[vx as usize] >>= 1;
        }
        // 8xy7 (SUBN Vx, Vy)
        //
        // Subtracts VX from VY, and stores the result in VX.
        // VF is set to 1 only when the difference is positive.
        Subn(vx, vy) => {
            let (flag, result) = subtract(regs[vy as usize], regs[vx as usize]);
            regs[FLAG_REGISTER] = flag;
            regs[vx as usize] = result;
        }
        // 8xyE (SHL Vx)
        //
        // If the most-significant bit of Vx is 1, then VF is set to 1, otherwise 0.
        // Shift VX left by 1.
        // VY is unused.
        Shl(vx) => {
            let x = regs[vx as usize];
            regs[FLAG_REGISTER] = (x >> 7) & 1;
            regs[vx as usize] = x << 1;
        }
        _ => unreachable!("not an arithmetic instruction: {instr:?}"),
    }

    Flow::Next
}

/// Subtraction with the borrow flag.
///
/// A zero difference counts as a borrow, and a negative difference
/// `d` leaves `255 - |d|` in the register.
#[inline]
fn subtract(a: u8, b: u8) -> (u8, u8) {
    let result = a as i16 - b as i16;
    if result > 0 {
        (1, result as u8)
    } else {
        (0, (0xFF - result.abs()) as u8)
    }
}

/// Execute a keyboard, timer or memory instruction
#[inline]
#[must_use]
fn exec_misc(cpu: &mut Chip8Cpu, instr: Instr) -> Flow {
    use Instr::*;

    match instr {
        // Ex9E (SKP Vx)
        //
        // Skip next instruction if the key with the value of Vx is pressed.
        Skp(vx) => Flow::skip_if(cpu.keypad.is_pressed(cpu.registers[vx as usize])),
        // ExA1 (SKNP Vx)
        //
        // Skip next instruction if the key with the value of Vx is not pressed.
        Sknp(vx) => Flow::skip_if(!cpu.keypad.is_pressed(cpu.registers[vx as usize])),
        // Fx07 (LD Vx, DT)
        //
        // Set Vx = delay timer value.
        LdVxDt(vx) => {
            cpu.registers[vx as usize] = cpu.delay_timer;
            Flow::Next
        }
        // Fx0A (LD Vx, K)
        //
        // Wait for a key press, store the value of the key in Vx.
        // All execution stops until a key is pressed.
        LdVxK(vx) => match cpu.keypad.first_pressed() {
            Some(k) => {
                cpu.registers[vx as usize] = k;
                Flow::Next
            }
            None => Flow::Block,
        },
        // Fx15 (LD DT, Vx)
        //
        // Set delay timer = Vx.
        LdDtVx(vx) => {
            cpu.delay_timer = cpu.registers[vx as usize];
            Flow::Next
        }
        // Fx18 (LD ST, Vx)
        //
        // Set sound timer = Vx.
        LdStVx(vx) => {
            cpu.sound_timer = cpu.registers[vx as usize];
            Flow::Next
        }
        // Fx1E (ADD I, Vx)
        //
        // Add Vx to I. VF is set when the result leaves the 12-bit address space.
        AddIVx(vx) => {
            let result = cpu.address + cpu.registers[vx as usize] as Address;
            cpu.registers[FLAG_REGISTER] = (result > ADDRESS_MASK) as u8;
            cpu.address = result & ADDRESS_MASK;
            Flow::Next
        }
        // Fx29 (LD F, Vx)
        //
        // Set I = location of sprite for digit Vx.
        LdFVx(vx) => {
            let x = cpu.registers[vx as usize] as Address;
            cpu.address =
                (FONTSET_START + x * FONTSET_HEIGHT as Address) & ADDRESS_MASK;
            Flow::Next
        }
        // Fx33 (LD B, Vx)
        //
        // Store the binary-coded decimal representation of Vx
        // in the memory locations I, I+1, and I+2.
        #[rustfmt::skip]
        LdBVx(vx) => {
            let addr = cpu.address as usize;
            let x = cpu.registers[vx as usize];
            cpu.write(addr,     x / 100);
            cpu.write(addr + 1, x / 10  % 10);
            cpu.write(addr + 2, x       % 10);
            Flow::Next
        }
        // Fx55 (LD [I], Vx)
        //
        // Store registers V0 through Vx in memory starting at location I.
        Store(vx) => {
            let addr = cpu.address as usize;
            for v in 0..=vx as usize {
                let value = cpu.registers[v];
                cpu.write(addr + v, value);
            }
            Flow::Next
        }
        // Fx65 (LD Vx, [I])
        //
        // Read registers V0 through Vx from memory starting at location I.
        Load(vx) => {
            let addr = cpu.address as usize;
            for v in 0..=vx as usize {
                cpu.registers[v] = cpu.read(addr + v);
            }
            Flow::Next
        }
        _ => unreachable!("not a miscellaneous instruction: {instr:?}"),
    }
}
