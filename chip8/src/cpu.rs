//! CPU and memory state.
use crate::{bytecode::Opcode, constants::*};

/// Core state for a chip8 interpreter.
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the current position in the bytecode.
    pub(crate) pc: Address,
    /// Stack pointer, indicating the next free slot of the stack.
    pub(crate) sp: usize,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// (I) Pointer register used for temporarily storing an address.
    pub(crate) address: Address,
    /// (DT) Delay timer that counts down to 0.
    pub(crate) delay_timer: u8,
    /// (ST) Sound timer that counts down to 0. When it has a non-zero value, a beep is played.
    pub(crate) sound_timer: u8,
    /// Switch tracking whether the buzzer is currently on.
    pub(crate) buzzer_state: bool,
    /// Keyboard input state.
    pub(crate) keypad: Keypad,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub(crate) ram: Box<[u8; MEM_SIZE]>,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub(crate) stack: [Address; STACK_SIZE],
    /// Screen buffer that is drawn too.
    pub(crate) display: Box<[bool; DISPLAY_BUFFER_SIZE]>,
    /// Set whenever the display buffer is written, cleared when presented.
    pub(crate) display_dirty: bool,

    // ------------------------------------------------------------------------
    // Control
    /// Error message if the VM has faulted.
    pub(crate) error: Option<&'static str>,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        Self {
            pc: MEM_START as Address,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
            delay_timer: 0,
            sound_timer: 0,
            buzzer_state: false,
            keypad: Keypad::default(),

            ram: Box::new([0; MEM_SIZE]),
            stack: [0; STACK_SIZE],
            display: Box::new([false; DISPLAY_BUFFER_SIZE]),
            display_dirty: true,

            error: None,
        }
    }
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_error(&mut self, message: &'static str) {
        self.error = Some(message);
    }

    pub fn error(&self) -> Option<&str> {
        self.error
    }

    pub fn clear_display(&mut self) {
        self.display.fill(false);
        self.display_dirty = true;
    }

    /// Read a byte, wrapping the address into the 4K memory space.
    #[inline(always)]
    pub fn read(&self, addr: usize) -> u8 {
        self.ram[addr & ADDRESS_MASK as usize]
    }

    /// Write a byte, wrapping the address into the 4K memory space.
    #[inline(always)]
    pub fn write(&mut self, addr: usize, value: u8) {
        self.ram[addr & ADDRESS_MASK as usize] = value;
    }

    /// Count down the delay timer.
    #[inline]
    pub fn tick_delay(&mut self) {
        // The checked_sub implementation uses `unlikely!()` which degrades performance.
        let (val, underflow) = self.delay_timer.overflowing_sub(1);
        if !underflow {
            self.delay_timer = val;
        }
    }

    #[inline]
    pub fn tick_sound(&mut self) {
        // The checked_sub implementation uses `unlikely!()` which degrades performance.
        let (val, underflow) = self.sound_timer.overflowing_sub(1);
        if !underflow {
            self.sound_timer = val;
        }
    }

    /// Extract the instruction at the current program counter.
    #[inline(always)]
    pub fn instr(&self) -> [u8; 2] {
        let pc = self.pc as usize;
        [self.read(pc), self.read(pc + 1)]
    }

    /// Fetch the big-endian opcode at the current program counter.
    #[inline(always)]
    pub fn fetch(&self) -> Opcode {
        Opcode::from_bytes(self.instr())
    }
}

/// The 16 keys of the COSMAC VIP hex keypad.
///
/// Pressed is a 1 bit, released is a 0 bit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Keypad(u16);

impl Keypad {
    pub fn set(&mut self, key_id: u8, pressed: bool) {
        if key_id < KEY_COUNT {
            if pressed {
                self.0 |= 1 << key_id;
            } else {
                self.0 &= !(1 << key_id);
            }
        }
    }

    /// Keys outside the keypad range are never pressed.
    pub fn is_pressed(&self, key_id: u8) -> bool {
        if key_id < KEY_COUNT {
            self.0 & (1 << key_id) > 0
        } else {
            false
        }
    }

    /// Check whether any key is pressed down.
    #[inline(always)]
    pub fn any(&self) -> bool {
        self.0 > 0
    }

    /// Retrieve the lowest valued key that is pressed down.
    #[inline]
    pub fn first_pressed(&self) -> Option<u8> {
        if self.any() {
            Some(self.0.trailing_zeros() as u8)
        } else {
            None
        }
    }

    /// Set all keys to up.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn bits(&self) -> u16 {
        self.0
    }
}
