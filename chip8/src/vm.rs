//! Virtual machine.
use std::{
    fmt::Write,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use log::{debug, error, info, trace, warn};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    bytecode::Instr,
    clock::{Clock, Hz},
    constants::*,
    cpu::{Chip8Cpu, Keypad},
    devices::{Control, Devices, KeyCode},
    error::{Chip8Error, Chip8Result},
    interp::{self, Flow},
    rom::Rom,
    Chip8DisplayBuffer,
};

pub struct Chip8Vm {
    cpu: Chip8Cpu,
    /// Throttles the run loop to the configured CPU frequency.
    clock: Clock,
    /// Drives the delay and sound timers at 60Hz.
    timer: Clock,
    rng: StdRng,
    font: [u8; FONTSET_DATA_LENGTH],
    /// Currently loaded program, kept for reloading.
    program: Vec<u8>,
    /// Number of unknown opcodes encountered since the last load.
    not_implemented: usize,
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct Chip8Conf {
    /// Instructions executed per second by the run loop.
    ///
    /// Runs as fast as possible when not set.
    pub clock_frequency: Option<Hz>,
    /// Seed for the random number instruction.
    ///
    /// Seeded from the system time when not set.
    pub seed: Option<u64>,
}

impl Chip8Vm {
    pub fn new(conf: Chip8Conf) -> Self {
        let seed = conf.seed.unwrap_or_else(time_seed);
        debug!("random seed {seed}");

        // Glyphs are available before the first program is loaded.
        let mut cpu = Chip8Cpu::new();
        let start = FONTSET_START as usize;
        cpu.ram[start..start + FONTSET_DATA_LENGTH].copy_from_slice(&FONTSET);

        Chip8Vm {
            cpu,
            clock: Clock::new(conf.clock_frequency.unwrap_or_default().into()),
            timer: Clock::timer(),
            rng: StdRng::seed_from_u64(seed),
            font: FONTSET,
            program: Vec::new(),
            not_implemented: 0,
        }
    }

    /// Replace the font glyphs, for this and every following load.
    pub fn load_font(&mut self, fontset: &[u8]) -> Chip8Result<()> {
        if fontset.len() != FONTSET_DATA_LENGTH {
            return Err(Chip8Error::Font(format!(
                "fontset data must be {FONTSET_DATA_LENGTH} bytes, got {}",
                fontset.len()
            )));
        }

        self.font.copy_from_slice(fontset);
        let start = FONTSET_START as usize;
        self.cpu.ram[start..start + FONTSET_DATA_LENGTH].copy_from_slice(fontset);

        Ok(())
    }

    /// Reset the machine and load a program at `MEM_START`.
    ///
    /// Programs that don't fit in memory are truncated.
    pub fn load_bytecode(&mut self, bytecode: &[u8]) {
        let bytecode = if bytecode.len() > MAX_PROGRAM_SIZE {
            warn!(
                "program is {} bytes, truncating to {MAX_PROGRAM_SIZE}",
                bytecode.len()
            );
            &bytecode[..MAX_PROGRAM_SIZE]
        } else {
            bytecode
        };

        // Start with a clean machine to avoid leaking the previous program.
        let mut cpu = Chip8Cpu::new();

        // Keyboard state belongs to the input device.
        cpu.keypad = self.cpu.keypad;

        let start = FONTSET_START as usize;
        cpu.ram[start..start + FONTSET_DATA_LENGTH].copy_from_slice(&self.font);

        // Load program into virtual RAM
        cpu.ram[MEM_START..MEM_START + bytecode.len()].copy_from_slice(bytecode);

        self.cpu = cpu;
        self.program = bytecode.to_vec();
        self.not_implemented = 0;
        self.reset();

        debug!("loaded {} byte program", bytecode.len());
    }

    pub fn load_rom(&mut self, rom: &Rom) {
        info!("loading {}", rom.name());
        self.load_bytecode(rom.data());
    }

    /// Restart the current program from a clean machine.
    pub fn reload(&mut self) {
        let program = std::mem::take(&mut self.program);
        self.load_bytecode(&program);
    }

    pub fn display_buffer(&self) -> Chip8DisplayBuffer<'_> {
        &self.cpu.display
    }

    pub fn pc(&self) -> Address {
        self.cpu.pc
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.cpu.registers
    }

    /// Address register I.
    pub fn index(&self) -> Address {
        self.cpu.address
    }

    /// Number of return addresses on the call stack.
    pub fn stack_depth(&self) -> usize {
        self.cpu.sp
    }

    pub fn delay_timer(&self) -> u8 {
        self.cpu.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.cpu.sound_timer
    }

    pub fn ram(&self) -> &[u8; MEM_SIZE] {
        &self.cpu.ram
    }

    pub fn keypad(&self) -> &Keypad {
        &self.cpu.keypad
    }

    /// Fault message if the machine has stopped on an error.
    pub fn error(&self) -> Option<&str> {
        self.cpu.error()
    }

    pub fn not_implemented_count(&self) -> usize {
        self.not_implemented
    }
}

/// Interpreter
impl Chip8Vm {
    /// Sets the keyboard key input state.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        self.cpu.keypad.set(key.as_u8(), pressed);
    }

    /// Clear the keyboard input state, setting all keys to up.
    pub fn clear_keys(&mut self) {
        self.cpu.keypad.clear()
    }

    /// Clear internal state in preparation for a fresh startup.
    fn reset(&mut self) {
        self.clock.reset();
        self.timer.reset();
    }

    /// Run the machine against the given devices until input asks to quit.
    ///
    /// Each iteration polls input, steps the CPU, and presents the
    /// display and buzzer when they changed.
    pub fn run<D: Devices>(&mut self, devices: &mut D) -> Chip8Result<()> {
        self.reset();

        let result = loop {
            match devices.poll_input(&mut self.cpu.keypad) {
                Control::Continue => {}
                Control::Reload => {
                    info!("reloading program");
                    self.reload();
                }
                Control::Quit => break Ok(()),
            }

            if let Err(err) = self.step() {
                break Err(err);
            }

            self.present(devices);
            self.clock.wait();
        };

        // Don't leave the buzzer on after the loop ends.
        if self.cpu.buzzer_state {
            self.cpu.buzzer_state = false;
            devices.buzz(false);
        }

        result
    }

    /// Execute the given number of steps, stopping at the first fault.
    pub fn run_steps(&mut self, step_count: usize) -> Chip8Result<Flow> {
        let mut flow = Flow::Next;

        for _ in 0..step_count {
            flow = self.step()?;
        }

        Ok(flow)
    }

    /// Count down the timers, then execute one instruction.
    ///
    /// A machine that has faulted stays stopped until a program is loaded.
    pub fn step(&mut self) -> Chip8Result<Flow> {
        if let Some(err) = self.cpu.error {
            return Err(Chip8Error::Runtime(err));
        }

        self.tick_timers(Instant::now());

        let flow = self.execute_cycle();

        match self.cpu.error {
            Some(err) => {
                error!("{:04X}: {err}", self.cpu.pc);
                Err(Chip8Error::Runtime(err))
            }
            None => Ok(flow),
        }
    }

    /// Count down the delay and sound timers if a 60Hz tick has elapsed by `now`.
    ///
    /// Returns whether the timers ticked.
    pub fn tick_timers(&mut self, now: Instant) -> bool {
        if self.timer.tick_at(now) {
            self.cpu.tick_delay();
            self.cpu.tick_sound();
            true
        } else {
            false
        }
    }

    /// Fetch, decode and execute the instruction at the program counter.
    pub fn execute_cycle(&mut self) -> Flow {
        let op = self.cpu.fetch();
        let instr = Instr::decode(op);

        trace!("{:04X}: {:04X}  {}", self.cpu.pc, op, instr);

        let flow = interp::execute(&mut self.cpu, instr, &mut self.rng);

        if flow == Flow::NotImplemented {
            self.not_implemented += 1;
            warn!("{:04X}: unknown opcode {:04X}", self.cpu.pc, op);
        }

        self.resolve(flow);

        flow
    }

    /// Apply a control flow directive to the program counter.
    #[inline]
    fn resolve(&mut self, flow: Flow) {
        let pc = self.cpu.pc;

        self.cpu.pc = match flow {
            // Unknown opcodes are skipped over.
            Flow::Next | Flow::NotImplemented => pc.wrapping_add(INSTR_SIZE) & ADDRESS_MASK,
            Flow::Skip => pc.wrapping_add(INSTR_SIZE * 2) & ADDRESS_MASK,
            Flow::Jump(addr) => addr,
            Flow::Block => pc,
        };
    }

    fn present<D: Devices>(&mut self, devices: &mut D) {
        if self.cpu.display_dirty {
            devices.draw(&self.cpu.display);
            self.cpu.display_dirty = false;
        }

        // Buzzer should be on while sound timer counts down,
        // then turned off when the timer reaches zero.
        let buzzing = self.cpu.sound_timer > 0;
        if buzzing != self.cpu.buzzer_state {
            self.cpu.buzzer_state = buzzing;
            devices.buzz(buzzing);
        }
    }
}

/// Troubleshooting
#[doc(hidden)]
impl Chip8Vm {
    pub fn set_register(&mut self, index: usize, value: u8) {
        self.cpu.registers[index & 0xF] = value;
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        let d = (x & DISPLAY_WIDTH_MASK) + (y & DISPLAY_HEIGHT_MASK) * DISPLAY_WIDTH;
        self.cpu.display[d] = on;
        self.cpu.display_dirty = true;
    }

    pub fn dump_display(&self) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();

        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                if self.cpu.display[x + y * DISPLAY_WIDTH] {
                    write!(buf, "#")?;
                } else {
                    write!(buf, ".")?;
                }
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
