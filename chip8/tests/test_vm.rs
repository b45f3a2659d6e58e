use chip8::{constants::*, prelude::*};

fn vm_with(program: &[u8]) -> Chip8Vm {
    let mut vm = Chip8Vm::new(Chip8Conf {
        seed: Some(0xC8),
        ..Default::default()
    });
    vm.load_bytecode(program);
    vm
}

#[test]
#[rustfmt::skip]
fn test_load_and_add() {
    let mut vm = vm_with(&[
        0x6A, 0x02, // LD VA, 2
        0x7A, 0x05, // ADD VA, 5
    ]);

    vm.run_steps(2).unwrap();

    assert_eq!(vm.registers()[0xA], 7);
    assert_eq!(vm.registers()[0xF], 0);
    assert_eq!(vm.pc(), 0x204);
}

#[test]
fn test_clear_screen() {
    let mut vm = vm_with(&[0x00, 0xE0]);
    vm.set_pixel(5, 5, true);
    assert!(vm.display_buffer()[5 + 5 * DISPLAY_WIDTH]);

    vm.step().unwrap();

    assert!(vm.display_buffer().iter().all(|px| !*px));
}

#[test]
#[rustfmt::skip]
fn test_binary_coded_decimal() {
    let mut vm = vm_with(&[
        0xA2, 0x10, // LD I, 0x210
        0xF0, 0x33, // LD B, V0
    ]);
    vm.set_register(0, 156);

    vm.run_steps(2).unwrap();

    assert_eq!(vm.index(), 0x210);
    assert_eq!(vm.ram()[0x210..0x213], [1, 5, 6]);
}

#[test]
#[rustfmt::skip]
fn test_call_and_return() {
    let mut vm = vm_with(&[
        0x22, 0x06, // 200: CALL 0x206
        0x61, 0x01, // 202: LD V1, 1
        0x12, 0x04, // 204: JP 0x204
        0x62, 0x02, // 206: LD V2, 2
        0x00, 0xEE, // 208: RET
    ]);

    assert_eq!(vm.step().unwrap(), Flow::Jump(0x206));
    assert_eq!(vm.stack_depth(), 1);

    vm.run_steps(2).unwrap();
    assert_eq!(vm.stack_depth(), 0);
    assert_eq!(vm.pc(), 0x202);

    vm.step().unwrap();
    assert_eq!(vm.registers()[1], 1);
    assert_eq!(vm.registers()[2], 2);
}

#[test]
fn test_block_until_key() {
    let mut vm = vm_with(&[0xF3, 0x0A]);

    for _ in 0..3 {
        assert_eq!(vm.step().unwrap(), Flow::Block);
    }
    assert_eq!(vm.pc(), 0x200);

    vm.set_key(KeyCode::KeyB, true);
    vm.set_key(KeyCode::Key9, true);
    assert_eq!(vm.step().unwrap(), Flow::Next);

    // lowest pressed key wins
    assert_eq!(vm.registers()[3], 0x9);
    assert_eq!(vm.pc(), 0x202);
}

#[test]
#[rustfmt::skip]
fn test_draw_wraps_around_screen() {
    let mut vm = vm_with(&[
        0x60, 0x3F, // LD V0, 63
        0x61, 0x1F, // LD V1, 31
        0xA2, 0x0A, // LD I, 0x20A
        0xD0, 0x12, // DRW V0, V1, 2
        0x12, 0x08, // JP 0x208
        0xC0, 0xC0, // sprite: 11000000 11000000
    ]);

    vm.run_steps(4).unwrap();

    let display = vm.display_buffer();
    let lit = |x: usize, y: usize| display[x + y * DISPLAY_WIDTH];
    assert!(lit(63, 31));
    assert!(lit(0, 31));
    assert!(lit(63, 0));
    assert!(lit(0, 0));
    assert_eq!(display.iter().filter(|px| **px).count(), 4);
    assert_eq!(vm.registers()[0xF], 0);
}

#[test]
#[rustfmt::skip]
fn test_redraw_erases_and_collides() {
    let mut vm = vm_with(&[
        0xF0, 0x29, // LD F, V0
        0xD1, 0x15, // DRW V1, V1, 5
        0xD1, 0x15, // DRW V1, V1, 5
    ]);

    vm.run_steps(2).unwrap();
    assert_eq!(vm.index(), FONTSET_START);
    assert_eq!(vm.registers()[0xF], 0);
    assert!(vm.display_buffer().iter().any(|px| *px));

    vm.step().unwrap();
    assert_eq!(vm.registers()[0xF], 1);
    assert!(vm.display_buffer().iter().all(|px| !*px));
}

#[test]
fn test_dump_display() {
    let mut vm = vm_with(&[]);
    vm.set_pixel(0, 0, true);

    let dump = vm.dump_display().unwrap();
    let mut lines = dump.lines();
    let first = lines.next().unwrap();

    assert_eq!(first.len(), DISPLAY_WIDTH);
    assert!(first.starts_with("#."));
    assert_eq!(dump.lines().count(), DISPLAY_HEIGHT);
}

#[test]
fn test_rom_load() {
    let rom = Rom::new("add.ch8", vec![0x6A, 0x02, 0x7A, 0x05]);
    let mut vm = Chip8Vm::new(Chip8Conf::default());
    vm.load_rom(&rom);

    vm.run_steps(2).unwrap();
    assert_eq!(vm.registers()[0xA], 7);
}
