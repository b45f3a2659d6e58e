use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chip8::prelude::*;

#[rustfmt::skip]
const COUNTER: &[u8] = &[
    0x60, 0x00, // 200: LD V0, 0
    0xA2, 0x14, // 202: LD I, 0x214
    0x70, 0x01, // 204: ADD V0, 1
    0xF0, 0x33, // 206: LD B, V0
    0x81, 0x02, // 208: AND V1, V0
    0xC3, 0x3F, // 20A: RND V3, 0x3F
    0xD3, 0x35, // 20C: DRW V3, V3, 5
    0x8F, 0x05, // 20E: SUB VF, V0
    0x12, 0x04, // 210: JP 0x204
];

fn criterion_benchmark(c: &mut Criterion) {
    let mut vm = Chip8Vm::new(Chip8Conf {
        seed: Some(1),
        ..Default::default()
    });
    vm.load_bytecode(COUNTER);

    c.bench_function("counter loop", |b| {
        b.iter(|| {
            let step_count = black_box(1000_usize);
            black_box(vm.run_steps(step_count))
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
