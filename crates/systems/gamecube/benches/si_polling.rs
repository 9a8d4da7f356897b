use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use emu_gamecube::buffer::swizzle;
use emu_gamecube::{
    create_device, encode_poll_words, Collaborators, DeviceKind, PadStatus, CMD_ORIGIN,
    CMD_RESET,
};

/// Polling runs once per controller per frame, so it must stay cheap
fn bench_get_data(c: &mut Criterion) {
    let collaborators = Collaborators::default();
    let mut pad = create_device(DeviceKind::StandardController, 0, &collaborators);

    c.bench_function("get_data", |b| b.iter(|| black_box(pad.get_data())));

    let status = PadStatus::default();
    c.bench_function("encode_poll_words", |b| {
        b.iter(|| black_box(encode_poll_words(black_box(&status))))
    });
}

fn bench_run_buffer(c: &mut Criterion) {
    let collaborators = Collaborators::default();
    let mut group = c.benchmark_group("run_buffer");

    for (name, cmd) in [("reset", CMD_RESET), ("origin", CMD_ORIGIN)] {
        let mut pad = create_device(DeviceKind::StandardController, 0, &collaborators);
        group.bench_with_input(BenchmarkId::from_parameter(name), &cmd, |b, &cmd| {
            let mut buf = [0u8; 128];
            b.iter(|| {
                buf[swizzle(0)] = cmd;
                black_box(pad.run_buffer(&mut buf))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_get_data, bench_run_buffer);
criterion_main!(benches);
