use criterion::measurement::WallTime;
use criterion::{black_box, criterion_main, BenchmarkGroup, Criterion};
use opus_remux::io::ogg_page::{self, OggPageWriter, STREAM_SERIAL};

fn benchmark_write_page(g: &mut BenchmarkGroup<'_, WallTime>) {
    let writer = OggPageWriter::new(STREAM_SERIAL);

    // a typical 20 ms music packet
    let payload_len = 960;
    let mut page = [0u8; 0x2000];
    for (i, b) in page[ogg_page::page_overhead(payload_len)..][..payload_len]
        .iter_mut()
        .enumerate()
    {
        *b = i as u8;
    }

    g.bench_function("OggPage/write_page", |b| {
        b.iter(|| {
            black_box(
                writer
                    .write_page(&mut page, payload_len, 0x1234, 2)
                    .unwrap(),
            );
        })
    });
}

fn benches() {
    let mut c = Criterion::default().configure_from_args();
    let mut g = c.benchmark_group("OggPage");

    benchmark_write_page(&mut g);

    g.finish();
}

criterion_main!(benches);
