//! Benchmarks for the METAR decoder.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use metar_decoder::parser::{DecodeOptions, decode, decode_with, looks_like_report};

/// Sample report lines for benchmarking.
const SAMPLE_REPORTS: &[&str] = &[
    "METAR KJFK 250251Z 08006KT 10SM BKN043 BKN095 BKN250 19/09 A3034 RMK AO2 SLP273 T01890094 50001",
    "SPECI KJFK 250251Z 21010G10KT 180V240 1 5/16SM +TSRA BR BKN043CB 19/09 A3034",
    "KDEN 011753Z AUTO 00000KT 1/4SM FG VV002 M03/M05 A3012 RMK AO2",
    "EGLL 250250Z VRB03KT 6SM -DZ BR FEW008 SCT015 12/11 Q1013",
    "KORD 250251Z COR 27015G25KT M1/4SM +BLSN OVC005 M10/M12 A2992",
];

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    group.throughput(Throughput::Elements(1));
    group.bench_function("single", |b| b.iter(|| decode(black_box(SAMPLE_REPORTS[0]))));

    group.throughput(Throughput::Elements(SAMPLE_REPORTS.len() as u64));
    group.bench_function("batch_lenient", |b| {
        b.iter(|| {
            for line in SAMPLE_REPORTS {
                let _ = decode(black_box(line));
            }
        })
    });

    group.bench_function("batch_strict", |b| {
        b.iter(|| {
            for line in SAMPLE_REPORTS {
                let _ = decode_with(black_box(line), DecodeOptions::strict());
            }
        })
    });

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");

    // Mix of reports, comments and blank lines as found in archive files
    let mixed_lines: Vec<&str> = vec![
        "# KJFK observations",
        SAMPLE_REPORTS[0],
        "",
        SAMPLE_REPORTS[1],
        "KJFK 2502Z 08006KT 10SM",
        SAMPLE_REPORTS[2],
    ];

    group.throughput(Throughput::Elements(mixed_lines.len() as u64));
    group.bench_function("mixed_input", |b| {
        b.iter(|| {
            for line in &mixed_lines {
                if looks_like_report(line) {
                    let _ = decode(black_box(line));
                }
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_full_pipeline);
criterion_main!(benches);
