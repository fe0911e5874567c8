use cogex_core::{InkColor, Screen};
use cogex_render::{load_font, SkiaRenderer};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use pprof::criterion::{Output, PProfProfiler};
use std::path::Path;
use std::time::Duration;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

/// Text is only drawn when `COGEX_FONT` points at a font; otherwise the
/// benchmark measures background fill and frame copy.
fn harness() -> (SkiaRenderer, Vec<u8>) {
    let font = std::env::var("COGEX_FONT")
        .ok()
        .and_then(|p| load_font(Path::new(&p)).ok());
    let r = SkiaRenderer::new(WIDTH, HEIGHT, font).unwrap();
    let fb = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
    (r, fb)
}

pub fn bench_render_screen(c: &mut Criterion) {
    let mut g = c.benchmark_group("render_screen");
    g.sample_size(40);

    let screens = [
        ("blank", Screen::blank()),
        (
            "stimulus",
            Screen::Stimulus {
                text: InkColor::Red.word().to_string(),
                ink: InkColor::Green.rgba(),
                background: [191, 191, 191, 255],
            },
        ),
        (
            "feedback",
            Screen::Feedback {
                correct: true,
                latency: Some(Duration::from_millis(523)),
            },
        ),
        (
            "instructions",
            Screen::instructions(
                "Decide whether the current digit is the same\nas the digit 2 positions back.\n\n\
                 Same -> press Y\nDifferent -> press N\n\nPress SPACE to see an example",
            ),
        ),
    ];

    for (name, screen) in &screens {
        g.bench_function(*name, |b| {
            b.iter_batched(
                harness,
                |(mut r, mut fb)| {
                    let stats = r.render_screen(black_box(screen), &mut fb);
                    black_box(stats)
                },
                BatchSize::LargeInput,
            )
        });
    }

    // Warm text cache: the same screen shown again.
    g.bench_function("stimulus_repeat", |b| {
        let (mut r, mut fb) = harness();
        let screen = &screens[1].1;
        b.iter(|| black_box(r.render_screen(screen, &mut fb)))
    });

    g.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
        .confidence_level(0.95)
        .noise_threshold(0.02)
        .significance_level(0.05);
    targets = bench_render_screen
}

criterion_main!(benches);
