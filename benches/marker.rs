use criterion::{black_box, Criterion};

use reflectance_marker::smooth::{smooth, SmoothingMethod};
use reflectance_marker::{CurveMarker, CurveParser, CurveSeries, MarkerParameters, ParsingMode};

fn synthetic_text() -> String {
    (300..=700)
        .flat_map(|w| (0..10).map(move |tenth| w as f64 + tenth as f64 / 10.0))
        .map(|w| {
            let r = 5.0 + 55.0 / (1.0 + (-(w - 500.0) / 8.0).exp());
            format!("{w},{},{},{}\n", r - 1.0, r, r + 1.0)
        })
        .collect()
}

fn synthetic_curve() -> CurveSeries {
    CurveParser::new(false, ParsingMode::Auto)
        .parse_str(&synthetic_text())
        .unwrap()
}

fn smoothing(c: &mut Criterion) {
    let series = synthetic_curve();

    c.bench_function("smooth_running_sum", |b| {
        b.iter(|| black_box(smooth(&series, 25, SmoothingMethod::RunningSum)))
    });

    c.bench_function("smooth_resum", |b| {
        b.iter(|| black_box(smooth(&series, 25, SmoothingMethod::Resum)))
    });
}

fn analysis(c: &mut Criterion) {
    let text = synthetic_text();
    let series = synthetic_curve();
    let params = MarkerParameters::default();

    c.bench_function("parse", |b| {
        b.iter(|| black_box(CurveParser::default().parse_str(&text).unwrap()))
    });

    c.bench_function("analyse", |b| {
        b.iter(|| black_box(CurveMarker::new(series.clone(), params)))
    });

    let mut marker = CurveMarker::new(series, params);
    let relaxed = MarkerParameters {
        amplitude: 10.0,
        ..params
    };
    c.bench_function("reanalyse_without_smoothing", |b| {
        b.iter(|| {
            marker.analyse(relaxed);
            black_box(marker.marker_indices())
        })
    });
}

criterion::criterion_group!(benches, smoothing, analysis);
criterion::criterion_main!(benches);
