//! Benchmarks for layout search and sheet rendering

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::RgbImage;
use qrtile_core::{
    LayoutOptimizer, LayoutOptions, LayoutRequest, Objective, PageSpec, RecordingSurface,
    RenderOptions, SheetGeometry, SheetRenderer,
};

fn benchmark_optimizer(c: &mut Criterion) {
    let page = PageSpec::a4(5.0);
    let tight = LayoutOptimizer::default();
    let square = LayoutOptimizer::new(LayoutOptions {
        objective: Objective::SquareCut,
        ..LayoutOptions::default()
    });

    c.bench_function("maximize_size_20", |b| {
        b.iter(|| tight.optimize(black_box(&page), &LayoutRequest::with_count(20)))
    });

    c.bench_function("maximize_size_10000", |b| {
        b.iter(|| tight.optimize(black_box(&page), &LayoutRequest::with_count(10_000)))
    });

    c.bench_function("square_cut_200", |b| {
        b.iter(|| square.optimize(black_box(&page), &LayoutRequest::new(Some(200), Some(5.0))))
    });
}

fn benchmark_render(c: &mut Criterion) {
    let page = PageSpec::a4(5.0);
    let layout = LayoutOptimizer::default()
        .optimize(&page, &LayoutRequest::with_size(10.0))
        .unwrap();
    let geometry = SheetGeometry::new(page, layout);
    let renderer = SheetRenderer::new(RenderOptions {
        ruler: true,
        ..RenderOptions::default()
    });
    let image = RgbImage::new(8, 8);

    c.bench_function("record_sheet_10mm", |b| {
        b.iter(|| {
            let mut surface = RecordingSurface::new();
            renderer.render(&mut surface, black_box(&geometry), &image).unwrap();
            surface
        })
    });
}

criterion_group!(benches, benchmark_optimizer, benchmark_render);
criterion_main!(benches);
