use std::hint::black_box;
use std::time::Instant;

use gridglow_common::Viewport;
use gridglow_render::{GridRenderer, HeightField, RecordingSurface, lift_at};

fn bench_render_frame(width: u32, height: u32, iterations: usize) {
    let viewport = Viewport::new(width, height);
    let mut renderer = GridRenderer::new(viewport);
    let mut surface = RecordingSurface::new(viewport);
    renderer.on_pointer_move(width as f32 / 2.0, height as f32 / 2.0);

    let start = Instant::now();
    for i in 0..iterations {
        // Sweep the pointer so the glow keeps moving
        let x = (i % width.max(1) as usize) as f32;
        renderer.on_pointer_move(black_box(x), height as f32 / 2.0);
        let _ = black_box(renderer.render_frame(&mut surface));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  render_frame ({width}x{height}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_height_field(width: u32, height: u32, iterations: usize) {
    let renderer = GridRenderer::new(Viewport::new(width, height));
    let layout = renderer.layout();
    let config = renderer.config().clone();
    let pointer = glam::Vec2::new(width as f32 / 3.0, height as f32 / 3.0);
    let mut field = HeightField::new();

    let start = Instant::now();
    for _ in 0..iterations {
        field.rebuild(black_box(layout), |p| lift_at(p, pointer, &config));
        black_box(field.peak());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  height field ({} vertices, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}",
        layout.vertex_count()
    );
}

fn main() {
    println!("=== Grid Render Benchmarks ===\n");

    println!("Full frame (recording surface):");
    bench_render_frame(800, 600, 500);
    bench_render_frame(1920, 1080, 100);
    bench_render_frame(3840, 2160, 20);

    println!("\nHeight field rebuild:");
    bench_height_field(800, 600, 5000);
    bench_height_field(1920, 1080, 1000);
    bench_height_field(3840, 2160, 200);

    println!("\n=== Done ===");
}
