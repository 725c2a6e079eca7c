use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cloudview_core::{Aabb, Point3f};
use cloudview_viewer::compute_framing;

fn framing_benchmark(c: &mut Criterion) {
    let bounds = Aabb::new(
        Point3f::new(-512.0, -64.0, -512.0),
        Point3f::new(512.0, 192.0, 512.0),
    );
    let fov = 60.0_f32.to_radians();

    c.bench_function("compute_framing", |b| {
        b.iter(|| compute_framing(black_box(&bounds), black_box(fov)))
    });
}

criterion_group!(benches, framing_benchmark);
criterion_main!(benches);
