use cassowary_core::{Strength, System};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Build a moderately sized layout-shaped system: a chain of `n` boxes,
/// each anchored to the previous with a hard margin and a soft centering
/// bias, which is representative of the constraint density a real widget
/// tree produces per layout pass.
fn build_system(n: usize) -> System {
    let mut sys = System::new();
    let mut lefts = Vec::with_capacity(n);
    let mut rights = Vec::with_capacity(n);

    let origin = sys.create_variable();
    sys.add_constraint_eq_const(origin, 0.0).unwrap();
    lefts.push(origin);

    for i in 0..n {
        let right = sys.create_variable();
        sys.add_constraint_eq(right, lefts[i], 20.0, false, Strength::Fixed).unwrap();
        rights.push(right);
        if i + 1 < n {
            let next_left = sys.create_variable();
            sys.add_constraint_ge(next_left, right, 4.0, false, Strength::Fixed).unwrap();
            sys.add_constraint_eq(next_left, right, 4.0, true, Strength::Medium).unwrap();
            lefts.push(next_left);
        }
    }

    sys
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimize");
    for &n in &[8usize, 64, 256] {
        group.bench_function(format!("chain_{n}"), |b| {
            b.iter(|| {
                let mut sys = build_system(black_box(n));
                sys.minimize().unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
