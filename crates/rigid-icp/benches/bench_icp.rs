use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rigid_3d::{transforms, PointSet, RigidTransform};
use rigid_icp::{BruteForceMatcher, IcpConvergenceCriteria, IcpEngine, NearestNeighborMatcher};

fn create_random_points(num_points: usize) -> Vec<[f64; 3]> {
    (0..num_points)
        .map(|_| {
            [
                rand::random::<f64>(),
                rand::random::<f64>(),
                rand::random::<f64>(),
            ]
        })
        .collect()
}

fn bench_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_neighbor");

    for num_points in [100, 1000, 5000].iter() {
        group.throughput(criterion::Throughput::Elements(*num_points as u64));
        let parameter_string = format!("{}", num_points);

        let source = PointSet::new(create_random_points(*num_points), None).unwrap();
        let target = PointSet::new(create_random_points(*num_points), None).unwrap();

        for (name, matcher) in [
            ("sequential", BruteForceMatcher::sequential()),
            ("parallel", BruteForceMatcher::default()),
        ] {
            group.bench_with_input(
                BenchmarkId::new(name, &parameter_string),
                &(&source, &target),
                |b, (src, dst)| {
                    b.iter(|| black_box(matcher.find_nearest(src, dst)));
                },
            );
        }
    }
    group.finish();
}

fn bench_icp(c: &mut Criterion) {
    let mut group = c.benchmark_group("icp");
    group.sample_size(10);

    let motion = RigidTransform::new(
        transforms::euler_to_rotation_matrix(0.05, -0.02, 0.1),
        [0.05, 0.0, -0.05],
    );

    for num_points in [500, 2000].iter() {
        let source = PointSet::new(create_random_points(*num_points), None).unwrap();
        let target = source.transformed(&motion).unwrap();
        let criteria = IcpConvergenceCriteria {
            max_iterations: 20,
            tolerance: 1e-6,
        };

        group.bench_with_input(
            BenchmarkId::new("icp_engine", num_points),
            &(&source, &target),
            |b, (src, dst)| {
                b.iter(|| {
                    let engine = IcpEngine::new(src, dst, criteria).unwrap();
                    black_box(engine.count())
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_matcher, bench_icp);
criterion_main!(benches);
