use criterion::{criterion_group, criterion_main, Criterion, black_box};
use linefish::fish::{export, Fisher, SearchConfig};
use linefish::oracle::MaterialOracle;

fn bench_scheduler(c: &mut Criterion) {
    let config = SearchConfig { max_ply: 3, default_fanout: 2, search_depth: 1, ..SearchConfig::default() };
    c.bench_function("fish_ply3_fanout2_material", |ben| {
        ben.iter(|| {
            let mut f = Fisher::new(MaterialOracle::new());
            let mut s = f.seed(black_box(config.clone())).unwrap();
            f.run(&mut s, |_| {}).unwrap();
            black_box(s.done.len())
        })
    });

    let mut f = Fisher::new(MaterialOracle::new());
    let mut s = f.seed(config.clone()).unwrap();
    f.run(&mut s, |_| {}).unwrap();
    c.bench_function("export_import_ply3", |ben| {
        ben.iter(|| {
            let json = export(black_box(&s)).unwrap();
            black_box(linefish::fish::import(&json))
        })
    });
}

criterion_group!(benches, bench_scheduler);
criterion_main!(benches);
