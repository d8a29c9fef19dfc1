use catalog_api::api::item::item_repository::NewItem;
use catalog_api::infra::validation::Valid;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn validate_new_item_benchmark(c: &mut Criterion) {
    c.bench_function("validate_new_item", |b| {
        b.iter(|| {
            Valid::new(black_box(NewItem {
                nom: "Chaise de jardin".to_string(),
                prix: 9.99,
            }))
        })
    });
}

criterion_group!(benches, validate_new_item_benchmark);
criterion_main!(benches);
