use std::time::Duration;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use odds_terminal::fake_rows::generate_raw_rows;
use odds_terminal::query::{PageRequest, QueryEngine};
use odds_terminal::schema::Column;
use odds_terminal::transform::transform_collection;

const ROWS: usize = 20_000;

fn bench_transform_collection(c: &mut Criterion) {
    let raws = generate_raw_rows(ROWS, 11);
    c.bench_function("transform_collection_20k", |b| {
        b.iter_batched(
            || raws.clone(),
            |raws| {
                let rows = transform_collection(black_box(raws)).unwrap();
                black_box(rows.len());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_filter_cold_cache(c: &mut Criterion) {
    let rows = transform_collection(generate_raw_rows(ROWS, 11)).unwrap();
    c.bench_function("filter_teams_cold", |b| {
        b.iter_batched(
            || QueryEngine::new(rows.clone(), Duration::ZERO).unwrap(),
            |mut engine| {
                let result = engine.apply_filters([(Column::Teams, "arsenal".to_string())]);
                black_box(result.total);
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_filter_warm_cache(c: &mut Criterion) {
    let rows = transform_collection(generate_raw_rows(ROWS, 11)).unwrap();
    let mut engine = QueryEngine::new(rows, Duration::ZERO).unwrap();
    engine.apply_filters([
        (Column::Teams, "a".to_string()),
        (Column::Home, "2".to_string()),
        (Column::Date, ".24".to_string()),
    ]);

    c.bench_function("filter_three_columns_warm", |b| {
        b.iter(|| {
            let result = engine.apply_filters([
                (Column::Teams, "arsenal".to_string()),
                (Column::Home, "2.".to_string()),
                (Column::Date, ".24".to_string()),
            ]);
            black_box(result.total);
        })
    });
}

fn bench_page_slice(c: &mut Criterion) {
    let rows = transform_collection(generate_raw_rows(ROWS, 11)).unwrap();
    let mut engine = QueryEngine::new(rows, Duration::ZERO).unwrap();
    engine.apply_filters([(Column::League, "league".to_string())]);

    c.bench_function("page_slice", |b| {
        b.iter(|| {
            let result = engine.page(black_box(PageRequest::new(3, 50)));
            black_box(result.rows.len());
        })
    });
}

criterion_group!(
    perf,
    bench_transform_collection,
    bench_filter_cold_cache,
    bench_filter_warm_cache,
    bench_page_slice
);
criterion_main!(perf);
