use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sheetbase::codec::{RowCodec, RowObject};
use sheetbase::grid::GridAccessor;
use sheetbase::schema::Table;
use sheetbase::table_service::TableService;
use sheetbase_memory::InMemoryGrid;

fn setup() -> TableService {
    let banks = Table::Banks;
    let grid = InMemoryGrid::with_sheets("bench", &[(banks.name(), banks.fields())]).unwrap();
    TableService::new(GridAccessor::new(Arc::new(grid)), RowCodec::default())
}

fn seed_data(tables: &TableService, rows: usize) {
    let objects: Vec<RowObject> = (0..rows)
        .map(|i| {
            RowObject::new()
                .with("bank_id", format!("BANK-{}", i))
                .with("name", format!("Bank {}", i))
                .with("is_bodega", i % 2 == 0)
                .with("supports_bizum", i % 3 == 0)
                .with("active", true)
        })
        .collect();
    tables.batch_append(Table::Banks.name(), &objects).unwrap();
}

fn bench_get_all_records(c: &mut Criterion) {
    let tables = setup();
    seed_data(&tables, 1000);

    c.bench_function("get_all_records_1000", |b| {
        b.iter(|| tables.get_all_records(black_box(Table::Banks.name())).unwrap())
    });
}

fn bench_find_by_id(c: &mut Criterion) {
    let tables = setup();
    seed_data(&tables, 1000);

    // Worst case: the id sits in the last row.
    c.bench_function("find_by_id_last_of_1000", |b| {
        b.iter(|| tables.find_by_id(Table::Banks.name(), black_box("BANK-999")).unwrap())
    });
}

fn bench_update_by_id(c: &mut Criterion) {
    let tables = setup();
    seed_data(&tables, 1000);
    let updates = RowObject::new().with("supports_bizum", true);

    c.bench_function("update_by_id_of_1000", |b| {
        b.iter(|| {
            tables
                .update_by_id(Table::Banks.name(), black_box("BANK-500"), &updates)
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_get_all_records,
    bench_find_by_id,
    bench_update_by_id
);
criterion_main!(benches);
