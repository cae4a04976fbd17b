use std::sync::Arc;

use sheetbase::codec::{RowCodec, RowObject, Value};
use sheetbase::error::{StorageError, TableError};
use sheetbase::grid::GridAccessor;
use sheetbase::table_service::{RowUpdate, TableService};
use sheetbase_core::{CellValue, GridStore};
use sheetbase_memory::InMemoryGrid;
use sheetbase_sqlite::SqliteGrid;
use time::macros::date;

const SHEET: &str = "Items";
const HEADERS: [&str; 4] = ["id", "name", "qty", "due"];

fn provision(store: Arc<dyn GridStore>) -> TableService {
    store.insert_sheet(SHEET).expect("Failed to create sheet");
    let header: Vec<CellValue> = HEADERS.iter().map(|h| CellValue::from(*h)).collect();
    store.write_range(SHEET, 1, 1, &[header]).expect("Failed to write header");
    TableService::new(GridAccessor::new(store), RowCodec::default())
}

fn memory_setup() -> TableService {
    provision(Arc::new(InMemoryGrid::open("test-sheet").expect("Failed to open grid")))
}

fn sqlite_setup() -> TableService {
    provision(Arc::new(SqliteGrid::open(":memory:", "test-sheet").expect("Failed to open grid")))
}

fn item(id: &str, name: &str, qty: i64) -> RowObject {
    RowObject::new().with("id", id).with("name", name).with("qty", qty)
}

fn seed(tables: &TableService, ids: &[&str]) {
    for (i, id) in ids.iter().enumerate() {
        tables
            .append_object(SHEET, &item(id, &format!("item {}", id), i as i64))
            .expect("Failed to append");
    }
}

macro_rules! backend_tests {
    ($($name:ident),* $(,)?) => {
        paste::paste! {
            $(
                #[test]
                fn [<test_ $name _memory>]() {
                    $name(memory_setup());
                }

                #[test]
                fn [<test_ $name _sqlite>]() {
                    $name(sqlite_setup());
                }
            )*
        }
    };
}

backend_tests!(
    append_then_find,
    duplicate_ids_first_wins,
    missing_ids,
    update_merges_fields,
    delete_shifts_rows,
    batch_update_partial_failure,
    batch_append_block,
    empty_batch_append,
    update_cell_formats_dates,
    clear_keeps_header,
    find_by_column_scans,
    missing_sheet_fails_fast,
    scan_returns_data_rows,
    update_row_overwrites_and_pads,
    round_trip_normalizes,
);

fn append_then_find(tables: TableService) {
    let last = tables
        .append_object(
            SHEET,
            &item("A1", "Widget", 7).with("due", Value::Date(date!(2025 - 03 - 04))),
        )
        .unwrap();
    assert_eq!(last, 2);

    let record = tables.find_by_id(SHEET, "A1").unwrap().expect("record");
    assert_eq!(record.text("name"), Some("Widget"));
    assert_eq!(record.number("qty"), Some(7.0));
    assert_eq!(record.text("due"), Some("2025-03-04"));
    assert_eq!(tables.row_count(SHEET).unwrap(), 1);
}

fn duplicate_ids_first_wins(tables: TableService) {
    tables.append_object(SHEET, &item("DUP", "first", 1)).unwrap();
    tables.append_object(SHEET, &item("DUP", "second", 2)).unwrap();

    let record = tables.find_by_id(SHEET, "DUP").unwrap().unwrap();
    assert_eq!(record.text("name"), Some("first"));
    assert_eq!(tables.find_row_number_by_id(SHEET, "DUP").unwrap(), Some(2));
}

fn missing_ids(tables: TableService) {
    seed(&tables, &["A"]);
    assert!(tables.find_by_id(SHEET, "nope").unwrap().is_none());
    assert_eq!(tables.find_row_number_by_id(SHEET, "nope").unwrap(), None);
    assert!(!tables.id_exists(SHEET, "nope").unwrap());
    assert!(!tables.update_by_id(SHEET, "nope", &RowObject::new().with("name", "x")).unwrap());
    assert!(!tables.delete_by_id(SHEET, "nope").unwrap());
    assert_eq!(tables.row_count(SHEET).unwrap(), 1);
}

fn update_merges_fields(tables: TableService) {
    seed(&tables, &["A", "B", "C"]);
    assert!(tables.update_by_id(SHEET, "B", &RowObject::new().with("qty", 99_i64)).unwrap());

    let record = tables.find_by_id(SHEET, "B").unwrap().unwrap();
    assert_eq!(record.text("name"), Some("item B"));
    assert_eq!(record.number("qty"), Some(99.0));
    assert_eq!(tables.find_row_number_by_id(SHEET, "B").unwrap(), Some(3));
    assert_eq!(tables.row_count(SHEET).unwrap(), 3);
}

fn delete_shifts_rows(tables: TableService) {
    seed(&tables, &["A", "B", "C"]);
    assert_eq!(tables.find_row_number_by_id(SHEET, "C").unwrap(), Some(4));

    assert!(tables.delete_by_id(SHEET, "B").unwrap());
    assert_eq!(tables.find_row_number_by_id(SHEET, "C").unwrap(), Some(3));
    assert_eq!(tables.row_count(SHEET).unwrap(), 2);
    assert!(tables.find_by_id(SHEET, "B").unwrap().is_none());
}

fn batch_update_partial_failure(tables: TableService) {
    seed(&tables, &["A"]);
    let outcome = tables.batch_update(
        SHEET,
        &[
            RowUpdate::new("A", RowObject::new().with("name", "renamed")),
            RowUpdate::new("ghost", RowObject::new().with("name", "never")),
        ],
    );
    assert_eq!(outcome.success_count, 1);
    assert_eq!(outcome.fail_count, 1);
    assert_eq!(outcome.failures[0].id, "ghost");

    let record = tables.find_by_id(SHEET, "A").unwrap().unwrap();
    assert_eq!(record.text("name"), Some("renamed"));
}

fn batch_append_block(tables: TableService) {
    seed(&tables, &["A"]);
    let written = tables
        .batch_append(SHEET, &[item("B", "b", 1), item("C", "c", 2)])
        .unwrap();
    assert_eq!(written, 2);
    assert_eq!(tables.row_count(SHEET).unwrap(), 3);
    assert_eq!(tables.find_row_number_by_id(SHEET, "C").unwrap(), Some(4));
}

fn empty_batch_append(tables: TableService) {
    assert_eq!(tables.batch_append(SHEET, &[]).unwrap(), 0);
    assert_eq!(tables.batch_append("NoSuchSheet", &[]).unwrap(), 0);
    assert_eq!(tables.row_count(SHEET).unwrap(), 0);
}

fn update_cell_formats_dates(tables: TableService) {
    seed(&tables, &["A"]);
    tables
        .update_cell(SHEET, 2, 4, &Value::Date(date!(2024 - 12 - 31)))
        .unwrap();
    let record = tables.find_by_id(SHEET, "A").unwrap().unwrap();
    assert_eq!(record.text("due"), Some("2024-12-31"));
}

fn clear_keeps_header(tables: TableService) {
    seed(&tables, &["A", "B"]);
    tables.clear_all_data(SHEET).unwrap();
    assert_eq!(tables.row_count(SHEET).unwrap(), 0);
    assert!(tables.get_all_data(SHEET).unwrap().is_empty());
    assert_eq!(tables.headers(SHEET).unwrap(), HEADERS.to_vec());
}

fn find_by_column_scans(tables: TableService) {
    tables.append_object(SHEET, &item("A", "same", 1)).unwrap();
    tables.append_object(SHEET, &item("B", "other", 2)).unwrap();
    tables.append_object(SHEET, &item("C", "same", 3)).unwrap();

    let found = tables.find_by_column(SHEET, "name", &CellValue::from("same")).unwrap();
    let ids: Vec<_> = found.iter().filter_map(|r| r.text("id")).collect();
    assert_eq!(ids, vec!["A", "C"]);
}

fn missing_sheet_fails_fast(tables: TableService) {
    let err = tables.get_all_records("Missing").unwrap_err();
    assert!(matches!(err, TableError::Storage(StorageError::SheetNotFound(ref name)) if name == "Missing"));
    assert!(tables.append_row("Missing", &[CellValue::from("x")]).is_err());
}

fn scan_returns_data_rows(tables: TableService) {
    seed(&tables, &["A", "B"]);
    let rows = tables.get_all_data(SHEET).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], CellValue::from("A"));
    assert_eq!(rows[1][1], CellValue::from("item B"));
    assert_eq!(rows[0].len(), HEADERS.len());
    assert_eq!(rows[0][3], CellValue::Empty);
}

fn update_row_overwrites_and_pads(tables: TableService) {
    seed(&tables, &["A", "B"]);
    tables
        .update_row(SHEET, 3, &[CellValue::from("B"), CellValue::from("short")])
        .unwrap();

    let record = tables.find_by_id(SHEET, "B").unwrap().unwrap();
    assert_eq!(record.text("name"), Some("short"));
    assert_eq!(record.get("qty"), Some(&CellValue::Empty));
    let untouched = tables.find_by_id(SHEET, "A").unwrap().unwrap();
    assert_eq!(untouched.text("name"), Some("item A"));
    assert_eq!(tables.row_count(SHEET).unwrap(), 2);
}

fn round_trip_normalizes(tables: TableService) {
    let object = RowObject::new()
        .with("id", "R")
        .with("name", Value::Null)
        .with("qty", false)
        .with("due", Value::Date(date!(2025 - 03 - 04)));
    tables.append_object(SHEET, &object).unwrap();

    let record = tables.find_by_id(SHEET, "R").unwrap().unwrap();
    assert_eq!(record.get("name"), Some(&CellValue::Empty));
    assert_eq!(record.get("qty"), Some(&CellValue::Bool(false)));
    assert_eq!(record.text("due"), Some("2025-03-04"));
}

#[test]
fn test_sqlite_data_survives_reopen() {
    let path = std::env::temp_dir().join(format!("sheetbase-{}.db", std::process::id()));
    let path = path.to_str().unwrap().to_string();
    let _ = std::fs::remove_file(&path);

    {
        let tables = provision(Arc::new(SqliteGrid::open(&path, "durable").unwrap()));
        seed(&tables, &["A", "B"]);
    }

    let reopened = TableService::new(
        GridAccessor::new(Arc::new(SqliteGrid::open(&path, "durable").unwrap())),
        RowCodec::default(),
    );
    assert_eq!(reopened.row_count(SHEET).unwrap(), 2);
    assert!(reopened.id_exists(SHEET, "B").unwrap());

    let _ = std::fs::remove_file(&path);
}
