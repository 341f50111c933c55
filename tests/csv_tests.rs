//! CSV loaders reject invalid rows before they reach the analytics.

use mursis_analytics::core::CustomerRecord;
use mursis_analytics::data::{create_customer_data, load_customer_csv, load_sales_csv};
use mursis_analytics::store::{save, CsvDirStore, WriteMode};
use mursis_analytics::AnalyticsError;
use std::fs;

fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

fn parse_position(err: AnalyticsError) -> (usize, String) {
    match err {
        AnalyticsError::Parse { row, column, .. } => (row, column),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn invalid_customer_files_are_rejected_with_position() {
    let dir = tempfile::tempdir().unwrap();
    let header = "customer_id,avg_purchase_value,purchase_frequency,return_rate\n";
    let cases = [
        ("C1,100,10,0.1\nC1,200,5,0.2\n", (2, "customer_id")),
        ("C1,100,10,0.1\nC2,200,5,1.7\n", (2, "return_rate")),
        ("C1,100,10,0.1\nC2,-50,2,0.2\n", (2, "avg_purchase_value")),
        ("C1,100,NaN,0.1\n", (1, "purchase_frequency")),
    ];
    for (i, (rows, (row, column))) in cases.iter().enumerate() {
        let path = write(&dir, &format!("customers_{i}.csv"), &format!("{header}{rows}"));
        let err = load_customer_csv(&path, 42).unwrap_err();
        assert_eq!(parse_position(err), (*row, column.to_string()), "case {i}");
    }
}

#[test]
fn invalid_sales_files_are_rejected_with_position() {
    let dir = tempfile::tempdir().unwrap();
    let cases = [
        ("2024-01-01,10\n2024-01-01,12\n", (2, "date")),
        ("2024-01-01,10\n2024-01-02,-3\n", (2, "sales")),
        ("2024-01-01,NaN\n", (1, "sales")),
    ];
    for (i, (rows, (row, column))) in cases.iter().enumerate() {
        let path = write(&dir, &format!("sales_{i}.csv"), &format!("date,sales\n{rows}"));
        let err = load_sales_csv(&path).unwrap_err();
        assert_eq!(parse_position(err), (*row, column.to_string()), "case {i}");
    }
}

#[test]
fn generated_customers_pass_validation_after_a_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvDirStore::open(dir.path()).unwrap();
    let customers: Vec<CustomerRecord> = create_customer_data(300, 11).unwrap().customers;
    save(&store, "customer_data", &customers, WriteMode::Replace).unwrap();

    let dataset = load_customer_csv(store.path_of("customer_data"), 0).unwrap();
    assert!(dataset.filled_columns.is_empty());
    assert_eq!(dataset.customers, customers);
}
