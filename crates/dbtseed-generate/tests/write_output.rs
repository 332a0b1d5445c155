use std::fs;
use std::path::PathBuf;

use dbtseed_core::{Column, DataType, Schema, Table};
use dbtseed_generate::{GenerateOptions, GenerationEngine, GenerationReport, write_output};

fn schema() -> Schema {
    Schema {
        models: vec![
            Table::new(
                "customers",
                vec![
                    Column::new("customer_id", DataType::Integer).primary_key(),
                    Column::new("nickname", DataType::Varchar),
                    Column::new("signed_up", DataType::Date).with_test("not_null"),
                ],
            ),
            Table::new(
                "orders",
                vec![
                    Column::new("order_id", DataType::Integer).primary_key(),
                    Column::new("customer_id", DataType::Integer)
                        .references("customers.customer_id"),
                ],
            ),
        ],
    }
}

#[test]
fn writes_one_csv_per_table_and_a_report() {
    let options = GenerateOptions {
        seed: Some(21),
        default_null_probability: 1.0,
        ..GenerateOptions::default()
    };
    let mut engine = GenerationEngine::new(schema(), options).expect("engine");
    let output = engine.generate(4, 4).expect("generate");

    let out_dir = temp_out_dir("write");
    let written = write_output(&out_dir, &output).expect("write output");
    assert_eq!(written.table_files.len(), 2);
    assert!(written.bytes_written > 0);

    let mut reader = csv::Reader::from_path(out_dir.join("customers.csv")).expect("open csv");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["customer_id", "nickname", "signed_up"]
    );
    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .expect("records");
    assert_eq!(records.len(), 4);
    for record in &records {
        assert!(record[0].parse::<i64>().is_ok());
        assert_eq!(&record[1], "", "nullable column should be empty");
        assert_eq!(record[2].len(), "2024-01-01".len());
    }

    let report: GenerationReport = serde_json::from_str(
        &fs::read_to_string(&written.report_file).expect("read report"),
    )
    .expect("parse report");
    assert_eq!(report.run_id, output.report.run_id);
    let orders = report
        .tables
        .iter()
        .find(|table| table.table == "orders")
        .expect("orders report");
    assert_eq!(orders.rows_generated, 4);

    fs::remove_dir_all(&out_dir).ok();
}

fn temp_out_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("dbtseed_generate_{label}_{}", uuid::Uuid::new_v4()));
    dir
}
