mod common;

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use churn_dash::data::cache::DatasetCache;
use churn_dash::data::loader::{load, Encoding, LoadOptions};
use churn_dash::data::model::{ColumnKind, Value};
use churn_dash::DashboardError;
use parquet::arrow::ArrowWriter;

use common::{customer_line, customers_csv, write_file, HEADER};

#[test]
fn latin1_file_loads_without_identifier() {
    let file = customers_csv(20, 5);
    let ds = load(file.path(), Encoding::Latin1).unwrap();

    assert_eq!(ds.len(), 20);
    assert!(!ds.schema.contains("CLIENTNUM"));
    assert!(ds.records.iter().all(|r| r.get("CLIENTNUM").is_none()));
    assert_eq!(ds.schema.column("Educação").unwrap().kind, ColumnKind::Categorical);
    assert_eq!(
        ds.schema.column("Taxa de Utilização Cartão").unwrap().kind,
        ColumnKind::Numeric
    );
    assert_eq!(ds.records[0].get("Educação"), Some(&Value::from("Graduação")));
}

#[test]
fn incomplete_rows_never_reach_the_dataset() {
    let mut lines = vec![HEADER.to_string()];
    lines.extend((0..10).map(|i| customer_line(i, false)));
    lines.push("1,Cliente,,M,Graduação,$120K +,2000,300,0.1".to_string());
    lines.push("2,Cliente,40,M,NaN,$120K +,2000,300,0.1".to_string());
    lines.push("3,Cancelado,40,M".to_string());
    let file = write_file(".csv", Encoding::Latin1, &lines);

    let ds = load(file.path(), Encoding::Latin1).unwrap();
    assert_eq!(ds.len(), 10);
    for record in &ds.records {
        for name in ds.schema.names() {
            assert!(record.get(name).is_some(), "{name} missing");
        }
    }
}

#[test]
fn missing_required_columns_fail_the_load() {
    let lines = vec![
        "CLIENTNUM,Categoria,Idade".to_string(),
        "1,Cliente,40".to_string(),
    ];
    let file = write_file(".csv", Encoding::Latin1, &lines);
    let err = load(file.path(), Encoding::Latin1).unwrap_err();
    assert!(err.is_load_error());
    match err {
        DashboardError::Schema { missing } => assert_eq!(
            missing,
            vec![
                "Faixa Salarial Anual",
                "Limite",
                "Valor Transacoes 12m",
                "Taxa de Utilização Cartão"
            ]
        ),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_file_is_reported_as_io() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(&dir.path().join("ClientesBanco.csv"), Encoding::Latin1).unwrap_err();
    assert!(matches!(err, DashboardError::Io { .. }));
}

#[test]
fn loading_twice_gives_identical_datasets() {
    let file = customers_csv(50, 10);
    let first = load(file.path(), Encoding::Latin1).unwrap();
    let second = load(file.path(), Encoding::Latin1).unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(first, second);

    // The identifier is already gone; dropping it again changes nothing.
    let dropped = second.clone().without_column("CLIENTNUM");
    assert_eq!(dropped, second);
}

#[test]
fn cache_loads_each_file_once() {
    let file = customers_csv(30, 3);
    let cache = DatasetCache::new();
    let options = LoadOptions::default();

    let a = cache.get_or_load(file.path(), &options).unwrap();
    let b = cache.get_or_load(file.path(), &options).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.len(), 30);
}

#[test]
fn parquet_nulls_are_dropped() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("CLIENTNUM", DataType::Int64, false),
        Field::new("Categoria", DataType::Utf8, true),
        Field::new("Idade", DataType::Int64, true),
        Field::new("Faixa Salarial Anual", DataType::Utf8, false),
        Field::new("Limite", DataType::Float64, false),
        Field::new("Valor Transacoes 12m", DataType::Float64, false),
        Field::new("Taxa de Utilização Cartão", DataType::Float64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![1, 2, 3])),
        Arc::new(StringArray::from(vec![Some("Cliente"), None, Some("Cancelado")])),
        Arc::new(Int64Array::from(vec![Some(45), Some(50), Some(38)])),
        Arc::new(StringArray::from(vec!["$120K +", "$40K - $60K", "Menos de $40K"])),
        Arc::new(Float64Array::from(vec![12691.0, 8256.0, 3418.0])),
        Arc::new(Float64Array::from(vec![1144.0, 1291.0, f64::NAN])),
        Arc::new(Float64Array::from(vec![0.061, 0.105, 0.0])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

    let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
    let mut writer =
        ArrowWriter::try_new(file.as_file().try_clone().unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let ds = load(file.path(), Encoding::Utf8).unwrap();
    assert_eq!(ds.len(), 1);
    assert_eq!(ds.records[0].get("Categoria"), Some(&Value::from("Cliente")));
    assert_eq!(ds.records[0].number("Idade"), Some(45.0));
    assert_eq!(ds.schema.column("Idade").unwrap().kind, ColumnKind::Numeric);
}

#[test]
fn tab_separated_file_loads_by_extension() {
    let mut lines = vec![HEADER.replace(',', "\t")];
    lines.extend((0..6).map(|i| customer_line(i, i < 2).replace(',', "\t")));
    let file = write_file(".tsv", Encoding::Latin1, &lines);

    let ds = load(file.path(), Encoding::Latin1).unwrap();
    assert_eq!(ds.len(), 6);
    assert!(!ds.schema.contains("CLIENTNUM"));
    assert_eq!(ds.schema.column("Limite").unwrap().kind, ColumnKind::Numeric);
    assert_eq!(ds.records[0].get("Categoria"), Some(&Value::from("Cancelado")));
}

#[test]
fn json_records_file_loads_by_extension() {
    let text = r#"[
        {"CLIENTNUM": 1, "Categoria": "Cancelado", "Idade": 45, "Faixa Salarial Anual": "$60K - $80K",
         "Limite": 12691.0, "Valor Transacoes 12m": 1144, "Taxa de Utilização Cartão": 0.061},
        {"CLIENTNUM": 2, "Categoria": "Cliente", "Idade": 38, "Faixa Salarial Anual": "Menos de $40K",
         "Limite": 3418.0, "Valor Transacoes 12m": 1887, "Taxa de Utilização Cartão": 0.0},
        {"CLIENTNUM": 3, "Categoria": "Cliente", "Idade": null, "Faixa Salarial Anual": "$120K +",
         "Limite": 9000.0, "Valor Transacoes 12m": 800, "Taxa de Utilização Cartão": 0.2}
    ]"#;
    let file = write_file(".json", Encoding::Utf8, &[text.to_string()]);

    let ds = load(file.path(), Encoding::Utf8).unwrap();
    assert_eq!(ds.len(), 2);
    assert!(!ds.schema.contains("CLIENTNUM"));
    assert_eq!(ds.records[1].number("Limite"), Some(3418.0));
}

#[test]
fn repeated_header_fails_the_load() {
    let lines = vec![
        format!("{HEADER},Idade"),
        format!("{},50", customer_line(0, false)),
    ];
    let file = write_file(".csv", Encoding::Latin1, &lines);

    let err = load(file.path(), Encoding::Latin1).unwrap_err();
    assert!(matches!(err, DashboardError::DuplicateColumns { .. }));
    assert!(err.is_load_error());
}
