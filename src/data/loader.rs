use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::model::{Column, ColumnInfo, ColumnKind, CustomerRecord, Dataset, Schema, Value};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Character encoding of a delimited text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    /// ISO-8859-1: every byte is the code point of the same value.
    #[default]
    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
}

impl Encoding {
    /// Decode raw bytes. `None` when the bytes are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            Encoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    /// Encode text. Characters Latin-1 cannot represent become `?`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => f.write_str("UTF-8"),
            Encoding::Latin1 => f.write_str("Latin-1"),
        }
    }
}

/// Cell spellings treated as a missing value (the usual dataframe defaults).
pub const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(cell: &str) -> bool {
    NA_MARKERS.contains(&cell.trim())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadOptions {
    pub encoding: Encoding,
    pub delimiter: u8,
    /// Dropped from the result whenever present.
    pub identifier_column: String,
    /// Headers that must be present, identifier included.
    pub required_columns: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            delimiter: b',',
            identifier_column: Column::IDENTIFIER.header().to_string(),
            required_columns: Column::REQUIRED
                .iter()
                .map(|c| c.header().to_string())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the customer table with the default column requirements.
pub fn load(path: &Path, encoding: Encoding) -> Result<Dataset> {
    load_with(
        path,
        &LoadOptions {
            encoding,
            ..LoadOptions::default()
        },
    )
}

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – delimited text with a header row
/// * `.tsv`          – same, tab separated
/// * `.json`         – `[{ "Categoria": "Cliente", "Idade": 45, ... }, ...]`
/// * `.parquet`      – one column per field
pub fn load_with(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let open = || File::open(path).map_err(|e| DashboardError::io(path, e));

    let dataset = match ext.as_str() {
        "csv" | "txt" => read_delimited(BufReader::new(open()?), options)?,
        "tsv" => {
            let options = LoadOptions {
                delimiter: b'\t',
                ..options.clone()
            };
            read_delimited(BufReader::new(open()?), &options)?
        }
        "json" => {
            let text = std::fs::read_to_string(path).map_err(|e| DashboardError::io(path, e))?;
            read_json(&text, options)?
        }
        "parquet" | "pq" => read_parquet(open()?, options)?,
        other => return Err(DashboardError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} customers with {} columns from {}",
        dataset.len(),
        dataset.schema.len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Raw table shared by every format
// ---------------------------------------------------------------------------

/// A present (non-missing) cell before column types are known.
#[derive(Debug)]
struct RawCell {
    text: String,
    number: Option<f64>,
}

/// NaN is never a number; infinities are, and `-0.0` reads as `0.0`.
fn number(v: f64) -> Option<f64> {
    match v {
        v if v.is_nan() => None,
        v if v == 0.0 => Some(0.0),
        v => Some(v),
    }
}

impl RawCell {
    fn parse(text: String) -> Self {
        let number = text.trim().parse::<f64>().ok().and_then(number);
        RawCell { text, number }
    }
}

struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<RawCell>>>,
}

impl RawTable {
    /// Check required headers, drop the identifier, drop incomplete rows and
    /// infer column kinds. A column is numeric when every kept cell is a number.
    fn into_dataset(self, options: &LoadOptions) -> Result<Dataset> {
        let RawTable { headers, rows } = self;

        let mut seen = HashSet::new();
        let mut duplicated: Vec<String> = headers
            .iter()
            .filter(|h| !seen.insert(h.as_str()))
            .cloned()
            .collect();
        if !duplicated.is_empty() {
            duplicated.sort();
            duplicated.dedup();
            return Err(DashboardError::DuplicateColumns { duplicated });
        }

        let missing: Vec<String> = options
            .required_columns
            .iter()
            .filter(|c| !headers.contains(c))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(DashboardError::Schema { missing });
        }

        let keep: Vec<usize> = (0..headers.len())
            .filter(|&i| headers[i] != options.identifier_column)
            .collect();

        let total = rows.len();
        let rows: Vec<Vec<RawCell>> = rows
            .into_iter()
            .filter_map(|mut row| {
                keep.iter()
                    .map(|&i| row.get_mut(i).and_then(Option::take))
                    .collect::<Option<Vec<_>>>()
            })
            .collect();
        if rows.len() < total {
            log::info!(
                "Dropped {} of {total} rows with missing values",
                total - rows.len()
            );
        }

        let columns: Vec<ColumnInfo> = keep
            .iter()
            .enumerate()
            .map(|(j, &i)| {
                let numeric = !rows.is_empty() && rows.iter().all(|r| r[j].number.is_some());
                ColumnInfo {
                    name: headers[i].clone(),
                    kind: if numeric {
                        ColumnKind::Numeric
                    } else {
                        ColumnKind::Categorical
                    },
                }
            })
            .collect();

        let records = rows
            .into_iter()
            .map(|row| CustomerRecord {
                fields: columns
                    .iter()
                    .zip(row)
                    .map(|(info, cell)| {
                        let value = match (info.kind, cell.number) {
                            (ColumnKind::Numeric, Some(v)) => Value::Number(v),
                            _ => Value::Text(cell.text),
                        };
                        (info.name.clone(), value)
                    })
                    .collect(),
            })
            .collect();

        Ok(Dataset::from_records(Schema::new(columns), records))
    }
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse delimited text with a header row. Short rows count as incomplete and
/// are dropped together with rows holding a missing marker.
pub fn read_delimited<R: Read>(reader: R, options: &LoadOptions) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(reader);

    let decode = |bytes: &[u8], row: usize| {
        options
            .encoding
            .decode(bytes)
            .ok_or(DashboardError::Encoding {
                encoding: options.encoding,
                row,
            })
    };

    let headers = reader
        .byte_headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 {
                h.strip_prefix(UTF8_BOM).unwrap_or(h)
            } else {
                h
            };
            decode(h, 0)
        })
        .collect::<Result<Vec<String>>>()?;

    let mut rows = Vec::new();
    for (row_no, record) in reader.byte_records().enumerate() {
        let record = record?;
        let row = (0..headers.len())
            .map(|i| match record.get(i) {
                Some(bytes) => {
                    let text = decode(bytes, row_no + 1)?;
                    Ok((!is_missing(&text)).then(|| RawCell::parse(text)))
                }
                None => Ok(None),
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }

    RawTable { headers, rows }.into_dataset(options)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`). A `null` or absent
/// key is a missing value.
pub fn read_json(text: &str, options: &LoadOptions) -> Result<Dataset> {
    let objects: Vec<JsonMap<String, JsonValue>> = serde_json::from_str(text)?;

    let mut headers: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for obj in &objects {
        for key in obj.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), headers.len());
                headers.push(key.clone());
            }
        }
    }

    let rows = objects
        .into_iter()
        .map(|obj| {
            let mut row: Vec<Option<RawCell>> = (0..headers.len()).map(|_| None).collect();
            for (key, val) in obj {
                row[positions[&key]] = json_cell(val);
            }
            row
        })
        .collect();

    RawTable { headers, rows }.into_dataset(options)
}

fn json_cell(val: JsonValue) -> Option<RawCell> {
    match val {
        JsonValue::Null => None,
        JsonValue::Number(n) => Some(RawCell {
            text: n.to_string(),
            number: n.as_f64().and_then(number),
        }),
        JsonValue::String(s) if is_missing(&s) => None,
        JsonValue::String(s) => Some(RawCell::parse(s)),
        other => Some(RawCell {
            text: other.to_string(),
            number: None,
        }),
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Nulls and NaN floats are missing values.
fn read_parquet(file: File, options: &LoadOptions) -> Result<Dataset> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| arrow_cell(col, row))
                .collect::<Result<Vec<_>>>()?;
            rows.push(cells);
        }
    }

    RawTable { headers, rows }.into_dataset(options)
}

fn arrow_cell(col: &ArrayRef, row: usize) -> Result<Option<RawCell>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let number = match col.data_type() {
        DataType::Int8 => Some(col.as_primitive::<Int8Type>().value(row) as f64),
        DataType::Int16 => Some(col.as_primitive::<Int16Type>().value(row) as f64),
        DataType::Int32 => Some(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Int64 => Some(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::UInt8 => Some(col.as_primitive::<UInt8Type>().value(row) as f64),
        DataType::UInt16 => Some(col.as_primitive::<UInt16Type>().value(row) as f64),
        DataType::UInt32 => Some(col.as_primitive::<UInt32Type>().value(row) as f64),
        DataType::UInt64 => Some(col.as_primitive::<UInt64Type>().value(row) as f64),
        DataType::Float32 => Some(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Some(col.as_primitive::<Float64Type>().value(row)),
        _ => None,
    };
    if number.is_some_and(f64::is_nan) {
        return Ok(None);
    }
    let text = array_value_to_string(col.as_ref(), row)?;
    Ok(Some(RawCell {
        text,
        number: number.and_then(self::number),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply, FilterSelection};

    const HEADER: &str = "CLIENTNUM,Categoria,Idade,Faixa Salarial Anual,Limite,Valor Transacoes 12m,Taxa de Utilização Cartão";

    fn options(encoding: Encoding) -> LoadOptions {
        LoadOptions {
            encoding,
            ..LoadOptions::default()
        }
    }

    #[test]
    fn latin1_headers_and_cells_decode() {
        let text = format!("{HEADER},Educação\n1,Cliente,45,$60K - $80K,12691,1144,0.061,Graduação\n");
        let bytes = Encoding::Latin1.encode(&text);
        let ds = read_delimited(bytes.as_slice(), &options(Encoding::Latin1)).unwrap();
        assert!(ds.schema.contains("Taxa de Utilização Cartão"));
        assert_eq!(
            ds.records[0].get("Educação"),
            Some(&Value::from("Graduação"))
        );
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let text = format!("{HEADER}\n1,Cliente,45,$60K - $80K,12691,1144,0.061\n");
        let bytes = Encoding::Latin1.encode(&text);
        let err = read_delimited(bytes.as_slice(), &options(Encoding::Utf8)).unwrap_err();
        assert!(matches!(err, DashboardError::Encoding { row: 0, .. }));
    }

    #[test]
    fn identifier_is_dropped_and_kinds_inferred() {
        let text = format!("{HEADER}\n1,Cliente,45,$60K - $80K,12691,1144,0.061\n2,Cancelado,38,Menos de $40K,3418,1887,0\n");
        let ds = read_delimited(text.as_bytes(), &options(Encoding::Utf8)).unwrap();
        assert!(!ds.schema.contains("CLIENTNUM"));
        assert_eq!(ds.schema.column("Idade").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(
            ds.schema.column("Categoria").unwrap().kind,
            ColumnKind::Categorical
        );
        assert_eq!(ds.records[1].number("Limite"), Some(3418.0));
    }

    #[test]
    fn rows_with_missing_or_short_cells_are_dropped() {
        let text = format!(
            "{HEADER}\n\
             1,Cliente,45,$60K - $80K,12691,1144,0.061\n\
             2,Cliente,NA,$60K - $80K,12691,1144,0.061\n\
             3,Cliente,,$60K - $80K,12691,1144,0.061\n\
             4,Cliente,45,$60K - $80K\n\
             ,Cancelado,50,$120K +,9000,800,0.2\n"
        );
        let ds = read_delimited(text.as_bytes(), &options(Encoding::Utf8)).unwrap();
        // The identifier is not checked for missing values since it is dropped.
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn every_missing_required_column_is_reported() {
        let text = "CLIENTNUM,Categoria\n1,Cliente\n";
        let err = read_delimited(text.as_bytes(), &options(Encoding::Utf8)).unwrap_err();
        match err {
            DashboardError::Schema { missing } => {
                assert_eq!(missing.len(), 5);
                assert!(missing.contains(&"Idade".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn utf8_bom_is_stripped_from_first_header() {
        let text = format!("\u{feff}{HEADER}\n1,Cliente,45,$60K - $80K,12691,1144,0.061\n");
        let ds = read_delimited(text.as_bytes(), &options(Encoding::Utf8)).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn mixed_column_stays_categorical() {
        let text = format!(
            "{HEADER},Dependentes\n1,Cliente,45,$60K - $80K,12691,1144,0.061,3\n2,Cliente,45,$60K - $80K,12691,1144,0.061,many\n"
        );
        let ds = read_delimited(text.as_bytes(), &options(Encoding::Utf8)).unwrap();
        assert_eq!(
            ds.schema.column("Dependentes").unwrap().kind,
            ColumnKind::Categorical
        );
        assert_eq!(ds.records[0].get("Dependentes"), Some(&Value::from("3")));
    }

    #[test]
    fn json_records_load_with_nulls_dropped() {
        let text = r#"[
            {"CLIENTNUM": 1, "Categoria": "Cliente", "Idade": 45, "Faixa Salarial Anual": "$60K - $80K",
             "Limite": 12691.0, "Valor Transacoes 12m": 1144, "Taxa de Utilização Cartão": 0.061},
            {"CLIENTNUM": 2, "Categoria": "Cancelado", "Idade": null, "Faixa Salarial Anual": "$120K +",
             "Limite": 9000.0, "Valor Transacoes 12m": 800, "Taxa de Utilização Cartão": 0.2}
        ]"#;
        let ds = read_json(text, &options(Encoding::Utf8)).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].number("Idade"), Some(45.0));
    }

    #[test]
    fn repeated_headers_are_rejected() {
        let text = format!("{HEADER},Limite\n1,Cliente,45,$60K - $80K,12691,1144,0.061,alto\n");
        let err = read_delimited(text.as_bytes(), &options(Encoding::Utf8)).unwrap_err();
        match err {
            DashboardError::DuplicateColumns { duplicated } => {
                assert_eq!(duplicated, ["Limite"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_zero_reads_as_zero() {
        let text = format!(
            "{HEADER}\n\
             1,Cliente,45,$60K - $80K,12691,1144,0\n\
             2,Cliente,45,$60K - $80K,12691,1144,-0\n"
        );
        let ds = read_delimited(text.as_bytes(), &options(Encoding::Utf8)).unwrap();
        let rate = ds.unique_values.get("Taxa de Utilização Cartão").unwrap();
        assert_eq!(rate.len(), 1);
        let n = ds.records[1].number("Taxa de Utilização Cartão").unwrap();
        assert!(n.is_sign_positive());
        let zero = FilterSelection::only("Taxa de Utilização Cartão", 0.0);
        assert_eq!(apply(&ds, &zero).unwrap().len(), 2);

        let json = r#"[{"Categoria": "Cliente", "Idade": -0.0, "Faixa Salarial Anual": "$120K +",
                        "Limite": 9000.0, "Valor Transacoes 12m": 800, "Taxa de Utilização Cartão": 0.2}]"#;
        let opts = LoadOptions {
            identifier_column: "CLIENTNUM".into(),
            required_columns: Vec::new(),
            ..options(Encoding::Utf8)
        };
        let ds = read_json(json, &opts).unwrap();
        assert!(ds.records[0].number("Idade").unwrap().is_sign_positive());
    }

    #[test]
    fn infinite_values_keep_a_column_numeric() {
        let text = format!(
            "{HEADER}\n\
             1,Cliente,45,$60K - $80K,inf,1144,0.061\n\
             2,Cliente,45,$60K - $80K,3418,1144,0.061\n"
        );
        let ds = read_delimited(text.as_bytes(), &options(Encoding::Utf8)).unwrap();
        assert_eq!(ds.schema.column("Limite").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(ds.records[0].number("Limite"), Some(f64::INFINITY));
    }

    #[test]
    fn latin1_encode_replaces_unrepresentable_chars() {
        assert_eq!(Encoding::Latin1.encode("ç€"), vec![0xE7, b'?']);
        assert_eq!(Encoding::Latin1.decode(&[0xE7]).as_deref(), Some("ç"));
    }

    #[test]
    fn unknown_extension_is_rejected_before_opening() {
        let err = load(Path::new("does/not/exist.xlsx"), Encoding::Latin1).unwrap_err();
        assert!(matches!(err, DashboardError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load(Path::new("does/not/exist.csv"), Encoding::Latin1).unwrap_err();
        assert!(matches!(err, DashboardError::Io { .. }));
    }
}
