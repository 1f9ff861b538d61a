use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use churn_dash::data::loader::Encoding;
use churn_dash::data::model::Column;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[(self.next_u64() % options.len() as u64) as usize]
    }

    fn int(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_u64() % (hi - lo + 1) as u64) as i64
    }
}

const SEXES: &[&str] = &["M", "F"];
const EDUCATION: &[&str] = &[
    "Ensino Médio",
    "Graduação",
    "Mestrado",
    "Doutorado",
    "Pós-Graduação",
    "Sem Educação Formal",
    "Desconhecido",
];
const MARITAL: &[&str] = &["Casado", "Solteiro", "Divorciado", "Desconhecido"];
const INCOME: &[&str] = &[
    "Menos de $40K",
    "$40K - $60K",
    "$60K - $80K",
    "$80K - $120K",
    "$120K +",
    "Desconhecido",
];
const CARDS: &[&str] = &["Blue", "Blue", "Blue", "Silver", "Gold", "Platinum"];

/// Cell of the generated table.
enum Cell {
    Int(i64),
    Float(f64),
    Text(&'static str),
}

impl Cell {
    fn render(&self) -> String {
        match self {
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => format!("{f:.3}"),
            Cell::Text(s) => s.to_string(),
        }
    }
}

/// Rows are cancelled when `i * 1627 mod 10000 < 1627`, which for 10 000 rows
/// yields exactly 1 627 cancellations spread over the file.
fn is_cancelled(i: usize) -> bool {
    (i as u64 * 1627) % 10_000 < 1627
}

fn generate_row(i: usize, rng: &mut SimpleRng) -> Vec<Cell> {
    let cancelled = is_cancelled(i);
    let age = rng.gauss(if cancelled { 44.0 } else { 46.5 }, 8.0).clamp(26.0, 73.0).round() as i64;
    let limit = rng.gauss(8600.0, 9000.0).clamp(1438.3, 34516.0);
    let utilization: f64 = if cancelled {
        (rng.next_f64() * 0.4).min(0.999)
    } else {
        (rng.next_f64() * 0.8).min(0.999)
    };
    let consumed = (limit * utilization).round();
    let products = if cancelled { rng.int(1, 4) } else { rng.int(2, 6) };
    let contacts = if cancelled { rng.int(2, 6) } else { rng.int(0, 4) };
    let tx_count = if cancelled { rng.int(10, 70) } else { rng.int(30, 130) };
    let tx_value = (tx_count as f64 * rng.gauss(65.0, 12.0).max(10.0)).round();

    vec![
        Cell::Int(700_000_000 + i as i64 * 37),
        Cell::Text(if cancelled { "Cancelado" } else { "Cliente" }),
        Cell::Int(age),
        Cell::Text(rng.pick(SEXES)),
        Cell::Int(rng.int(0, 5)),
        Cell::Text(rng.pick(EDUCATION)),
        Cell::Text(rng.pick(MARITAL)),
        Cell::Text(rng.pick(INCOME)),
        Cell::Text(rng.pick(CARDS)),
        Cell::Int(rng.int(13, 56)),
        Cell::Int(products),
        Cell::Int(rng.int(0, 6)),
        Cell::Int(contacts),
        Cell::Float(limit.round()),
        Cell::Float(consumed),
        Cell::Float((limit - consumed).round()),
        Cell::Float(rng.gauss(0.76, 0.2).max(0.0)),
        Cell::Float(tx_value),
        Cell::Int(tx_count),
        Cell::Float(rng.gauss(0.71, 0.23).max(0.0)),
        Cell::Float(utilization),
    ]
}

fn write_csv(path: &Path, rows: &[Vec<Cell>]) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(Column::ALL.iter().map(|c| Encoding::Latin1.encode(c.header())))?;
    for row in rows {
        writer.write_record(row.iter().map(|cell| Encoding::Latin1.encode(&cell.render())))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Vec<Cell>]) -> Result<()> {
    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();
    for (j, column) in Column::ALL.iter().enumerate() {
        let (data_type, array): (DataType, ArrayRef) = match rows.first().map(|r| &r[j]) {
            Some(Cell::Text(_)) => (
                DataType::Utf8,
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| match &r[j] {
                    Cell::Text(s) => s.to_string(),
                    other => other.render(),
                }))),
            ),
            Some(Cell::Int(_)) => (
                DataType::Int64,
                Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| match &r[j] {
                    Cell::Int(i) => *i,
                    _ => 0,
                }))),
            ),
            _ => (
                DataType::Float64,
                Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| match &r[j] {
                    Cell::Float(f) => *f,
                    Cell::Int(i) => *i as f64,
                    Cell::Text(_) => f64::NAN,
                }))),
            ),
        };
        fields.push(Field::new(column.header(), data_type, false));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let output_path = PathBuf::from(
        args.next()
            .unwrap_or_else(|| "dados/ClientesBanco.csv".to_string()),
    );
    let n_rows: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("row count '{n}' is not a number"))?,
        None => 10_000,
    };

    let mut rng = SimpleRng::new(42);
    let rows: Vec<Vec<Cell>> = (0..n_rows).map(|i| generate_row(i, &mut rng)).collect();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let is_parquet = output_path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_parquet(&output_path, &rows)?;
    } else {
        write_csv(&output_path, &rows)?;
    }

    let cancelled = (0..n_rows).filter(|&i| is_cancelled(i)).count();
    println!(
        "Wrote {n_rows} customers ({cancelled} cancelled) to {}",
        output_path.display()
    );
    Ok(())
}
